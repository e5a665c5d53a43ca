//! Two-sample Kolmogorov–Smirnov tests for checking sampler output against
//! reference draws. The asymptotic distribution follows *Numerical Recipes*
//! (Third Edition), as in the `kolmogorov_smirnov` crate (Apache 2.0).

use std::cmp::Ordering;

/// Outcome of a two-sample KS test at a given significance level.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub is_rejected: bool,
    /// Largest distance between the two empirical CDFs.
    pub statistic: f64,
    pub p_value: f64,
    pub level: f64,
}

/// Tests whether two samples come from the same distribution. Both slices are
/// sorted in place.
pub fn two_sample_ks_test(
    sample_1: &mut [f64],
    sample_2: &mut [f64],
    level: f64,
) -> Result<TestResult, String> {
    if sample_1.len() <= 7 || sample_2.len() <= 7 {
        return Err(format!(
            "Expected more than 7 values per sample, got {} and {}.",
            sample_1.len(),
            sample_2.len()
        ));
    }
    let statistic = ks_statistic(sample_1, sample_2)?;
    let (n1, n2) = (sample_1.len() as f64, sample_2.len() as f64);
    let p_value = qks((n1 * n2 / (n1 + n2)).sqrt() * statistic)?;
    Ok(TestResult {
        is_rejected: p_value < level,
        statistic,
        p_value,
        level,
    })
}

/// Sorts both samples and returns the supremum distance between their
/// empirical distribution functions.
pub fn ks_statistic(sample_1: &mut [f64], sample_2: &mut [f64]) -> Result<f64, String> {
    if sample_1.is_empty() || sample_2.is_empty() {
        return Err("Expected both samples to be non-empty.".into());
    }
    sample_1.sort_unstable_by(cmp_f64);
    sample_2.sort_unstable_by(cmp_f64);

    let (n1, n2) = (sample_1.len(), sample_2.len());
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < n1 && j < n2 {
        // step past every copy of the smallest remaining value in both samples
        let x = sample_1[i].min(sample_2[j]);
        while i < n1 && sample_1[i] <= x {
            i += 1;
        }
        while j < n2 && sample_2[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 as f64 - j as f64 / n2 as f64).abs());
    }
    // once one sample is used up the other only moves towards it
    Ok(d)
}

/// CDF of the Kolmogorov distribution.
fn pks(z: f64) -> Result<f64, String> {
    if z < 0. {
        return Err(format!("Bad z = {z} for the KS distribution function."));
    }
    if z == 0. {
        return Ok(0.);
    }
    if z < 1.18 {
        let y = (-1.233_700_550_136_169_7 / z.powi(2)).exp();
        return Ok(2.256_758_334_191_025
            * (-y.ln()).sqrt()
            * (y + y.powf(9.) + y.powf(25.) + y.powf(49.)));
    }
    let x = (-2. * z.powi(2)).exp();
    Ok(1. - 2. * (x - x.powf(4.) + x.powf(9.)))
}

/// Complementary CDF of the Kolmogorov distribution.
fn qks(z: f64) -> Result<f64, String> {
    if z < 0. {
        return Err(format!("Bad z = {z} for the KS distribution function."));
    }
    if z == 0. {
        return Ok(1.);
    }
    if z < 1.18 {
        return Ok(1. - pks(z)?);
    }
    let x = (-2. * z.powi(2)).exp();
    Ok(2. * (x - x.powf(4.) + x.powf(9.)))
}

/// Orders NaN after every number.
fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn test_statistic_shifted_samples() {
        let mut s1 = [0.0, 1.0, 2.0, 3.0];
        let mut s2 = [1.0, 2.0, 3.0, 4.0];
        let d = ks_statistic(&mut s1, &mut s2).unwrap();
        assert!((d - 0.25).abs() < 1e-12, "Expected 0.25, got {d}");
    }

    #[test]
    fn test_statistic_identical_and_disjoint() {
        let mut a = [3.0, 1.0, 2.0];
        let mut b = [1.0, 2.0, 3.0];
        assert_eq!(ks_statistic(&mut a, &mut b).unwrap(), 0.0);

        let mut c = [1.0, 2.0, 3.0];
        let mut d = [10.0, 11.0];
        assert_eq!(ks_statistic(&mut c, &mut d).unwrap(), 1.0);
    }

    #[test]
    fn test_statistic_with_ties() {
        let mut s1 = [1.0, 1.0, 1.0, 2.0, 2.0];
        let mut s2 = [1.0, 1.0, 2.0, 2.0, 2.0];
        let d = ks_statistic(&mut s1, &mut s2).unwrap();
        assert!((d - 0.2).abs() < 1e-12, "Expected 0.2, got {d}");
    }

    #[test]
    fn test_empty_sample_is_an_error() {
        let mut s1: [f64; 0] = [];
        let mut s2 = [1.0, 2.0];
        assert!(ks_statistic(&mut s1, &mut s2).is_err());
        assert!(ks_statistic(&mut s2, &mut s1).is_err());
    }

    #[test]
    fn test_small_samples_are_refused() {
        let mut s1 = [1.0, 2.0, 3.0];
        let mut s2 = [1.0, 2.0, 3.0];
        assert!(two_sample_ks_test(&mut s1, &mut s2, 0.05).is_err());
    }

    #[test]
    fn test_p_value_for_repeated_pattern() {
        let base_1 = [0.12, 0.25, 0.25, 0.78, 0.99, 0.33, 0.15, 0.5];
        let base_2 = [0.12, 0.25, 0.25, 0.78, 0.99, 0.33, 0.15, 0.51];
        let mut s1: Vec<f64> = base_1.iter().cycle().take(160).copied().collect();
        let mut s2: Vec<f64> = base_2.iter().cycle().take(160).copied().collect();

        let result = two_sample_ks_test(&mut s1, &mut s2, 0.05).unwrap();
        assert!((result.statistic - 0.125).abs() < 1e-9, "Got D = {}", result.statistic);
        assert!((result.p_value - 0.1641).abs() < 1e-4, "Got p = {}", result.p_value);
        assert!(!result.is_rejected);
    }

    #[test]
    fn test_detects_a_shifted_normal() {
        let mut rng = SmallRng::seed_from_u64(1);
        let n = Normal::new(0.0, 1.0).unwrap();
        let m = Normal::new(0.5, 1.0).unwrap();
        let mut s1: Vec<f64> = (0..2_000).map(|_| n.sample(&mut rng)).collect();
        let mut s2: Vec<f64> = (0..2_000).map(|_| m.sample(&mut rng)).collect();
        assert!(two_sample_ks_test(&mut s1, &mut s2, 0.01).unwrap().is_rejected);
    }

    #[test]
    fn test_pks_values() {
        assert!(pks(-1.0).is_err());
        assert_eq!(pks(0.0).unwrap(), 0.0);
        assert!((pks(1.23).unwrap() - 0.902_973_102_404_779_1).abs() < 1e-8);
        assert!((pks(2.34).unwrap() - 0.999_964_926_083_361_1).abs() < 1e-8);
        assert!((pks(3.45).unwrap() - 1.0).abs() < 1e-8);
        assert_eq!(qks(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_nan_sorts_last() {
        let mut s = [f64::NAN, 2.0, f64::NAN, 1.0];
        s.sort_by(cmp_f64);
        assert!(s[0] == 1.0 && s[1] == 2.0 && s[2].is_nan() && s[3].is_nan(), "Got {s:?}");
    }
}
