/*!
Univariate target densities for the ARMS sampler.

A target only has to expose the log of its (possibly unnormalized) density through
[`LogDensity`]. Any closure `Fn(f64) -> f64` already does, so most callers never
implement the trait by hand.

# Examples

```rust
use mini_arms::distributions::{Gaussian, LogDensity};

let target = Gaussian::new(0.0, 1.0);
assert_eq!(target.log_density(0.0), 0.0);

let closure = |x: f64| -0.5 * x * x;
assert_eq!(closure.log_density(2.0), -2.0);
```
*/

use rand::Rng;
use rand_distr::{Distribution, Gamma as GammaDistr, Normal};

/// A univariate target distribution.
pub trait LogDensity {
    /// Returns the log of the unnormalized density at `x`.
    fn log_density(&self, x: f64) -> f64;
}

impl<F> LogDensity for F
where
    F: Fn(f64) -> f64,
{
    fn log_density(&self, x: f64) -> f64 {
        self(x)
    }
}

/// A normal distribution N(mean, std²), unnormalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub mean: f64,
    pub std: f64,
}

impl Gaussian {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

impl LogDensity for Gaussian {
    fn log_density(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std;
        -0.5 * z * z
    }
}

/**
A two-component Gaussian mixture. With well separated components its log-density
is not concave, so it needs Metropolis correction.

# Examples

```rust
use mini_arms::distributions::{GaussianMixture, LogDensity};
use rand::{rngs::SmallRng, SeedableRng};

let mixture = GaussianMixture::new(-2.0, 1.0, 2.0, 1.0, 0.5);
assert!(mixture.log_density(0.0) < mixture.log_density(2.0));

let mut rng = SmallRng::seed_from_u64(42);
let x = mixture.sample_exact(&mut rng);
assert!(x.is_finite());
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianMixture {
    pub mu0: f64,
    pub sigma0: f64,
    pub mu1: f64,
    pub sigma1: f64,
    /// Weight of the first component, in (0, 1).
    pub pi0: f64,
}

impl GaussianMixture {
    pub fn new(mu0: f64, sigma0: f64, mu1: f64, sigma1: f64, pi0: f64) -> Self {
        Self {
            mu0,
            sigma0,
            mu1,
            sigma1,
            pi0,
        }
    }

    /// Draws directly from the mixture; used as a reference for diagnostics.
    pub fn sample_exact<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (mu, sigma) = if rng.gen::<f64>() < self.pi0 {
            (self.mu0, self.sigma0)
        } else {
            (self.mu1, self.sigma1)
        };
        match Normal::new(mu, sigma) {
            Ok(normal) => normal.sample(rng),
            Err(_) => f64::NAN,
        }
    }

    /// Theoretical mean of the mixture.
    pub fn mean(&self) -> f64 {
        self.pi0 * self.mu0 + (1.0 - self.pi0) * self.mu1
    }

    /// Theoretical variance of the mixture.
    pub fn variance(&self) -> f64 {
        let m = self.mean();
        self.pi0 * (self.sigma0.powi(2) + (self.mu0 - m).powi(2))
            + (1.0 - self.pi0) * (self.sigma1.powi(2) + (self.mu1 - m).powi(2))
    }
}

impl LogDensity for GaussianMixture {
    fn log_density(&self, x: f64) -> f64 {
        // log-sum-exp of the two weighted components
        let a = self.pi0.ln() - self.sigma0.ln() - 0.5 * ((x - self.mu0) / self.sigma0).powi(2);
        let b = (1.0 - self.pi0).ln()
            - self.sigma1.ln()
            - 0.5 * ((x - self.mu1) / self.sigma1).powi(2);
        let m = a.max(b);
        m + ((a - m).exp() + (b - m).exp()).ln()
    }
}

/// A gamma distribution with the given shape and scale, unnormalized.
///
/// Log-concave for `shape >= 1`. The density is zero for `x <= 0`, so the lower
/// bound of the sampling domain should be non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gamma {
    pub shape: f64,
    pub scale: f64,
}

impl Gamma {
    pub fn new(shape: f64, scale: f64) -> Self {
        Self { shape, scale }
    }

    /// Draws directly from the distribution via `rand_distr`.
    pub fn sample_exact<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match GammaDistr::new(self.shape, self.scale) {
            Ok(gamma) => gamma.sample(rng),
            Err(_) => f64::NAN,
        }
    }
}

impl LogDensity for Gamma {
    fn log_density(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return f64::NEG_INFINITY;
        }
        (self.shape - 1.0) * x.ln() - x / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_gaussian_log_density() {
        let g = Gaussian::new(1.0, 2.0);
        assert_abs_diff_eq!(g.log_density(1.0), 0.0);
        assert_abs_diff_eq!(g.log_density(5.0), -2.0);
    }

    #[test]
    fn test_mixture_matches_direct_formula() {
        let m = GaussianMixture::new(-2.0, 1.0, 3.0, 1.5, 0.3);
        for &x in &[-4.0, -2.0, 0.0, 0.5, 3.0, 7.0] {
            let direct = (0.3 / 1.0 * (-0.5 * (x + 2.0_f64).powi(2)).exp()
                + 0.7 / 1.5 * (-0.5 * ((x - 3.0) / 1.5_f64).powi(2)).exp())
            .ln();
            assert_abs_diff_eq!(m.log_density(x), direct, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mixture_is_stable_far_in_the_tails() {
        let m = GaussianMixture::new(-2.0, 1.0, 2.0, 1.0, 0.5);
        let far = m.log_density(60.0);
        assert!(far.is_finite(), "Expected finite log density, got {far}");
    }

    #[test]
    fn test_mixture_moments() {
        let m = GaussianMixture::new(-2.0, 1.0, 3.0, 1.5, 0.5);
        assert_abs_diff_eq!(m.mean(), 0.5);
        assert_abs_diff_eq!(m.variance(), 0.5 * (1.0 + 6.25) + 0.5 * (2.25 + 6.25));
    }

    #[test]
    fn test_exact_mixture_draws_have_the_right_mean() {
        let m = GaussianMixture::new(-2.0, 1.0, 2.0, 1.0, 0.25);
        let mut rng = SmallRng::seed_from_u64(7);
        let n = 20_000;
        let mean = (0..n).map(|_| m.sample_exact(&mut rng)).sum::<f64>() / n as f64;
        assert_abs_diff_eq!(mean, m.mean(), epsilon = 0.1);
    }

    #[test]
    fn test_gamma_outside_support() {
        let g = Gamma::new(2.0, 1.0);
        assert_eq!(g.log_density(0.0), f64::NEG_INFINITY);
        assert_abs_diff_eq!(g.log_density(1.0), -1.0);
    }
}
