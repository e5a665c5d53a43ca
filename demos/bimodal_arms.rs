//! Samples a two-component Gaussian mixture with ARMS and compares the draws
//! against exact draws from the mixture.
//!
//! The mixture's log-density is not concave between the modes, so the sampler
//! runs with Metropolis correction and the draws form a Markov chain.

use mini_arms::arms::Arms;
use mini_arms::config::ArmsConfig;
use mini_arms::distributions::GaussianMixture;
use mini_arms::ks_test::ks_statistic;
use rand::{rngs::SmallRng, SeedableRng};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let target = GaussianMixture::new(-2.0, 1.0, 2.0, 1.0, 0.5);
    let config = ArmsConfig::default()
        .set_initial_points(vec![-4.0, -2.0, 0.0, 2.0, 4.0])
        .set_bounds(-12.0, 12.0)
        .set_convexity(0.5);

    let mut arms = Arms::new(target, config)?.set_seed(7);
    let (draws, stats) = arms.run_progress(50_000)?;
    println!("{stats}");
    println!(
        "theoretical mean = {:.4}, variance = {:.4}",
        target.mean(),
        target.variance()
    );

    let mut rng = SmallRng::seed_from_u64(8);
    let mut exact: Vec<f64> = (0..draws.len())
        .map(|_| target.sample_exact(&mut rng))
        .collect();
    let mut sample = draws.to_vec();
    let d = ks_statistic(&mut sample, &mut exact)?;
    println!("KS distance to exact draws: {d:.4}");

    println!("{}", arms.envelope());
    Ok(())
}
