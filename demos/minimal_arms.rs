use mini_arms::arms::Arms;
use mini_arms::config::ArmsConfig;

fn main() {
    // Standard normal log-density, up to a constant
    let target = |x: f64| -0.5 * x * x;

    // Start from {-1, 0, 1} on [-10.1, 10.1]; the target is log-concave, so no Metropolis step
    let config = ArmsConfig::default().set_metropolis(false);
    let mut arms = Arms::new(target, config)
        .expect("Expected a valid configuration")
        .set_seed(42);

    // Draw 10,000 values
    let samples = arms.run(10_000).expect("Expected every draw to succeed");

    assert_eq!(samples.len(), 10_000);
    println!(
        "mean = {:.3}, variance = {:.3}, {} log-density evaluations, {} envelope points",
        samples.mean().unwrap_or(f64::NAN),
        samples.var(1.0),
        arms.evaluations(),
        arms.envelope().len()
    );
}
