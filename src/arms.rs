/*!
# ARMS Sampling Sessions

[`Arms`] ties everything together: it owns the configuration, the adaptive
envelope, the evaluation context for the target and a seeded random number
generator. Each call to [`Arms::draw`] produces one value and leaves the
envelope a little tighter than before.

## Example Usage

```rust
use mini_arms::arms::Arms;
use mini_arms::config::ArmsConfig;
use mini_arms::distributions::Gaussian;

let config = ArmsConfig::default()
    .set_bounds(-10.0, 10.0)
    .set_metropolis(false);
let mut arms = Arms::new(Gaussian::new(0.0, 1.0), config).unwrap().set_seed(42);

let samples = arms.run(1_000).unwrap();
assert_eq!(samples.len(), 1_000);
assert!(samples.iter().all(|x| x.abs() < 10.0));
```

A target that is not log-concave needs Metropolis correction, which is on by
default:

```rust
use mini_arms::arms::Arms;
use mini_arms::config::ArmsConfig;
use mini_arms::distributions::GaussianMixture;

let config = ArmsConfig::default()
    .set_initial_points(vec![-4.0, -2.0, 0.0, 2.0, 4.0])
    .set_bounds(-12.0, 12.0);
let target = GaussianMixture::new(-2.0, 1.0, 2.0, 1.0, 0.5);
let mut arms = Arms::new(target, config).unwrap().set_seed(7);

let x = arms.draw().unwrap();
assert!(x > -12.0 && x < 12.0);
```
*/

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use ndarray::Array1;
use rand::prelude::*;

use crate::config::ArmsConfig;
use crate::distributions::LogDensity;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::sampler::{self, Context};
use crate::stats::{DrawTracker, RunStats};

/**
An adaptive rejection Metropolis sampler for a univariate target `D`.

# Examples

```rust
use mini_arms::arms::Arms;
use mini_arms::config::ArmsConfig;

let config = ArmsConfig::default().set_metropolis(false);
let arms = Arms::new(|x: f64| -0.5 * x * x, config).unwrap();
assert_eq!(arms.envelope().len(), 7);
assert_eq!(arms.evaluations(), 3);
```
*/
#[derive(Debug, Clone)]
pub struct Arms<D> {
    /// The settings the envelope was built from.
    pub config: ArmsConfig,
    envelope: Envelope,
    ctx: Context<D>,
    /// The random seed.
    pub seed: u64,
    /// The random number generator driving candidate generation and acceptance.
    pub rng: SmallRng,
}

impl<D: LogDensity> Arms<D> {
    /**
    Validates `config`, evaluates the target at the initial points and builds the
    starting envelope. The generator is seeded from the thread-local RNG; call
    [`Arms::set_seed`] for reproducible runs.

    # Errors

    [`crate::error::ArmsError::Configuration`] for invalid settings, or
    [`crate::error::ArmsError::EnvelopeViolation`] if the initial points already
    contradict log-concavity while Metropolis correction is off.
    */
    pub fn new(target: D, config: ArmsConfig) -> Result<Self> {
        let mut ctx = Context::new(target);
        let envelope = Envelope::build(&config, &mut ctx)?;
        let seed = thread_rng().gen::<u64>();
        Ok(Self {
            config,
            envelope,
            ctx,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /**
    Sets a new seed and reseeds the generator.

    # Examples

    ```rust
    use mini_arms::arms::Arms;
    use mini_arms::config::ArmsConfig;

    let config = ArmsConfig::default().set_metropolis(false);
    let mut a = Arms::new(|x: f64| -0.5 * x * x, config.clone()).unwrap().set_seed(42);
    let mut b = Arms::new(|x: f64| -0.5 * x * x, config).unwrap().set_seed(42);
    assert_eq!(a.seed, 42);
    assert_eq!(a.run(10).unwrap(), b.run(10).unwrap());
    ```
    */
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Draws a single value, refining the envelope on the way.
    pub fn draw(&mut self) -> Result<f64> {
        sampler::draw(
            &mut self.envelope,
            &mut self.ctx,
            &mut self.rng,
            self.config.max_attempts,
        )
    }

    /// Draws `n` values in sequence.
    pub fn run(&mut self, n: usize) -> Result<Array1<f64>> {
        let mut out = Array1::<f64>::zeros(n);
        for x in out.iter_mut() {
            *x = self.draw()?;
        }
        Ok(out)
    }

    /**
    Draws `n` values like [`Arms::run`] while showing a progress bar with the
    running mean and the number of log-density evaluations per draw.

    Returns the draws along with a [`RunStats`] summary.
    */
    pub fn run_progress(&mut self, n: usize) -> Result<(Array1<f64>, RunStats)> {
        let pb = ProgressBar::new(n as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_prefix("ARMS");

        let mut tracker = DrawTracker::new();
        let mut out = Array1::<f64>::zeros(n);
        for (i, x) in out.iter_mut().enumerate() {
            *x = self.draw()?;
            tracker.step(*x);
            pb.inc(1);
            if i % 100 == 0 {
                pb.set_message(format!(
                    "mean≈{:.3} evals/draw≈{:.2}",
                    tracker.mean(),
                    self.evaluations() as f64 / tracker.n() as f64
                ));
            }
        }
        pb.finish_with_message("Done!");

        let stats = tracker.stats(self.evaluations(), self.envelope.len());
        debug!("ARMS run finished: {stats}");
        Ok((out, stats))
    }

    /// Discards all refinement and rebuilds the envelope from the configuration.
    pub fn reset(&mut self) -> Result<()> {
        self.envelope = Envelope::build(&self.config, &mut self.ctx)?;
        Ok(())
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Log-density evaluations since the envelope was last built.
    pub fn evaluations(&self) -> usize {
        self.ctx.evaluations()
    }

    pub fn target(&self) -> &D {
        self.ctx.target()
    }
}
