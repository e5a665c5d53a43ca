/*!
# mini-arms

Adaptive rejection Metropolis sampling (ARMS) of univariate distributions.

Given only the log of a possibly unnormalized density, the sampler keeps a
piecewise-linear upper bound on the log-density, draws candidates from the
piecewise-exponential envelope it defines and refines that envelope with every
evaluation it has to make. For log-concave targets this is plain adaptive
rejection sampling and draws are independent. Otherwise a Metropolis step keeps
the resulting Markov chain correct.

```rust
use mini_arms::arms::Arms;
use mini_arms::config::ArmsConfig;

let config = ArmsConfig::default()
    .set_bounds(-10.0, 10.0)
    .set_metropolis(false);
let mut arms = Arms::new(|x: f64| -0.5 * x * x, config).unwrap().set_seed(1);
let samples = arms.run(100).unwrap();
assert_eq!(samples.len(), 100);
```
*/

pub mod arms;
pub mod config;
pub mod distributions;
pub mod envelope;
pub mod error;
pub mod ks_test;
pub mod numeric;
pub mod sampler;
pub mod stats;
mod update;
