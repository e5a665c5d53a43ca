/*!
Configuration of an ARMS sampling session.

[`ArmsConfig`] is built with consuming setters, starting from defaults that
suit a density centred near zero:

```rust
use mini_arms::config::ArmsConfig;

let config = ArmsConfig::default()
    .set_initial_points(vec![-2.0, 0.0, 2.0])
    .set_bounds(-10.0, 10.0)
    .set_metropolis(false);
assert_eq!(config.lower_bound(), -10.0);
assert!(config.validate().is_ok());
```
*/

use crate::error::{ArmsError, Result};

/// Default number of envelope points the arena can hold.
pub const DEFAULT_CAPACITY: usize = 100;
/// Default number of candidates a single draw may reject.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Settings for building an envelope and drawing from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmsConfig {
    /// Starting abscissae, strictly increasing, at least three.
    pub initial_points: Vec<f64>,
    /// Lower end of the domain. Derived from the initial points when `None`.
    pub lower: Option<f64>,
    /// Upper end of the domain. Derived from the initial points when `None`.
    pub upper: Option<f64>,
    /// Relaxation applied to chord gradients that violate log-concavity.
    pub convexity: f64,
    /// Maximum number of envelope points.
    pub capacity: usize,
    /// Whether the Metropolis correction step is applied.
    pub metropolis: bool,
    /// Previous Markov-chain iterate. Defaults to the midpoint of the initial points.
    pub previous: Option<f64>,
    /// Number of rejected candidates after which a draw gives up.
    pub max_attempts: usize,
}

impl Default for ArmsConfig {
    fn default() -> Self {
        Self {
            initial_points: vec![-1.0, 0.0, 1.0],
            lower: None,
            upper: None,
            convexity: 0.0,
            capacity: DEFAULT_CAPACITY,
            metropolis: true,
            previous: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ArmsConfig {
    /// Starting abscissae of the envelope; at least three, strictly increasing.
    pub fn set_initial_points(mut self, points: Vec<f64>) -> Self {
        self.initial_points = points;
        self
    }

    /// Domain of the target. Every draw lies in `[lower, upper]`.
    pub fn set_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }

    /**
    How far chord gradients that contradict log-concavity are pushed past the
    central chord. Larger values give a looser envelope that is more likely to
    dominate a non-log-concave target; only used with Metropolis correction.

    # Examples

    ```rust
    use mini_arms::config::ArmsConfig;

    let config = ArmsConfig::default().set_convexity(1.0);
    assert_eq!(config.convexity, 1.0);
    assert!(ArmsConfig::default().set_convexity(-1.0).validate().is_err());
    ```
    */
    pub fn set_convexity(mut self, convexity: f64) -> Self {
        self.convexity = convexity;
        self
    }

    /// Maximum number of envelope points; refinement stops once it is reached.
    pub fn set_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Enables the Metropolis step needed for targets that are not log-concave.
    pub fn set_metropolis(mut self, metropolis: bool) -> Self {
        self.metropolis = metropolis;
        self
    }

    /// Starting state of the Metropolis chain; must lie strictly inside the bounds.
    pub fn set_previous(mut self, previous: f64) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Number of consecutive rejections after which a draw fails with
    /// [`ArmsError::SamplerExhausted`].
    pub fn set_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The lower domain bound, `min(x0 / 10, x0 * 10) - 0.1` unless set.
    pub fn lower_bound(&self) -> f64 {
        self.lower.unwrap_or_else(|| match self.initial_points.first() {
            Some(&x0) => (x0 / 10.0).min(x0 * 10.0) - 0.1,
            None => f64::NEG_INFINITY,
        })
    }

    /// The upper domain bound, `max(xn / 10, xn * 10) + 0.1` unless set.
    pub fn upper_bound(&self) -> f64 {
        self.upper.unwrap_or_else(|| match self.initial_points.last() {
            Some(&xn) => (xn / 10.0).max(xn * 10.0) + 0.1,
            None => f64::INFINITY,
        })
    }

    /// The starting Metropolis iterate.
    pub fn previous_iterate(&self) -> f64 {
        self.previous.unwrap_or_else(|| {
            match (self.initial_points.first(), self.initial_points.last()) {
                (Some(&first), Some(&last)) => 0.5 * (first + last),
                _ => f64::NAN,
            }
        })
    }

    /// Number of points the initial envelope occupies.
    pub fn initial_size(&self) -> usize {
        2 * self.initial_points.len() + 1
    }

    /// Checks every constraint the envelope builder relies on.
    pub fn validate(&self) -> Result<()> {
        let points = &self.initial_points;
        if points.len() < 3 {
            return Err(ArmsError::Configuration(format!(
                "Expected at least 3 initial points, got {}.",
                points.len()
            )));
        }
        if points.iter().any(|x| !x.is_finite()) {
            return Err(ArmsError::Configuration(
                "Initial points must be finite.".into(),
            ));
        }
        if let Some(w) = points.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ArmsError::Configuration(format!(
                "Initial points must be strictly increasing, found {} followed by {}.",
                w[0], w[1]
            )));
        }

        let (lower, upper) = (self.lower_bound(), self.upper_bound());
        if !lower.is_finite() || !upper.is_finite() {
            return Err(ArmsError::Configuration(format!(
                "Bounds must be finite, got [{lower}, {upper}]."
            )));
        }
        if points[0] <= lower || points[points.len() - 1] >= upper {
            return Err(ArmsError::Configuration(format!(
                "Initial points must lie strictly inside [{lower}, {upper}]."
            )));
        }
        if !(self.convexity >= 0.0) {
            return Err(ArmsError::Configuration(format!(
                "Convexity must be non-negative, got {}.",
                self.convexity
            )));
        }
        if self.capacity < self.initial_size() {
            return Err(ArmsError::Configuration(format!(
                "Capacity {} cannot hold the {} points of the initial envelope.",
                self.capacity,
                self.initial_size()
            )));
        }
        if self.max_attempts == 0 {
            return Err(ArmsError::Configuration(
                "At least one attempt per draw is required.".into(),
            ));
        }
        if self.metropolis {
            let previous = self.previous_iterate();
            if !(previous > lower && previous < upper) {
                return Err(ArmsError::Configuration(format!(
                    "Previous Markov chain iterate {previous} lies outside ({lower}, {upper})."
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds_match_the_classic_setup() {
        let config = ArmsConfig::default();
        assert!((config.lower_bound() + 10.1).abs() < 1e-12);
        assert!((config.upper_bound() - 10.1).abs() < 1e-12);
        assert_eq!(config.previous_iterate(), 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_bounds_for_fractional_points() {
        let config = ArmsConfig::default().set_initial_points(vec![0.5, 1.0, 2.0]);
        assert!((config.lower_bound() - (0.05 - 0.1)).abs() < 1e-12);
        assert!((config.upper_bound() - 20.1).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_too_few_points() {
        let config = ArmsConfig::default().set_initial_points(vec![0.0, 1.0]);
        assert!(matches!(
            config.validate(),
            Err(ArmsError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_unordered_points() {
        let config = ArmsConfig::default().set_initial_points(vec![0.0, 2.0, 1.0]);
        assert!(matches!(
            config.validate(),
            Err(ArmsError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_points_on_the_bounds() {
        let config = ArmsConfig::default().set_bounds(-1.0, 5.0);
        assert!(matches!(
            config.validate(),
            Err(ArmsError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_negative_convexity() {
        let config = ArmsConfig::default().set_convexity(-0.5);
        assert!(matches!(
            config.validate(),
            Err(ArmsError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_small_capacity() {
        let config = ArmsConfig::default().set_capacity(6);
        assert!(matches!(
            config.validate(),
            Err(ArmsError::Configuration(_))
        ));
        assert!(ArmsConfig::default().set_capacity(7).validate().is_ok());
    }

    #[test]
    fn test_previous_iterate_only_checked_with_metropolis() {
        let config = ArmsConfig::default().set_previous(50.0);
        assert!(config.validate().is_err());
        assert!(config.set_metropolis(false).validate().is_ok());
    }
}
