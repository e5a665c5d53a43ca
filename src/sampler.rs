/*!
# Candidate Generation and the ARMS Acceptance Test

Drawing works in three steps:

1. **Invert**: a uniform number is mapped through the inverse CDF of the
   piecewise-exponential envelope to a candidate abscissa.
2. **Test**: the candidate is accepted by the squeezing test, by the rejection
   test, or (with Metropolis correction) by a Metropolis–Hastings step against
   the previous Markov-chain iterate. Rejected candidates refine the envelope.
3. **Draw**: steps 1 and 2 repeat until something is accepted or the attempt
   cap is hit.

```rust
use mini_arms::config::ArmsConfig;
use mini_arms::envelope::Envelope;
use mini_arms::sampler::{draw, Context};
use rand::{rngs::SmallRng, SeedableRng};

let mut ctx = Context::new(|x: f64| -0.5 * x * x);
let config = ArmsConfig::default().set_metropolis(false);
let mut envelope = Envelope::build(&config, &mut ctx).unwrap();
let mut rng = SmallRng::seed_from_u64(42);

let x = draw(&mut envelope, &mut ctx, &mut rng, config.max_attempts).unwrap();
assert!(x > envelope.lower() && x < envelope.upper());
```
*/

use log::warn;
use rand::Rng;

use crate::distributions::LogDensity;
use crate::envelope::{Envelope, Iterate};
use crate::error::{ArmsError, Result};
use crate::numeric::{exp_shift, log_shift, EYEPS, YCEIL, YEPS};

/// The target density together with a count of how often it was evaluated.
#[derive(Debug, Clone)]
pub struct Context<D> {
    target: D,
    evaluations: usize,
}

impl<D: LogDensity> Context<D> {
    pub fn new(target: D) -> Self {
        Self {
            target,
            evaluations: 0,
        }
    }

    /// Evaluates the log-density at `x` and counts the evaluation.
    pub fn evaluate(&mut self, x: f64) -> f64 {
        self.evaluations += 1;
        self.target.log_density(x)
    }

    /// Number of log-density evaluations since the envelope was built.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub(crate) fn reset(&mut self) {
        self.evaluations = 0;
    }
}

/// A working point drawn from the envelope, not yet part of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x: f64,
    /// Envelope height at `x` until the log-density has been evaluated there.
    pub y: f64,
    pub ey: f64,
    pub cum: f64,
    pub on_curve: bool,
    /// Arena index of the envelope point on the left.
    pub left: usize,
    /// Arena index of the envelope point on the right.
    pub right: usize,
}

/// What the acceptance test decided about a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// A value was produced: the candidate, or with Metropolis correction
    /// possibly the previous iterate again.
    Accepted(f64),
    Rejected,
}

impl Envelope {
    /**
    Returns the candidate at cumulative probability `prob` under the envelope.

    # Errors

    [`ArmsError::NumericGuardTripped`] if floating-point error puts the
    inverted abscissa outside the piece it was taken from.
    */
    pub fn invert(&self, prob: f64) -> Result<Candidate> {
        let mut q = self.rightmost;
        let u = prob * self.points[q].cum;
        while let Some(l) = self.points[q].left {
            if self.points[l].cum <= u {
                break;
            }
            q = l;
        }
        let l = self.points[q].left.ok_or_else(|| {
            ArmsError::EnvelopeViolation("cumulative mass below the left bound".into())
        })?;
        let (pl, pr) = (self.points[l], self.points[q]);

        let mut candidate = Candidate {
            x: pr.x,
            y: pr.y,
            ey: pr.ey,
            cum: u,
            on_curve: false,
            left: l,
            right: q,
        };
        if pl.x == pr.x {
            return Ok(candidate);
        }

        let prop = (u - pl.cum) / (pr.cum - pl.cum);
        let (xl, xr) = (pl.x, pr.x);
        let (yl, yr) = (pl.y, pr.y);
        let (eyl, eyr) = (pl.ey, pr.ey);
        if (yr - yl).abs() < YEPS {
            // the piece was integrated as a straight line
            candidate.x = if (eyr - eyl).abs() > EYEPS * (eyr + eyl).abs() {
                xl + ((xr - xl) / (eyr - eyl))
                    * (-eyl + ((1.0 - prop) * eyl * eyl + prop * eyr * eyr).sqrt())
            } else {
                xl + (xr - xl) * prop
            };
            candidate.ey = ((candidate.x - xl) / (xr - xl)) * (eyr - eyl) + eyl;
            candidate.y = log_shift(candidate.ey, self.ymax);
        } else {
            candidate.x = xl
                + ((xr - xl) / (yr - yl))
                    * (-yl + log_shift((1.0 - prop) * eyl + prop * eyr, self.ymax));
            candidate.y = ((candidate.x - xl) / (xr - xl)) * (yr - yl) + yl;
            candidate.ey = exp_shift(candidate.y, self.ymax);
        }

        if !(candidate.x >= xl && candidate.x <= xr) {
            return Err(ArmsError::NumericGuardTripped {
                x: candidate.x,
                lower: xl,
                upper: xr,
            });
        }
        Ok(candidate)
    }
}

/// Draws a candidate from the piecewise-exponential envelope.
pub fn sample<R: Rng + ?Sized>(envelope: &Envelope, rng: &mut R) -> Result<Candidate> {
    envelope.invert(rng.gen::<f64>())
}

/**
Runs the squeezing, rejection and Metropolis tests on `candidate`.

Every evaluation of the log-density that ends in the rejection branch is used
to refine the envelope.

# Errors

[`ArmsError::EnvelopeViolation`] if refining the envelope shows the target is
not log-concave while Metropolis correction is disabled.
*/
pub fn test<D, R>(
    envelope: &mut Envelope,
    candidate: &mut Candidate,
    ctx: &mut Context<D>,
    rng: &mut R,
) -> Result<Outcome>
where
    D: LogDensity,
    R: Rng + ?Sized,
{
    let ymax = envelope.ymax;
    let y = log_shift(rng.gen::<f64>() * candidate.ey, ymax);

    let (l, r) = (candidate.left, candidate.right);
    let left = envelope.points[l];
    let right = envelope.points[r];
    if !envelope.metropolis() && left.left.is_some() && right.right.is_some() {
        // squeeze under the chord through the nearest on-curve points
        let ql = if left.on_curve { Some(l) } else { left.left };
        let qr = if right.on_curve { Some(r) } else { right.right };
        if let (Some(ql), Some(qr)) = (ql, qr) {
            let (pl, pr) = (envelope.points[ql], envelope.points[qr]);
            let ysqueeze =
                (pr.y * (candidate.x - pl.x) + pl.y * (pr.x - candidate.x)) / (pr.x - pl.x);
            if y <= ysqueeze {
                return Ok(Outcome::Accepted(candidate.x));
            }
        }
    }

    let ynew = ctx.evaluate(candidate.x);

    let chain = match envelope.chain {
        Some(chain) if y < ynew => chain,
        _ => {
            candidate.y = ynew;
            candidate.ey = exp_shift(ynew, ymax);
            candidate.on_curve = true;
            envelope.insert(candidate, ctx)?;
            return Ok(if y < ynew {
                Outcome::Accepted(candidate.x)
            } else {
                Outcome::Rejected
            });
        }
    };

    // Metropolis step against the previous iterate
    let (ql, qr) = envelope.straddling(chain.x);
    let (pl, pr) = (envelope.points[ql], envelope.points[qr]);
    let w = (chain.x - pl.x) / (pr.x - pl.x);
    let zold = (pl.y + w * (pr.y - pl.y)).min(chain.y);
    let znew = candidate.y.min(ynew);
    let w = ((ynew - znew) - (chain.y - zold)).min(0.0);
    let p = if w > -YCEIL { w.exp() } else { 0.0 };

    if rng.gen::<f64>() > p {
        // stay put: the previous iterate is drawn again
        candidate.x = chain.x;
        candidate.y = chain.y;
        candidate.ey = exp_shift(chain.y, envelope.ymax);
        candidate.on_curve = true;
        candidate.left = ql;
        candidate.right = qr;
    } else {
        envelope.chain = Some(Iterate {
            x: candidate.x,
            y: ynew,
        });
    }
    Ok(Outcome::Accepted(candidate.x))
}

/**
Draws one value, refining `envelope` along the way.

# Errors

[`ArmsError::SamplerExhausted`] if `max_attempts` candidates in a row were
rejected; any fatal error from [`sample`] or [`test`] is passed through.
*/
pub fn draw<D, R>(
    envelope: &mut Envelope,
    ctx: &mut Context<D>,
    rng: &mut R,
    max_attempts: usize,
) -> Result<f64>
where
    D: LogDensity,
    R: Rng + ?Sized,
{
    for _ in 0..max_attempts {
        let mut candidate = sample(envelope, rng)?;
        if let Outcome::Accepted(x) = test(envelope, &mut candidate, ctx, rng)? {
            return Ok(x);
        }
    }
    warn!("Rejected {max_attempts} candidates in a row; the envelope may be badly conditioned");
    Err(ArmsError::SamplerExhausted {
        attempts: max_attempts,
    })
}
