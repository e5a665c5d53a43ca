/*!
# Piecewise-Exponential Envelope

The envelope is a piecewise-linear upper bound on the log-density. Its points
alternate between *on-curve* points, where the log-density was evaluated, and
*intersection* points, where the chords through neighbouring on-curve points
cross. Exponentiating it gives a piecewise-exponential density that is cheap to
integrate and invert.

Points live in a fixed-capacity arena and refer to their neighbours by index.
The arena only ever grows by appending, so the left domain bound stays at index
zero for the whole lifetime of the envelope.

```rust
use mini_arms::config::ArmsConfig;
use mini_arms::envelope::Envelope;
use mini_arms::sampler::Context;

let mut ctx = Context::new(|x: f64| -0.5 * x * x);
let config = ArmsConfig::default().set_metropolis(false);
let envelope = Envelope::build(&config, &mut ctx).unwrap();

assert_eq!(envelope.len(), 7);
assert_eq!(ctx.evaluations(), 3);
assert!(envelope.total() > 0.0);
```
*/

use std::fmt;

use log::debug;

use crate::config::ArmsConfig;
use crate::distributions::LogDensity;
use crate::error::{ArmsError, Result};
use crate::numeric::{exp_shift, segment_integral, YEPS};
use crate::sampler::Context;

/// A single point of the envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    /// Log-height: the evaluated log-density for on-curve points, the chord
    /// crossing height otherwise.
    pub y: f64,
    /// `exp_shift(y, ymax)`.
    pub ey: f64,
    /// Integral of the exponentiated envelope from the left bound up to `x`.
    pub cum: f64,
    pub on_curve: bool,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// A state of the Metropolis chain together with its log-density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iterate {
    pub x: f64,
    pub y: f64,
}

/// The adaptive envelope of one sampling session.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub(crate) points: Vec<Point>,
    pub(crate) capacity: usize,
    pub(crate) rightmost: usize,
    pub(crate) ymax: f64,
    pub(crate) convexity: f64,
    /// Previous Markov-chain iterate; `Some` iff Metropolis correction is on.
    pub(crate) chain: Option<Iterate>,
    pub(crate) saturated: bool,
}

impl Envelope {
    /// Index of the left domain bound.
    pub(crate) const LEFTMOST: usize = 0;

    /**
    Builds the initial envelope from the configured abscissae.

    The log-density is evaluated once per initial point, plus once at the
    previous Markov-chain iterate when Metropolis correction is enabled. The
    evaluation counter of `ctx` is reset first.

    # Errors

    [`ArmsError::Configuration`] if the configuration is invalid, and
    [`ArmsError::EnvelopeViolation`] if the initial points already show the
    target is not log-concave while Metropolis correction is disabled.
    */
    pub fn build<D: LogDensity>(config: &ArmsConfig, ctx: &mut Context<D>) -> Result<Self> {
        config.validate()?;
        ctx.reset();

        let n = config.initial_size();
        let mut points = Vec::with_capacity(config.capacity);
        points.push(Point {
            x: config.lower_bound(),
            right: Some(1),
            ..Point::default()
        });
        for j in 1..n - 1 {
            let mut point = Point {
                left: Some(j - 1),
                right: Some(j + 1),
                ..Point::default()
            };
            if j % 2 == 1 {
                point.x = config.initial_points[j / 2];
                point.y = ctx.evaluate(point.x);
                point.on_curve = true;
            }
            points.push(point);
        }
        points.push(Point {
            x: config.upper_bound(),
            left: Some(n - 2),
            ..Point::default()
        });

        let chain = if config.metropolis {
            let x = config.previous_iterate();
            Some(Iterate {
                x,
                y: ctx.evaluate(x),
            })
        } else {
            None
        };

        let mut envelope = Self {
            points,
            capacity: config.capacity,
            rightmost: n - 1,
            ymax: f64::NEG_INFINITY,
            convexity: config.convexity,
            chain,
            saturated: false,
        };
        for q in (0..n).step_by(2) {
            envelope.chord_intersect(q)?;
        }
        envelope.cumulate();

        debug!(
            "Built envelope with {} points over [{}, {}], total mass {:e}",
            n,
            config.lower_bound(),
            config.upper_bound(),
            envelope.total()
        );
        Ok(envelope)
    }

    /// Number of points currently in the envelope.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a built envelope, which holds at least seven points;
    /// provided to pair with [`Envelope::len`].
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points the envelope may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once no further pair of points fits into the arena.
    pub fn is_full(&self) -> bool {
        self.points.len() + 2 > self.capacity
    }

    /// Largest log-height over all points.
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Total integral of the exponentiated envelope.
    pub fn total(&self) -> f64 {
        self.points[self.rightmost].cum
    }

    pub fn lower(&self) -> f64 {
        self.points[Self::LEFTMOST].x
    }

    pub fn upper(&self) -> f64 {
        self.points[self.rightmost].x
    }

    pub fn metropolis(&self) -> bool {
        self.chain.is_some()
    }

    /// The previous Markov-chain iterate, if Metropolis correction is enabled.
    pub fn previous(&self) -> Option<Iterate> {
        self.chain
    }

    /// Points in order from the left bound to the right bound.
    pub fn points(&self) -> impl Iterator<Item = &Point> + '_ {
        self.sequence().map(move |i| &self.points[i])
    }

    pub(crate) fn sequence(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(Self::LEFTMOST), move |&i| self.points[i].right)
    }

    fn slope(&self, a: usize, b: usize) -> f64 {
        let (pa, pb) = (&self.points[a], &self.points[b]);
        (pb.y - pa.y) / (pb.x - pa.x)
    }

    /// The consecutive pair of points whose interval contains `x`.
    pub(crate) fn straddling(&self, x: f64) -> (usize, usize) {
        let mut ql = Self::LEFTMOST;
        while let Some(qr) = self.points[ql].right {
            if self.points[qr].x >= x {
                return (ql, qr);
            }
            ql = qr;
        }
        (self.points[ql].left.unwrap_or(ql), ql)
    }

    /// Refreshes `ymax`, every `ey` and every `cum`.
    pub(crate) fn cumulate(&mut self) {
        self.ymax = self
            .points
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);
        let ymax = self.ymax;
        for p in self.points.iter_mut() {
            p.ey = exp_shift(p.y, ymax);
        }

        self.points[Self::LEFTMOST].cum = 0.0;
        let mut prev = Self::LEFTMOST;
        while let Some(next) = self.points[prev].right {
            let area = segment_integral(&self.points[prev], &self.points[next]);
            self.points[next].cum = self.points[prev].cum + area;
            prev = next;
        }
    }

    /**
    Places intersection point `q` where the chords on either side of it cross.

    The chord gradient left of the interval runs through the on-curve point on
    the left and the on-curve point before it; the right gradient is symmetric.
    Domain bounds keep their abscissa and only get a height, extrapolated along
    the single chord available to them.
    */
    pub(crate) fn chord_intersect(&mut self, q: usize) -> Result<()> {
        let point = self.points[q];
        if point.on_curve {
            return Err(ArmsError::EnvelopeViolation(format!(
                "point at x = {} is on the curve, not an intersection",
                point.x
            )));
        }
        let (l, r) = (point.left, point.right);
        let far_left = l
            .and_then(|i| self.points[i].left)
            .and_then(|i| self.points[i].left);
        let far_right = r
            .and_then(|i| self.points[i].right)
            .and_then(|i| self.points[i].right);

        let mut gl = l.zip(far_left).map(|(a, b)| self.slope(b, a));
        let mut gr = r.zip(far_right).map(|(a, b)| self.slope(a, b));
        let grl = l.zip(r).map(|(a, b)| self.slope(a, b));

        let stretch = 1.0 + self.convexity;
        if let (Some(g), Some(c)) = (gl, grl) {
            if g < c {
                if !self.metropolis() {
                    return Err(self.violation(q, "left"));
                }
                gl = Some(g + stretch * (c - g));
            }
        }
        if let (Some(g), Some(c)) = (gr, grl) {
            if g > c {
                if !self.metropolis() {
                    return Err(self.violation(q, "right"));
                }
                gr = Some(g + stretch * (c - g));
            }
        }

        let (x, y) = match (l, r, grl) {
            (Some(l), Some(r), Some(grl)) => {
                let (pl, pr) = (self.points[l], self.points[r]);
                let width = pr.x - pl.x;
                let dr = gl.map(|g| ((g - grl) * width).max(YEPS));
                let dl = gr.map(|g| ((grl - g) * width).max(YEPS));
                match (dl, dr) {
                    (Some(dl), Some(dr)) => (
                        (dl * pr.x + dr * pl.x) / (dl + dr),
                        (dl * pr.y + dr * pl.y + dl * dr) / (dl + dr),
                    ),
                    (None, Some(dr)) => (pr.x, pr.y + dr),
                    (Some(dl), None) => (pl.x, pl.y + dl),
                    (None, None) => return Err(self.no_gradient(q)),
                }
            }
            // right bound
            (Some(l), None, _) => match gl {
                Some(g) => {
                    let pl = self.points[l];
                    (point.x, pl.y + g * (point.x - pl.x))
                }
                None => return Err(self.no_gradient(q)),
            },
            // left bound
            (None, Some(r), _) => match gr {
                Some(g) => {
                    let pr = self.points[r];
                    (point.x, pr.y - g * (pr.x - point.x))
                }
                None => return Err(self.no_gradient(q)),
            },
            _ => return Err(self.no_gradient(q)),
        };

        let lower = l.map_or(f64::NEG_INFINITY, |i| self.points[i].x);
        let upper = r.map_or(f64::INFINITY, |i| self.points[i].x);
        if !(x >= lower && x <= upper) {
            return Err(ArmsError::NumericGuardTripped { x, lower, upper });
        }

        let point = &mut self.points[q];
        point.x = x;
        point.y = y;
        Ok(())
    }

    fn violation(&self, q: usize, side: &str) -> ArmsError {
        ArmsError::EnvelopeViolation(format!(
            "log-density is not concave on the {side} of x = {}; enable Metropolis correction",
            self.points[q].x
        ))
    }

    fn no_gradient(&self, q: usize) -> ArmsError {
        ArmsError::EnvelopeViolation(format!(
            "no chord gradient on either side of x = {}",
            self.points[q].x
        ))
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "envelope: {} of {} points, ymax = {}, total = {:e}",
            self.len(),
            self.capacity,
            self.ymax,
            self.total()
        )?;
        writeln!(
            f,
            "{:>14} {:>14} {:>14} {:>14} {:>9}",
            "x", "y", "ey", "cum", "on_curve"
        )?;
        for p in self.points() {
            writeln!(
                f,
                "{:>14.6} {:>14.6} {:>14.6e} {:>14.6e} {:>9}",
                p.x, p.y, p.ey, p.cum, p.on_curve
            )?;
        }
        if let Some(prev) = self.chain {
            writeln!(f, "previous iterate: x = {}, y = {}", prev.x, prev.y)?;
        }
        Ok(())
    }
}
