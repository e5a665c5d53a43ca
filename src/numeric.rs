//! Overflow-safe exponentiation helpers and the closed-form piece integral used
//! by the envelope.

use crate::envelope::Point;

/// Critical relative x-value difference.
pub const XEPS: f64 = 0.00001;
/// Critical y-value difference; also the floor for chord-crossing denominators.
pub const YEPS: f64 = 0.1;
/// Critical relative exp(y) difference.
pub const EYEPS: f64 = 0.001;
/// Maximum shifted exponent, keeps exp(y) away from overflow.
pub const YCEIL: f64 = 50.0;

/// Returns `exp(y - y0 + YCEIL)`, or zero when that would underflow.
///
/// # Examples
///
/// ```rust
/// use mini_arms::numeric::{exp_shift, YCEIL};
///
/// assert_eq!(exp_shift(3.0, 3.0), YCEIL.exp());
/// assert_eq!(exp_shift(-200.0, 0.0), 0.0);
/// ```
pub fn exp_shift(y: f64, y0: f64) -> f64 {
    if y - y0 > -2.0 * YCEIL {
        (y - y0 + YCEIL).exp()
    } else {
        0.0
    }
}

/// Inverse of [`exp_shift`].
pub fn log_shift(u: f64, y0: f64) -> f64 {
    u.ln() + y0 - YCEIL
}

/// Integral of the exponentiated envelope over `[left.x, right.x]`.
///
/// Pieces whose heights differ by less than [`YEPS`] are integrated with the
/// trapezoid rule, since the exponential formula cancels catastrophically there.
pub fn segment_integral(left: &Point, right: &Point) -> f64 {
    if left.x == right.x {
        return 0.0;
    }
    let dy = right.y - left.y;
    if dy.abs() < YEPS {
        0.5 * (right.ey + left.ey) * (right.x - left.x)
    } else {
        ((right.ey - left.ey) / dy) * (right.x - left.x)
    }
}
