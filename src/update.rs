//! Refinement of the envelope with newly evaluated points.

use log::{debug, trace};

use crate::distributions::LogDensity;
use crate::envelope::{Envelope, Point};
use crate::error::{ArmsError, Result};
use crate::numeric::XEPS;
use crate::sampler::{Candidate, Context};

impl Envelope {
    /**
    Incorporates an evaluated candidate into the envelope.

    Does nothing if the candidate is not on the curve or if the arena cannot
    take another pair of points. Otherwise the candidate and a new intersection
    point are spliced in between the candidate's neighbours, the affected
    intersections are recomputed and the envelope is re-integrated.

    The update is staged on a copy: if any recomputed intersection reports an
    [`ArmsError::EnvelopeViolation`], the envelope is left exactly as it was.
    */
    pub(crate) fn insert<D: LogDensity>(
        &mut self,
        candidate: &Candidate,
        ctx: &mut Context<D>,
    ) -> Result<()> {
        if !candidate.on_curve {
            return Ok(());
        }
        if self.is_full() {
            if !self.saturated {
                debug!(
                    "Envelope reached its capacity of {} points; refinement stops",
                    self.capacity
                );
                self.saturated = true;
            }
            return Ok(());
        }

        let mut staged = self.clone();
        staged.splice(candidate, ctx)?;
        *self = staged;
        Ok(())
    }

    fn splice<D: LogDensity>(&mut self, candidate: &Candidate, ctx: &mut Context<D>) -> Result<()> {
        let (l, r) = (candidate.left, candidate.right);
        let q = self.points.len();
        let m = q + 1;

        let mut meet = Point::default();
        let (q_left, q_right) = match (self.points[l].on_curve, self.points[r].on_curve) {
            (true, false) => {
                // new intersection goes between the left neighbour and the point
                meet.left = Some(l);
                meet.right = Some(q);
                self.points[l].right = Some(m);
                self.points[r].left = Some(q);
                (m, r)
            }
            (false, true) => {
                meet.left = Some(q);
                meet.right = Some(r);
                self.points[r].left = Some(m);
                self.points[l].right = Some(q);
                (l, m)
            }
            _ => {
                return Err(ArmsError::EnvelopeViolation(format!(
                    "candidate at x = {} is not between an on-curve point and an intersection",
                    candidate.x
                )))
            }
        };
        self.points.push(Point {
            x: candidate.x,
            y: candidate.y,
            on_curve: true,
            left: Some(q_left),
            right: Some(q_right),
            ..Point::default()
        });
        self.points.push(meet);

        // keep the new point away from the ends of its on-curve interval
        let ql = self.points[q_left].left.unwrap_or(q_left);
        let qr = self.points[q_right].right.unwrap_or(q_right);
        let (xl, xr) = (self.points[ql].x, self.points[qr].x);
        let near_left = (1.0 - XEPS) * xl + XEPS * xr;
        let near_right = XEPS * xl + (1.0 - XEPS) * xr;
        let x = self.points[q].x;
        if x < near_left {
            self.points[q].x = near_left;
            self.points[q].y = ctx.evaluate(near_left);
        } else if x > near_right {
            self.points[q].x = near_right;
            self.points[q].y = ctx.evaluate(near_right);
        }

        self.chord_intersect(q_left)?;
        self.chord_intersect(q_right)?;
        if let Some(i) = self.points[q_left]
            .left
            .and_then(|i| self.points[i].left)
        {
            self.chord_intersect(i)?;
        }
        if let Some(i) = self.points[q_right]
            .right
            .and_then(|i| self.points[i].right)
        {
            self.chord_intersect(i)?;
        }

        self.cumulate();
        trace!(
            "Added envelope point at x = {}, now {} points",
            self.points[q].x,
            self.points.len()
        );
        Ok(())
    }
}
