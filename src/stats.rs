//! Running statistics over the draws of a sampling run.

use std::fmt;

use ndarray::prelude::*;

/// Streaming mean, variance and range of a sequence of draws.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawTracker {
    n: u64,
    mean: f64,
    mean_sq: f64,
    min: f64,
    max: f64,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub n_draws: u64,
    /// Log-density evaluations spent, including those made while building the envelope.
    pub n_evaluations: usize,
    /// Number of envelope points at the end of the run.
    pub envelope_points: usize,
    pub mean: f64,
    /// Unbiased sample variance.
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for DrawTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawTracker {
    pub fn new() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            mean_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn step(&mut self, x: f64) {
        self.n += 1;
        let n = self.n as f64;
        self.mean = (self.mean * (n - 1.0) + x) / n;
        self.mean_sq = (self.mean_sq * (n - 1.0) + x * x) / n;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased variance estimate; NaN with fewer than two draws.
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            return f64::NAN;
        }
        let n = self.n as f64;
        (self.mean_sq - self.mean * self.mean) * n / (n - 1.0)
    }

    pub fn stats(&self, n_evaluations: usize, envelope_points: usize) -> RunStats {
        RunStats {
            n_draws: self.n,
            n_evaluations,
            envelope_points,
            mean: self.mean,
            variance: self.variance(),
            min: self.min,
            max: self.max,
        }
    }
}

impl RunStats {
    /// Average number of log-density evaluations per draw.
    pub fn evaluations_per_draw(&self) -> f64 {
        self.n_evaluations as f64 / self.n_draws as f64
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draws={} evals/draw={:.3} points={} mean={:.4} var={:.4} range=[{:.4}, {:.4}]",
            self.n_draws,
            self.evaluations_per_draw(),
            self.envelope_points,
            self.mean,
            self.variance,
            self.min,
            self.max
        )
    }
}

/// Mean and unbiased variance of a sample vector.
pub fn mean_and_variance(sample: ArrayView1<f64>) -> Option<(f64, f64)> {
    let mean = sample.mean()?;
    if sample.len() < 2 {
        return None;
    }
    Some((mean, sample.var(1.0)))
}
