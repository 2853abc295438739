//! Running acceptance statistics and run summaries.

use ndarray::prelude::*;
use std::collections::VecDeque;
use std::fmt;

const DEFAULT_WINDOW: usize = 100;

/// Tracks acceptance over a whole run and over a sliding window of recent iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceTracker {
    n: u64,
    n_accepted: u64,
    sum_accept_prob: f64,
    window_size: usize,
    window: VecDeque<f64>,
    window_sum: f64,
}

impl Default for AcceptanceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl AcceptanceTracker {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            n: 0,
            n_accepted: 0,
            sum_accept_prob: 0.0,
            window_size,
            window: VecDeque::with_capacity(window_size),
            window_sum: 0.0,
        }
    }

    pub fn step(&mut self, accept_prob: f64, accepted: bool) {
        self.n += 1;
        self.n_accepted += accepted as u64;
        self.sum_accept_prob += accept_prob;

        self.window.push_back(accept_prob);
        self.window_sum += accept_prob;
        if self.window.len() > self.window_size {
            if let Some(removed) = self.window.pop_front() {
                self.window_sum -= removed;
            }
        }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    /// Mean Metropolis acceptance probability over all iterations; 0 before the first.
    pub fn mean_accept_prob(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.sum_accept_prob / self.n as f64
    }

    /// Fraction of iterations whose proposal was accepted.
    pub fn accept_rate(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.n_accepted as f64 / self.n as f64
    }

    /// Mean acceptance probability over the last `window_size` iterations.
    pub fn window_mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window_sum / self.window.len() as f64
    }
}

/// Summary of a collected run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub n_draws: usize,
    pub mean_accept_prob: f64,
    pub accept_rate: f64,
    pub epsilon_bar: f64,
    pub mean: Array1<f64>, // n_params
    pub std: Array1<f64>,  // n_params
}

impl RunStats {
    /// Computes per-parameter means and standard deviations of `draws`
    /// (shape `[n_draws, n_params]`).
    pub fn new(draws: ArrayView2<f64>, tracker: &AcceptanceTracker, epsilon_bar: f64) -> Self {
        let n_params = draws.ncols();
        let mean = draws
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_params));
        let std = if draws.nrows() > 1 {
            draws.std_axis(Axis(0), 1.0)
        } else {
            Array1::zeros(n_params)
        };
        Self {
            n_draws: draws.nrows(),
            mean_accept_prob: tracker.mean_accept_prob(),
            accept_rate: tracker.accept_rate(),
            epsilon_bar,
            mean,
            std,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} draws, mean p(accept)={:.3}, accept rate={:.3}, epsilon_bar={:.4e}",
            self.n_draws, self.mean_accept_prob, self.accept_rate, self.epsilon_bar
        )?;
        for (i, (m, s)) in self.mean.iter().zip(self.std.iter()).enumerate() {
            write!(f, "\n  theta[{i}]: mean={m:.4}, std={s:.4}")?;
        }
        Ok(())
    }
}
