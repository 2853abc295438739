//! Nesterov dual-averaging step-size adaptation (Hoffman & Gelman, 2014, Algorithm 5).
//!
//! [`DualAverage`] holds all adaptation bookkeeping of one sampler as an explicit value,
//! so the Cold → Adapting → Tuned state machine can be driven and inspected without a
//! model or a sampler around it.

use crate::error::{HmcError, Result};

/// Smallest step size the adaptation and the step-size search will produce.
pub const MIN_STEP_SIZE: f64 = 1e-10;
/// Largest step size the adaptation and the step-size search will produce.
pub const MAX_STEP_SIZE: f64 = 1e7;

/// Tuning constants of the dual-averaging scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualAverageSettings {
    /// Shrinkage towards `mu`.
    pub gamma: f64,
    /// Stabilizes the early iterations.
    pub t_0: f64,
    /// Decay exponent of the averaging weight, in `(0.5, 1]`.
    pub kappa: f64,
    /// Target mean acceptance probability.
    pub delta: f64,
}

impl Default for DualAverageSettings {
    fn default() -> DualAverageSettings {
        DualAverageSettings {
            gamma: 0.05,
            t_0: 10.,
            kappa: 0.75,
            delta: 0.7,
        }
    }
}

impl DualAverageSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(HmcError::InvalidSetting {
                name: "gamma",
                value: self.gamma,
                reason: "must be finite and positive",
            });
        }
        if !(self.t_0.is_finite() && self.t_0 >= 0.0) {
            return Err(HmcError::InvalidSetting {
                name: "t_0",
                value: self.t_0,
                reason: "must be finite and non-negative",
            });
        }
        if !(self.kappa > 0.5 && self.kappa <= 1.0) {
            return Err(HmcError::InvalidSetting {
                name: "kappa",
                value: self.kappa,
                reason: "must lie in (0.5, 1]",
            });
        }
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(HmcError::InvalidSetting {
                name: "delta",
                value: self.delta,
                reason: "must lie in (0, 1)",
            });
        }
        Ok(())
    }
}

/// Where a sampler is in its adaptation schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdaptPhase {
    /// No dual-averaging iteration has run yet.
    Cold,
    /// `0 < num_iter <= num_adapt`: the step size is updated after every iteration.
    Adapting,
    /// `num_iter > num_adapt`: the step size is frozen at `epsilon_bar`.
    Tuned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DualAverage {
    settings: DualAverageSettings,
    num_adapt: usize,
    num_iter: usize,
    mu: f64,
    log_epsilon: f64,
    log_epsilon_bar: f64,
    h_bar: f64,
}

impl DualAverage {
    /// Starts a cold adaptation anchored at `mu = ln(10 * initial_epsilon)`.
    ///
    /// `epsilon_bar` starts at `initial_epsilon`, so with `num_adapt == 0` the sampler
    /// keeps the step size it was given. Hoffman & Gelman start it at 1 instead.
    pub fn new(settings: DualAverageSettings, initial_epsilon: f64, num_adapt: usize) -> Self {
        DualAverage {
            settings,
            num_adapt,
            num_iter: 0,
            mu: (10. * initial_epsilon).ln(),
            log_epsilon: initial_epsilon.ln(),
            log_epsilon_bar: initial_epsilon.ln(),
            h_bar: 0.,
        }
    }

    pub fn phase(&self) -> AdaptPhase {
        if self.num_iter == 0 {
            AdaptPhase::Cold
        } else if self.num_iter <= self.num_adapt {
            AdaptPhase::Adapting
        } else {
            AdaptPhase::Tuned
        }
    }

    /// Re-seeds the anchor after a step-size search. Has no effect once adaptation
    /// has started; returns whether the anchor was moved.
    pub fn reanchor(&mut self, epsilon: f64) -> bool {
        if self.phase() != AdaptPhase::Cold {
            return false;
        }
        self.mu = (10. * epsilon).ln();
        self.log_epsilon = epsilon.ln();
        self.log_epsilon_bar = epsilon.ln();
        true
    }

    /// Counts a new iteration and returns the phase it belongs to.
    pub fn begin_iteration(&mut self) -> AdaptPhase {
        self.num_iter += 1;
        self.phase()
    }

    /// Feeds the acceptance probability of the current iteration and returns the step
    /// size for the next one. Once tuned, the statistics are left untouched and
    /// `epsilon_bar` is returned.
    pub fn update(&mut self, accept_prob: f64) -> f64 {
        if self.phase() != AdaptPhase::Adapting {
            return self.epsilon_bar();
        }
        let m = self.num_iter as f64;
        let w = 1. / (m + self.settings.t_0);
        self.h_bar = (1. - w) * self.h_bar + w * (self.settings.delta - accept_prob);
        self.log_epsilon = (self.mu - m.sqrt() / self.settings.gamma * self.h_bar)
            .clamp(MIN_STEP_SIZE.ln(), MAX_STEP_SIZE.ln());
        let eta = m.powf(-self.settings.kappa);
        self.log_epsilon_bar = eta * self.log_epsilon + (1. - eta) * self.log_epsilon_bar;
        self.epsilon()
    }

    /// The un-averaged step size from the latest update.
    pub fn epsilon(&self) -> f64 {
        self.log_epsilon.exp()
    }

    pub fn epsilon_bar(&self) -> f64 {
        self.log_epsilon_bar.exp()
    }

    pub fn log_epsilon_bar(&self) -> f64 {
        self.log_epsilon_bar
    }

    pub fn h_bar(&self) -> f64 {
        self.h_bar
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn num_iter(&self) -> usize {
        self.num_iter
    }

    pub fn num_adapt(&self) -> usize {
        self.num_adapt
    }

    pub fn settings(&self) -> &DualAverageSettings {
        &self.settings
    }
}
