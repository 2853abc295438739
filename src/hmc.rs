//! A single-chain Hamiltonian (Hybrid) Monte Carlo sampler with dual-averaging step-size
//! adaptation.
//!
//! The sampler works with any target implementing [`LogDensityModel`]: the model supplies
//! its log density and the exact gradient, the sampler supplies the leapfrog integrator,
//! the Metropolis accept/reject step, a heuristic for a starting step size and the
//! Nesterov dual-averaging scheme that tunes the step size during warm-up.
//!
//! # Example
//!
//! ```rust
//! use mini_hmc::distributions::IsotropicGaussian;
//! use mini_hmc::hmc::{HmcConfig, HMC};
//! use ndarray::array;
//!
//! let target = IsotropicGaussian::new(2, 1.0).unwrap();
//! let mut sampler = HMC::new(target, HmcConfig::new(0.1, 10, 100))
//!     .unwrap()
//!     .set_seed(42);
//!
//! let mut theta = array![3.0, -3.0];
//! for _ in 0..200 {
//!     theta = sampler.adapt_step(&theta).unwrap();
//! }
//! assert!(sampler.epsilon_bar() > 0.0);
//! ```

use crate::distributions::LogDensityModel;
use crate::error::{HmcError, Result};
use crate::euclidean::{add_scaled_assign, all_finite, hamiltonian, standard_normal};
use crate::stats::{AcceptanceTracker, RunStats};
use crate::stepsize::{
    AdaptPhase, DualAverage, DualAverageSettings, MAX_STEP_SIZE, MIN_STEP_SIZE,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, trace, warn};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::LN_2;

/// Tuning configuration of an [`HMC`] sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmcConfig {
    /// Initial leapfrog step size.
    pub epsilon: f64,
    /// Leapfrog steps per iteration.
    pub num_leapfrog: usize,
    /// Warm-up iterations during which the step size is adapted.
    pub num_adapt: usize,
    pub dual_averaging: DualAverageSettings,
}

impl Default for HmcConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            num_leapfrog: 10,
            num_adapt: 1000,
            dual_averaging: DualAverageSettings::default(),
        }
    }
}

impl HmcConfig {
    pub fn new(epsilon: f64, num_leapfrog: usize, num_adapt: usize) -> Self {
        Self {
            epsilon,
            num_leapfrog,
            num_adapt,
            dual_averaging: DualAverageSettings::default(),
        }
    }

    pub fn with_dual_averaging(mut self, settings: DualAverageSettings) -> Self {
        self.dual_averaging = settings;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(HmcError::InvalidStepSize(self.epsilon));
        }
        if self.num_leapfrog < 1 {
            return Err(HmcError::InvalidLeapfrogSteps(self.num_leapfrog));
        }
        self.dual_averaging.validate()
    }
}

/// Outcome of one HMC iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The next state of the chain: the proposal if accepted, otherwise a copy of the input.
    pub position: Array1<f64>,
    /// Metropolis acceptance probability `min(1, exp(H0 - H1))`, always in `[0, 1]`.
    pub accept_prob: f64,
    pub accepted: bool,
    /// `H1 - H0`; may be non-finite for a divergent trajectory.
    pub energy_error: f64,
}

/// Metropolis acceptance probability for a move from energy `h0` to energy `h1`.
///
/// A non-finite proposal energy or a NaN difference yields 0.
pub fn accept_prob(h0: f64, h1: f64) -> f64 {
    let log_alpha = h0 - h1;
    if !h1.is_finite() || log_alpha.is_nan() {
        return 0.0;
    }
    log_alpha.min(0.0).exp()
}

/// Runs `n_steps` leapfrog steps of size `epsilon` in place.
///
/// Each step is a half-step on the momentum, a full step on the position and another
/// half-step on the momentum with the gradient at the new position. The gradient at the
/// end of one step is reused at the start of the next.
pub fn integrate<M>(
    model: &M,
    theta: &mut Array1<f64>,
    r: &mut Array1<f64>,
    epsilon: f64,
    n_steps: usize,
) where
    M: LogDensityModel + ?Sized,
{
    let grad = model.gradient(theta.view());
    integrate_from(model, theta, r, epsilon, n_steps, grad)
}

/// Leapfrog integration starting from an already evaluated gradient at `theta`.
fn integrate_from<M>(
    model: &M,
    theta: &mut Array1<f64>,
    r: &mut Array1<f64>,
    epsilon: f64,
    n_steps: usize,
    mut grad: Array1<f64>,
) where
    M: LogDensityModel + ?Sized,
{
    let half = 0.5 * epsilon;
    for _ in 0..n_steps {
        add_scaled_assign(r, &grad, half);
        add_scaled_assign(theta, &*r, epsilon);
        grad = model.gradient(theta.view());
        add_scaled_assign(r, &grad, half);
    }
}

/// Evaluates the gradient at `theta` and checks that it has one entry per parameter.
fn checked_gradient<M>(model: &M, theta: ArrayView1<f64>) -> Result<Array1<f64>>
where
    M: LogDensityModel + ?Sized,
{
    let grad = model.gradient(theta);
    if grad.len() != theta.len() {
        return Err(HmcError::ShapeMismatch {
            what: "gradient",
            expected: theta.len(),
            found: grad.len(),
        });
    }
    Ok(grad)
}

/// A single leapfrog step.
pub fn leapfrog<M>(model: &M, theta: &mut Array1<f64>, r: &mut Array1<f64>, epsilon: f64)
where
    M: LogDensityModel + ?Sized,
{
    integrate(model, theta, r, epsilon, 1)
}

/// Searches for a step size whose one-step acceptance probability is close to 0.5.
///
/// Starting from `initial`, the step size is doubled while one leapfrog step keeps an
/// acceptance probability above 0.5, or halved while it stays below, and the first step
/// size past the crossing is returned. The search gives up at `1e-10` / `1e7`.
pub fn find_reasonable_epsilon<M>(
    model: &M,
    theta: ArrayView1<f64>,
    momentum: ArrayView1<f64>,
    initial: f64,
) -> Result<f64>
where
    M: LogDensityModel + ?Sized,
{
    if !(initial.is_finite() && initial > 0.0) {
        return Err(HmcError::InvalidStepSize(initial));
    }
    if theta.len() != model.dim() {
        return Err(HmcError::DimensionMismatch {
            expected: model.dim(),
            found: theta.len(),
        });
    }
    if momentum.len() != theta.len() {
        return Err(HmcError::ShapeMismatch {
            what: "momentum",
            expected: theta.len(),
            found: momentum.len(),
        });
    }
    let logp0 = model.log_density(theta);
    if !logp0.is_finite() {
        return Err(HmcError::NonFiniteLogDensity { value: logp0 });
    }
    let grad0 = checked_gradient(model, theta)?;
    let h0 = hamiltonian(logp0, &momentum);

    let log_accept = |epsilon: f64| -> f64 {
        let mut q = theta.to_owned();
        let mut r = momentum.to_owned();
        integrate_from(model, &mut q, &mut r, epsilon, 1, grad0.clone());
        let logp = if all_finite(&q) {
            model.log_density(q.view())
        } else {
            f64::NAN
        };
        accept_prob(h0, hamiltonian(logp, &r)).ln()
    };

    let mut epsilon = initial;
    let mut log_alpha = log_accept(epsilon);
    let a: f64 = if log_alpha > 0.5f64.ln() { 1.0 } else { -1.0 };

    while a * log_alpha > -a * LN_2 {
        let next = epsilon * 2f64.powf(a);
        if !(MIN_STEP_SIZE..=MAX_STEP_SIZE).contains(&next) {
            warn!(
                "Step size search stopped at the bound: epsilon={:.3e}, p(accept)={:.3}",
                epsilon,
                log_alpha.exp()
            );
            break;
        }
        epsilon = next;
        log_alpha = log_accept(epsilon);
        debug!(
            "Step size search: epsilon={:.3e}, p(accept)={:.3}",
            epsilon,
            log_alpha.exp()
        );
    }
    Ok(epsilon)
}

/// A Hamiltonian Monte Carlo sampler for one chain.
///
/// The sampler owns the model, its random stream and all step-size state. The chain's
/// position is owned by the caller: every iteration borrows the current position and
/// returns the next one.
///
/// # Type Parameters
///
/// * `M`: The target implementing [`LogDensityModel`]. A reference `&M` also works.
#[derive(Debug, Clone)]
pub struct HMC<M> {
    model: M,
    /// The active leapfrog step size.
    step_size: f64,
    n_leapfrog: usize,
    adaptation: DualAverage,
    rng: SmallRng,
}

impl<M: LogDensityModel> HMC<M> {
    /// Creates a sampler after validating `config` and the model's dimension.
    pub fn new(model: M, config: HmcConfig) -> Result<Self> {
        config.validate()?;
        if model.dim() == 0 {
            return Err(HmcError::EmptyParameters);
        }
        Ok(Self {
            model,
            step_size: config.epsilon,
            n_leapfrog: config.num_leapfrog,
            adaptation: DualAverage::new(
                config.dual_averaging,
                config.epsilon,
                config.num_adapt,
            ),
            rng: SmallRng::from_entropy(),
        })
    }

    /// Sets a new random seed.
    ///
    /// This method ensures reproducibility across runs.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The step size the next plain iteration will use.
    pub fn epsilon(&self) -> f64 {
        self.step_size
    }

    /// The averaged step size; frozen once the sampler is tuned.
    pub fn epsilon_bar(&self) -> f64 {
        self.adaptation.epsilon_bar()
    }

    /// Number of dual-averaging iterations performed so far.
    pub fn num_iter(&self) -> usize {
        self.adaptation.num_iter()
    }

    pub fn num_leapfrog(&self) -> usize {
        self.n_leapfrog
    }

    pub fn phase(&self) -> AdaptPhase {
        self.adaptation.phase()
    }

    pub fn adaptation(&self) -> &DualAverage {
        &self.adaptation
    }

    /// Picks a starting step size with [`find_reasonable_epsilon`], using the current step
    /// size as the initial guess and a fresh momentum draw.
    ///
    /// The result becomes the active step size. If no dual-averaging iteration has run
    /// yet, the adaptation is re-anchored at the new step size. `num_iter` is unchanged.
    pub fn find_reasonable_epsilon(&mut self, theta: &Array1<f64>) -> Result<f64> {
        let momentum: Array1<f64> = standard_normal(theta.len(), &mut self.rng);
        let epsilon =
            find_reasonable_epsilon(&self.model, theta.view(), momentum.view(), self.step_size)?;
        self.step_size = epsilon;
        if self.adaptation.reanchor(epsilon) {
            debug!("Re-anchored dual averaging at epsilon={:.3e}", epsilon);
        }
        Ok(epsilon)
    }

    /// One HMC iteration with the current step size. No adaptation, no counters.
    pub fn transition(&mut self, theta: &Array1<f64>) -> Result<Transition> {
        let (logp, grad) = self.check_position(theta.view())?;
        let epsilon = self.step_size;
        Ok(self.propose(theta, logp, grad, epsilon))
    }

    /// Like [`HMC::transition`] but returns only the next position.
    pub fn step(&mut self, theta: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.transition(theta)?.position)
    }

    /// One HMC iteration with dual-averaging step-size adaptation.
    ///
    /// Increments `num_iter`. While `num_iter <= num_adapt` the acceptance probability of
    /// this iteration updates the adaptation statistics and the next step size; afterwards
    /// the step size stays frozen at `epsilon_bar`.
    pub fn adapt_transition(&mut self, theta: &Array1<f64>) -> Result<Transition> {
        let (logp, grad) = self.check_position(theta.view())?;
        let phase = self.adaptation.begin_iteration();
        if phase == AdaptPhase::Tuned {
            if self.adaptation.num_iter() == self.adaptation.num_adapt() + 1 {
                info!(
                    "Step size adaptation finished after {} iterations: epsilon_bar={:.4e}",
                    self.adaptation.num_adapt(),
                    self.adaptation.epsilon_bar()
                );
            }
            self.step_size = self.adaptation.epsilon_bar();
        }
        let epsilon = self.step_size;
        let transition = self.propose(theta, logp, grad, epsilon);
        if phase == AdaptPhase::Adapting {
            self.step_size = self.adaptation.update(transition.accept_prob);
        }
        Ok(transition)
    }

    /// Like [`HMC::adapt_transition`] but returns only the next position.
    pub fn adapt_step(&mut self, theta: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.adapt_transition(theta)?.position)
    }

    /// Run the sampler for `n_collect` + `n_discard` dual-averaging iterations.
    ///
    /// First, the sampler takes `n_discard` warm-up steps, then takes `n_collect` further
    /// steps and collects those draws in an array of shape `[n_collect, dim]`.
    pub fn run(
        &mut self,
        initial: &Array1<f64>,
        n_collect: usize,
        n_discard: usize,
    ) -> Result<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((n_collect, self.model.dim()));
        let mut theta = initial.clone();
        for _ in 0..n_discard {
            theta = self.adapt_step(&theta)?;
        }
        for i in 0..n_collect {
            theta = self.adapt_step(&theta)?;
            out.row_mut(i).assign(&theta);
        }
        Ok(out)
    }

    /// Like [`HMC::run`], but displays a progress bar with the acceptance probability over
    /// a sliding window of 100 iterations and the current step size, and returns summary
    /// statistics of the collected draws.
    pub fn run_progress(
        &mut self,
        initial: &Array1<f64>,
        n_collect: usize,
        n_discard: usize,
    ) -> Result<(Array2<f64>, RunStats)> {
        let mut out = Array2::<f64>::zeros((n_collect, self.model.dim()));
        let mut theta = initial.clone();

        let pb = ProgressBar::new((n_discard + n_collect) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:8} {bar:40.cyan/blue} {pos}/{len} ({eta}) | {msg}")
                .expect("progress bar template is valid")
                .progress_chars("=>-"),
        );
        pb.set_prefix("HMC");

        let mut warmup = AcceptanceTracker::default();
        for _ in 0..n_discard {
            let t = self.adapt_transition(&theta)?;
            warmup.step(t.accept_prob, t.accepted);
            theta = t.position;
            pb.set_message(format!(
                "warm-up p(accept)≈{:.2} ε≈{:.3e}",
                warmup.window_mean(),
                self.step_size
            ));
            pb.inc(1);
        }

        let mut tracker = AcceptanceTracker::default();
        for i in 0..n_collect {
            let t = self.adapt_transition(&theta)?;
            tracker.step(t.accept_prob, t.accepted);
            theta = t.position;
            out.row_mut(i).assign(&theta);
            pb.set_message(format!(
                "p(accept)≈{:.2} ε≈{:.3e}",
                tracker.window_mean(),
                self.step_size
            ));
            pb.inc(1);
        }
        pb.finish_with_message("Done!");

        let stats = RunStats::new(out.view(), &tracker, self.epsilon_bar());
        info!("HMC run finished: {}", stats);
        Ok((out, stats))
    }

    /// Validates the current position and returns its log density and gradient.
    fn check_position(&self, theta: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
        if theta.len() != self.model.dim() {
            return Err(HmcError::DimensionMismatch {
                expected: self.model.dim(),
                found: theta.len(),
            });
        }
        let logp = self.model.log_density(theta);
        if !logp.is_finite() {
            return Err(HmcError::NonFiniteLogDensity { value: logp });
        }
        let grad = checked_gradient(&self.model, theta)?;
        Ok((logp, grad))
    }

    /// Samples a momentum, integrates and runs the accept/reject step.
    fn propose(
        &mut self,
        theta: &Array1<f64>,
        logp_current: f64,
        grad: Array1<f64>,
        epsilon: f64,
    ) -> Transition {
        let momentum: Array1<f64> = standard_normal(theta.len(), &mut self.rng);
        let h_current = hamiltonian(logp_current, &momentum);

        let mut proposed = theta.clone();
        let mut r = momentum;
        integrate_from(&self.model, &mut proposed, &mut r, epsilon, self.n_leapfrog, grad);

        let logp_proposed = if all_finite(&proposed) {
            self.model.log_density(proposed.view())
        } else {
            f64::NAN
        };
        let h_proposed = hamiltonian(logp_proposed, &r);
        if !h_proposed.is_finite() {
            warn!(
                "Non-finite Hamiltonian after {} leapfrog steps with epsilon={:.3e}; rejecting",
                self.n_leapfrog, epsilon
            );
        }

        let accept_prob = accept_prob(h_current, h_proposed);
        let u: f64 = self.rng.gen();
        let accepted = u < accept_prob;
        trace!(
            "epsilon={:.3e} H0={:.4} H1={:.4} p(accept)={:.3} accepted={}",
            epsilon,
            h_current,
            h_proposed,
            accept_prob,
            accepted
        );

        Transition {
            position: if accepted { proposed } else { theta.clone() },
            accept_prob,
            accepted,
            energy_error: h_proposed - h_current,
        }
    }
}
