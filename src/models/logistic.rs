use super::{sigmoid, softplus};
use crate::distributions::LogDensityModel;
use crate::error::{HmcError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Bayesian logistic regression with binary responses `y` (length N) and a design
/// matrix `x` (N × D). Parameters are the D regression coefficients.
///
/// By default the coefficients carry an independent `N(0, 1)` prior; without a prior
/// the posterior is improper on linearly separable data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticRegression<'a> {
    y: ArrayView1<'a, f64>,
    x: ArrayView2<'a, f64>,
    prior_scale: Option<f64>,
}

impl<'a> LogisticRegression<'a> {
    pub const DEFAULT_PRIOR_SCALE: f64 = 1.0;

    pub fn new(y: ArrayView1<'a, f64>, x: ArrayView2<'a, f64>) -> Result<Self> {
        if x.ncols() == 0 {
            return Err(HmcError::EmptyParameters);
        }
        if x.nrows() != y.len() {
            return Err(HmcError::ShapeMismatch {
                what: "responses vs design matrix rows",
                expected: x.nrows(),
                found: y.len(),
            });
        }
        if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(HmcError::InvalidData(format!(
                "responses must be 0 or 1, got {bad}"
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(HmcError::InvalidData(
                "design matrix contains non-finite entries".to_string(),
            ));
        }
        Ok(Self {
            y,
            x,
            prior_scale: Some(Self::DEFAULT_PRIOR_SCALE),
        })
    }

    /// Uses an independent `N(0, scale^2)` prior on every coefficient.
    pub fn with_prior_scale(mut self, scale: f64) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(HmcError::InvalidData(format!(
                "prior scale must be finite and positive, got {scale}"
            )));
        }
        self.prior_scale = Some(scale);
        Ok(self)
    }

    /// Drops the prior, leaving the bare likelihood.
    pub fn likelihood_only(mut self) -> Self {
        self.prior_scale = None;
        self
    }

    pub fn prior_scale(&self) -> Option<f64> {
        self.prior_scale
    }

    pub fn n_obs(&self) -> usize {
        self.y.len()
    }
}

impl LogDensityModel for LogisticRegression<'_> {
    fn dim(&self) -> usize {
        self.x.ncols()
    }

    fn log_density(&self, params: ArrayView1<f64>) -> f64 {
        let eta = self.x.dot(&params);
        let mut lp: f64 = self
            .y
            .iter()
            .zip(eta.iter())
            .map(|(&y, &e)| y * e - softplus(e))
            .sum();
        if let Some(s) = self.prior_scale {
            lp -= 0.5 * params.dot(&params) / (s * s);
        }
        lp
    }

    fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64> {
        let eta = self.x.dot(&params);
        let resid: Array1<f64> = self
            .y
            .iter()
            .zip(eta.iter())
            .map(|(&y, &e)| y - sigmoid(e))
            .collect();
        let mut grad = self.x.t().dot(&resid);
        if let Some(s) = self.prior_scale {
            grad.scaled_add(-1.0 / (s * s), &params);
        }
        grad
    }
}
