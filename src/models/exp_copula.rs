use super::{log_sigmoid, log_softplus, logsumexp, sigmoid, softplus};
use crate::distributions::LogDensityModel;
use crate::error::{HmcError, Result};
use ndarray::{Array1, ArrayView1};

/// A multinomial model over K categories whose probability simplex is parameterized
/// through positive weights.
///
/// Each of the K unconstrained parameters `zeta_k` maps to a weight
/// `Z_k = softplus(zeta_k / sigma)`, and the category probabilities are
/// `s_k = Z_k / sum(Z)`. The parameters carry a logistic(0, sigma) prior, under which
/// the weights are iid Exp(1) and `s` is uniform on the simplex; the posterior of `s`
/// given counts `c` is Dirichlet(1 + c).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpCopula<'a> {
    counts: ArrayView1<'a, u64>,
    sigma: f64,
    n_total: f64,
}

impl<'a> ExpCopula<'a> {
    pub fn new(counts: ArrayView1<'a, u64>, sigma: f64) -> Result<Self> {
        if counts.is_empty() {
            return Err(HmcError::EmptyParameters);
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(HmcError::InvalidData(format!(
                "sigma must be finite and positive, got {sigma}"
            )));
        }
        let n_total = counts.iter().map(|&c| c as f64).sum();
        Ok(Self {
            counts,
            sigma,
            n_total,
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Total count `N = sum(c)`.
    pub fn n_total(&self) -> f64 {
        self.n_total
    }

    /// The positive weights `Z_k = softplus(zeta_k / sigma)`.
    pub fn z(&self, zeta: ArrayView1<f64>) -> Array1<f64> {
        zeta.mapv(|v| softplus(v / self.sigma))
    }

    /// Derivatives `dZ_k / dzeta_k = sigmoid(zeta_k / sigma) / sigma`.
    pub fn z_dot(&self, zeta: ArrayView1<f64>) -> Array1<f64> {
        zeta.mapv(|v| sigmoid(v / self.sigma) / self.sigma)
    }

    /// Category probabilities `s = Z / sum(Z)`.
    pub fn simplex(&self, zeta: ArrayView1<f64>) -> Array1<f64> {
        let log_z = zeta.mapv(|v| log_softplus(v / self.sigma));
        let lse = logsumexp(log_z.iter().copied());
        log_z.mapv(|l| (l - lse).exp())
    }
}

impl LogDensityModel for ExpCopula<'_> {
    fn dim(&self) -> usize {
        self.counts.len()
    }

    fn log_density(&self, params: ArrayView1<f64>) -> f64 {
        let t = params.mapv(|v| v / self.sigma);
        let log_z = t.mapv(log_softplus);
        let prior: f64 = t.iter().map(|&t| -t - 2.0 * softplus(-t)).sum();
        let data: f64 = self
            .counts
            .iter()
            .zip(log_z.iter())
            .map(|(&c, &l)| c as f64 * l)
            .sum();
        prior + data - self.n_total * logsumexp(log_z.iter().copied())
    }

    fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64> {
        let inv_sigma = 1.0 / self.sigma;
        let t = params.mapv(|v| v * inv_sigma);
        let log_z = t.mapv(log_softplus);
        let lse = logsumexp(log_z.iter().copied());
        let mut grad = Array1::zeros(t.len());
        for (k, g) in grad.iter_mut().enumerate() {
            let log_sig = log_sigmoid(t[k]);
            let prior = (1.0 - 2.0 * sigmoid(t[k])) * inv_sigma;
            let data = self.counts[k] as f64 * (log_sig - log_z[k]).exp() * inv_sigma;
            let norm = self.n_total * (log_sig - lse).exp() * inv_sigma;
            *g = prior + data - norm;
        }
        grad
    }
}
