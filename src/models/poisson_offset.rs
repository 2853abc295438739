use crate::distributions::LogDensityModel;
use crate::error::{HmcError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Poisson counts with a multivariate-normal latent log-rate, a shared offset and
/// known per-observation exposures.
///
/// `Y_i ~ Poisson(s_i * exp(phi + zeta_i))` with `zeta ~ N(mu, Sigma)`. The model is
/// given the precision matrix `Sigma_inv` directly; it does not have to be symmetric,
/// the quadratic form only uses its symmetric part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonOffsetScaled<'a> {
    y: ArrayView1<'a, f64>,
    mu: ArrayView1<'a, f64>,
    sigma_inv: ArrayView2<'a, f64>,
    scales: ArrayView1<'a, f64>,
    phi: f64,
}

impl<'a> PoissonOffsetScaled<'a> {
    pub fn new(
        y: ArrayView1<'a, f64>,
        mu: ArrayView1<'a, f64>,
        sigma_inv: ArrayView2<'a, f64>,
        scales: ArrayView1<'a, f64>,
        phi: f64,
    ) -> Result<Self> {
        let n = y.len();
        if n == 0 {
            return Err(HmcError::EmptyParameters);
        }
        if mu.len() != n {
            return Err(HmcError::ShapeMismatch {
                what: "prior mean vs observations",
                expected: n,
                found: mu.len(),
            });
        }
        if sigma_inv.nrows() != n {
            return Err(HmcError::ShapeMismatch {
                what: "precision matrix rows vs observations",
                expected: n,
                found: sigma_inv.nrows(),
            });
        }
        if sigma_inv.ncols() != n {
            return Err(HmcError::ShapeMismatch {
                what: "precision matrix columns vs observations",
                expected: n,
                found: sigma_inv.ncols(),
            });
        }
        if scales.len() != n {
            return Err(HmcError::ShapeMismatch {
                what: "scales vs observations",
                expected: n,
                found: scales.len(),
            });
        }
        if let Some(bad) = y.iter().find(|&&v| !(v.is_finite() && v >= 0.0)) {
            return Err(HmcError::InvalidData(format!(
                "counts must be finite and non-negative, got {bad}"
            )));
        }
        if let Some(bad) = scales.iter().find(|&&v| !(v.is_finite() && v > 0.0)) {
            return Err(HmcError::InvalidData(format!(
                "scales must be finite and positive, got {bad}"
            )));
        }
        if !phi.is_finite() || mu.iter().chain(sigma_inv.iter()).any(|v| !v.is_finite()) {
            return Err(HmcError::InvalidData(
                "offset, prior mean and precision matrix must be finite".to_string(),
            ));
        }
        Ok(Self {
            y,
            mu,
            sigma_inv,
            scales,
            phi,
        })
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Expected counts `s_i * exp(phi + zeta_i)`.
    pub fn rates(&self, zeta: ArrayView1<f64>) -> Array1<f64> {
        let mut rates = zeta.mapv(|z| (self.phi + z).exp());
        rates *= &self.scales;
        rates
    }
}

impl LogDensityModel for PoissonOffsetScaled<'_> {
    fn dim(&self) -> usize {
        self.y.len()
    }

    fn log_density(&self, params: ArrayView1<f64>) -> f64 {
        let d = &params - &self.mu;
        let quad = d.dot(&self.sigma_inv.dot(&d));
        let lik: f64 = self
            .y
            .iter()
            .zip(params.iter())
            .zip(self.scales.iter())
            .map(|((&y, &z), &s)| y * (self.phi + z + s.ln()) - s * (self.phi + z).exp())
            .sum();
        -0.5 * quad + lik
    }

    fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64> {
        let d = &params - &self.mu;
        let mut grad = self.sigma_inv.dot(&d) + self.sigma_inv.t().dot(&d);
        grad *= -0.5;
        grad += &self.y;
        grad -= &self.rates(params);
        grad
    }
}
