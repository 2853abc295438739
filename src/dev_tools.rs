//! Helpers for validating hand-written gradients against finite differences.

use crate::distributions::LogDensityModel;
use ndarray::{Array1, ArrayView1};

/// Centered finite-difference approximation of the gradient of `model.log_density`.
pub fn numerical_gradient<M>(model: &M, params: ArrayView1<f64>, h: f64) -> Array1<f64>
where
    M: LogDensityModel + ?Sized,
{
    let mut probe = params.to_owned();
    let mut out = Array1::zeros(params.len());
    for i in 0..params.len() {
        let orig = probe[i];
        probe[i] = orig + h;
        let up = model.log_density(probe.view());
        probe[i] = orig - h;
        let down = model.log_density(probe.view());
        probe[i] = orig;
        out[i] = (up - down) / (2.0 * h);
    }
    out
}

/// Largest absolute difference between the analytic and the numerical gradient, scaled
/// by `max(1, |numerical|)` so large gradients are compared relatively.
pub fn max_gradient_error<M>(model: &M, params: ArrayView1<f64>, h: f64) -> f64
where
    M: LogDensityModel + ?Sized,
{
    let analytic = model.gradient(params);
    let numeric = numerical_gradient(model, params, h);
    analytic
        .iter()
        .zip(numeric.iter())
        .map(|(a, n)| (a - n).abs() / n.abs().max(1.0))
        .fold(0.0, f64::max)
}
