//! Concrete statistical models implementing [`LogDensityModel`](crate::distributions::LogDensityModel).
//!
//! Each model validates its data once at construction and afterwards evaluates its
//! log density and gradient without failing. Data that does not need preprocessing is
//! borrowed as `ndarray` views, so the caller's arrays must outlive the model.

mod exp_copula;
mod logistic;
mod logit_normal;
mod poisson_offset;

pub use exp_copula::ExpCopula;
pub use logistic::LogisticRegression;
pub use logit_normal::LogitNormal;
pub use poisson_offset::PoissonOffsetScaled;

/// `ln(1 + exp(x))` without overflow.
pub(crate) fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// The logistic function `1 / (1 + exp(-x))`.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(sigmoid(x))`.
pub(crate) fn log_sigmoid(x: f64) -> f64 {
    -softplus(-x)
}

/// `ln(softplus(x))`, using `softplus(x) ≈ exp(x)` far in the left tail.
pub(crate) fn log_softplus(x: f64) -> f64 {
    if x < -30.0 {
        x
    } else {
        softplus(x).ln()
    }
}

/// `ln(sum(exp(x)))` over the values of `xs`; `-inf` for an empty input.
pub(crate) fn logsumexp<I>(xs: I) -> f64
where
    I: IntoIterator<Item = f64> + Clone,
{
    let max = xs.clone().into_iter().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = xs.into_iter().map(|x| (x - max).exp()).sum();
    max + sum.ln()
}
