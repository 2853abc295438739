/*!
Defines the capability every target density has to provide to the HMC engine, along with
a simple isotropic Gaussian that is handy for testing and tuning.

A model supplies its unnormalized log-density and the exact gradient of that log-density.
The sampler never looks inside a model; anything implementing [`LogDensityModel`] can be
plugged into [`crate::hmc::HMC`].

# Examples

```rust
use mini_hmc::distributions::{IsotropicGaussian, LogDensityModel};
use ndarray::array;

let gauss = IsotropicGaussian::new(3, 2.0).unwrap();
let theta = array![1.0, 0.0, -1.0];
let logp = gauss.log_density(theta.view());
let grad = gauss.gradient(theta.view());
assert_eq!(grad.len(), 3);
println!("log density: {logp}, gradient: {grad}");
```
*/

use crate::error::{HmcError, Result};
use ndarray::{Array1, ArrayView1};

/// A target density that HMC can sample from.
///
/// `log_density` is the log of the (possibly unnormalized) target density, i.e. the
/// negative potential energy. `gradient` must return the exact gradient of
/// `log_density` at the same point and have the same length as the input.
/// Both methods are required: there is no sensible default.
pub trait LogDensityModel {
    /// Number of parameters the model expects.
    fn dim(&self) -> usize;

    /// Log of the unnormalized density at `params`.
    fn log_density(&self, params: ArrayView1<f64>) -> f64;

    /// Gradient of [`LogDensityModel::log_density`] at `params`.
    fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64>;
}

impl<M: LogDensityModel + ?Sized> LogDensityModel for &M {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn log_density(&self, params: ArrayView1<f64>) -> f64 {
        (**self).log_density(params)
    }

    fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64> {
        (**self).gradient(params)
    }
}

/**
An isotropic, zero-mean Gaussian with standard deviation `std` in `dim` dimensions.

# Examples

```rust
use mini_hmc::distributions::{IsotropicGaussian, LogDensityModel};
use ndarray::array;

let gauss = IsotropicGaussian::new(2, 1.0).unwrap();
assert_eq!(gauss.log_density(array![0.0, 0.0].view()), 0.0);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsotropicGaussian {
    pub dim: usize,
    pub std: f64,
}

impl IsotropicGaussian {
    /// Creates a new isotropic Gaussian; `std` must be finite and positive.
    pub fn new(dim: usize, std: f64) -> Result<Self> {
        if dim == 0 {
            return Err(HmcError::EmptyParameters);
        }
        if !(std.is_finite() && std > 0.0) {
            return Err(HmcError::InvalidData(format!(
                "standard deviation must be finite and positive, got {std}"
            )));
        }
        Ok(Self { dim, std })
    }
}

impl LogDensityModel for IsotropicGaussian {
    fn dim(&self) -> usize {
        self.dim
    }

    fn log_density(&self, params: ArrayView1<f64>) -> f64 {
        let sq = params.dot(&params);
        -0.5 * sq / (self.std * self.std)
    }

    fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64> {
        let prec = 1.0 / (self.std * self.std);
        params.mapv(|x| -x * prec)
    }
}
