//! Hamiltonian Monte Carlo with dual-averaging step-size adaptation.
//!
//! See [`hmc::HMC`] for the sampler, [`distributions::LogDensityModel`] for the interface a
//! target has to implement, and [`models`] for ready-made targets.

pub mod dev_tools;
pub mod distributions;
pub mod error;
pub mod euclidean;
pub mod hmc;
pub mod models;
pub mod stats;
pub mod stepsize;

pub use distributions::LogDensityModel;
pub use error::{HmcError, Result};
pub use hmc::{HmcConfig, Transition, HMC};
