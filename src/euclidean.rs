//! Phase-space vector operations used by the Hamiltonian integrator.
//!
//! The sampler stores positions and momenta as one-dimensional `ndarray` arrays; the
//! helpers here work on any `ArrayBase` so views and owned arrays can be mixed.

use ndarray::{Array1, ArrayBase, Data, DataMut, Ix1, Zip};
use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// In-place fused multiply-add: `y += alpha * x`.
pub fn add_scaled_assign<T, S1, S2>(y: &mut ArrayBase<S1, Ix1>, x: &ArrayBase<S2, Ix1>, alpha: T)
where
    T: Float,
    S1: DataMut<Elem = T>,
    S2: Data<Elem = T>,
{
    assert_eq!(
        y.len(),
        x.len(),
        "add_scaled_assign called with mismatched lengths"
    );
    Zip::from(y).and(x).for_each(|a, &b| {
        *a = *a + b * alpha;
    });
}

/// Kinetic energy `0.5 * r.r` of a momentum under the identity mass matrix.
pub fn kinetic_energy<T, S>(momentum: &ArrayBase<S, Ix1>) -> T
where
    T: Float,
    S: Data<Elem = T>,
{
    let sq = momentum.iter().fold(T::zero(), |acc, &p| acc + p * p);
    sq * T::from(0.5).unwrap()
}

/// Hamiltonian `H = -log p(theta) + 0.5 * r.r`.
pub fn hamiltonian<T, S>(log_density: T, momentum: &ArrayBase<S, Ix1>) -> T
where
    T: Float,
    S: Data<Elem = T>,
{
    -log_density + kinetic_energy(momentum)
}

/// Draws a vector of `dim` independent standard normal variates.
pub fn standard_normal<T, R>(dim: usize, rng: &mut R) -> Array1<T>
where
    R: Rng + ?Sized,
    StandardNormal: Distribution<T>,
{
    Array1::from_iter((0..dim).map(|_| rng.sample(StandardNormal)))
}

/// Returns true if every entry is finite.
pub fn all_finite<T, S>(v: &ArrayBase<S, Ix1>) -> bool
where
    T: Float,
    S: Data<Elem = T>,
{
    v.iter().all(|x| x.is_finite())
}
