//! Integrator and sampler checks for every bundled model.

use approx::assert_abs_diff_eq;
use mini_hmc::distributions::LogDensityModel;
use mini_hmc::euclidean::hamiltonian;
use mini_hmc::hmc::{integrate, HmcConfig, HMC};
use mini_hmc::models::{ExpCopula, LogisticRegression, LogitNormal, PoissonOffsetScaled};
use ndarray::{array, Array1, Axis};

const MOMENTA: [[f64; 3]; 5] = [
    [1.0, -0.5, 0.3],
    [-0.2, 0.8, 1.1],
    [0.6, 0.6, -1.4],
    [-1.0, 0.1, 0.0],
    [0.3, -1.2, 0.7],
];

/// Builds a momentum of length `dim` from the fixed table.
fn momentum(k: usize, dim: usize) -> Array1<f64> {
    Array1::from_shape_fn(dim, |i| MOMENTA[k][i % 3] * (1.0 + 0.1 * (i / 3) as f64))
}

fn check_reversible<M: LogDensityModel>(model: &M, theta: &Array1<f64>) {
    for k in 0..MOMENTA.len() {
        let r0 = momentum(k, theta.len());
        let mut q = theta.clone();
        let mut r = r0.clone();
        integrate(model, &mut q, &mut r, 0.01, 20);
        r.mapv_inplace(|v| -v);
        integrate(model, &mut q, &mut r, 0.01, 20);
        r.mapv_inplace(|v| -v);
        assert_abs_diff_eq!(q, *theta, epsilon = 1e-8);
        assert_abs_diff_eq!(r, r0, epsilon = 1e-8);
    }
}

/// Sum of `|H1 - H0|` over the fixed momenta after ten steps of size `epsilon`.
fn total_energy_error<M: LogDensityModel>(model: &M, theta: &Array1<f64>, epsilon: f64) -> f64 {
    let h0_logp = model.log_density(theta.view());
    (0..MOMENTA.len())
        .map(|k| {
            let mut q = theta.clone();
            let mut r = momentum(k, theta.len());
            let h0 = hamiltonian(h0_logp, &r);
            integrate(model, &mut q, &mut r, epsilon, 10);
            (hamiltonian(model.log_density(q.view()), &r) - h0).abs()
        })
        .sum()
}

fn check_energy_error_shrinks<M: LogDensityModel>(model: &M, theta: &Array1<f64>) {
    let large = total_energy_error(model, theta, 0.02);
    let small = total_energy_error(model, theta, 0.005);
    assert!(large.is_finite());
    assert!(
        small <= 0.5 * large + 1e-10,
        "energy error did not shrink: {small} vs {large}"
    );
}

#[test]
fn test_logistic_regression_integrator() {
    let y = array![1.0, 0.0, 1.0, 0.0, 1.0];
    let x = array![
        [1.0, 0.5, -1.0],
        [1.0, -1.5, 0.2],
        [1.0, 2.0, 0.3],
        [1.0, 0.0, -0.8],
        [1.0, 1.2, 1.0]
    ];
    let model = LogisticRegression::new(y.view(), x.view()).unwrap();
    let theta = array![0.2, 0.9, -0.4];
    check_reversible(&model, &theta);
    check_energy_error_shrinks(&model, &theta);
}

#[test]
fn test_exp_copula_integrator() {
    let counts = array![10u64, 5, 2];
    let model = ExpCopula::new(counts.view(), 1.0).unwrap();
    let theta = array![0.5, -0.2, -1.0];
    check_reversible(&model, &theta);
    check_energy_error_shrinks(&model, &theta);
}

#[test]
fn test_logit_normal_integrator() {
    let counts = array![8u64, 3, 1, 2, 9];
    let i_vec = array![0usize, 0, 0, 1, 1];
    let j_vec = array![0usize, 1, 2, 0, 2];
    let model = LogitNormal::new(counts.view(), i_vec.view(), j_vec.view(), 0.7).unwrap();
    let theta = Array1::from_shape_fn(model.dim(), |i| 0.3 * (i as f64) - 1.0);
    check_reversible(&model, &theta);
    check_energy_error_shrinks(&model, &theta);
}

#[test]
fn test_poisson_offset_scaled_integrator() {
    let y = array![4.0, 0.0, 9.0];
    let mu = array![1.0, 0.0, 2.0];
    let sigma_inv = array![[1.5, 0.2, 0.0], [0.2, 1.0, 0.1], [0.0, 0.1, 2.0]];
    let scales = array![1.0, 2.0, 0.5];
    let model =
        PoissonOffsetScaled::new(y.view(), mu.view(), sigma_inv.view(), scales.view(), 0.2)
            .unwrap();
    let theta = array![1.1, -0.3, 2.5];
    check_reversible(&model, &theta);
    check_energy_error_shrinks(&model, &theta);
}

#[test]
fn test_exp_copula_posterior_mean() {
    // The simplex posterior is Dirichlet(1 + counts): mean (11, 6, 3) / 20.
    let counts = array![10u64, 5, 2];
    let model = ExpCopula::new(counts.view(), 1.0).unwrap();
    let mut sampler = HMC::new(&model, HmcConfig::new(0.1, 10, 1_000))
        .unwrap()
        .set_seed(42);
    let draws = sampler.run(&Array1::zeros(3), 4_000, 1_000).unwrap();

    let mut mean = Array1::<f64>::zeros(3);
    for row in draws.axis_iter(Axis(0)) {
        mean += &model.simplex(row);
    }
    mean /= draws.nrows() as f64;
    assert_abs_diff_eq!(mean, array![0.55, 0.3, 0.15], epsilon = 0.03);
}

#[test]
fn test_logit_normal_posterior_follows_counts() {
    let counts = array![80u64, 15, 5, 10, 10, 80];
    let i_vec = array![0usize, 0, 0, 1, 1, 1];
    let j_vec = array![0usize, 1, 2, 0, 1, 2];
    let model = LogitNormal::new(counts.view(), i_vec.view(), j_vec.view(), 1.0).unwrap();
    let mut sampler = HMC::new(&model, HmcConfig::new(0.05, 10, 1_000))
        .unwrap()
        .set_seed(42);
    let draws = sampler
        .run(&Array1::zeros(model.dim()), 2_000, 1_000)
        .unwrap();

    let mut probs = ndarray::Array2::<f64>::zeros((2, 3));
    for row in draws.axis_iter(Axis(0)) {
        probs += &model.row_probabilities(row);
    }
    probs /= draws.nrows() as f64;

    let empirical = array![[0.8, 0.15, 0.05], [0.1, 0.1, 0.8]];
    assert_abs_diff_eq!(probs, empirical, epsilon = 0.1);
    assert!(probs[[0, 0]] > probs[[0, 1]] && probs[[0, 1]] > probs[[0, 2]]);
    assert!(probs[[1, 2]] > probs[[1, 0]]);
}

#[test]
fn test_poisson_posterior_tracks_log_rates() {
    // With a weak prior the posterior of zeta_i is close to log(y_i / s_i) - phi.
    let y = array![100.0, 50.0];
    let mu = array![0.0, 0.0];
    let sigma_inv = array![[0.01, 0.0], [0.0, 0.01]];
    let scales = array![1.0, 2.0];
    let model =
        PoissonOffsetScaled::new(y.view(), mu.view(), sigma_inv.view(), scales.view(), 0.5)
            .unwrap();
    let mut sampler = HMC::new(&model, HmcConfig::new(0.01, 10, 1_000))
        .unwrap()
        .set_seed(42);
    let initial = array![3.0, 3.0];
    sampler.find_reasonable_epsilon(&initial).unwrap();
    let draws = sampler.run(&initial, 2_000, 1_000).unwrap();
    let mean = draws.mean_axis(Axis(0)).unwrap();
    let expected = array![100.0f64.ln() - 0.5, 25.0f64.ln() - 0.5];
    assert_abs_diff_eq!(mean, expected, epsilon = 0.06);
}
