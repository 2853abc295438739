//! A small HMC demo: Bayesian logistic regression on simulated data.

use mini_hmc::hmc::{HmcConfig, HMC};
use mini_hmc::models::LogisticRegression;
use ndarray::{array, Array1, Array2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_OBS: usize = 500;
    const ITERATIONS: usize = 2000;
    const WARMUP: usize = 1000;
    const SEED: u64 = 42;

    // Intercept and two covariates.
    let true_beta = array![-0.5, 1.5, -2.0];
    let mut rng = SmallRng::seed_from_u64(SEED);
    let x = Array2::<f64>::from_shape_fn((N_OBS, 3), |(_, j)| {
        if j == 0 {
            1.0
        } else {
            rng.sample(StandardNormal)
        }
    });
    let eta = x.dot(&true_beta);
    let y: Array1<f64> = eta.mapv(|e| {
        let p = 1.0 / (1.0 + (-e).exp());
        if rng.gen::<f64>() < p {
            1.0
        } else {
            0.0
        }
    });

    let model = LogisticRegression::new(y.view(), x.view())?.with_prior_scale(5.0)?;
    let config = HmcConfig::new(0.01, 20, WARMUP);
    let mut sampler = HMC::new(model, config)?.set_seed(SEED);

    let initial = Array1::zeros(3);
    let eps = sampler.find_reasonable_epsilon(&initial)?;
    println!("Starting step size: {eps:.4e}");

    let (draws, stats) = sampler.run_progress(&initial, ITERATIONS, WARMUP)?;
    println!("Generated {} draws of {} parameters", draws.nrows(), draws.ncols());
    println!("{stats}");
    for (j, (m, t)) in stats.mean.iter().zip(true_beta.iter()).enumerate() {
        println!("beta[{j}]: posterior mean {m:.3} (true {t:.3})");
    }

    Ok(())
}
