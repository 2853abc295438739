use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mini_hmc::distributions::IsotropicGaussian;
use mini_hmc::hmc::{integrate, HmcConfig, HMC};
use mini_hmc::models::LogisticRegression;
use ndarray::{Array1, Array2};

fn logistic_data(n: usize, d: usize) -> (Array1<f64>, Array2<f64>) {
    let x = Array2::from_shape_fn((n, d), |(i, j)| ((i * 31 + j * 17) % 13) as f64 / 6.5 - 1.0);
    let y = Array1::from_shape_fn(n, |i| if x[[i, 0]] + x[[i, d - 1]] > 0.0 { 1.0 } else { 0.0 });
    (y, x)
}

fn criterion_benchmark(c: &mut Criterion) {
    for dim in [10, 1000] {
        let target = IsotropicGaussian::new(dim, 1.0).unwrap();
        let theta = Array1::from_elem(dim, 0.5);
        let r = Array1::from_elem(dim, 1.0);
        c.bench_function(&format!("leapfrog x10 normal {dim}"), |b| {
            b.iter_batched(
                || (theta.clone(), r.clone()),
                |(mut q, mut p)| {
                    integrate(&target, &mut q, &mut p, black_box(0.1), 10);
                    q
                },
                BatchSize::SmallInput,
            )
        });
    }

    let (y, x) = logistic_data(1000, 10);
    let model = LogisticRegression::new(y.view(), x.view()).unwrap();
    let mut sampler = HMC::new(model, HmcConfig::new(0.05, 10, 100))
        .unwrap()
        .set_seed(42);
    let mut theta = Array1::zeros(10);
    for _ in 0..200 {
        theta = sampler.adapt_step(&theta).unwrap();
    }
    c.bench_function("hmc iteration logistic 1000x10", |b| {
        b.iter(|| sampler.step(black_box(&theta)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
