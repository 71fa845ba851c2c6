// ========================================================================================
//
//                   SNPSIEVE COORDINATE DESCENT BENCHMARK
//
// ========================================================================================
//
// Measures how the Lasso solver scales with panel width. The response mixes
// two informative columns with Gaussian noise so the descent has real work
// to do; everything is seeded so runs are comparable across revisions.
//
// ========================================================================================

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use snpsieve::lasso::Lasso;

/// The number of samples to simulate in the cohort.
const NUM_SAMPLES: usize = 200;
/// The panel widths to test. This array defines the x-axis of the report.
const PANEL_WIDTHS: [usize; 3] = [10, 50, 200];

/// Builds a seeded synthetic panel: standard-normal dosage proxies with a
/// sparse linear response plus noise.
fn synthetic_panel(n_samples: usize, n_features: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let standard_normal = Normal::new(0.0, 1.0).expect("valid distribution parameters");

    let x = Array2::from_shape_fn((n_samples, n_features), |_| standard_normal.sample(&mut rng));
    let noise: Vec<f64> = (0..n_samples)
        .map(|_| 0.1 * standard_normal.sample(&mut rng))
        .collect();

    let mut y = Array1::zeros(n_samples);
    for i in 0..n_samples {
        y[i] = 3.0 * x[[i, 0]] - 2.0 * x[[i, 1]] + noise[i];
    }
    (x, y)
}

fn bench_lasso_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lasso_fit");
    for &width in &PANEL_WIDTHS {
        let (x, y) = synthetic_panel(NUM_SAMPLES, width, 42);
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let fit = Lasso::new(0.01)
                    .fit(black_box(x.view()), black_box(y.view()))
                    .expect("benchmark inputs are well-formed");
                black_box(fit.coefficients.sum())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lasso_fit);
criterion_main!(benches);
