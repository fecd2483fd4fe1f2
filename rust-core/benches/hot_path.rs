use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kalman_denoise::{denoiser_pair, DenoiserConfig, KalmanFilter};

fn bench_filter_step(c: &mut Criterion) {
    let mut filter = KalmanFilter::new(1e-5, 0.25).unwrap();
    c.bench_function("kalman_step", |b| {
        b.iter(|| filter.step(black_box(0.25)))
    });
}

fn bench_realtime_block(c: &mut Criterion) {
    let (mut denoiser, _observer) = denoiser_pair(&DenoiserConfig::default()).unwrap();
    let mut block: Vec<f64> = (0..128).map(|i| (i as f64 * 0.05).sin()).collect();

    c.bench_function("realtime_block_128", |b| {
        b.iter(|| denoiser.process_block_inplace(black_box(&mut block)))
    });
}

criterion_group!(benches, bench_filter_step, bench_realtime_block);
criterion_main!(benches);
