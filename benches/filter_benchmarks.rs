//! Benchmarks for signal filter performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use virtual_tryon::filters::{
    exponential::ExponentialFilter, moving_average::MovingAverageFilter, NoFilter, SignalFilter,
};
use virtual_tryon::keypoint::JointName;
use virtual_tryon::signals::{JointSignal, SignalKey};

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Test data - one frame of noisy head, torso and limb signals per step
    let test_data: Vec<Vec<(SignalKey, JointSignal)>> = (0..100)
        .map(|i| {
            let t = i as f64 * 0.1;
            vec![
                (SignalKey::Head, JointSignal::offset(t.sin() + 0.1 * rand::random::<f64>(), t.cos())),
                (SignalKey::Torso, JointSignal::offset(0.5 * t.cos(), -1.0 + 0.1 * rand::random::<f64>())),
                (
                    SignalKey::Joint(JointName::RightShoulder),
                    JointSignal::Angle(1.5 + 0.2 * t.sin()),
                ),
                (
                    SignalKey::Joint(JointName::LeftElbow),
                    JointSignal::Angle(-0.8 + 0.05 * rand::random::<f64>()),
                ),
            ]
        })
        .collect();

    let filter_configs = vec![
        ("no_filter", Box::new(NoFilter) as Box<dyn SignalFilter>),
        ("moving_average_5", Box::new(MovingAverageFilter::new(5))),
        ("moving_average_10", Box::new(MovingAverageFilter::new(10))),
        ("exponential_0.5", Box::new(ExponentialFilter::new(0.5))),
        ("exponential_0.8", Box::new(ExponentialFilter::new(0.8))),
    ];

    for (name, mut filter) in filter_configs {
        group.bench_with_input(BenchmarkId::new("single_frame", name), &test_data[0], |b, frame| {
            b.iter(|| {
                for &(key, signal) in frame {
                    black_box(filter.apply(key, black_box(signal)));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("sequence_100", name), &test_data, |b, data| {
            b.iter(|| {
                filter.reset();
                for frame in data {
                    for &(key, signal) in frame {
                        black_box(filter.apply(key, black_box(signal)));
                    }
                }
            });
        });
    }

    group.finish();
}

fn benchmark_filter_reset(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_reset");

    let filter_configs = vec![
        (
            "moving_average",
            Box::new(MovingAverageFilter::new(10)) as Box<dyn SignalFilter>,
        ),
        ("exponential", Box::new(ExponentialFilter::new(0.5))),
    ];

    for (name, mut filter) in filter_configs {
        // Pre-fill filter with data
        for i in 0..20 {
            filter.apply(SignalKey::Head, JointSignal::offset(i as f64, i as f64));
            filter.apply(SignalKey::Joint(JointName::RightElbow), JointSignal::Angle(i as f64 * 0.1));
        }

        group.bench_function(name, |b| {
            b.iter(|| {
                black_box(filter.reset());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_filters, benchmark_filter_reset);
criterion_main!(benches);
