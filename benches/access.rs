use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::hint::black_box;
use tensorview::{All, Span, Tensor};

fn random_tensor(rows: usize, cols: usize) -> Tensor<f32, 2> {
    let mut rng = rand::thread_rng();
    let data: Vec<f32> = (0..rows * cols).map(|_| rng.gen()).collect();
    Tensor::from_vec(data, [rows, cols]).unwrap()
}

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");

    for size in [64, 256, 1024].iter() {
        let t = random_tensor(*size, *size);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("contiguous", size), &t, |b, t| {
            b.iter(|| black_box(t.iter().unwrap().sum::<f32>()));
        });

        // Every other element along the contiguous axis
        let sub = t.at((Span::with_stride(0, *size, 2), ..)).unwrap();
        group.bench_with_input(BenchmarkId::new("strided", size), &sub, |b, sub| {
            b.iter(|| black_box(sub.iter().unwrap().sum::<f32>()));
        });

        group.bench_with_input(BenchmarkId::new("mapped", size), &t, |b, t| {
            b.iter(|| {
                let scaled = t.map(|x| x * 2.0);
                black_box(scaled.iter().unwrap().sum::<f32>())
            });
        });
    }
    group.finish();
}

fn bench_element_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("element_access");
    let size = 512;
    let t = random_tensor(size, size);

    group.bench_function("linear", |b| {
        b.iter(|| {
            let mut total = 0.0f32;
            for i in 0..size * size {
                total += t[i];
            }
            black_box(total)
        });
    });

    group.bench_function("coordinates", |b| {
        b.iter(|| {
            let mut total = 0.0f32;
            for j in 0..size {
                for i in 0..size {
                    total += t[[i, j]];
                }
            }
            black_box(total)
        });
    });

    group.bench_function("row_subviews", |b| {
        b.iter(|| {
            let mut total = 0.0f32;
            for i in 0..size {
                let row = t.at((i, All)).unwrap();
                total += row.iter().unwrap().sum::<f32>();
            }
            black_box(total)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_iteration, bench_element_access);
criterion_main!(benches);
