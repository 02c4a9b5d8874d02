use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use zq_math::dft::ntt::Table;

const Q61: u64 = 0x1fffffffffe00001;
const Q36: u64 = 0xffffee001;

fn forward_inplace(c: &mut Criterion) {
    fn runner(n: u64, q: u64) -> Box<dyn FnMut()> {
        let table: Table<u64> = Table::<u64>::new(n, q).unwrap();
        let mut a: Vec<u64> = (0..n).collect();
        Box::new(move || table.forward_inplace(&mut a))
    }

    let mut b = c.benchmark_group("forward_inplace");
    for log_n in 10..13 {
        let n: u64 = 1 << log_n;
        for (name, q) in [("q61", Q61), ("q36", Q36)] {
            let mut runner = runner(n, q);
            let id = BenchmarkId::new(name, n);
            b.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
        }
    }
}

fn forward_inplace_lazy(c: &mut Criterion) {
    fn runner(n: u64, q: u64) -> Box<dyn FnMut()> {
        let table: Table<u64> = Table::<u64>::new(n, q).unwrap();
        let mut a: Vec<u64> = (0..n).collect();
        Box::new(move || table.forward_inplace_lazy(&mut a))
    }

    let mut b = c.benchmark_group("forward_inplace_lazy");
    for log_n in 10..13 {
        let n: u64 = 1 << log_n;
        let mut runner = runner(n, Q61);
        let id = BenchmarkId::new("q61", n);
        b.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
    }
}

fn backward_inplace(c: &mut Criterion) {
    fn runner(n: u64, q: u64) -> Box<dyn FnMut()> {
        let table: Table<u64> = Table::<u64>::new(n, q).unwrap();
        let mut a: Vec<u64> = (0..n).collect();
        Box::new(move || table.backward_inplace(&mut a))
    }

    let mut b = c.benchmark_group("backward_inplace");
    for log_n in 10..13 {
        let n: u64 = 1 << log_n;
        for (name, q) in [("q61", Q61), ("q36", Q36)] {
            let mut runner = runner(n, q);
            let id = BenchmarkId::new(name, n);
            b.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
        }
    }
}

fn forward_inplace_reference(c: &mut Criterion) {
    fn runner(n: u64, q: u64) -> Box<dyn FnMut()> {
        let table: Table<u64> = Table::<u64>::new(n, q).unwrap();
        let mut a: Vec<u64> = (0..n).collect();
        Box::new(move || table.forward_inplace_reference(&mut a))
    }

    let mut b = c.benchmark_group("forward_inplace_reference");
    for log_n in 10..13 {
        let n: u64 = 1 << log_n;
        let mut runner = runner(n, Q61);
        let id = BenchmarkId::new("q61", n);
        b.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
    }
}

criterion_group!(
    benches,
    forward_inplace,
    forward_inplace_lazy,
    backward_inplace,
    forward_inplace_reference
);
criterion_main!(benches);
