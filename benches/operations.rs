use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use zq_math::eltwise::fma_mod_assign;
use zq_math::modulus::barrett::Barrett;
use zq_math::modulus::prime::Prime;
use zq_math::modulus::{BARRETT, ONCE};

const Q61: u64 = 0x1fffffffffe00001;

fn mul(c: &mut Criterion) {
    let prime: Prime<u64> = Prime::<u64>::new(Q61).unwrap();
    let x: u64 = 0x5f876e514845cc8b % Q61;
    let y: u64 = 0xad726f98f24a761a % Q61;
    let w: Barrett<u64> = prime.barrett.prepare::<64>(y);

    c.bench_function("mul", |b| {
        b.iter(|| black_box(prime.mul(black_box(x), black_box(y))))
    });
    c.bench_function("mul_prepared", |b| {
        b.iter(|| black_box(prime.mul_prepared(black_box(x), w)))
    });
    c.bench_function("mul_lazy", |b| {
        b.iter(|| black_box(prime.barrett.mul_lazy::<64>(black_box(x), y, *w.quotient())))
    });
}

fn reduce(c: &mut Criterion) {
    let prime: Prime<u64> = Prime::<u64>::new(Q61).unwrap();
    let x: u64 = 0x5f876e514845cc8b;

    c.bench_function("reduce_barrett", |b| {
        b.iter(|| black_box(prime.reduce::<BARRETT>(black_box(x))))
    });
    c.bench_function("reduce_once", |b| {
        b.iter(|| black_box(prime.reduce::<ONCE>(black_box(x % (2 * Q61)))))
    });
}

fn pow(c: &mut Criterion) {
    let prime: Prime<u64> = Prime::<u64>::new(Q61).unwrap();
    c.bench_function("pow", |b| {
        b.iter(|| black_box(prime.pow(black_box(0x5f876e514845cc8b % Q61), Q61 - 2)))
    });
}

fn eltwise_fma(c: &mut Criterion) {
    let mut b = c.benchmark_group("eltwise_fma");
    for log_n in 10..13 {
        let n: usize = 1 << log_n;
        let mut arg1: Vec<u64> = (0..n as u64).collect();
        let arg3: Vec<u64> = (0..n as u64).rev().collect();
        let id = BenchmarkId::new("q61", n);
        b.bench_with_input(id, &(), |b, _| {
            b.iter(|| fma_mod_assign(&mut arg1, 0xabcdef % Q61, Some(&arg3), Q61).unwrap())
        });
    }
}

criterion_group!(benches, mul, reduce, pow, eltwise_fma);
criterion_main!(benches);
