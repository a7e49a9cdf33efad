//! Benchmarks for row and column extraction
//!
//! Compares direct storage access with the same data behind delayed nodes,
//! and measures parallel materialization across thread counts.
//!
//! Run with: cargo bench --bench extraction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scranwasm::matrix::layered;
use scranwasm::operations::{column_sums, realize_dense};
use scranwasm::{Layout, NumericMatrix};

const NROW: usize = 2_000;
const NCOL: usize = 500;

/// Deterministic counts with roughly 10% non-zero entries
fn generate_counts() -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    for c in 0..NCOL {
        for r in 0..NROW {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            if state % 10 == 0 {
                rows.push(r);
                cols.push(c);
                // Mostly small counts, a few rows with large ones
                values.push(if r % 97 == 0 { (state % 5000) as f64 } else { (state % 20) as f64 + 1.0 });
            }
        }
    }
    (rows, cols, values)
}

fn fetch_all_columns(m: &NumericMatrix) -> f64 {
    let mut cursor = m.columns();
    let mut buffer = vec![0.0; m.nrow()];
    let mut total = 0.0;
    for j in 0..m.ncol() {
        cursor.fetch(j, &mut buffer).unwrap();
        total += buffer[0];
    }
    total
}

fn fetch_all_rows(m: &NumericMatrix) -> f64 {
    let mut cursor = m.rows();
    let mut buffer = vec![0.0; m.ncol()];
    let mut total = 0.0;
    for i in 0..m.nrow() {
        cursor.fetch(i, &mut buffer).unwrap();
        total += buffer[0];
    }
    total
}

/// Column access: the natural direction for CSC storage
fn bench_column_extraction(c: &mut Criterion) {
    let (rows, cols, values) = generate_counts();
    let csc = NumericMatrix::from_triplets(NROW, NCOL, &rows, &cols, &values).unwrap();
    let layered = layered::from_triplets(NROW, NCOL, &rows, &cols, &values).unwrap();
    let keep: Vec<usize> = (0..NROW).step_by(2).collect();
    let delayed = csc
        .subset_rows(&keep)
        .unwrap()
        .apply_scalar_op("+", 1.0, false)
        .unwrap()
        .apply_math_op("log", Some(2.0))
        .unwrap();

    let mut group = c.benchmark_group("column_extraction");
    group.throughput(Throughput::Elements((NROW * NCOL) as u64));
    for (name, m) in [("csc", &csc), ("layered", &layered), ("delayed", &delayed)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), m, |b, m| {
            b.iter(|| fetch_all_columns(black_box(m)))
        });
    }
    group.finish();
}

/// Row access against the compressed direction
fn bench_row_extraction(c: &mut Criterion) {
    let (rows, cols, values) = generate_counts();
    let csc = NumericMatrix::from_triplets(NROW, NCOL, &rows, &cols, &values).unwrap();
    let dense_values = realize_dense(&csc, Layout::RowMajor, 1);
    let dense = NumericMatrix::from_dense(NROW, NCOL, dense_values, Layout::RowMajor).unwrap();

    let mut group = c.benchmark_group("row_extraction");
    group.throughput(Throughput::Elements((NROW * NCOL) as u64));
    for (name, m) in [("csc", &csc), ("dense", &dense), ("transposed", &dense.transpose().transpose())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), m, |b, m| {
            b.iter(|| fetch_all_rows(black_box(m)))
        });
    }
    group.finish();
}

/// Parallel consumers across thread counts
fn bench_parallel(c: &mut Criterion) {
    let (rows, cols, values) = generate_counts();
    let csc = NumericMatrix::from_triplets(NROW, NCOL, &rows, &cols, &values).unwrap();

    let mut group = c.benchmark_group("column_sums");
    for threads in [1, 2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(threads), threads, |b, &t| {
            b.iter(|| column_sums(black_box(&csc), t))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_column_extraction, bench_row_extraction, bench_parallel);
criterion_main!(benches);
