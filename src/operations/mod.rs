//! Parallel whole-matrix operations
//!
//! Consumers split rows or columns into contiguous blocks and give each
//! worker its own extractor over the shared, immutable matrix.
//!
//! # Organization
//!
//! - [`parallel`]: Block partitioning and bounded rayon execution
//! - [`realize`]: Dense materialization and margin sums

pub mod parallel;
pub mod realize;

pub use realize::{column_sums, realize_dense, row_sums};
