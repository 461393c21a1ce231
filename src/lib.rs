//! # tabmat_sandwich - Sandwich Products for GLM Fitting
//!
//! Computes `X.T @ diag(d) @ X`, the dominant per-iteration cost of
//! iteratively reweighted least squares, for dense and compressed-column
//! sparse matrices.
//!
//! ## Architecture
//!
//! - [`sparse`]: compressed-column kernel, generic over `f32` and `f64`
//! - [`dense`](Sandwich::dense): cache-blocked `f64` kernel with `wide::f64x4` SIMD
//! - [`Sandwich`]: binds blocking parameters and an optional dedicated pool
//!
//! Both kernels compute only the lower triangle, with every rayon task owning
//! a disjoint block of output rows, then mirror it into the upper triangle.
//! The result is therefore exactly symmetric. Its low-order bits may depend
//! on blocking and thread count.
//!
//! ## Example
//!
//! ```
//! use ndarray::array;
//!
//! let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
//! let r = tabmat_sandwich::sandwich_dense(x.view(), &[1.0, 0.0, 1.0]).unwrap();
//! assert_eq!(r, array![[26.0, 32.0], [32.0, 40.0]]);
//! ```

use ndarray::{Array2, ArrayView2};

mod config;
mod dense;
mod engine;
mod error;
mod partition;
mod selection;
pub mod sparse;
mod triangle;

pub use config::SandwichConfig;
pub use engine::Sandwich;
pub use error::{Axis, Result, SandwichError};
pub use sparse::{CscView, Scalar};

/// `A.T @ diag(d) @ A` on rayon's global pool. See [`Sandwich::sparse`].
pub fn sandwich_sparse<T: Scalar>(a: &CscView<T>, at: &CscView<T>, d: &[T]) -> Result<Array2<T>> {
    Sandwich::default().sparse(a, at, d)
}

/// See [`Sandwich::sparse_subset`].
pub fn sandwich_sparse_subset<T: Scalar>(
    a: &CscView<T>,
    at: &CscView<T>,
    d: &[T],
    rows: &[usize],
    cols: &[usize],
) -> Result<Array2<T>> {
    Sandwich::default().sparse_subset(a, at, d, rows, cols)
}

/// `X.T @ diag(d) @ X` on rayon's global pool. See [`Sandwich::dense`].
pub fn sandwich_dense(x: ArrayView2<f64>, d: &[f64]) -> Result<Array2<f64>> {
    Sandwich::default().dense(x, d)
}

/// See [`Sandwich::dense_subset`].
pub fn sandwich_dense_subset(
    x: ArrayView2<f64>,
    d: &[f64],
    rows: &[usize],
    cols: &[usize],
) -> Result<Array2<f64>> {
    Sandwich::default().dense_subset(x, d, rows, cols)
}
