//! Error types for the sandwich kernels.

use std::fmt;

use thiserror::Error;

/// Result type alias using [`SandwichError`].
pub type Result<T> = std::result::Result<T, SandwichError>;

/// Which axis a row/column subset refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Cols,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Rows => f.write_str("row"),
            Axis::Cols => f.write_str("column"),
        }
    }
}

/// Errors reported at the kernel boundary.
///
/// Only cheap checks live here. Sortedness of row indices and the transpose
/// relationship between `A` and `AT` are caller invariants.
#[derive(Error, Debug)]
pub enum SandwichError {
    /// Weight vector length differs from the matrix row count.
    #[error("weight vector has length {actual}, expected {expected} (one weight per row)")]
    WeightLength { expected: usize, actual: usize },

    /// `AT` is not shaped like the transpose of `A`.
    #[error(
        "transpose has shape {at_shape:?} with {at_nnz} nonzeros, \
         expected {expected:?} with {a_nnz} nonzeros"
    )]
    TransposeShape {
        expected: (usize, usize),
        at_shape: (usize, usize),
        a_nnz: usize,
        at_nnz: usize,
    },

    /// Compressed-column arrays disagree with each other or with the shape.
    #[error("invalid compressed-column layout: {what} is {actual}, expected {expected}")]
    CscLayout {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// `indptr` decreases between two adjacent columns.
    #[error("column {column} ends at indptr {end}, expected at least its start {start}")]
    DecreasingIndptr { column: usize, start: i32, end: i32 },

    /// A subset index lies outside the matrix.
    #[error("{axis} index {index} out of bounds for {axis} count {bound}")]
    SubsetIndex {
        axis: Axis,
        index: usize,
        bound: usize,
    },

    /// A subset is not strictly ascending.
    #[error("{axis} subset must be strictly ascending")]
    UnsortedSubset { axis: Axis },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("result shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
