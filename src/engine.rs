//! Entry points bound to a configuration and a worker pool.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2};

use crate::config::SandwichConfig;
use crate::dense;
use crate::error::{Axis, Result};
use crate::selection::Selection;
use crate::sparse::{self, CscView, Scalar};

/// Sandwich kernels with fixed blocking and an optional dedicated pool.
///
/// Without `num_threads` the kernels run on rayon's global pool. With it, a
/// private `rayon::ThreadPool` is built once and every call is installed on
/// it. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Sandwich {
    config: SandwichConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Default for Sandwich {
    fn default() -> Self {
        Self {
            config: SandwichConfig::default(),
            pool: None,
        }
    }
}

impl Sandwich {
    pub fn new(config: SandwichConfig) -> Result<Self> {
        let config = config.normalized();
        let pool = match config.num_threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("sandwich-{i}"))
                    .build()?;
                log::debug!("built sandwich pool with {} threads", pool.current_num_threads());
                Some(Arc::new(pool))
            }
            None => None,
        };
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &SandwichConfig {
        &self.config
    }

    /// Number of workers the kernels will run on.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// `A.T @ diag(d) @ A` for a compressed-column `A` and its transpose `at`.
    ///
    /// Returns an `A.ncols() x A.ncols()` symmetric matrix.
    ///
    /// # Preconditions
    /// `at` must hold exactly the transpose of `a`, and row indices must be
    /// strictly increasing within each column of both. Violations produce
    /// wrong numbers, not errors; only shapes and `d.len()` are checked.
    ///
    /// # Panics
    /// If a stored row index is negative or not below the row count.
    pub fn sparse<T: Scalar>(&self, a: &CscView<T>, at: &CscView<T>, d: &[T]) -> Result<Array2<T>> {
        sparse::check_inputs(a, at, d)?;
        self.run_sparse(a, at, d, Selection::All(a.nrows()), Selection::All(a.ncols()))
    }

    /// Sparse sandwich restricted to `A[rows, cols]`.
    ///
    /// Both subsets must be strictly ascending and in range. The result is
    /// `cols.len() x cols.len()`.
    pub fn sparse_subset<T: Scalar>(
        &self,
        a: &CscView<T>,
        at: &CscView<T>,
        d: &[T],
        rows: &[usize],
        cols: &[usize],
    ) -> Result<Array2<T>> {
        sparse::check_inputs(a, at, d)?;
        let rows = Selection::checked(rows, a.nrows(), Axis::Rows)?;
        let cols = Selection::checked(cols, a.ncols(), Axis::Cols)?;
        self.run_sparse(a, at, d, rows, cols)
    }

    fn run_sparse<T: Scalar>(
        &self,
        a: &CscView<T>,
        at: &CscView<T>,
        d: &[T],
        rows: Selection<'_>,
        cols: Selection<'_>,
    ) -> Result<Array2<T>> {
        let m = cols.len();
        log::debug!(
            "sparse sandwich: {}x{} with {} nonzeros, {} rows x {} cols selected",
            a.nrows(),
            a.ncols(),
            a.nnz(),
            rows.len(),
            m
        );
        let block = self.config.sparse_col_block;
        let out = self.install(|| sparse::sparse_sandwich(a, at, d, rows, cols, block));
        Ok(Array2::from_shape_vec((m, m), out)?)
    }

    /// `X.T @ diag(d) @ X` for a dense `X` of any memory layout.
    ///
    /// Returns an `X.ncols() x X.ncols()` symmetric matrix. Weights may be
    /// negative.
    pub fn dense(&self, x: ArrayView2<f64>, d: &[f64]) -> Result<Array2<f64>> {
        dense::check_weights(&x, d)?;
        let (n, m) = x.dim();
        self.run_dense(x, d, Selection::All(n), Selection::All(m))
    }

    /// Dense sandwich restricted to `X[rows, cols]`.
    pub fn dense_subset(
        &self,
        x: ArrayView2<f64>,
        d: &[f64],
        rows: &[usize],
        cols: &[usize],
    ) -> Result<Array2<f64>> {
        dense::check_weights(&x, d)?;
        let rows = Selection::checked(rows, x.nrows(), Axis::Rows)?;
        let cols = Selection::checked(cols, x.ncols(), Axis::Cols)?;
        self.run_dense(x, d, rows, cols)
    }

    fn run_dense(
        &self,
        x: ArrayView2<f64>,
        d: &[f64],
        rows: Selection<'_>,
        cols: Selection<'_>,
    ) -> Result<Array2<f64>> {
        let m = cols.len();
        log::debug!(
            "dense sandwich: {}x{}, {} rows x {} cols selected, row_block={} tile={}",
            x.nrows(),
            x.ncols(),
            rows.len(),
            m,
            self.config.row_block,
            self.config.tile
        );
        let (row_block, tile) = (self.config.row_block, self.config.tile);
        let out = self.install(|| dense::dense_sandwich(x, d, rows, cols, row_block, tile));
        Ok(Array2::from_shape_vec((m, m), out)?)
    }
}
