//! Sparse sandwich product for compressed-column matrices.
//!
//! Computes `A.T @ diag(d) @ A` given `A` and its transpose `AT`, both in
//! compressed-column form. For every nonzero `A[k, j]` the kernel walks
//! column `k` of `AT`, which lists the columns `i` sharing row `k`, and stops
//! as soon as `i > j`. Only the lower triangle is accumulated; the upper
//! triangle is mirrored at the end.

use num_traits::Float;
use rayon::prelude::*;

use crate::error::{Result, SandwichError};
use crate::partition::RowBlocks;
use crate::selection::Selection;
use crate::triangle::mirror_lower;

/// Element types the sparse kernel is instantiated for (`f32` and `f64`).
pub trait Scalar: Float + Send + Sync + 'static {}

impl<T: Float + Send + Sync + 'static> Scalar for T {}

/// Borrowed compressed-column matrix.
///
/// `indptr[j]..indptr[j + 1]` delimits column `j` inside `data` and `indices`.
/// Row indices within a column must be strictly increasing and `< nrows`;
/// neither is checked in release builds.
#[derive(Debug, Clone, Copy)]
pub struct CscView<'a, T> {
    nrows: usize,
    ncols: usize,
    data: &'a [T],
    indices: &'a [i32],
    indptr: &'a [i32],
}

impl<'a, T: Scalar> CscView<'a, T> {
    /// Wrap compressed-column arrays after checking their lengths and that
    /// `indptr` is a non-decreasing range starting at 0 and ending at `nnz`.
    pub fn new(
        nrows: usize,
        ncols: usize,
        data: &'a [T],
        indices: &'a [i32],
        indptr: &'a [i32],
    ) -> Result<Self> {
        if indptr.len() != ncols + 1 {
            return Err(layout("indptr length", ncols + 1, indptr.len()));
        }
        if indices.len() != data.len() {
            return Err(layout("indices length", data.len(), indices.len()));
        }
        if indptr[0] != 0 {
            return Err(layout("indptr[0]", 0, indptr[0].max(0) as usize));
        }
        let last = indptr[ncols];
        if last < 0 || last as usize != data.len() {
            return Err(layout("indptr[ncols]", data.len(), last.max(0) as usize));
        }
        if let Some(column) = indptr.windows(2).position(|w| w[1] < w[0]) {
            return Err(SandwichError::DecreasingIndptr {
                column,
                start: indptr[column],
                end: indptr[column + 1],
            });
        }
        Ok(Self {
            nrows,
            ncols,
            data,
            indices,
            indptr,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// `(row, value)` pairs of column `j`, in stored order.
    #[inline(always)]
    pub fn column(&self, j: usize) -> impl Iterator<Item = (usize, T)> + 'a {
        let (indices, data): (&'a [i32], &'a [T]) = (self.indices, self.data);
        let start = self.indptr[j] as usize;
        let end = self.indptr[j + 1] as usize;
        indices[start..end]
            .iter()
            .zip(&data[start..end])
            .map(|(&i, &v)| (i as usize, v))
    }

    /// True when every column's row indices are strictly increasing.
    pub fn has_sorted_indices(&self) -> bool {
        self.indptr.windows(2).all(|w| {
            self.indices[w[0] as usize..w[1] as usize]
                .windows(2)
                .all(|p| p[0] < p[1])
        })
    }
}

fn layout(what: &'static str, expected: usize, actual: usize) -> SandwichError {
    SandwichError::CscLayout {
        what,
        expected,
        actual,
    }
}

/// Boundary checks shared by the full and subset entry points.
pub(crate) fn check_inputs<T: Scalar>(a: &CscView<T>, at: &CscView<T>, d: &[T]) -> Result<()> {
    if d.len() != a.nrows {
        return Err(SandwichError::WeightLength {
            expected: a.nrows,
            actual: d.len(),
        });
    }
    if at.shape() != (a.ncols, a.nrows) || at.nnz() != a.nnz() {
        return Err(SandwichError::TransposeShape {
            expected: (a.ncols, a.nrows),
            at_shape: at.shape(),
            a_nnz: a.nnz(),
            at_nnz: at.nnz(),
        });
    }
    debug_assert!(a.has_sorted_indices(), "A has unsorted row indices");
    debug_assert!(at.has_sorted_indices(), "AT has unsorted row indices");
    Ok(())
}

/// Lower triangle of the sandwich product, row-major, `cols.len()` squared.
///
/// Row `cj` of the output holds `R[cj, ci]` for `ci <= cj`. Each task owns a
/// block of output rows, so writes never overlap. `cols` must be ascending
/// for the `i > j` early exit to coincide with `ci > cj`.
pub(crate) fn sparse_lower<T: Scalar>(
    a: &CscView<T>,
    at: &CscView<T>,
    d: &[T],
    rows: Selection<'_>,
    cols: Selection<'_>,
    col_block: usize,
) -> Vec<T> {
    let m = cols.len();
    let mut out = vec![T::zero(); m * m];
    if m == 0 || a.nnz() == 0 {
        return out;
    }

    let row_included = rows.mask(a.nrows);
    let col_map = cols.position_map(a.ncols);

    let blocks = RowBlocks::new(m, col_block);
    log::trace!("sparse sandwich: {} column blocks of {}", blocks.len(), col_block);

    blocks
        .split_mut(&mut out, m)
        .into_par_iter()
        .for_each(|(range, chunk)| {
            for cj in range.clone() {
                let j = cols.get(cj);
                let row = &mut chunk[(cj - range.start) * m..][..m];

                for (k, a_val) in a.column(j) {
                    if let Some(included) = &row_included {
                        if !included[k] {
                            continue;
                        }
                    }
                    let weighted = a_val * d[k];

                    for (i, at_val) in at.column(k) {
                        if i > j {
                            break;
                        }
                        let ci = match &col_map {
                            Some(map) => match map[i] {
                                Some(ci) => ci,
                                None => continue,
                            },
                            None => i,
                        };
                        row[ci] = row[ci] + at_val * weighted;
                    }
                }
            }
        });

    out
}

/// Full symmetric sandwich from the lower-triangle kernel.
pub(crate) fn sparse_sandwich<T: Scalar>(
    a: &CscView<T>,
    at: &CscView<T>,
    d: &[T],
    rows: Selection<'_>,
    cols: Selection<'_>,
    col_block: usize,
) -> Vec<T> {
    let m = cols.len();
    let mut out = sparse_lower(a, at, d, rows, cols, col_block);
    mirror_lower(&mut out, m);
    out
}
