//! Dense sandwich product: `X.T @ diag(d) @ X`.
//!
//! Cache blocking over three dimensions:
//! - `k`: rows of `X` are packed `row_block` at a time into two column-major
//!   panels, `X` and `diag(d) @ X`, so each weight is applied once per block.
//! - `j`: output rows are split into tiles owned by one rayon task each.
//! - `i`: inside a task, columns are visited in tiles so the `X` panels
//!   touched by the tile stay in cache while every `j` of the task reuses them.
//!
//! Only `i <= j` is computed; the upper triangle is mirrored afterwards.

use ndarray::ArrayView2;
use rayon::prelude::*;
use wide::f64x4;

use crate::error::{Result, SandwichError};
use crate::partition::RowBlocks;
use crate::selection::Selection;
use crate::triangle::mirror_lower;

/// Element access for the three layouts an `ArrayView2` can come in.
enum Layout<'a> {
    RowMajor { data: &'a [f64], ncols: usize },
    ColMajor { data: &'a [f64], nrows: usize },
    Strided(ArrayView2<'a, f64>),
}

impl<'a> Layout<'a> {
    fn of(x: ArrayView2<'a, f64>) -> Self {
        let (nrows, ncols) = x.dim();
        if let Some(data) = x.to_slice() {
            return Layout::RowMajor { data, ncols };
        }
        if let Some(data) = x.clone().reversed_axes().to_slice() {
            return Layout::ColMajor { data, nrows };
        }
        Layout::Strided(x)
    }

    fn name(&self) -> &'static str {
        match self {
            Layout::RowMajor { .. } => "row-major",
            Layout::ColMajor { .. } => "column-major",
            Layout::Strided(_) => "strided",
        }
    }

    #[inline(always)]
    fn get(&self, r: usize, c: usize) -> f64 {
        match self {
            Layout::RowMajor { data, ncols } => data[r * ncols + c],
            Layout::ColMajor { data, nrows } => data[c * nrows + r],
            Layout::Strided(x) => x[[r, c]],
        }
    }
}

pub(crate) fn check_weights(x: &ArrayView2<f64>, d: &[f64]) -> Result<()> {
    if d.len() != x.nrows() {
        return Err(SandwichError::WeightLength {
            expected: x.nrows(),
            actual: d.len(),
        });
    }
    Ok(())
}

/// Dot product with 4-wide fused multiply-add and a scalar tail.
#[inline]
fn simd_dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut acc = f64x4::splat(0.0);
    let mut a4 = a.chunks_exact(4);
    let mut b4 = b.chunks_exact(4);
    for (x, y) in (&mut a4).zip(&mut b4) {
        let x = f64x4::new([x[0], x[1], x[2], x[3]]);
        let y = f64x4::new([y[0], y[1], y[2], y[3]]);
        acc = x.mul_add(y, acc);
    }
    let lanes = acc.to_array();
    let mut sum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
    for (x, y) in a4.remainder().iter().zip(b4.remainder()) {
        sum += x * y;
    }
    sum
}

/// Add one packed row block's contribution to the output rows in `range`.
///
/// `scaled` and `plain` hold `m` columns of `len` entries each.
fn accumulate_tile(
    range: std::ops::Range<usize>,
    chunk: &mut [f64],
    scaled: &[f64],
    plain: &[f64],
    len: usize,
    m: usize,
    tile: usize,
) {
    for i0 in (0..range.end).step_by(tile) {
        let i1 = (i0 + tile).min(range.end);
        for j in range.clone() {
            if i0 > j {
                continue;
            }
            let wj = &scaled[j * len..(j + 1) * len];
            let row = &mut chunk[(j - range.start) * m..][..m];
            for i in i0..i1.min(j + 1) {
                row[i] += simd_dot(wj, &plain[i * len..(i + 1) * len]);
            }
        }
    }
}

/// Lower triangle of the dense sandwich, row-major, `cols.len()` squared.
pub(crate) fn dense_lower(
    x: ArrayView2<f64>,
    d: &[f64],
    rows: Selection<'_>,
    cols: Selection<'_>,
    row_block: usize,
    tile: usize,
) -> Vec<f64> {
    let m = cols.len();
    let n = rows.len();
    let mut out = vec![0.0; m * m];
    if m == 0 || n == 0 {
        return out;
    }

    let layout = Layout::of(x);
    let block = row_block.max(1).min(n);
    let tile = tile.max(1);
    let blocks = RowBlocks::new(m, tile);
    log::trace!(
        "dense sandwich: {} layout, {} row blocks of {}, {} output tiles of {}",
        layout.name(),
        n.div_ceil(block),
        block,
        blocks.len(),
        tile
    );

    // Column-major panels reused across row blocks: panel[c * len + k].
    let mut scaled = vec![0.0; m * block];
    let mut plain = vec![0.0; m * block];

    for k0 in (0..n).step_by(block) {
        let k1 = (k0 + block).min(n);
        let len = k1 - k0;
        let scaled = &mut scaled[..m * len];
        let plain = &mut plain[..m * len];

        scaled
            .par_chunks_mut(len)
            .zip(plain.par_chunks_mut(len))
            .enumerate()
            .for_each(|(c, (s, p))| {
                let col = cols.get(c);
                for (off, k) in (k0..k1).enumerate() {
                    let r = rows.get(k);
                    let v = layout.get(r, col);
                    p[off] = v;
                    s[off] = v * d[r];
                }
            });

        let (scaled, plain) = (&*scaled, &*plain);
        blocks
            .split_mut(&mut out, m)
            .into_par_iter()
            .for_each(|(range, chunk)| {
                accumulate_tile(range, chunk, scaled, plain, len, m, tile);
            });
    }

    out
}

/// Full symmetric dense sandwich.
pub(crate) fn dense_sandwich(
    x: ArrayView2<f64>,
    d: &[f64],
    rows: Selection<'_>,
    cols: Selection<'_>,
    row_block: usize,
    tile: usize,
) -> Vec<f64> {
    let m = cols.len();
    let mut out = dense_lower(x, d, rows, cols, row_block, tile);
    mirror_lower(&mut out, m);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, ShapeBuilder};

    #[test]
    fn simd_dot_handles_tail() {
        let a: Vec<f64> = (1..=7).map(f64::from).collect();
        let b = vec![1.0; 7];
        assert_eq!(simd_dot(&a, &b), 28.0);
        assert_eq!(simd_dot(&[], &[]), 0.0);
    }

    #[test]
    fn layouts_agree() {
        let c = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let mut f = Array2::<f64>::zeros((2, 3).f());
        f.assign(&c);
        let wide = array![[1.0, 9.0, 2.0, 9.0, 3.0], [4.0, 9.0, 5.0, 9.0, 6.0]];
        let strided = wide.slice(ndarray::s![.., ..;2]);

        assert_eq!(Layout::of(c.view()).name(), "row-major");
        assert_eq!(Layout::of(f.view()).name(), "column-major");
        assert_eq!(Layout::of(strided).name(), "strided");

        for layout in [Layout::of(c.view()), Layout::of(f.view()), Layout::of(strided)] {
            assert_eq!(layout.get(1, 2), 6.0);
            assert_eq!(layout.get(0, 1), 2.0);
        }
    }

    #[test]
    fn lower_triangle_only_before_mirror() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let d = [1.0, 0.0, 1.0];
        let lower = dense_lower(x.view(), &d, Selection::All(3), Selection::All(2), 2, 1);
        assert_eq!(lower, vec![26.0, 0.0, 32.0, 40.0]);
    }

    #[test]
    fn blocking_does_not_change_result() {
        let x = Array2::from_shape_fn((37, 9), |(r, c)| ((r * 7 + c * 3) % 11) as f64 - 5.0);
        let d: Vec<f64> = (0..37).map(|k| (k % 5) as f64 - 1.0).collect();
        let reference = dense_sandwich(
            x.view(),
            &d,
            Selection::All(37),
            Selection::All(9),
            512,
            64,
        );
        for (row_block, tile) in [(1, 1), (4, 2), (5, 3), (36, 8)] {
            let out = dense_sandwich(
                x.view(),
                &d,
                Selection::All(37),
                Selection::All(9),
                row_block,
                tile,
            );
            for (a, b) in out.iter().zip(&reference) {
                assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0));
            }
        }
    }

    #[test]
    fn negative_weights_are_supported() {
        let x = array![[1.0, 1.0], [2.0, 0.0]];
        let d = [-1.0, 2.0];
        let out = dense_sandwich(x.view(), &d, Selection::All(2), Selection::All(2), 8, 8);
        assert_eq!(out, vec![7.0, -1.0, -1.0, -1.0]);
    }

    #[test]
    fn weight_length_is_checked() {
        let x = array![[1.0], [2.0]];
        assert!(matches!(
            check_weights(&x.view(), &[1.0]),
            Err(SandwichError::WeightLength {
                expected: 2,
                actual: 1
            })
        ));
    }
}
