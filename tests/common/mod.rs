#![allow(dead_code)]

use ndarray::Array2;
use num_traits::Float;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Owned compressed-column arrays.
pub struct Csc<T> {
    pub nrows: usize,
    pub ncols: usize,
    pub data: Vec<T>,
    pub indices: Vec<i32>,
    pub indptr: Vec<i32>,
}

impl<T: tabmat_sandwich::Scalar> Csc<T> {
    pub fn from_dense(x: &Array2<T>) -> Self {
        let (nrows, ncols) = x.dim();
        let mut data = Vec::new();
        let mut indices = Vec::new();
        let mut indptr = vec![0i32];
        for j in 0..ncols {
            for i in 0..nrows {
                let v = x[[i, j]];
                if v != T::zero() {
                    data.push(v);
                    indices.push(i as i32);
                }
            }
            indptr.push(data.len() as i32);
        }
        Self {
            nrows,
            ncols,
            data,
            indices,
            indptr,
        }
    }

    pub fn view(&self) -> tabmat_sandwich::CscView<'_, T> {
        tabmat_sandwich::CscView::new(
            self.nrows,
            self.ncols,
            &self.data,
            &self.indices,
            &self.indptr,
        )
        .expect("valid csc layout")
    }
}

/// `A` and `A.T`, both compressed-column.
pub fn csc_pair<T: tabmat_sandwich::Scalar>(x: &Array2<T>) -> (Csc<T>, Csc<T>) {
    (Csc::from_dense(x), Csc::from_dense(&x.t().to_owned()))
}

/// Sum over rows of `x[k, i] * d[k] * x[k, j]`, one entry at a time.
pub fn naive_sandwich<T: Float>(x: &Array2<T>, d: &[T]) -> Array2<T> {
    let (n, m) = x.dim();
    Array2::from_shape_fn((m, m), |(i, j)| {
        (0..n).fold(T::zero(), |acc, k| acc + x[[k, i]] * d[k] * x[[k, j]])
    })
}

/// Random matrix where each entry is nonzero with probability `density`.
pub fn random_matrix(rng: &mut StdRng, n: usize, m: usize, density: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, m), |_| {
        if rng.gen_bool(density) {
            rng.gen_range(-2.0..2.0)
        } else {
            0.0
        }
    })
}

pub fn random_weights(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(0.0..3.0)).collect()
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn assert_close(actual: &Array2<f64>, expected: &Array2<f64>, tol: f64) {
    assert_eq!(actual.dim(), expected.dim());
    for ((idx, a), e) in actual.indexed_iter().zip(expected.iter()) {
        assert!(
            approx::relative_eq!(*a, *e, epsilon = tol, max_relative = tol),
            "mismatch at {:?}: {} vs {}",
            idx,
            a,
            e
        );
    }
}

pub fn assert_exactly_symmetric<T: PartialEq + std::fmt::Debug + Copy>(r: &Array2<T>) {
    let (m, k) = r.dim();
    assert_eq!(m, k);
    for i in 0..m {
        for j in 0..m {
            assert_eq!(r[[i, j]], r[[j, i]], "asymmetric at ({i}, {j})");
        }
    }
}
