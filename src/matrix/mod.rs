//! Dense row-major linear algebra on `f64` slices.
//!
//! A `rows×cols` matrix is a slice of length `rows * cols` where entry
//! `(i, j)` lives at `i * cols + j`.

use tracing::warn;

use crate::types::{EPSILON, MIN_PIVOT};

/// Identity matrix of size `n×n`
pub fn identity(n: usize) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    m
}

/// Cholesky 分解 - 将正定矩阵 A 分解为 L * L^T
///
/// Non-positive pivots are floored to `sqrt(MIN_PIVOT)` so the factor stays
/// usable; this only happens if `a` has lost positive definiteness to
/// rounding.
pub fn cholesky_decompose(a: &[f64], n: usize) -> Vec<f64> {
    let mut l = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];

            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }

            if i == j {
                if sum <= 0.0 || sum.is_nan() {
                    warn!(row = i, pivot = sum, "non-positive Cholesky pivot, flooring");
                    l[i * n + i] = MIN_PIVOT.sqrt();
                } else {
                    l[i * n + i] = sum.sqrt();
                }
            } else {
                let diag = l[j * n + j];
                if diag.abs() > EPSILON {
                    l[i * n + j] = sum / diag;
                } else {
                    l[i * n + j] = 0.0;
                }
            }
        }
    }

    l
}

/// 使用 Cholesky 分解求解线性系统 A * x = b, 其中 A = L * L^T
pub fn solve_cholesky(l: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    // 1. 前向替换: L * y = b
    let y = solve_triangular_lower(l, b, n);

    // 2. 后向替换: L^T * x = y
    solve_triangular_upper_transpose(l, &y, n)
}

/// 求解下三角系统 L * x = b (前向替换)
pub fn solve_triangular_lower(l: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut x = vec![0.0; n];

    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i * n + j] * x[j];
        }

        let diag = l[i * n + i];
        if diag.abs() > EPSILON {
            x[i] = sum / diag;
        } else {
            x[i] = 0.0;
        }
    }

    x
}

/// 求解上三角系统 L^T * x = b (后向替换)
fn solve_triangular_upper_transpose(l: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut x = vec![0.0; n];

    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            // L^T[i,j] = L[j,i]
            sum -= l[j * n + i] * x[j];
        }

        let diag = l[i * n + i];
        if diag.abs() > EPSILON {
            x[i] = sum / diag;
        } else {
            x[i] = 0.0;
        }
    }

    x
}

/// Inverse of a symmetric positive definite matrix.
///
/// Solves `A * X = I` column by column through one Cholesky factor, then
/// symmetrises the result so rounding never breaks symmetry.
pub fn invert_spd(a: &[f64], n: usize) -> Vec<f64> {
    let l = cholesky_decompose(a, n);
    let mut inv = vec![0.0; n * n];
    let mut e = vec![0.0; n];

    for j in 0..n {
        e.iter_mut().for_each(|v| *v = 0.0);
        e[j] = 1.0;
        let col = solve_cholesky(&l, &e, n);
        for (i, v) in col.into_iter().enumerate() {
            inv[i * n + j] = v;
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let avg = (inv[i * n + j] + inv[j * n + i]) / 2.0;
            inv[i * n + j] = avg;
            inv[j * n + i] = avg;
        }
    }

    inv
}

/// 矩阵向量乘法: A * x, A 为 rows×cols
pub fn mat_vec_mul(a: &[f64], x: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let mut result = vec![0.0; rows];
    for i in 0..rows {
        for j in 0..cols {
            result[i] += a[i * cols + j] * x[j];
        }
    }
    result
}

/// Transposed product A^T * x, A 为 rows×cols, result has length `cols`
pub fn mat_t_vec_mul(a: &[f64], x: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let mut result = vec![0.0; cols];
    for i in 0..rows {
        let xi = x[i];
        for j in 0..cols {
            result[j] += a[i * cols + j] * xi;
        }
    }
    result
}

/// 矩阵乘法: A (m×n) * B (n×p) -> m×p
pub fn mat_mul(a: &[f64], b: &[f64], m: usize, n: usize, p: usize) -> Vec<f64> {
    let mut result = vec![0.0; m * p];
    for i in 0..m {
        for k in 0..n {
            let aik = a[i * n + k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..p {
                result[i * p + j] += aik * b[k * p + j];
            }
        }
    }
    result
}

/// A^T (n×m) * B (m×p) -> n×p, where A is stored as m×n
pub fn transpose_mul(a: &[f64], b: &[f64], m: usize, n: usize, p: usize) -> Vec<f64> {
    let mut result = vec![0.0; n * p];
    for k in 0..m {
        for i in 0..n {
            let aki = a[k * n + i];
            if aki == 0.0 {
                continue;
            }
            for j in 0..p {
                result[i * p + j] += aki * b[k * p + j];
            }
        }
    }
    result
}

/// 向量点积
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

/// 外积更新: A += u * v^T, A 为 len(u)×len(v)
pub fn outer_add(a: &mut [f64], u: &[f64], v: &[f64]) {
    let cols = v.len();
    for (i, &ui) in u.iter().enumerate() {
        for (j, &vj) in v.iter().enumerate() {
            a[i * cols + j] += ui * vj;
        }
    }
}

/// 外积更新: A += x * x^T
pub fn rank1_update_matrix(a: &mut [f64], x: &[f64]) {
    outer_add(a, x, x);
}

/// 向量加法: a += scale * b (also used element-wise on matrices)
pub fn vec_add_scaled(a: &mut [f64], b: &[f64], scale: f64) {
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai += scale * bi;
    }
}
