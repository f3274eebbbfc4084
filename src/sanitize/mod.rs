use crate::matrix::cholesky_decompose;
use crate::types::{DiagnosticResult, EPSILON, MAX_CONDITION_NUMBER};

/// 检查数组是否包含无效值 (NaN 或 Inf)
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// Asymmetry of a square matrix: largest `|a[i][j] - a[j][i]|`
pub fn max_asymmetry(a: &[f64], n: usize) -> f64 {
    let mut worst: f64 = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((a[i * n + j] - a[j * n + i]).abs());
        }
    }
    worst
}

/// 诊断协方差矩阵健康状态
pub fn diagnose_covariance(a: &[f64], n: usize) -> DiagnosticResult {
    let has_nan = a.iter().any(|v| v.is_nan());
    let has_inf = a.iter().any(|v| v.is_infinite());

    let mut min_diagonal = f64::MAX;
    let mut max_diagonal = f64::MIN;

    if !has_nan && !has_inf {
        let l = cholesky_decompose(a, n);
        for i in 0..n {
            let diag = l[i * n + i];
            if diag > 0.0 && diag.is_finite() {
                min_diagonal = min_diagonal.min(diag);
                max_diagonal = max_diagonal.max(diag);
            }
        }
    }

    // 计算条件数估计
    let condition_number = if min_diagonal > EPSILON && min_diagonal != f64::MAX {
        (max_diagonal / min_diagonal).powi(2)
    } else {
        f64::MAX
    };

    let is_healthy = !has_nan && !has_inf && condition_number < MAX_CONDITION_NUMBER;

    let message = if is_healthy {
        "Model is healthy".to_string()
    } else if has_nan {
        "Model contains NaN values".to_string()
    } else if has_inf {
        "Model contains infinite values".to_string()
    } else {
        format!("Model has high condition number: {:.2e}", condition_number)
    };

    DiagnosticResult {
        is_healthy,
        has_nan,
        has_inf,
        condition_number,
        min_diagonal: if min_diagonal == f64::MAX {
            0.0
        } else {
            min_diagonal
        },
        max_diagonal: if max_diagonal == f64::MIN {
            0.0
        } else {
            max_diagonal
        },
        message,
    }
}
