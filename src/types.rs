//! Common Types and Constants
//!
//! Shared data structures used by both bandit variants.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Exploration weight used when a configuration leaves `alpha` unset
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Floor for Cholesky pivots that come out non-positive
pub const MIN_PIVOT: f64 = 1e-6;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

/// Condition number above which a covariance is reported unhealthy
pub const MAX_CONDITION_NUMBER: f64 = 1e12;

// ==================== Estimates ====================

/// Per-arm breakdown of an upper confidence bound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmEstimate {
    /// Point estimate of the reward
    pub exploitation: f64,
    /// Standard deviation term `sqrt(|variance|)`, before scaling by alpha
    pub confidence: f64,
    /// Payoff used for selection
    pub score: f64,
}

// ==================== Diagnostics ====================

/// Numerical health of the covariance accumulators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub is_healthy: bool,
    pub has_nan: bool,
    pub has_inf: bool,
    /// Condition number estimated from the Cholesky diagonal
    pub condition_number: f64,
    pub min_diagonal: f64,
    pub max_diagonal: f64,
    pub message: String,
}

impl DiagnosticResult {
    /// Combine two reports, keeping the worst of each measure.
    pub fn merge(self, other: DiagnosticResult) -> DiagnosticResult {
        let has_nan = self.has_nan || other.has_nan;
        let has_inf = self.has_inf || other.has_inf;
        let condition_number = self.condition_number.max(other.condition_number);
        let is_healthy = self.is_healthy && other.is_healthy;
        let message = if self.is_healthy && !other.is_healthy {
            other.message
        } else {
            self.message
        };

        DiagnosticResult {
            is_healthy,
            has_nan,
            has_inf,
            condition_number,
            min_diagonal: self.min_diagonal.min(other.min_diagonal),
            max_diagonal: self.max_diagonal.max(other.max_diagonal),
            message,
        }
    }
}
