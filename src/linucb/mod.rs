//! LinUCB with disjoint linear models.
//!
//! Every arm keeps its own ridge regression over the context:
//!
//! - `A = I + Σ x xᵀ` (d×d)
//! - `b = Σ r x` (d)
//! - `θ = A⁻¹ b`
//!
//! and is scored as `θᵀx + α·sqrt(xᵀA⁻¹x)`.

use tracing::{debug, trace, warn};

use crate::bandit::{check_batch_lengths, ArmSelector, ContextualBandit};
use crate::error::{BanditError, Result};
use crate::matrix::*;
use crate::sanitize::{diagnose_covariance, has_invalid_values};
use crate::types::{ArmEstimate, DiagnosticResult};

/// Private ridge regression state of a single arm
#[derive(Debug, Clone, PartialEq)]
pub struct ArmModel {
    /// 协方差矩阵 A = I + Σ x x^T (d×d, 行优先)
    a: Vec<f64>,
    /// A^{-1}, refreshed after every mutation of `a`
    a_inv: Vec<f64>,
    /// 奖励向量 b = Σ r x (d)
    b: Vec<f64>,
    /// θ = A^{-1} b
    theta: Vec<f64>,
    d: usize,
    pulls: u64,
}

impl ArmModel {
    /// Identity prior, zero rewards
    pub fn new(d: usize) -> Self {
        ArmModel {
            a: identity(d),
            a_inv: identity(d),
            b: vec![0.0; d],
            theta: vec![0.0; d],
            d,
            pulls: 0,
        }
    }

    /// `A += x xᵀ`, `b += r x`; derived values are left stale
    pub(crate) fn accumulate(&mut self, x: &[f64], reward: f64) {
        rank1_update_matrix(&mut self.a, x);
        vec_add_scaled(&mut self.b, x, reward);
        self.pulls += 1;
    }

    /// Recompute `A⁻¹` and `θ` from the accumulators
    pub(crate) fn refresh(&mut self) {
        self.a_inv = invert_spd(&self.a, self.d);
        self.theta = mat_vec_mul(&self.a_inv, &self.b, self.d, self.d);
        if has_invalid_values(&self.a_inv) || has_invalid_values(&self.theta) {
            warn!(pulls = self.pulls, "arm regression produced non-finite values");
        }
    }

    /// `xᵀA⁻¹x`
    pub fn variance(&self, x: &[f64]) -> f64 {
        dot_product(x, &mat_vec_mul(&self.a_inv, x, self.d, self.d))
    }

    /// `θᵀx`
    pub fn mean(&self, x: &[f64]) -> f64 {
        dot_product(&self.theta, x)
    }

    pub fn covariance(&self) -> &[f64] {
        &self.a
    }

    pub fn inverse(&self) -> &[f64] {
        &self.a_inv
    }

    pub fn reward_sum(&self) -> &[f64] {
        &self.b
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.theta
    }

    pub fn dimension(&self) -> usize {
        self.d
    }

    /// Samples applied to this arm
    pub fn pulls(&self) -> u64 {
        self.pulls
    }

    pub fn diagnose(&self) -> DiagnosticResult {
        diagnose_covariance(&self.a, self.d)
    }
}

pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
    if !alpha.is_finite() {
        return Err(BanditError::invalid(format!("alpha must be finite, got {alpha}")));
    }
    Ok(())
}

pub(crate) fn check_arm(arm: usize, arms: usize) -> Result<()> {
    if arm >= arms {
        return Err(BanditError::ArmOutOfRange { arm, arms });
    }
    Ok(())
}

pub(crate) fn check_finite(context: &[f64], reward: f64) -> Result<()> {
    if has_invalid_values(context) || !reward.is_finite() {
        return Err(BanditError::NonFiniteSample);
    }
    Ok(())
}

pub(crate) fn check_dimension(context: &[f64], expected: usize) -> Result<()> {
    if context.len() != expected {
        return Err(BanditError::DimensionMismatch {
            expected,
            actual: context.len(),
        });
    }
    Ok(())
}

/// LinUCB with one independent ridge regression per arm
#[derive(Debug, Clone)]
pub struct LinUcb {
    arms: Vec<ArmModel>,
    /// 探索参数
    alpha: f64,
    /// 特征维度
    d: usize,
    selector: ArmSelector,
    update_count: u64,
}

impl LinUcb {
    /// Create a model with `d` features and `n` arms, tie-breaks seeded from entropy
    pub fn new(d: usize, n: usize, alpha: f64) -> Result<Self> {
        Self::build(d, n, alpha, ArmSelector::new(), None)
    }

    /// Create a model whose tie-breaks are reproducible
    pub fn with_seed(d: usize, n: usize, alpha: f64, seed: u64) -> Result<Self> {
        Self::build(d, n, alpha, ArmSelector::with_seed(seed), Some(seed))
    }

    pub(crate) fn build(
        d: usize,
        n: usize,
        alpha: f64,
        selector: ArmSelector,
        seed: Option<u64>,
    ) -> Result<Self> {
        if d == 0 || n == 0 {
            return Err(BanditError::invalid(format!(
                "number of features and of arms must be > 0 (got d={d}, n={n})"
            )));
        }
        check_alpha(alpha)?;

        debug!(features = d, arms = n, alpha, ?seed, "created disjoint LinUCB");

        Ok(LinUcb {
            arms: (0..n).map(|_| ArmModel::new(d)).collect(),
            alpha,
            d,
            selector,
            update_count: 0,
        })
    }

    /// Payoff breakdown of every arm
    pub fn estimate(&self, context: &[f64]) -> Result<Vec<ArmEstimate>> {
        check_dimension(context, self.d)?;

        Ok(self
            .arms
            .iter()
            .map(|arm| {
                let exploitation = arm.mean(context);
                // |.| guards against tiny negative values from rounding
                let confidence = arm.variance(context).abs().sqrt();
                ArmEstimate {
                    exploitation,
                    confidence,
                    score: exploitation + self.alpha * confidence,
                }
            })
            .collect())
    }

    fn apply_sample(&mut self, context: &[f64], arm: usize, reward: f64) -> Result<()> {
        check_dimension(context, self.d)?;
        check_arm(arm, self.arms.len())?;
        check_finite(context, reward)?;

        let model = &mut self.arms[arm];
        model.accumulate(context, reward);
        model.refresh();
        self.update_count += 1;

        trace!(arm, reward, "applied disjoint sample");
        Ok(())
    }

    pub fn features(&self) -> usize {
        self.d
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
        check_alpha(alpha)?;
        self.alpha = alpha;
        Ok(())
    }

    /// Reseed the tie-break RNG
    pub fn set_seed(&mut self, seed: u64) {
        self.selector.set_seed(seed);
    }

    pub fn arm(&self, arm: usize) -> Option<&ArmModel> {
        self.arms.get(arm)
    }

    /// Total samples applied
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// 健康诊断
    pub fn diagnose(&self) -> DiagnosticResult {
        self.arms
            .iter()
            .map(ArmModel::diagnose)
            .reduce(DiagnosticResult::merge)
            .unwrap_or_else(|| diagnose_covariance(&identity(self.d), self.d))
    }
}

impl ContextualBandit for LinUcb {
    fn arms(&self) -> usize {
        self.arms.len()
    }

    fn context_dimension(&self) -> usize {
        self.d
    }

    fn predict(&self, context: &[f64]) -> Result<Vec<f64>> {
        Ok(self.estimate(context)?.into_iter().map(|e| e.score).collect())
    }

    fn select_arm(&mut self, context: &[f64]) -> Result<usize> {
        let payoffs = self.predict(context)?;
        self.selector.select(&payoffs)
    }

    fn update(&mut self, context: &[f64], arm: usize, reward: f64) -> Result<()> {
        self.apply_sample(context, arm, reward)
    }

    fn update_batch(
        &mut self,
        contexts: &[Vec<f64>],
        arms: &[usize],
        rewards: &[f64],
    ) -> Result<()> {
        check_batch_lengths(contexts.len(), arms.len(), rewards.len())?;

        for (i, ((context, &arm), &reward)) in contexts.iter().zip(arms).zip(rewards).enumerate() {
            if let Err(err) = self.apply_sample(context, arm, reward) {
                warn!(sample = i, applied = i, error = %err, "batch update aborted");
                return Err(err);
            }
        }
        Ok(())
    }
}
