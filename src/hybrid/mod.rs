//! LinUCB with hybrid linear models.
//!
//! Context vectors are `[z, x]`: `k` shared features `z` whose effect `β` is
//! common to all arms, followed by `d` private features `x` with a per-arm
//! effect `θ_a`. The private state reuses [`ArmModel`]; the joint estimate
//! adds
//!
//! - `A0 = I + Σ (z zᵀ) − Σ_a B_aᵀ A_a⁻¹ B_a` (k×k)
//! - `b0 = Σ r z − Σ_a B_aᵀ A_a⁻¹ b_a` (k)
//! - `B_a = Σ x zᵀ` per arm (d×k)
//! - `β = A0⁻¹ b0`
//!
//! Each sample refreshes every arm's inverse, so an update costs `n`
//! inversions against one for the disjoint model.

use tracing::{debug, trace, warn};

use crate::bandit::{check_batch_lengths, ArmSelector, ContextualBandit};
use crate::error::{BanditError, Result};
use crate::linucb::{check_alpha, check_arm, check_dimension, check_finite, ArmModel};
use crate::matrix::*;
use crate::sanitize::diagnose_covariance;
use crate::types::{ArmEstimate, DiagnosticResult};

/// LinUCB with per-arm private models plus one regression shared by all arms
#[derive(Debug, Clone)]
pub struct HybridLinUcb {
    arms: Vec<ArmModel>,
    /// B_a = Σ x z^T (d×k, 行优先), one per arm
    cross: Vec<Vec<f64>>,
    a0: Vec<f64>,
    a0_inv: Vec<f64>,
    b0: Vec<f64>,
    beta: Vec<f64>,
    alpha: f64,
    /// private features
    d: usize,
    /// shared features
    k: usize,
    selector: ArmSelector,
    update_count: u64,
}

impl HybridLinUcb {
    /// `d` private features, `k` shared features, `n` arms
    pub fn new(d: usize, k: usize, n: usize, alpha: f64) -> Result<Self> {
        Self::build(d, k, n, alpha, ArmSelector::new(), None)
    }

    pub fn with_seed(d: usize, k: usize, n: usize, alpha: f64, seed: u64) -> Result<Self> {
        Self::build(d, k, n, alpha, ArmSelector::with_seed(seed), Some(seed))
    }

    pub(crate) fn build(
        d: usize,
        k: usize,
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
        if k == 0 {
            return Err(BanditError::invalid(
                "number of shared features must be > 0; use the disjoint model without shared features",
            ));
        }
        check_alpha(alpha)?;

        debug!(
            features = d,
            shared_features = k,
            arms = n,
            alpha,
            ?seed,
            "created hybrid LinUCB"
        );

        Ok(HybridLinUcb {
            arms: (0..n).map(|_| ArmModel::new(d)).collect(),
            cross: vec![vec![0.0; d * k]; n],
            a0: identity(k),
            a0_inv: identity(k),
            b0: vec![0.0; k],
            beta: vec![0.0; k],
            alpha,
            d,
            k,
            selector,
            update_count: 0,
        })
    }

    /// Payoff breakdown of every arm for a combined `[shared, private]` context
    pub fn estimate(&self, context: &[f64]) -> Result<Vec<ArmEstimate>> {
        check_dimension(context, self.k + self.d)?;
        let (z, x) = context.split_at(self.k);
        Ok(self.estimate_parts(z, x))
    }

    /// Payoffs with the shared and private parts passed separately
    pub fn predict_split(&self, shared: &[f64], private: &[f64]) -> Result<Vec<f64>> {
        check_dimension(shared, self.k)?;
        check_dimension(private, self.d)?;
        Ok(self
            .estimate_parts(shared, private)
            .into_iter()
            .map(|e| e.score)
            .collect())
    }

    fn estimate_parts(&self, z: &[f64], x: &[f64]) -> Vec<ArmEstimate> {
        let (d, k) = (self.d, self.k);
        let a0_inv_z = mat_vec_mul(&self.a0_inv, z, k, k);
        let shared_variance = dot_product(z, &a0_inv_z);
        let shared_mean = dot_product(z, &self.beta);

        self.arms
            .iter()
            .zip(&self.cross)
            .map(|(arm, b_a)| {
                let a_inv_x = mat_vec_mul(arm.inverse(), x, d, d);
                // B_a^T A_a^{-1} x (k)
                let bt_a_inv_x = mat_t_vec_mul(b_a, &a_inv_x, d, k);

                let s = shared_variance - 2.0 * dot_product(&a0_inv_z, &bt_a_inv_x)
                    + dot_product(x, &a_inv_x)
                    + dot_product(&bt_a_inv_x, &mat_vec_mul(&self.a0_inv, &bt_a_inv_x, k, k));

                let exploitation = shared_mean + arm.mean(x);
                let confidence = s.abs().sqrt();
                // No exploration bonus while the shared estimate is exactly zero.
                let score = if shared_mean != 0.0 {
                    exploitation + self.alpha * confidence
                } else {
                    exploitation
                };

                ArmEstimate {
                    exploitation,
                    confidence,
                    score,
                }
            })
            .collect()
    }

    /// `B_aᵀ A_a⁻¹ B_a` and `B_aᵀ A_a⁻¹ b_a` for the arm's current inverse
    fn shared_contribution(&self, arm: usize) -> (Vec<f64>, Vec<f64>) {
        let (d, k) = (self.d, self.k);
        let model = &self.arms[arm];
        let b_a = &self.cross[arm];

        let a_inv_b = mat_mul(model.inverse(), b_a, d, d, k);
        let bt_a_inv_b = transpose_mul(b_a, &a_inv_b, d, k, k);
        // A^{-1} b = θ
        let bt_theta = mat_t_vec_mul(b_a, model.coefficients(), d, k);
        (bt_a_inv_b, bt_theta)
    }

    fn apply_sample(&mut self, context: &[f64], arm: usize, reward: f64) -> Result<()> {
        check_dimension(context, self.k + self.d)?;
        check_arm(arm, self.arms.len())?;
        check_finite(context, reward)?;
        let (z, x) = context.split_at(self.k);

        // Fold out the arm's old contribution.
        let (old_matrix, old_vector) = self.shared_contribution(arm);
        vec_add_scaled(&mut self.a0, &old_matrix, 1.0);
        vec_add_scaled(&mut self.b0, &old_vector, 1.0);

        self.arms[arm].accumulate(x, reward);
        outer_add(&mut self.cross[arm], x, z);

        // Fold in the new contribution against the refreshed inverse.
        self.arms[arm].refresh();
        let (new_matrix, new_vector) = self.shared_contribution(arm);
        rank1_update_matrix(&mut self.a0, z);
        vec_add_scaled(&mut self.a0, &new_matrix, -1.0);
        vec_add_scaled(&mut self.b0, z, reward);
        vec_add_scaled(&mut self.b0, &new_vector, -1.0);

        for (j, model) in self.arms.iter_mut().enumerate() {
            if j != arm {
                model.refresh();
            }
        }

        self.a0_inv = invert_spd(&self.a0, self.k);
        self.beta = mat_vec_mul(&self.a0_inv, &self.b0, self.k, self.k);
        self.update_count += 1;

        trace!(arm, reward, "applied hybrid sample");
        Ok(())
    }

    pub fn features(&self) -> usize {
        self.d
    }

    pub fn shared_features(&self) -> usize {
        self.k
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
        check_alpha(alpha)?;
        self.alpha = alpha;
        Ok(())
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.selector.set_seed(seed);
    }

    /// Private-feature state of one arm
    pub fn arm(&self, arm: usize) -> Option<&ArmModel> {
        self.arms.get(arm)
    }

    /// `B_a` (d×k, row-major)
    pub fn cross_covariance(&self, arm: usize) -> Option<&[f64]> {
        self.cross.get(arm).map(Vec::as_slice)
    }

    /// `A0` (k×k)
    pub fn shared_covariance(&self) -> &[f64] {
        &self.a0
    }

    pub fn shared_inverse(&self) -> &[f64] {
        &self.a0_inv
    }

    /// `b0`
    pub fn shared_reward(&self) -> &[f64] {
        &self.b0
    }

    /// `β`
    pub fn shared_coefficients(&self) -> &[f64] {
        &self.beta
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// 健康诊断, covering every arm and the shared accumulator
    pub fn diagnose(&self) -> DiagnosticResult {
        self.arms
            .iter()
            .map(ArmModel::diagnose)
            .fold(diagnose_covariance(&self.a0, self.k), DiagnosticResult::merge)
    }
}

impl ContextualBandit for HybridLinUcb {
    fn arms(&self) -> usize {
        self.arms.len()
    }

    fn context_dimension(&self) -> usize {
        self.k + self.d
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
