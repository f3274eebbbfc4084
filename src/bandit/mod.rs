//! Common bandit surface shared by the disjoint and hybrid models.
//!
//! - [`ContextualBandit`]: predict / select / update capability set
//! - [`ArmSelector`]: argmax with uniform random tie-breaking over a seedable RNG
//! - [`Bandit`]: either model behind one value, as built from a config

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::error::{BanditError, Result};
use crate::hybrid::HybridLinUcb;
use crate::linucb::LinUcb;

/// Pick the arm with the highest payoff.
///
/// Arms whose payoff equals the running maximum exactly are collected and
/// one of them is drawn uniformly with `rng`. NaN payoffs are never viable.
pub fn select_max_with_ties<R: Rng + ?Sized>(payoffs: &[f64], rng: &mut R) -> Result<usize> {
    let mut max_payoff = f64::NEG_INFINITY;
    let mut viable: Vec<usize> = Vec::new();

    for (arm, &payoff) in payoffs.iter().enumerate() {
        if payoff > max_payoff {
            max_payoff = payoff;
            viable.clear();
            viable.push(arm);
        } else if payoff == max_payoff {
            viable.push(arm);
        }
    }

    match viable.len() {
        0 => Err(BanditError::NoViableArm),
        1 => Ok(viable[0]),
        len => Ok(viable[rng.gen_range(0..len)]),
    }
}

/// Tie-breaking arm selector owning its random source
#[derive(Debug, Clone)]
pub struct ArmSelector {
    rng: ChaCha8Rng,
}

impl ArmSelector {
    /// Selector seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Selector with a fixed seed (reproducible tie-breaks)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn select(&mut self, payoffs: &[f64]) -> Result<usize> {
        select_max_with_ties(payoffs, &mut self.rng)
    }
}

impl Default for ArmSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Predict / select / update capability set of a LinUCB model.
pub trait ContextualBandit {
    /// Number of arms
    fn arms(&self) -> usize;

    /// Required context length
    fn context_dimension(&self) -> usize;

    /// Upper confidence bound payoff of every arm for `context`
    fn predict(&self, context: &[f64]) -> Result<Vec<f64>>;

    /// Arm with the highest payoff, ties broken by the model's own RNG
    fn select_arm(&mut self, context: &[f64]) -> Result<usize>;

    /// Apply one observed reward
    fn update(&mut self, context: &[f64], arm: usize, reward: f64) -> Result<()>;

    /// Apply observed rewards in order.
    ///
    /// Fails with `LengthMismatch` before touching state when the three
    /// slices differ in length. A sample that fails validation aborts the
    /// batch; samples before it stay applied.
    fn update_batch(&mut self, contexts: &[Vec<f64>], arms: &[usize], rewards: &[f64])
        -> Result<()>;

    /// Like [`select_arm`](Self::select_arm) but with a caller-supplied RNG
    fn select_arm_with<R: Rng + ?Sized>(&self, context: &[f64], rng: &mut R) -> Result<usize>
    where
        Self: Sized,
    {
        let payoffs = self.predict(context)?;
        select_max_with_ties(&payoffs, rng)
    }
}

/// Batch shape check shared by both models
pub(crate) fn check_batch_lengths(contexts: usize, arms: usize, rewards: usize) -> Result<()> {
    if contexts != arms || contexts != rewards {
        return Err(BanditError::LengthMismatch {
            contexts,
            arms,
            rewards,
        });
    }
    Ok(())
}

/// Either LinUCB variant behind one value
#[derive(Debug, Clone)]
pub enum Bandit {
    Disjoint(LinUcb),
    Hybrid(HybridLinUcb),
}

impl Bandit {
    pub fn is_hybrid(&self) -> bool {
        matches!(self, Bandit::Hybrid(_))
    }

    pub fn as_disjoint(&self) -> Option<&LinUcb> {
        match self {
            Bandit::Disjoint(model) => Some(model),
            Bandit::Hybrid(_) => None,
        }
    }

    pub fn as_hybrid(&self) -> Option<&HybridLinUcb> {
        match self {
            Bandit::Hybrid(model) => Some(model),
            Bandit::Disjoint(_) => None,
        }
    }
}

impl From<LinUcb> for Bandit {
    fn from(model: LinUcb) -> Self {
        Bandit::Disjoint(model)
    }
}

impl From<HybridLinUcb> for Bandit {
    fn from(model: HybridLinUcb) -> Self {
        Bandit::Hybrid(model)
    }
}

impl ContextualBandit for Bandit {
    fn arms(&self) -> usize {
        match self {
            Bandit::Disjoint(model) => model.arms(),
            Bandit::Hybrid(model) => model.arms(),
        }
    }

    fn context_dimension(&self) -> usize {
        match self {
            Bandit::Disjoint(model) => model.context_dimension(),
            Bandit::Hybrid(model) => model.context_dimension(),
        }
    }

    fn predict(&self, context: &[f64]) -> Result<Vec<f64>> {
        match self {
            Bandit::Disjoint(model) => model.predict(context),
            Bandit::Hybrid(model) => model.predict(context),
        }
    }

    fn select_arm(&mut self, context: &[f64]) -> Result<usize> {
        match self {
            Bandit::Disjoint(model) => model.select_arm(context),
            Bandit::Hybrid(model) => model.select_arm(context),
        }
    }

    fn update(&mut self, context: &[f64], arm: usize, reward: f64) -> Result<()> {
        match self {
            Bandit::Disjoint(model) => model.update(context, arm, reward),
            Bandit::Hybrid(model) => model.update(context, arm, reward),
        }
    }

    fn update_batch(
        &mut self,
        contexts: &[Vec<f64>],
        arms: &[usize],
        rewards: &[f64],
    ) -> Result<()> {
        match self {
            Bandit::Disjoint(model) => model.update_batch(contexts, arms, rewards),
            Bandit::Hybrid(model) => model.update_batch(contexts, arms, rewards),
        }
    }
}
