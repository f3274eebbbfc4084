use serde::{Deserialize, Serialize};

use crate::bandit::{ArmSelector, Bandit};
use crate::error::{BanditError, Result};
use crate::hybrid::HybridLinUcb;
use crate::linucb::LinUcb;
use crate::types::DEFAULT_ALPHA;

/// Model description, loadable from JSON.
///
/// `shared_features` selects the variant: absent builds a disjoint model,
/// present builds a hybrid one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditConfig {
    /// Private features per arm (`d`)
    pub features: usize,
    /// Shared features (`k`), hybrid only
    #[serde(default)]
    pub shared_features: Option<usize>,
    /// Number of arms (`n`)
    pub arms: usize,
    /// Exploration weight
    #[serde(default)]
    pub alpha: Option<f64>,
    /// Tie-break seed; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl BanditConfig {
    pub fn disjoint(features: usize, arms: usize) -> Self {
        Self {
            features,
            shared_features: None,
            arms,
            alpha: None,
            seed: None,
        }
    }

    pub fn hybrid(features: usize, shared_features: usize, arms: usize) -> Self {
        Self {
            shared_features: Some(shared_features),
            ..Self::disjoint(features, arms)
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: BanditConfig = serde_json::from_str(json)
            .map_err(|err| BanditError::invalid(format!("malformed bandit config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn alpha_or_default(&self) -> f64 {
        self.alpha.unwrap_or(DEFAULT_ALPHA)
    }

    pub fn validate(&self) -> Result<()> {
        if self.features == 0 {
            return Err(BanditError::invalid("features must be > 0"));
        }
        if self.arms == 0 {
            return Err(BanditError::invalid("arms must be > 0"));
        }
        if self.shared_features == Some(0) {
            return Err(BanditError::invalid(
                "shared_features must be > 0 when set; omit it for a disjoint model",
            ));
        }
        if !self.alpha_or_default().is_finite() {
            return Err(BanditError::invalid("alpha must be finite"));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Bandit> {
        self.validate()?;
        let alpha = self.alpha_or_default();
        let selector = ArmSelector::from_seed_option(self.seed);

        match self.shared_features {
            None => LinUcb::build(self.features, self.arms, alpha, selector, self.seed)
                .map(Bandit::from),
            Some(k) => HybridLinUcb::build(self.features, k, self.arms, alpha, selector, self.seed)
                .map(Bandit::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::ContextualBandit;

    #[test]
    fn parses_disjoint_config_with_defaults() {
        let config = BanditConfig::from_json(r#"{"features": 3, "arms": 4}"#).unwrap();
        assert_eq!(config, BanditConfig::disjoint(3, 4));
        assert_eq!(config.alpha_or_default(), DEFAULT_ALPHA);

        let bandit = config.build().unwrap();
        assert!(!bandit.is_hybrid());
        assert_eq!(bandit.arms(), 4);
        assert_eq!(bandit.context_dimension(), 3);
    }

    #[test]
    fn parses_hybrid_config() {
        let json = r#"{"features": 4, "shared_features": 2, "arms": 3, "alpha": 0.5, "seed": 7}"#;
        let config = BanditConfig::from_json(json).unwrap();
        assert_eq!(
            config,
            BanditConfig::hybrid(4, 2, 3).with_alpha(0.5).with_seed(7)
        );

        let bandit = config.build().unwrap();
        let hybrid = bandit.as_hybrid().unwrap();
        assert_eq!(hybrid.shared_features(), 2);
        assert_eq!(hybrid.alpha(), 0.5);
        assert_eq!(bandit.context_dimension(), 6);
    }

    #[test]
    fn rejects_zero_shared_features() {
        let err = BanditConfig::from_json(r#"{"features": 2, "shared_features": 0, "arms": 2}"#)
            .unwrap_err();
        assert!(matches!(err, BanditError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_zero_arms_and_features() {
        assert!(BanditConfig::disjoint(0, 2).build().is_err());
        assert!(BanditConfig::disjoint(2, 0).build().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = BanditConfig::from_json(r#"{"features": -1, "arms": 2}"#).unwrap_err();
        assert!(matches!(err, BanditError::InvalidConfiguration(_)));
    }

    #[test]
    fn seeded_configs_break_ties_identically() {
        let config = BanditConfig::disjoint(2, 5).with_seed(11);
        let mut first = config.build().unwrap();
        let mut second = config.build().unwrap();
        for _ in 0..25 {
            assert_eq!(
                first.select_arm(&[1.0, 0.0]).unwrap(),
                second.select_arm(&[1.0, 0.0]).unwrap()
            );
        }
    }
}
