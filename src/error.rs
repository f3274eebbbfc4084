use thiserror::Error;

pub type Result<T> = std::result::Result<T, BanditError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BanditError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("context dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("batch length mismatch: {contexts} contexts, {arms} arms, {rewards} rewards")]
    LengthMismatch {
        contexts: usize,
        arms: usize,
        rewards: usize,
    },
    #[error("sample contains NaN or infinite values")]
    NonFiniteSample,
    #[error("arm {arm} out of range (model has {arms} arms)")]
    ArmOutOfRange { arm: usize, arms: usize },
    /// Internal invariant violation: no payoff was comparable.
    #[error("no viable arm")]
    NoViableArm,
}

impl BanditError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        BanditError::InvalidConfiguration(reason.into())
    }
}
