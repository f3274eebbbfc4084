//! # linucb - 线性上置信界上下文老虎机
//!
//! Online ridge regression bandits after Li, Chu, Langford and Schapire,
//! "A contextual-bandit approach to personalized news article
//! recommendation" (WWW 2010):
//!
//! - [`LinUcb`] - disjoint linear models, one regression per arm
//! - [`HybridLinUcb`] - per-arm models plus a regression shared by all arms
//! - [`ContextualBandit`] - the predict / select / update surface of both
//! - [`BanditConfig`] - JSON-loadable description that builds either one
//!
//! Models are plain single-threaded values; wrap them in a lock to share.
//!
//! ```rust
//! use linucb::{ContextualBandit, LinUcb};
//!
//! let mut bandit = LinUcb::with_seed(2, 3, 0.5, 42).unwrap();
//! let arm = bandit.select_arm(&[1.0, 0.0]).unwrap();
//! bandit.update(&[1.0, 0.0], arm, 1.0).unwrap();
//! assert_eq!(bandit.predict(&[1.0, 0.0]).unwrap().len(), 3);
//! ```

#![deny(clippy::all)]

pub mod bandit;
pub mod config;
pub mod error;
pub mod hybrid;
pub mod linucb;
pub mod matrix;
pub mod sanitize;
pub mod types;

pub use bandit::{select_max_with_ties, ArmSelector, Bandit, ContextualBandit};
pub use config::BanditConfig;
pub use error::{BanditError, Result};
pub use hybrid::HybridLinUcb;
pub use linucb::{ArmModel, LinUcb};
pub use types::*;
