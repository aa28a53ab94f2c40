//! Risk Classification Module
//!
//! Pure severity tiering over per-category risk probabilities:
//! - categories: the known wire category keys and display helpers
//! - classifier: the deterministic score → verdict mapping

pub mod categories;
pub mod classifier;

pub use categories::{split_key, SAFE_CATEGORY};
pub use classifier::{classify, RiskVector, Severity, Verdict};
