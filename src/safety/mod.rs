//! Command Safety Module
//!
//! Policy engine deciding whether generated shell commands are safe, need
//! confirmation, or must be refused.
//!
//! Low risk (shown and runnable):
//! - Listing, viewing and searching files
//! - Read-only git inspection
//!
//! Needs confirmation (Medium/High):
//! - Deleting, moving or overwriting files
//! - Privilege escalation, permission changes
//! - Anything not recognisably read-only
//!
//! Refused (hard block):
//! - Formatting or overwriting disks, deleting `/`
//! - Fork bombs, piping downloads into a shell
//!
//! The flow is two explicit stages: raw generator output goes through the
//! `Sanitizer`, which asks the `RiskClassifier` for an `Assessment`, and only
//! the resulting `SanitizedResult` may be shown to a user.

pub mod classifier;
pub mod risk;
pub mod rules;
pub mod sanitizer;

#[cfg(test)]
mod proptests;

pub use classifier::{Assessment, RiskClassifier, DRY_RUN_ADVISORY, NOT_READ_ONLY_REASON};
pub use risk::{RiskLevel, RuleCategory};
pub use rules::{CatalogError, Rule, RuleCatalog, RuleSpec};
pub use sanitizer::{CandidateResult, SanitizedResult, Sanitizer};
