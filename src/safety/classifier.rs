//! Command Risk Classifier
//!
//! Evaluates a batch of shell commands against a `RuleCatalog` and produces
//! an `Assessment`: the maximum risk across the batch, whether any command is
//! hard-blocked, and the reasons behind the verdict.
//!
//! # Evaluation
//!
//! Each non-empty command is trimmed and run through four passes in a fixed
//! order:
//! 1. Hard-block rules (set `blocked`, every match recorded)
//! 2. High-risk rules (escalate to High)
//! 3. Medium-risk rules (escalate to at least Medium)
//! 4. Read-only fallback: a command that matches no read-only hint, while the
//!    batch is still Low, escalates to Medium
//!
//! # Principle: Conservative Default
//!
//! Unrecognised commands are never assumed safe.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::risk::{RiskLevel, RuleCategory};
use super::rules::{CatalogError, RuleCatalog};
use crate::metrics;

/// Reason recorded by the read-only fallback
pub const NOT_READ_ONLY_REASON: &str = "Command is not clearly read-only.";

/// Advisory appended when a risky batch carries no dry-run alternative
pub const DRY_RUN_ADVISORY: &str = "Preview changes before running any destructive command.";

/// Verdict for one batch of commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Maximum risk across all commands in the batch
    pub risk_level: RiskLevel,
    /// Whether the batch must be confirmed before running
    pub needs_confirmation: bool,
    /// Whether any command matched a hard-block rule
    pub blocked: bool,
    /// Deduplicated reasons, in first-seen order
    pub reasons: Vec<String>,
    /// Supplied dry-run commands, or the generic advisory
    pub suggested_dry_run_commands: Vec<String>,
}

/// Rule engine over an owned, immutable catalog
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    catalog: RuleCatalog,
}

impl RiskClassifier {
    /// Create a classifier over an explicit catalog
    pub fn new(catalog: RuleCatalog) -> Self {
        Self { catalog }
    }

    /// Create a classifier over the built-in policy
    pub fn with_builtin_rules() -> Result<Self, CatalogError> {
        Ok(Self::new(RuleCatalog::builtin()?))
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Evaluate a batch of commands
    ///
    /// Never fails: empty and whitespace-only commands are skipped, and an
    /// empty batch yields a Low, unblocked assessment.
    ///
    /// # Examples
    ///
    /// ```
    /// use nl2bash_guard::safety::{RiskClassifier, RiskLevel};
    ///
    /// let classifier = RiskClassifier::with_builtin_rules().unwrap();
    ///
    /// let listing = classifier.evaluate(&["ls -la"], &[] as &[&str]);
    /// assert_eq!(listing.risk_level, RiskLevel::Low);
    ///
    /// let wipe = classifier.evaluate(&["rm -rf /"], &[] as &[&str]);
    /// assert!(wipe.blocked);
    /// ```
    pub fn evaluate<C, D>(&self, commands: &[C], dry_run_commands: &[D]) -> Assessment
    where
        C: AsRef<str>,
        D: AsRef<str>,
    {
        let started = Instant::now();
        let mut risk_level = RiskLevel::Low;
        let mut blocked = false;
        let mut reasons: Vec<String> = Vec::new();

        let mut record = |reason: &str| {
            if !reasons.iter().any(|r| r == reason) {
                reasons.push(reason.to_string());
            }
        };

        for command in commands {
            let trimmed = command.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }

            for rule in self.catalog.rules(RuleCategory::HardBlock) {
                if rule.is_match(trimmed) {
                    blocked = true;
                    metrics::record_rule_match(RuleCategory::HardBlock);
                    record(rule.reason());
                }
            }

            for category in [RuleCategory::HighRisk, RuleCategory::MediumRisk] {
                for rule in self.catalog.rules(category) {
                    if rule.is_match(trimmed) {
                        if let Some(level) = category.escalates_to() {
                            risk_level = risk_level.escalate(level);
                        }
                        metrics::record_rule_match(category);
                        record(rule.reason());
                    }
                }
            }

            let looks_read_only = self
                .catalog
                .rules(RuleCategory::ReadOnlyHint)
                .iter()
                .any(|hint| hint.is_match(trimmed));
            if !looks_read_only && risk_level == RiskLevel::Low {
                risk_level = RiskLevel::Medium;
                record(NOT_READ_ONLY_REASON);
            }
        }

        let mut suggested_dry_run_commands: Vec<String> = dry_run_commands
            .iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        if risk_level.requires_confirmation() && suggested_dry_run_commands.is_empty() {
            suggested_dry_run_commands.push(DRY_RUN_ADVISORY.to_string());
        }

        let assessment = Assessment {
            risk_level,
            needs_confirmation: risk_level.requires_confirmation(),
            blocked,
            reasons,
            suggested_dry_run_commands,
        };

        if assessment.blocked {
            warn!(
                "Blocked command batch ({} commands): {}",
                commands.len(),
                assessment.reasons.join(" ")
            );
        } else {
            debug!(
                "Assessed {} commands: risk={}, reasons={}",
                commands.len(),
                assessment.risk_level,
                assessment.reasons.len()
            );
        }
        metrics::record_assessment(&assessment, started.elapsed());

        assessment
    }
}
