//! Sanitizer: the trust boundary for generator output
//!
//! The generator reports its own risk label, but that label is never used.
//! `Sanitizer::sanitize` turns an untrusted `CandidateResult` into a
//! `SanitizedResult` whose risk fields come only from the rule engine.
//! `SanitizedResult` has no public constructor, so holding one proves the
//! classifier ran.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::classifier::{Assessment, RiskClassifier};
use super::risk::RiskLevel;

/// Raw generator output, before classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub commands: Vec<String>,
    #[serde(default)]
    pub dry_run_commands: Vec<String>,
    /// Claimed by the generator; ignored
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Claimed by the generator; ignored
    #[serde(default)]
    pub needs_confirmation: bool,
}

/// Candidate overlaid with the authoritative verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedResult {
    commands: Vec<String>,
    dry_run_commands: Vec<String>,
    risk_level: RiskLevel,
    needs_confirmation: bool,
    safety: Assessment,
}

impl SanitizedResult {
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn dry_run_commands(&self) -> &[String] {
        &self.dry_run_commands
    }

    /// Recomputed risk level
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Recomputed confirmation requirement
    pub fn needs_confirmation(&self) -> bool {
        self.needs_confirmation
    }

    pub fn is_blocked(&self) -> bool {
        self.safety.blocked
    }

    /// Full assessment, including `blocked` and `reasons`
    pub fn safety(&self) -> &Assessment {
        &self.safety
    }

    pub fn into_safety(self) -> Assessment {
        self.safety
    }

    /// Assessment as it should be shown to a user
    ///
    /// Same as `safety()` with the top-level risk and confirmation overlaid,
    /// so a refusal never reads as Low.
    pub fn verdict(&self) -> Assessment {
        Assessment {
            risk_level: self.risk_level,
            needs_confirmation: self.needs_confirmation,
            ..self.safety.clone()
        }
    }
}

/// Re-derives risk for generator output
#[derive(Debug, Clone)]
pub struct Sanitizer {
    classifier: Arc<RiskClassifier>,
}

impl Sanitizer {
    pub fn new(classifier: Arc<RiskClassifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    /// Recompute risk from the raw commands, discarding the claimed label
    pub fn sanitize(&self, candidate: CandidateResult) -> SanitizedResult {
        let safety = self
            .classifier
            .evaluate(&candidate.commands, &candidate.dry_run_commands);

        if candidate.risk_level != safety.risk_level {
            tracing::debug!(
                "Generator claimed {} risk, classifier computed {}",
                candidate.risk_level,
                safety.risk_level
            );
        }

        // A refusal is always presented as maximally unsafe, whatever the
        // non-blocking rules computed
        let (risk_level, needs_confirmation) = if safety.blocked {
            (RiskLevel::High, true)
        } else {
            (safety.risk_level, safety.needs_confirmation)
        };

        SanitizedResult {
            commands: candidate.commands,
            dry_run_commands: candidate.dry_run_commands,
            risk_level,
            needs_confirmation,
            safety,
        }
    }
}
