//! Risk levels and rule categories
//!
//! Every verdict produced by the classifier is expressed with these two
//! enums. `RiskLevel` is totally ordered so signals combine with `max`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk level of a command batch
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Recognised read-only command, safe to show and run
    #[default]
    Low = 0,
    /// Unrecognised or mildly mutating command, needs confirmation
    Medium = 1,
    /// Destructive or privileged command, needs confirmation
    High = 2,
}

impl RiskLevel {
    /// Combine two signals, keeping the most severe
    pub fn escalate(self, other: RiskLevel) -> RiskLevel {
        self.max(other)
    }

    /// Whether a command at this level must be confirmed before running
    pub fn requires_confirmation(self) -> bool {
        self != RiskLevel::Low
    }

    /// Three-level badge label used by presentation layers
    pub fn badge(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Category a rule belongs to, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// Never surfaced, even with confirmation
    HardBlock,
    /// Escalates to High
    HighRisk,
    /// Escalates to at least Medium
    MediumRisk,
    /// Anchored read-only pattern; only suppresses the unknown-command fallback
    ReadOnlyHint,
}

impl RuleCategory {
    /// All categories in the order the engine evaluates them
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::HardBlock,
        RuleCategory::HighRisk,
        RuleCategory::MediumRisk,
        RuleCategory::ReadOnlyHint,
    ];

    /// Risk level a match in this category escalates to, if any
    pub fn escalates_to(self) -> Option<RiskLevel> {
        match self {
            RuleCategory::HighRisk => Some(RiskLevel::High),
            RuleCategory::MediumRisk => Some(RiskLevel::Medium),
            // Hard blocks set `blocked` instead of raising the level
            RuleCategory::HardBlock | RuleCategory::ReadOnlyHint => None,
        }
    }

    /// Snake-case name, used for config keys and metric labels
    pub fn as_str(self) -> &'static str {
        match self {
            RuleCategory::HardBlock => "hard_block",
            RuleCategory::HighRisk => "high_risk",
            RuleCategory::MediumRisk => "medium_risk",
            RuleCategory::ReadOnlyHint => "read_only_hint",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::HardBlock => write!(f, "HardBlock"),
            RuleCategory::HighRisk => write!(f, "HighRisk"),
            RuleCategory::MediumRisk => write!(f, "MediumRisk"),
            RuleCategory::ReadOnlyHint => write!(f, "ReadOnlyHint"),
        }
    }
}

const CATEGORY_NAMES: &str = "hard_block, high_risk, medium_risk, read_only_hint";

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "hard_block" | "hardblock" => Ok(RuleCategory::HardBlock),
            "high_risk" | "highrisk" | "high" => Ok(RuleCategory::HighRisk),
            "medium_risk" | "mediumrisk" | "medium" => Ok(RuleCategory::MediumRisk),
            "read_only_hint" | "readonlyhint" | "read_only" => Ok(RuleCategory::ReadOnlyHint),
            other => Err(format!(
                "Unknown rule category '{}'. Must be one of: {}",
                other, CATEGORY_NAMES
            )),
        }
    }
}
