//! Generator collaborator types
//!
//! The LLM that turns a task into shell commands lives outside this crate.
//! It plugs in through `CommandGenerator`; whatever it returns is treated as
//! untrusted and goes through repair and sanitization before anyone sees it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::safety::{CandidateResult, RiskLevel};

/// Placeholder used when the generator returns fewer explanations than commands
pub const EXPLANATION_PLACEHOLDER: &str = "Explanation not provided.";

/// Target operating system for generated commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    Macos,
    #[default]
    Wsl,
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOs::Linux => write!(f, "linux"),
            TargetOs::Macos => write!(f, "macos"),
            TargetOs::Wsl => write!(f, "wsl"),
        }
    }
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Natural-language task
    pub input: String,
    /// Defaults to WSL when absent
    #[serde(default)]
    pub os: Option<TargetOs>,
}

impl GenerateRequest {
    pub fn target_os(&self) -> TargetOs {
        self.os.unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.input.trim().is_empty() {
            return Err("input is required".to_string());
        }
        Ok(())
    }
}

/// Raw generator output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOutput {
    pub commands: Vec<String>,
    #[serde(default)]
    pub explanations: Vec<String>,
    /// Self-reported; never shown or used for gating
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Self-reported; never shown or used for gating
    #[serde(default)]
    pub needs_confirmation: bool,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub dry_run_commands: Vec<String>,
}

impl GeneratorOutput {
    /// Reject output with nothing to classify
    pub fn validate(&self) -> Result<(), String> {
        if self.commands.is_empty() {
            return Err("commands must contain at least one entry".to_string());
        }
        Ok(())
    }

    /// Make explanations line up one-to-one with commands
    ///
    /// Missing explanations are padded with a placeholder and extras are
    /// dropped. Commands are never touched, so repair cannot change what
    /// gets classified.
    pub fn repair(mut self) -> Self {
        let commands = self.commands.len();
        if self.explanations.len() != commands {
            tracing::debug!(
                "Repairing explanations: {} for {} commands",
                self.explanations.len(),
                commands
            );
            self.explanations
                .resize(commands, EXPLANATION_PLACEHOLDER.to_string());
        }
        self
    }

    /// The fields the classifier consumes
    pub fn candidate(&self) -> CandidateResult {
        CandidateResult {
            commands: self.commands.clone(),
            dry_run_commands: self.dry_run_commands.clone(),
            risk_level: self.risk_level,
            needs_confirmation: self.needs_confirmation,
        }
    }
}

/// Natural-language-to-shell generator
#[async_trait]
pub trait CommandGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GeneratorOutput>;
}
