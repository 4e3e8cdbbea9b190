//! Response shaping for sanitized generator output
//!
//! A blocked batch becomes a refusal: no commands, no explanations, risk
//! forced to High and the matched reasons attached. Anything else is returned
//! with the recomputed risk and the full assessment for the client to render.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::generator::GeneratorOutput;
use crate::safety::{Assessment, RiskLevel, Sanitizer};

pub const BLOCKED_MESSAGE: &str = "Blocked potentially dangerous command generation.";

/// Refusal for a hard-blocked batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedResponse {
    pub error: String,
    pub blocked: bool,
    pub reasons: Vec<String>,
    pub commands: Vec<String>,
    pub explanations: Vec<String>,
    pub risk_level: RiskLevel,
    pub needs_confirmation: bool,
    pub assumptions: Vec<String>,
    pub dry_run_commands: Vec<String>,
}

/// Generator output with the authoritative verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedResponse {
    pub commands: Vec<String>,
    pub explanations: Vec<String>,
    pub risk_level: RiskLevel,
    pub needs_confirmation: bool,
    pub assumptions: Vec<String>,
    pub dry_run_commands: Vec<String>,
    pub safety: Assessment,
}

/// What the boundary sends back for one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BoundaryResponse {
    Blocked(BlockedResponse),
    Assessed(AssessedResponse),
}

impl BoundaryResponse {
    /// Repair, sanitize and shape generator output
    pub fn from_output(output: GeneratorOutput, sanitizer: &Sanitizer) -> Self {
        let output = output.repair();
        let sanitized = sanitizer.sanitize(output.candidate());

        if sanitized.is_blocked() {
            // The sanitizer already reports a refusal as High
            let risk_level = sanitized.risk_level();
            let needs_confirmation = sanitized.needs_confirmation();
            return BoundaryResponse::Blocked(BlockedResponse {
                error: BLOCKED_MESSAGE.to_string(),
                blocked: true,
                reasons: sanitized.into_safety().reasons,
                commands: Vec::new(),
                explanations: Vec::new(),
                risk_level,
                needs_confirmation,
                assumptions: output.assumptions,
                dry_run_commands: Vec::new(),
            });
        }

        BoundaryResponse::Assessed(AssessedResponse {
            commands: output.commands,
            explanations: output.explanations,
            risk_level: sanitized.risk_level(),
            needs_confirmation: sanitized.needs_confirmation(),
            assumptions: output.assumptions,
            dry_run_commands: output.dry_run_commands,
            safety: sanitized.into_safety(),
        })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, BoundaryResponse::Blocked(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BoundaryResponse::Blocked(_) => StatusCode::BAD_REQUEST,
            BoundaryResponse::Assessed(_) => StatusCode::OK,
        }
    }
}

impl IntoResponse for BoundaryResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
