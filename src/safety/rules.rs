//! Rule Catalog
//!
//! Rules are data: a `(category, name, pattern, reason)` tuple compiled into a
//! case-insensitive regex. The built-in table below is the canonical policy;
//! deployments may append their own rules from config.
//!
//! # Reconciled scoring rules
//!
//! The rows after the core HighRisk and MediumRisk entries (`power`,
//! `block-device`, `fsck`, `chgrp`, `system-path-write`, `remote-copy`,
//! `command-chain`) carry the signals of the older additive point-scoring
//! heuristic as named, explainable rules.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::risk::RuleCategory;

/// Error types for building a rule catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Rule '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule '{0}' has an empty pattern")]
    EmptyPattern(String),

    #[error("Rule '{0}' has an empty reason")]
    EmptyReason(String),

    #[error("Rule name '{0}' is defined more than once")]
    DuplicateName(String),
}

/// Uncompiled rule definition, as written in the built-in table or config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Category the rule is evaluated in
    pub category: RuleCategory,
    /// Short unique identifier
    pub name: String,
    /// Regex source; read-only hints are anchored automatically
    pub pattern: String,
    /// Human-readable reason reported when the rule matches
    #[serde(default)]
    pub reason: String,
}

impl RuleSpec {
    pub fn new(category: RuleCategory, name: &str, pattern: &str, reason: &str) -> Self {
        Self {
            category,
            name: name.to_string(),
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

const BUILTIN_RULES: &[(RuleCategory, &str, &str, &str)] = &[
    // Hard blocks: never surfaced, even with confirmation
    (
        RuleCategory::HardBlock,
        "root-delete",
        // Any recursive flag, then `/`, `/*` or a quoted form of either
        concat!(
            r"\brm\s+(?:-{1,2}[\w-]+\s+)*(?:-[a-z]*r[a-z]*|--recursive)\s+",
            r#"(?:-{1,2}[\w-]+\s+)*["']?/\*?["']?(?:$|[\s;&|])"#,
        ),
        "Refuses deleting the root directory.",
    ),
    (
        RuleCategory::HardBlock,
        "mkfs",
        r"\bmkfs(?:\.\w+)?\b",
        "Refuses filesystem formatting commands.",
    ),
    (
        RuleCategory::HardBlock,
        "dd-overwrite",
        r"\bdd\s+if=",
        "Refuses raw disk overwrite commands (dd).",
    ),
    (
        RuleCategory::HardBlock,
        "fork-bomb",
        r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
        "Refuses fork bomb.",
    ),
    (
        RuleCategory::HardBlock,
        "curl-pipe-shell",
        r"\bcurl\b.*\|\s*(?:sh|bash)\b",
        "Refuses piping remote scripts to a shell.",
    ),
    (
        RuleCategory::HardBlock,
        "wget-pipe-shell",
        r"\bwget\b.*\|\s*(?:sh|bash)\b",
        "Refuses piping remote scripts to a shell.",
    ),
    // High risk
    (RuleCategory::HighRisk, "sudo", r"\bsudo\b", "Uses sudo."),
    (RuleCategory::HighRisk, "rm", r"\brm\b", "Deletes files."),
    (RuleCategory::HighRisk, "chown", r"\bchown\b", "Changes file ownership."),
    (RuleCategory::HighRisk, "chmod", r"\bchmod\b", "Changes file permissions."),
    (RuleCategory::HighRisk, "mv", r"\bmv\b", "Moves/overwrites files."),
    // `2>&1` duplicates a descriptor and is not a file write
    (
        RuleCategory::HighRisk,
        "redirect",
        r">>?\s*[^\s&|>]",
        "Overwrites file contents via redirection.",
    ),
    (RuleCategory::HighRisk, "tee-etc", r"\btee\b.*/etc/", "Writes into /etc."),
    (
        RuleCategory::HighRisk,
        "power",
        r"\b(?:shutdown|reboot|halt|poweroff)\b",
        "Shuts down or reboots the machine.",
    ),
    (
        RuleCategory::HighRisk,
        "block-device",
        r"/dev/(?:sd[a-z]|hd[a-z]|nvme\d|mmcblk\d|disk\d)",
        "Targets a raw block device.",
    ),
    (
        RuleCategory::HighRisk,
        "fsck",
        r"\bfsck(?:\.\w+)?\b",
        "Checks or repairs a filesystem.",
    ),
    (RuleCategory::HighRisk, "chgrp", r"\bchgrp\b", "Changes file group ownership."),
    (
        RuleCategory::HighRisk,
        "system-path-write",
        r"(?:>>?\s*|\b(?:cp|mv|tee|ln|install)\b.*\s)/(?:etc|root|boot|sys|proc)\b",
        "Writes into a system directory.",
    ),
    // Medium risk
    (
        RuleCategory::MediumRisk,
        "sed-in-place",
        r"\bsed\b.*\s-i\b",
        "In-place edits with sed.",
    ),
    (RuleCategory::MediumRisk, "truncate", r"\btruncate\b", "Truncates files."),
    (
        RuleCategory::MediumRisk,
        "tar-delete",
        r"\btar\b.*\s--delete\b",
        "Deletes entries from an archive.",
    ),
    (
        RuleCategory::MediumRisk,
        "remote-copy",
        r"\b(?:rsync|scp)\b",
        "Copies files to or from another location.",
    ),
    (
        RuleCategory::MediumRisk,
        "command-chain",
        r"(?:[|&;].*){4}",
        "Chains several commands together.",
    ),
    // Read-only hints, anchored at the start of the command
    (
        RuleCategory::ReadOnlyHint,
        "basic-info",
        r"(?:ls|pwd|whoami|id|date|uname)\b",
        "Lists files or reports identity and system information.",
    ),
    (
        RuleCategory::ReadOnlyHint,
        "file-view",
        r"(?:cat|head|tail|less|more)\b",
        "Prints file contents.",
    ),
    (
        RuleCategory::ReadOnlyHint,
        "search",
        r"(?:grep|rg|find)\b",
        "Searches files.",
    ),
    (
        RuleCategory::ReadOnlyHint,
        "system-stats",
        r"(?:du|df|ps|top|htop)\b",
        "Reports disk and process usage.",
    ),
    (
        RuleCategory::ReadOnlyHint,
        "git-read",
        r"git\s+(?:status|log|diff|show)\b",
        "Inspects git history or working tree.",
    ),
];

/// A compiled, immutable policy rule
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    category: RuleCategory,
    pattern: Regex,
    reason: String,
}

impl Rule {
    /// Compile a rule definition
    ///
    /// Patterns are case-insensitive. Read-only hints are anchored at the
    /// start of the command (after optional whitespace).
    pub fn compile(spec: &RuleSpec) -> Result<Self, CatalogError> {
        if spec.pattern.trim().is_empty() {
            return Err(CatalogError::EmptyPattern(spec.name.clone()));
        }
        if spec.reason.trim().is_empty() && spec.category != RuleCategory::ReadOnlyHint {
            return Err(CatalogError::EmptyReason(spec.name.clone()));
        }

        let source = match spec.category {
            RuleCategory::ReadOnlyHint if !spec.pattern.starts_with('^') => {
                format!(r"^\s*(?:{})", spec.pattern)
            }
            _ => spec.pattern.clone(),
        };

        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|source| CatalogError::InvalidPattern {
                name: spec.name.clone(),
                source,
            })?;

        Ok(Self {
            name: spec.name.clone(),
            category: spec.category,
            pattern,
            reason: spec.reason.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> RuleCategory {
        self.category
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Compiled pattern source, including any anchoring
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Test the rule against an already-trimmed command
    pub fn is_match(&self, command: &str) -> bool {
        self.pattern.is_match(command)
    }
}

/// Immutable set of rules grouped by category
///
/// Built once at startup and owned by the classifier. Cloning is cheap
/// enough for tests that need a variant catalog.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    hard_block: Vec<Rule>,
    high_risk: Vec<Rule>,
    medium_risk: Vec<Rule>,
    read_only_hints: Vec<Rule>,
}

impl RuleCatalog {
    /// Catalog with no rules; every non-empty command falls back to Medium
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile the built-in policy
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a built-in pattern fails to compile. This is
    /// a startup failure, never a per-request one.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_specs(Self::builtin_specs())
    }

    /// The built-in rule definitions, uncompiled
    pub fn builtin_specs() -> Vec<RuleSpec> {
        BUILTIN_RULES
            .iter()
            .map(|(category, name, pattern, reason)| {
                RuleSpec::new(*category, name, pattern, reason)
            })
            .collect()
    }

    /// Compile a catalog from rule definitions
    pub fn from_specs<I>(specs: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = RuleSpec>,
    {
        let mut catalog = Self::empty();
        catalog.extend(specs)?;
        Ok(catalog)
    }

    /// Append more rule definitions, keeping names unique
    pub fn extend<I>(&mut self, specs: I) -> Result<(), CatalogError>
    where
        I: IntoIterator<Item = RuleSpec>,
    {
        let mut names: HashSet<String> = self.iter().map(|r| r.name().to_string()).collect();

        for spec in specs {
            if !names.insert(spec.name.clone()) {
                return Err(CatalogError::DuplicateName(spec.name));
            }
            let rule = Rule::compile(&spec)?;
            self.bucket_mut(rule.category()).push(rule);
        }

        Ok(())
    }

    /// Rules of one category, in declaration order
    pub fn rules(&self, category: RuleCategory) -> &[Rule] {
        match category {
            RuleCategory::HardBlock => &self.hard_block,
            RuleCategory::HighRisk => &self.high_risk,
            RuleCategory::MediumRisk => &self.medium_risk,
            RuleCategory::ReadOnlyHint => &self.read_only_hints,
        }
    }

    /// All rules, in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        RuleCategory::ALL
            .into_iter()
            .flat_map(move |category| self.rules(category).iter())
    }

    /// Look up a rule by name
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.iter().find(|rule| rule.name() == name)
    }

    pub fn len(&self) -> usize {
        self.hard_block.len()
            + self.high_risk.len()
            + self.medium_risk.len()
            + self.read_only_hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, category: RuleCategory) -> &mut Vec<Rule> {
        match category {
            RuleCategory::HardBlock => &mut self.hard_block,
            RuleCategory::HighRisk => &mut self.high_risk,
            RuleCategory::MediumRisk => &mut self.medium_risk,
            RuleCategory::ReadOnlyHint => &mut self.read_only_hints,
        }
    }
}
