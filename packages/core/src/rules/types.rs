//! Wire and storage types for detection rules.

use serde::{Deserialize, Serialize};

/// One remote-supplied detection rule.
///
/// `kind` is kept as a free string rather than an enum so that rules of a
/// kind this build does not know about still deserialize, round-trip through
/// the store unchanged, and are skipped later by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub pattern: String,
}

impl RuleRecord {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            pattern: pattern.into(),
        }
    }
}

/// Ordered collection of rules, exactly as fetched or persisted.
pub type RuleSet = Vec<RuleRecord>;

/// Compilation strategies known to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Plain substring match on the candidate bytes.
    Contains,
    /// Regular expression match on the candidate bytes.
    Regex,
}

impl RuleKind {
    /// Resolve a wire `type` tag. Returns `None` for tags this build does not know.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "contains" => Some(Self::Contains),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}
