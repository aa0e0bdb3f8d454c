//! Compiled detectors.

use std::sync::Arc;

use regex::bytes::Regex;

/// A compiled, immutable classifier built from one rule.
#[derive(Debug, Clone)]
pub enum Detector {
    Contains(ContainsDetector),
    Regex(RegexDetector),
}

impl Detector {
    /// Returns `true` when `content` matches this detector.
    pub fn detect(&self, content: &[u8]) -> bool {
        match self {
            Detector::Contains(d) => d.detect(content),
            Detector::Regex(d) => d.detect(content),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContainsDetector {
    pattern: Vec<u8>,
}

impl ContainsDetector {
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// An empty pattern is contained in every input.
    pub fn detect(&self, content: &[u8]) -> bool {
        if self.pattern.is_empty() {
            return true;
        }
        if self.pattern.len() > content.len() {
            return false;
        }
        content
            .windows(self.pattern.len())
            .any(|window| window == self.pattern.as_slice())
    }
}

#[derive(Debug, Clone)]
pub struct RegexDetector {
    regex: Regex,
}

impl RegexDetector {
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }

    pub fn detect(&self, content: &[u8]) -> bool {
        self.regex.is_match(content)
    }
}

/// The complete set of detectors handed out to readers.
///
/// Cloning is a reference-count bump; the detectors behind it never change.
pub type Snapshot = Arc<[Detector]>;

/// Returns `true` when any detector in `detectors` matches `content`.
pub fn detect_any(detectors: &[Detector], content: &[u8]) -> bool {
    detectors.iter().any(|d| d.detect(content))
}
