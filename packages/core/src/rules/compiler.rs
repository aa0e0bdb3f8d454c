//! Rule compilation.
//!
//! [`compile`] turns one [`RuleRecord`] into a [`Detector`]. [`compile_rule_set`]
//! applies the batch policy: rules of an unknown kind are skipped so that
//! new kinds can be introduced server-side without breaking older builds,
//! every other failure is collected and fails the whole batch.

use regex::bytes::Regex;

use crate::rules::detector::{ContainsDetector, Detector, RegexDetector};
use crate::rules::error::CompileError;
use crate::rules::types::{RuleKind, RuleRecord};

/// Compile a single rule.
pub fn compile(record: &RuleRecord) -> Result<Detector, CompileError> {
    let kind = RuleKind::from_tag(&record.kind)
        .ok_or_else(|| CompileError::unknown_kind(&record.name, &record.kind))?;

    if record.pattern.is_empty() {
        return Err(CompileError::malformed(&record.name, "empty pattern"));
    }

    match kind {
        RuleKind::Contains => Ok(Detector::Contains(ContainsDetector::new(
            record.pattern.as_bytes(),
        ))),
        RuleKind::Regex => {
            let regex = Regex::new(&record.pattern).map_err(|err| {
                CompileError::malformed(
                    &record.name,
                    format!("{:?} regexp compile: {}", record.pattern, err),
                )
            })?;
            Ok(Detector::Regex(RegexDetector::new(regex)))
        }
    }
}

/// Compile every rule in `rules`, all or nothing.
///
/// Returns the detectors in rule order, or a [`CompileError::Batch`] holding
/// every non-recoverable failure. No partial list is ever returned.
pub fn compile_rule_set(rules: &[RuleRecord]) -> Result<Vec<Detector>, CompileError> {
    let mut detectors = Vec::with_capacity(rules.len());
    let mut failures = Vec::new();

    for record in rules {
        match compile(record) {
            Ok(detector) => detectors.push(detector),
            Err(err) if err.is_unknown_kind() => {
                tracing::debug!(
                    name = %record.name,
                    kind = %record.kind,
                    "Skipping rule of unknown type"
                );
            }
            Err(err) => failures.push(err),
        }
    }

    if !failures.is_empty() {
        return Err(CompileError::Batch { failures });
    }
    Ok(detectors)
}
