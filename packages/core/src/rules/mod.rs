//! Detection rules
//!
//! Rule records as served by the remote rules API, the detectors compiled
//! from them, and the compiler that sits between the two.

pub mod compiler;
pub mod detector;
pub mod error;
pub mod types;

pub use compiler::{compile, compile_rule_set};
pub use detector::{detect_any, Detector, Snapshot};
pub use error::CompileError;
pub use types::{RuleKind, RuleRecord, RuleSet};
