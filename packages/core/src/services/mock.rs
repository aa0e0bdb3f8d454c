//! Scriptable [`RuleSource`] for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::rules::RuleSet;
use crate::services::source::{FetchError, RuleSource};

/// Returns queued responses in order, then `fallback` forever.
///
/// With no fallback configured an exhausted mock fails every call.
pub struct MockRuleSource {
    responses: StdMutex<VecDeque<Result<RuleSet, FetchError>>>,
    fallback: Option<RuleSet>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl MockRuleSource {
    pub fn new() -> Self {
        Self {
            responses: StdMutex::new(VecDeque::new()),
            fallback: None,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answer with `rules`.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.fallback = Some(rules);
        self
    }

    /// Answer the next call with `err`.
    pub fn with_error(self, err: FetchError) -> Self {
        self.responses
            .lock()
            .expect("mock rule source lock poisoned")
            .push_back(Err(err));
        self
    }

    /// Hold every fetch until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockRuleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleSource for MockRuleSource {
    async fn fetch_rules(&self) -> Result<RuleSet, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let queued = self
            .responses
            .lock()
            .expect("mock rule source lock poisoned")
            .pop_front();

        match (queued, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(rules)) => Ok(rules.clone()),
            (None, None) => Err(FetchError::unavailable("mock rule source exhausted")),
        }
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}
