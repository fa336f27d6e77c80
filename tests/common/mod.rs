// tests/common/mod.rs — Mock oracles shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use promptsmith::infra::errors::PromptsmithError;
use promptsmith::oracle::Oracle;

fn unavailable() -> PromptsmithError {
    PromptsmithError::OracleUnavailable {
        oracle: "mock".into(),
        message: "connection refused".into(),
    }
}

/// Replies from a fixed queue, in order. `None` entries and an empty queue
/// answer with `OracleUnavailable`.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<String>>,
    calls: AtomicU32,
}

impl ScriptedOracle {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = Option<S>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(Into::into)).collect()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        })
    }

    /// Every call fails.
    pub fn unreachable() -> Arc<Self> {
        Self::new(Vec::<Option<String>>::new())
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn transform(&self, request: &str) -> Result<String, PromptsmithError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            _ => Err(unavailable()),
        }
    }
}

type Responder = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Answers each request through a closure; `None` means unavailable.
pub struct FnOracle {
    respond: Box<Responder>,
    calls: AtomicU32,
}

impl FnOracle {
    pub fn new(respond: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for FnOracle {
    fn id(&self) -> &str {
        "fn"
    }

    async fn transform(&self, request: &str) -> Result<String, PromptsmithError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(request).ok_or_else(unavailable)
    }
}

/// Critique JSON the way a well-behaved oracle would send it.
pub fn critique_json(score: f32, advice: bool) -> String {
    format!(
        "```json\n{{\"overall_score\": {score}, \"clarity\": {score}, \"effectiveness\": {score}, \
         \"completeness\": {score}, \"improvements\": [\"Add an output format\"], \
         \"concerns\": [\"Audience unclear\"], \"continuation_advice\": {advice}}}\n```"
    )
}

pub fn is_critique_request(request: &str) -> bool {
    request.contains("\"continuation_advice\"")
}

pub fn is_analysis_request(request: &str) -> bool {
    request.contains("\"missing_constraints\"")
}

/// The prompt text embedded in a layer request.
pub fn layer_prompt(request: &str) -> &str {
    let (_, rest) = request.split_once("# Prompt\n\n").unwrap_or(("", request));
    rest.rsplit_once("\n\nKeep everything")
        .map(|(text, _)| text)
        .unwrap_or(rest)
}

/// Name of the layer a request targets, from its title line.
pub fn layer_title(request: &str) -> &str {
    request
        .lines()
        .next()
        .and_then(|l| l.strip_prefix("# Enhancement: "))
        .unwrap_or("")
}
