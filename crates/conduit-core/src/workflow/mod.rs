//! Named workflow steps with telemetry attached at registration
//!
//! Every step registered into a [`StepRegistry`] is wrapped once in an
//! instrumented adapter that opens a tracing span, times the call and appends
//! a [`StepRecord`]. Callers run steps by name.

use crate::error::{ConduitError, ConduitResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info_span, warn};

/// One unit of work taking and producing JSON
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, input: Value) -> ConduitResult<Value>;
}

/// Adapter turning an async closure into a [`Step`]
pub struct FnStep<F> {
    f: F,
}

impl<F> FnStep<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Step for FnStep<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = ConduitResult<Value>> + Send,
{
    async fn run(&self, input: Value) -> ConduitResult<Value> {
        (self.f)(input).await
    }
}

/// Outcome of one step execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct InstrumentedStep {
    name: String,
    inner: Arc<dyn Step>,
    records: Arc<Mutex<Vec<StepRecord>>>,
}

#[async_trait]
impl Step for InstrumentedStep {
    async fn run(&self, input: Value) -> ConduitResult<Value> {
        let span = info_span!("step", name = %self.name);
        let started_at = Utc::now();
        let clock = Instant::now();

        let result = self.inner.run(input).instrument(span).await;

        let duration_ms = clock.elapsed().as_millis() as u64;
        let error = result.as_ref().err().map(ToString::to_string);
        match &error {
            None => debug!("Step {} finished in {}ms", self.name, duration_ms),
            Some(e) => warn!("Step {} failed after {}ms: {}", self.name, duration_ms, e),
        }
        self.records.lock().push(StepRecord {
            name: self.name.clone(),
            started_at,
            duration_ms,
            success: error.is_none(),
            error,
        });
        result
    }
}

/// Steps by name, each instrumented once when registered
#[derive(Default)]
pub struct StepRegistry {
    steps: HashMap<String, Arc<dyn Step>>,
    records: Arc<Mutex<Vec<StepRecord>>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, step: impl Step + 'static) {
        let name = name.into();
        let instrumented = InstrumentedStep {
            name: name.clone(),
            inner: Arc::new(step),
            records: self.records.clone(),
        };
        self.steps.insert(name, Arc::new(instrumented));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.steps.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn run(&self, name: &str, input: Value) -> ConduitResult<Value> {
        let step = self
            .steps
            .get(name)
            .cloned()
            .ok_or_else(|| ConduitError::invalid_field("step", format!("Unknown step '{}'", name)))?;
        step.run(input).await
    }

    /// Run steps in order, feeding each output into the next
    pub async fn run_pipeline(&self, names: &[&str], input: Value) -> ConduitResult<Value> {
        let mut value = input;
        for name in names {
            value = self.run(name, value).await?;
        }
        Ok(value)
    }

    pub fn records(&self) -> Vec<StepRecord> {
        self.records.lock().clone()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("steps", &self.names())
            .field("records", &self.records.lock().len())
            .finish()
    }
}
