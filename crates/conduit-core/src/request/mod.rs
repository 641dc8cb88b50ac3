//! Requests sent to providers and the responses they produce
//!
//! A [`Request`] is everything that affects model output: generation
//! parameters, the ordered prompt messages and the offered tools. Its
//! [`Request::fingerprint`] is the canonical digest the cache keys on.

mod canonical;
mod params;
mod response;

pub use canonical::canonical_json;
pub use params::GenerationParams;
pub use response::{Response, ResponseMetadata, StopReason};

use crate::error::{ConduitError, ConduitResult};
use crate::message::Message;
use crate::tools::ToolSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// Generation parameters plus the resolved prompt context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    params: GenerationParams,
    messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
}

impl Request {
    /// Build a request, validating parameters and requiring at least one message
    pub fn new(params: GenerationParams, messages: Vec<Message>) -> ConduitResult<Self> {
        params.validate()?;
        if messages.is_empty() {
            return Err(ConduitError::invalid_field(
                "messages",
                "a request needs at least one message",
            ));
        }
        Ok(Self {
            params,
            messages,
            tools: Vec::new(),
        })
    }

    /// Offer tools to the model
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.params.model
    }

    /// The message the response will reply to
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Canonical, output-relevant projection of the request.
    ///
    /// Messages contribute their payload only; identifiers, timestamps and
    /// session ownership never reach the key.
    pub fn canonical_value(&self) -> Value {
        let messages: Vec<Value> = self
            .messages
            .iter()
            .map(|m| {
                json!({
                    "role": m.role(),
                    "content": m.content(),
                    "tool_calls": m.tool_calls(),
                    "tool_call_id": m.tool_call_id(),
                    "name": m.tool_name(),
                })
            })
            .collect();

        json!({
            "params": self.params.canonical_value(),
            "messages": messages,
            "tools": self.tools,
        })
    }

    /// SHA-256 hex digest of the canonical JSON encoding
    pub fn fingerprint(&self) -> String {
        let encoded = canonical_json(&self.canonical_value());
        let digest = Sha256::digest(encoded.as_bytes());
        format!("{:x}", digest)
    }
}
