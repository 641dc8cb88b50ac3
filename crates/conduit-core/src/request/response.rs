//! Provider responses

use super::Request;
use crate::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural completion
    Stop,
    /// Hit the token limit
    Length,
    /// Model asked for tool calls
    ToolCalls,
    /// Safety refusal
    ContentFilter,
    Error,
}

impl StopReason {
    /// Map a wire `finish_reason` onto the enum
    pub fn from_finish_reason(reason: &str) -> Self {
        match reason {
            "stop" | "end_turn" | "stop_sequence" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "tool_calls" | "function_call" | "tool_use" => Self::ToolCalls,
            "content_filter" | "safety" => Self::ContentFilter,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Timing, usage and stop information for one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub timestamp: DateTime<Utc>,
    /// Wall time of the provider call in milliseconds
    pub duration_ms: u64,
    /// Model that actually served the request
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub stop_reason: StopReason,
}

impl ResponseMetadata {
    pub fn new(model: impl Into<String>, stop_reason: StopReason) -> Self {
        Self {
            timestamp: Utc::now(),
            duration_ms: 0,
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            stop_reason,
        }
    }

    pub fn with_usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// The answer to a [`Request`].
///
/// Always carries the request that produced it so the cache key can be
/// recomputed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    request: Request,
    message: Message,
    metadata: ResponseMetadata,
}

impl Response {
    pub fn new(request: Request, message: Message, metadata: ResponseMetadata) -> Self {
        Self {
            request,
            message,
            metadata,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn metadata(&self) -> &ResponseMetadata {
        &self.metadata
    }

    /// Text of the returned message
    pub fn content(&self) -> String {
        self.message.text()
    }

    pub fn stop_reason(&self) -> StopReason {
        self.metadata.stop_reason
    }

    pub fn into_parts(self) -> (Request, Message, ResponseMetadata) {
        (self.request, self.message, self.metadata)
    }
}
