//! Provider-agnostic generation parameters

use crate::error::{ConduitError, ConduitResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Knobs that affect model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model identifier
    pub model: String,
    /// Sampling temperature, 0.0..=2.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling, 0.0..=1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum output tokens, at least 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    #[serde(default)]
    pub stream: bool,
    /// JSON schema for structured output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// Provider-specific passthrough options
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub client_params: Map<String, Value>,
}

impl GenerationParams {
    /// Create params for a model with everything else unset
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: Vec::new(),
            stream: false,
            response_schema: None,
            client_params: Map::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_client_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.client_params.insert(key.into(), value);
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> ConduitResult<()> {
        if self.model.trim().is_empty() {
            return Err(ConduitError::invalid_field("model", "model must not be empty"));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConduitError::invalid_field(
                    "temperature",
                    format!("temperature {} outside 0.0..=2.0", t),
                ));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConduitError::invalid_field(
                    "top_p",
                    format!("top_p {} outside 0.0..=1.0", p),
                ));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(ConduitError::invalid_field(
                "max_tokens",
                "max_tokens must be at least 1",
            ));
        }
        Ok(())
    }

    /// Every field as JSON, absent values included as null
    pub(crate) fn canonical_value(&self) -> Value {
        serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "top_p": self.top_p,
            "max_tokens": self.max_tokens,
            "stop": self.stop,
            "stream": self.stream,
            "response_schema": self.response_schema,
            "client_params": self.client_params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ranges() {
        assert!(GenerationParams::new("m").with_temperature(2.0).validate().is_ok());
        assert!(GenerationParams::new("m").with_temperature(2.1).validate().is_err());
        assert!(GenerationParams::new("m").with_top_p(-0.1).validate().is_err());
        assert!(GenerationParams::new("m").with_max_tokens(0).validate().is_err());
        assert!(GenerationParams::new(" ").validate().is_err());
    }

    #[test]
    fn test_serde_omits_unset_fields() {
        let json = serde_json::to_value(GenerationParams::new("gpt")).unwrap();
        assert_eq!(json, serde_json::json!({"model": "gpt", "stream": false}));
    }
}
