//! Prompt template implementation
//!
//! Templates use `{{ name }}` placeholders. Rendering is strict: every
//! placeholder needs a value and every supplied value needs a placeholder.

use crate::error::ConduitError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder pattern is valid"));

/// A prompt template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    template: String,
    variables: Vec<String>,
}

impl Prompt {
    /// Create a template and collect its placeholders in order of first use
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut seen = BTreeSet::new();
        let variables = PLACEHOLDER
            .captures_iter(&template)
            .map(|cap| cap[1].to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        Self {
            template,
            variables,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// JSON schema of the expected inputs: one required string per placeholder
    pub fn input_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .variables
            .iter()
            .map(|name| (name.clone(), json!({ "type": "string" })))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.variables,
            "additionalProperties": false,
        })
    }

    /// Render with a value map
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, RenderError> {
        if let Some(extra) = values
            .keys()
            .filter(|key| !self.variables.contains(key))
            .min()
        {
            return Err(RenderError::UnexpectedVariable(extra.clone()));
        }
        if let Some(missing) = self.variables.iter().find(|v| !values.contains_key(*v)) {
            return Err(RenderError::MissingVariable(missing.clone()));
        }

        Ok(PLACEHOLDER
            .replace_all(&self.template, |cap: &regex::Captures<'_>| {
                values.get(&cap[1]).cloned().unwrap_or_default()
            })
            .into_owned())
    }

    /// Render with name/value pairs
    pub fn render_pairs(&self, values: &[(&str, &str)]) -> Result<String, RenderError> {
        let map = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.render(&map)
    }
}

/// Template rendering errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("missing template variable: {0}")]
    MissingVariable(String),

    #[error("unexpected template variable: {0}")]
    UnexpectedVariable(String),
}

impl From<RenderError> for ConduitError {
    fn from(error: RenderError) -> Self {
        ConduitError::invalid_field("prompt", error.to_string())
    }
}
