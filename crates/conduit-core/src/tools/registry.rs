//! Tool registry for managing available tools

use super::base::{Tool, ToolError, ToolSpec};
use crate::message::{Message, ToolCall};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of tool results that report a failure back to the model
pub const TOOL_ERROR_PREFIX: &str = "Tool execution error";

/// Registry for managing available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Builder-style registration
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Specs of all tools, sorted by name so requests stay deterministic
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool call and wrap the outcome as a tool message replying to
    /// `predecessor`.
    ///
    /// Failures never propagate: an unknown tool or a failing call becomes a
    /// tool message starting with [`TOOL_ERROR_PREFIX`], so the model can
    /// react to it.
    pub async fn execute(&self, call: &ToolCall, predecessor: &Message) -> Message {
        let outcome = match self.tools.get(&call.function_name) {
            Some(tool) => tool.call(&call.arguments).await,
            None => Err(ToolError::NotFound(call.function_name.clone())),
        };

        let content = match outcome {
            Ok(output) => {
                debug!("Tool {} ({}) succeeded", call.function_name, call.id);
                output
            }
            Err(e) => {
                warn!("Tool {} ({}) failed: {}", call.function_name, call.id, e);
                format!("{}: {}", TOOL_ERROR_PREFIX, e)
            }
        };

        Message::tool_result(call.id.clone(), Some(call.function_name.clone()), content)
            .reply_to(predecessor)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
