//! Tools the model can call during a turn

mod base;
mod registry;

pub use base::{FnTool, Tool, ToolError, ToolSpec};
pub use registry::{TOOL_ERROR_PREFIX, ToolRegistry};
