//! Prompt templates with strict variable checking

mod template;

pub use template::{Prompt, RenderError};
