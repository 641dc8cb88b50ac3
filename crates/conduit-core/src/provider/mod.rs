//! Provider boundary
//!
//! A [`ProviderAdapter`] turns a [`Request`] into a [`Response`] for one vendor
//! API. Adapters report failures through the provider-neutral
//! [`ProviderError`] taxonomy and never retry on their own.

mod error;
mod openai;

pub use error::{ProviderError, sanitize_error_text};
pub use openai::OpenAiCompatibleProvider;

use crate::request::{Request, Response};
use async_trait::async_trait;

/// Dispatches requests to a model provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name used in logs and events
    fn name(&self) -> &str;

    /// Obtain one complete response for the request
    async fn dispatch(&self, request: &Request) -> Result<Response, ProviderError>;
}
