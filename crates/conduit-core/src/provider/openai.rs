//! OpenAI-compatible chat completions adapter

use super::error::{ProviderError, sanitize_error_text};
use super::ProviderAdapter;
use crate::config::ProviderConfig;
use crate::error::{ConduitError, ConduitResult};
use crate::message::{ContentPart, Message, MessageContent, ToolCall};
use crate::request::{Request, Response, ResponseMetadata, StopReason};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Adapter for any endpoint speaking the `/chat/completions` wire shape
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    config: ProviderConfig,
    http_client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: ProviderConfig) -> ConduitResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConduitError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: ProviderConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let mut request = self.http_client.post(self.endpoint()).json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        if let Some(org) = &self.config.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(status, &body, retry_after))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(skip(self, request), fields(model = %request.model()), level = "debug")]
    async fn dispatch(&self, request: &Request) -> Result<Response, ProviderError> {
        let body = build_body(request);
        let started = Instant::now();
        let response = self.send(&body).await?;

        let completion = if request.params().stream {
            collect_stream(response).await?
        } else {
            let json: Value = response.json().await.map_err(|e| {
                ProviderError::other(format!("Failed to parse {} response: {}", self.name(), e))
            })?;
            Completion::from_json(&json)?
        };

        let elapsed = started.elapsed().as_millis() as u64;
        debug!(
            "{} answered in {}ms ({:?})",
            self.name(),
            elapsed,
            completion.finish_reason
        );
        completion.into_response(request, elapsed)
    }
}

/// Wire body for a request
pub(crate) fn build_body(request: &Request) -> Value {
    let params = request.params();
    let mut body = Map::new();
    body.insert("model".into(), json!(params.model));
    body.insert(
        "messages".into(),
        Value::Array(request.messages().iter().map(message_to_wire).collect()),
    );
    if let Some(temperature) = params.temperature {
        body.insert("temperature".into(), json!(temperature));
    }
    if let Some(top_p) = params.top_p {
        body.insert("top_p".into(), json!(top_p));
    }
    if let Some(max_tokens) = params.max_tokens {
        body.insert("max_tokens".into(), json!(max_tokens));
    }
    if !params.stop.is_empty() {
        body.insert("stop".into(), json!(params.stop));
    }
    if params.stream {
        body.insert("stream".into(), json!(true));
        body.insert("stream_options".into(), json!({"include_usage": true}));
    }
    if let Some(schema) = &params.response_schema {
        body.insert(
            "response_format".into(),
            json!({
                "type": "json_schema",
                "json_schema": {"name": "response", "schema": schema},
            }),
        );
    }
    if !request.tools().is_empty() {
        let tools: Vec<Value> = request
            .tools()
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        body.insert("tools".into(), Value::Array(tools));
    }
    for (key, value) in &params.client_params {
        body.insert(key.clone(), value.clone());
    }
    Value::Object(body)
}

fn message_to_wire(message: &Message) -> Value {
    let mut wire = Map::new();
    wire.insert("role".into(), json!(message.role().as_str()));
    let content = match message.content() {
        Some(MessageContent::Text(text)) => json!(text),
        Some(MessageContent::Parts(parts)) => {
            Value::Array(parts.iter().map(part_to_wire).collect())
        }
        None => Value::Null,
    };
    wire.insert("content".into(), content);

    if message.has_tool_calls() {
        let calls: Vec<Value> = message
            .tool_calls()
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.function_name,
                        "arguments": call.arguments.to_string(),
                    }
                })
            })
            .collect();
        wire.insert("tool_calls".into(), Value::Array(calls));
    }
    if let Some(call_id) = message.tool_call_id() {
        wire.insert("tool_call_id".into(), json!(call_id));
    }
    if let Some(name) = message.tool_name() {
        wire.insert("name".into(), json!(name));
    }
    Value::Object(wire)
}

fn part_to_wire(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text { text } => json!({"type": "text", "text": text}),
        ContentPart::ImageUrl { url, detail } => json!({
            "type": "image_url",
            "image_url": {"url": url, "detail": detail},
        }),
        ContentPart::InputAudio { data, format } => json!({
            "type": "input_audio",
            "input_audio": {"data": data, "format": format},
        }),
    }
}

/// Provider output before it is bound to a request
#[derive(Debug, Default)]
pub(crate) struct Completion {
    content: Option<String>,
    reasoning: Option<String>,
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<String>,
    model: Option<String>,
    input_tokens: u32,
    output_tokens: u32,
}

impl Completion {
    pub(crate) fn from_json(json: &Value) -> Result<Self, ProviderError> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| ProviderError::other("Response contained no choices"))?;
        let message = &choice["message"];

        let tool_calls = message["tool_calls"]
            .as_array()
            .map(|calls| calls.iter().map(parse_tool_call).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            content: message["content"].as_str().map(str::to_string),
            reasoning: message["reasoning_content"].as_str().map(str::to_string),
            tool_calls,
            finish_reason: choice["finish_reason"].as_str().map(str::to_string),
            model: json["model"].as_str().map(str::to_string),
            input_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    pub(crate) fn into_response(
        self,
        request: &Request,
        duration_ms: u64,
    ) -> Result<Response, ProviderError> {
        let stop_reason = self
            .finish_reason
            .as_deref()
            .map(StopReason::from_finish_reason)
            .unwrap_or(StopReason::Stop);
        let withheld = stop_reason == StopReason::ContentFilter
            && self.tool_calls.is_empty()
            && self.content.as_deref().is_none_or(str::is_empty);
        if withheld {
            return Err(ProviderError::content_filtered(
                "Response withheld by the provider's content filter",
            ));
        }

        let message = if self.tool_calls.is_empty() {
            Message::assistant(self.content.unwrap_or_default())
        } else {
            Message::assistant_with_tool_calls(
                self.content.filter(|c| !c.is_empty()).map(MessageContent::from),
                self.tool_calls,
            )
            .map_err(|e| ProviderError::other(e.to_string()))?
        };
        let message = match self.reasoning.filter(|r| !r.is_empty()) {
            Some(reasoning) => message.with_reasoning(reasoning),
            None => message,
        };
        let message = match request.last_message() {
            Some(last) => message.with_predecessor(last.id()),
            None => message,
        };

        let metadata = ResponseMetadata::new(
            self.model.unwrap_or_else(|| request.model().to_string()),
            stop_reason,
        )
        .with_usage(self.input_tokens, self.output_tokens)
        .with_duration_ms(duration_ms);

        Ok(Response::new(request.clone(), message, metadata))
    }
}

fn parse_tool_call(call: &Value) -> Result<ToolCall, ProviderError> {
    let id = call["id"]
        .as_str()
        .ok_or_else(|| ProviderError::other("Tool call without id"))?;
    let name = call["function"]["name"]
        .as_str()
        .ok_or_else(|| ProviderError::other("Tool call without function name"))?;
    Ok(ToolCall::new(id, name, parse_arguments(&call["function"]["arguments"])))
}

fn parse_arguments(raw: &Value) -> Value {
    match raw {
        Value::String(s) if s.trim().is_empty() => json!({}),
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone())),
        Value::Null => json!({}),
        other => other.clone(),
    }
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulate a server-sent event stream into one completion
async fn collect_stream(response: reqwest::Response) -> Result<Completion, ProviderError> {
    let mut completion = Completion::default();
    let mut content = String::new();
    let mut reasoning = String::new();
    let mut partial_calls: BTreeMap<u64, PartialToolCall> = BTreeMap::new();
    let mut buffer = String::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(newline) = buffer.find('\n') {
            let line: String = buffer.drain(..=newline).collect();
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                break;
            }
            let event: Value = serde_json::from_str(data).map_err(|e| {
                ProviderError::other(format!(
                    "Invalid stream event: {} ({})",
                    e,
                    sanitize_error_text(data)
                ))
            })?;

            if let Some(model) = event["model"].as_str() {
                completion.model = Some(model.to_string());
            }
            if let Some(usage) = event.get("usage").filter(|u| u.is_object()) {
                completion.input_tokens = usage["prompt_tokens"].as_u64().unwrap_or(0) as u32;
                completion.output_tokens = usage["completion_tokens"].as_u64().unwrap_or(0) as u32;
            }
            let Some(choice) = event["choices"].get(0) else {
                continue;
            };
            let delta = &choice["delta"];
            if let Some(text) = delta["content"].as_str() {
                content.push_str(text);
            }
            if let Some(text) = delta["reasoning_content"].as_str() {
                reasoning.push_str(text);
            }
            if let Some(calls) = delta["tool_calls"].as_array() {
                for call in calls {
                    let index = call["index"].as_u64().unwrap_or(0);
                    let partial = partial_calls.entry(index).or_default();
                    if let Some(id) = call["id"].as_str() {
                        partial.id = id.to_string();
                    }
                    if let Some(name) = call["function"]["name"].as_str() {
                        partial.name.push_str(name);
                    }
                    if let Some(args) = call["function"]["arguments"].as_str() {
                        partial.arguments.push_str(args);
                    }
                }
            }
            if let Some(reason) = choice["finish_reason"].as_str() {
                completion.finish_reason = Some(reason.to_string());
            }
        }
    }

    completion.content = Some(content);
    completion.reasoning = Some(reasoning);
    completion.tool_calls = partial_calls
        .into_values()
        .map(|p| ToolCall::new(p.id, p.name, parse_arguments(&Value::String(p.arguments))))
        .collect();
    Ok(completion)
}

#[cfg(test)]
#[path = "openai_tests.rs"]
mod openai_tests;
