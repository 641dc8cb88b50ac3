//! Orchestrator tests against a mocked provider

use super::*;
use crate::cache::{ConduitCache, ResponseCache};
use crate::conversation::Conversation;
use crate::error::{ConduitError, ConduitResult};
use crate::events::{ProgressEvent, RecordingDisplay};
use crate::message::{Message, Role, ToolCall};
use crate::provider::{MockProviderAdapter, ProviderError};
use crate::recovery::RetryConfig;
use crate::repository::{
    ConversationRepository, ConversationSummary, MemoryRepository, PersistenceMode,
};
use crate::request::{GenerationParams, Request, Response, ResponseMetadata, StopReason};
use crate::tools::{FnTool, ToolRegistry};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn answer(request: &Request, text: &str) -> Response {
    Response::new(
        request.clone(),
        Message::assistant(text),
        ResponseMetadata::new(request.model(), StopReason::Stop).with_usage(10, 2),
    )
}

fn echo_provider() -> MockProviderAdapter {
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().returning(|request| {
        let last = request.last_message().map(Message::text).unwrap_or_default();
        Ok(answer(request, &format!("echo: {}", last)))
    });
    provider
}

fn options() -> ConduitOptions {
    ConduitOptions::new("test", GenerationParams::new("test-model").with_temperature(0.0))
        .with_system_prompt("You are terse.")
        .with_retry(
            RetryConfig::default()
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(2))
                .with_jitter(false),
        )
}

struct Harness {
    conduit: Conduit,
    display: Arc<RecordingDisplay>,
    repository: Arc<MemoryRepository>,
}

fn harness(provider: MockProviderAdapter, configure: impl FnOnce(ConduitOptions) -> ConduitOptions) -> Harness {
    let display = Arc::new(RecordingDisplay::new());
    let repository = Arc::new(MemoryRepository::new("test"));
    let cache: Arc<dyn ResponseCache> = Arc::new(ConduitCache::in_memory("test", 32));
    let options = configure(
        options()
            .with_display(display.clone())
            .with_cache(Some(cache))
            .with_repository(Some(repository.clone())),
    );
    Harness {
        conduit: Conduit::new(Arc::new(provider), options),
        display,
        repository,
    }
}

#[tokio::test]
async fn test_turn_registers_and_persists() {
    let h = harness(echo_provider(), |o| o);
    let mut conversation = h.conduit.fresh_conversation(None);

    let outcome = h
        .conduit
        .run_turn(&mut conversation, "hello", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.content(), "echo: hello");
    assert!(!outcome.from_cache);
    assert!(outcome.persisted);
    assert_eq!(conversation.view().unwrap().roles(), "SUA");
    assert_eq!(conversation.leaf(), Some(outcome.response.message().id()));

    let stored = h.repository.load(conversation.id(), None).await.unwrap().unwrap();
    assert_eq!(stored.len(), 3);

    let events = h.display.events();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { input_tokens: 10, .. })));
}

#[tokio::test]
async fn test_history_is_sent_with_each_turn() {
    let mut provider = MockProviderAdapter::new();
    let sizes = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = sizes.clone();
    provider.expect_dispatch().returning(move |request| {
        seen.lock().push(request.messages().len());
        Ok(answer(request, "ok"))
    });
    let h = harness(provider, |o| o.with_use_cache(false));
    let mut conversation = h.conduit.fresh_conversation(None);
    let cancel = CancellationToken::new();

    h.conduit.run_turn(&mut conversation, "one", &cancel).await.unwrap();
    h.conduit.run_turn(&mut conversation, "two", &cancel).await.unwrap();

    assert_eq!(*sizes.lock(), vec![2, 4]);
    assert_eq!(conversation.view().unwrap().roles(), "SUAUA");
}

#[tokio::test]
async fn test_without_history_only_system_and_new_message_are_sent() {
    let mut provider = MockProviderAdapter::new();
    provider
        .expect_dispatch()
        .withf(|request| request.messages().len() == 2)
        .times(2)
        .returning(|request| Ok(answer(request, "ok")));
    let h = harness(provider, |o| o.with_use_cache(false).with_include_history(false));
    let mut conversation = h.conduit.fresh_conversation(None);
    let cancel = CancellationToken::new();

    h.conduit.run_turn(&mut conversation, "one", &cancel).await.unwrap();
    h.conduit.run_turn(&mut conversation, "two", &cancel).await.unwrap();
    assert_eq!(conversation.len(), 5);
}

#[tokio::test]
async fn test_identical_request_is_served_from_cache() {
    let mut provider = MockProviderAdapter::new();
    provider
        .expect_dispatch()
        .times(1)
        .returning(|request| Ok(answer(request, "Paris")));
    let h = harness(provider, |o| o);
    let cancel = CancellationToken::new();

    let first = h.conduit.query("Capital of France?", &cancel).await.unwrap();
    let second = h.conduit.query("Capital of France?", &cancel).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(second.content(), "Paris");
    assert_ne!(first.conversation_id, second.conversation_id);
    assert_ne!(first.response.message().id(), second.response.message().id());

    let replayed = h.repository.load(&second.conversation_id, None).await.unwrap().unwrap();
    let view = replayed.view().unwrap();
    assert_eq!(view.roles(), "SUA");
    assert_eq!(
        view.last().unwrap().predecessor_id(),
        Some(view.messages()[1].id())
    );
    assert!(h
        .display
        .events()
        .iter()
        .any(|e| matches!(e, ProgressEvent::CacheHit { .. })));
}

#[tokio::test]
async fn test_provider_failure_leaves_conversation_untouched() {
    let mut provider = MockProviderAdapter::new();
    provider
        .expect_dispatch()
        .times(1)
        .returning(|_| Err(ProviderError::authentication("bad key")));
    let h = harness(provider, |o| o);
    let mut conversation = h.conduit.fresh_conversation(None);
    let before = conversation.len();

    let err = h
        .conduit
        .run_turn(&mut conversation, "hello", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ConduitError::Provider(ProviderError::Authentication { .. })));
    assert_eq!(conversation.len(), before);
    assert!(h.repository.list(None).await.unwrap().is_empty());
    assert!(matches!(h.display.events().last(), Some(ProgressEvent::Failed { .. })));
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().times(3).returning(move |request| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(ProviderError::transient("connection reset"))
        } else {
            Ok(answer(request, "finally"))
        }
    });
    let h = harness(provider, |o| o);

    let outcome = h
        .conduit
        .query("anyone there?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.content(), "finally");
    let retries = h
        .display
        .events()
        .into_iter()
        .filter(|e| matches!(e, ProgressEvent::Retrying { .. }))
        .count();
    assert_eq!(retries, 2);
}

#[tokio::test]
async fn test_cancelled_turn_registers_nothing() {
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().times(0);
    let h = harness(provider, |o| o);
    let mut conversation = h.conduit.fresh_conversation(None);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h
        .conduit
        .run_turn(&mut conversation, "hello", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ConduitError::Cancelled));
    assert_eq!(conversation.view().unwrap().roles(), "S");
}

#[tokio::test]
async fn test_tool_calls_are_executed_and_answered() {
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().times(2).returning(|request| {
        let last = request.last_message().cloned().unwrap();
        if last.role() == Role::Tool {
            Ok(answer(request, &format!("The sum is {}", last.text())))
        } else {
            let call = ToolCall::new("call_1", "add", json!({"a": 2, "b": 3}));
            let message = Message::assistant_with_tool_calls(None, vec![call]).unwrap();
            Ok(Response::new(
                request.clone(),
                message,
                ResponseMetadata::new(request.model(), StopReason::ToolCalls),
            ))
        }
    });
    let tools = ToolRegistry::new().with_tool(Arc::new(FnTool::new("add", "Add two numbers", |args| {
        let a = args["a"].as_i64().unwrap_or(0);
        let b = args["b"].as_i64().unwrap_or(0);
        Ok((a + b).to_string())
    })));
    let h = harness(provider, |o| o.with_tools(Arc::new(tools)).with_use_cache(false));
    let mut conversation = h.conduit.fresh_conversation(None);

    let outcome = h
        .conduit
        .run_turn(&mut conversation, "2 + 3?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.tool_rounds, 1);
    assert_eq!(outcome.content(), "The sum is 5");
    assert_eq!(conversation.view().unwrap().roles(), "SUATA");
}

#[tokio::test]
async fn test_tool_round_limit() {
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().times(2).returning(|request| {
        let call = ToolCall::new("again", "missing_tool", json!({}));
        Ok(Response::new(
            request.clone(),
            Message::assistant_with_tool_calls(None, vec![call]).unwrap(),
            ResponseMetadata::new(request.model(), StopReason::ToolCalls),
        ))
    });
    let h = harness(provider, |o| {
        o.with_tools(Arc::new(ToolRegistry::new().with_tool(Arc::new(FnTool::new(
            "noop",
            "Does nothing",
            |_| Ok(String::new()),
        )))))
        .with_max_tool_rounds(1)
        .with_use_cache(false)
    });
    let mut conversation = h.conduit.fresh_conversation(None);

    let outcome = h
        .conduit
        .run_turn(&mut conversation, "loop", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.tool_rounds, 1);
    assert!(outcome.response.message().has_tool_calls());
    let tool_reply = conversation
        .view()
        .unwrap()
        .messages()
        .iter()
        .find(|m| m.role() == Role::Tool)
        .map(|m| m.text())
        .unwrap();
    assert!(tool_reply.starts_with(crate::tools::TOOL_ERROR_PREFIX));
}

fn two_tool_calls(request: &Request) -> Response {
    let calls = vec![
        ToolCall::new("call_1", "add", json!({"a": 1, "b": 2})),
        ToolCall::new("call_2", "add", json!({"a": 3, "b": 4})),
    ];
    Response::new(
        request.clone(),
        Message::assistant_with_tool_calls(None, calls).unwrap(),
        ResponseMetadata::new(request.model(), StopReason::ToolCalls),
    )
}

#[tokio::test]
async fn test_failure_after_tool_round_leaves_conversation_untouched() {
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().times(2).returning(|request| {
        match request.last_message().map(Message::role) {
            Some(Role::Tool) => Err(ProviderError::authentication("key revoked")),
            _ => Ok(two_tool_calls(request)),
        }
    });
    let tools = ToolRegistry::new().with_tool(Arc::new(FnTool::new("add", "Add", |_| {
        Ok("sum".to_string())
    })));
    let h = harness(provider, |o| o.with_tools(Arc::new(tools)).with_use_cache(false));
    let mut conversation = h.conduit.fresh_conversation(None);
    let before = conversation.len();

    let err = h
        .conduit
        .run_turn(&mut conversation, "add things", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ConduitError::Provider(ProviderError::Authentication { .. })));
    assert_eq!(conversation.len(), before);
    assert_eq!(conversation.view().unwrap().roles(), "S");
    assert!(h.repository.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_between_tool_calls_leaves_conversation_untouched() {
    let mut provider = MockProviderAdapter::new();
    provider
        .expect_dispatch()
        .times(1)
        .returning(|request| Ok(two_tool_calls(request)));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let tools = ToolRegistry::new().with_tool(Arc::new(FnTool::new("add", "Add", move |_| {
        trigger.cancel();
        Ok("sum".to_string())
    })));
    let h = harness(provider, |o| o.with_tools(Arc::new(tools)).with_use_cache(false));
    let mut conversation = h.conduit.fresh_conversation(None);

    let err = h
        .conduit
        .run_turn(&mut conversation, "add things", &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, ConduitError::Cancelled));
    assert_eq!(conversation.view().unwrap().roles(), "S");
    assert_eq!(conversation.len(), 1);
}

struct BrokenRepository;

#[async_trait]
impl ConversationRepository for BrokenRepository {
    fn project(&self) -> &str {
        "broken"
    }
    async fn load(&self, _: &str, _: Option<&str>) -> ConduitResult<Option<Conversation>> {
        Ok(None)
    }
    async fn load_by_name(&self, _: &str) -> ConduitResult<Option<Conversation>> {
        Ok(None)
    }
    async fn save(&self, _: &Conversation, _: Option<&str>) -> ConduitResult<()> {
        Err(ConduitError::persistence("disk full"))
    }
    async fn list(&self, _: Option<usize>) -> ConduitResult<Vec<ConversationSummary>> {
        Ok(Vec::new())
    }
    async fn load_all(&self) -> ConduitResult<Vec<Conversation>> {
        Ok(Vec::new())
    }
    async fn remove(&self, _: &str) -> ConduitResult<bool> {
        Ok(false)
    }
    async fn wipe(&self) -> ConduitResult<usize> {
        Ok(0)
    }
    async fn last(&self) -> ConduitResult<Option<Conversation>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_persistence_failure_degrades() {
    let h = harness(echo_provider(), |o| o.with_repository(Some(Arc::new(BrokenRepository))));
    let mut conversation = h.conduit.fresh_conversation(None);

    let outcome = h
        .conduit
        .run_turn(&mut conversation, "still works?", &CancellationToken::new())
        .await
        .unwrap();
    assert!(!outcome.persisted);
    assert_eq!(conversation.view().unwrap().roles(), "SUA");
}

#[tokio::test]
async fn test_chat_mode_generates_title() {
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().returning(|request| {
        let text = request.last_message().map(Message::text).unwrap_or_default();
        if text.starts_with("Generate a concise title") {
            Ok(answer(request, "\"Tulip Planting For Beginners\""))
        } else {
            Ok(answer(request, "Plant them in autumn."))
        }
    });
    let h = harness(provider, |o| o.with_persistence_mode(PersistenceMode::Chat));
    let mut conversation = h.conduit.open(PersistenceMode::Chat, None).await.unwrap();

    h.conduit
        .run_turn(&mut conversation, "How do I plant tulips?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(conversation.title(), Some("Tulip Planting For Beginners"));
    assert_eq!(conversation.view().unwrap().roles(), "SUA");
    let listed = h.repository.list(None).await.unwrap();
    assert_eq!(listed[0].title.as_deref(), Some("Tulip Planting For Beginners"));
}

#[tokio::test]
async fn test_chat_mode_title_falls_back_to_first_user_message() {
    let mut provider = MockProviderAdapter::new();
    provider.expect_dispatch().returning(|request| {
        let text = request.last_message().map(Message::text).unwrap_or_default();
        if text.starts_with("Generate a concise title") {
            Err(ProviderError::content_filtered("no"))
        } else {
            Ok(answer(request, "sure"))
        }
    });
    let h = harness(provider, |o| o.with_persistence_mode(PersistenceMode::Chat));
    let mut conversation = h.conduit.fresh_conversation(None);

    h.conduit
        .run_turn(&mut conversation, "Help me name my cat", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(conversation.title(), Some("Help me name my cat"));
}

#[tokio::test]
async fn test_open_modes() {
    let h = harness(echo_provider(), |o| o);
    let cancel = CancellationToken::new();

    let mut original = h.conduit.fresh_conversation(Some("conv-1"));
    h.conduit.run_turn(&mut original, "remember this", &cancel).await.unwrap();

    let resumed = h.conduit.open(PersistenceMode::Resume, Some("conv-1")).await.unwrap();
    assert_eq!(resumed.len(), 3);
    assert_eq!(resumed.leaf(), original.leaf());

    let latest = h.conduit.open(PersistenceMode::Resume, None).await.unwrap();
    assert_eq!(latest.id(), "conv-1");

    let fresh = h.conduit.open(PersistenceMode::Resume, Some("conv-2")).await.unwrap();
    assert_eq!(fresh.id(), "conv-2");
    assert_eq!(fresh.view().unwrap().roles(), "S");

    let overwritten = h
        .conduit
        .open(PersistenceMode::Overwrite, Some("conv-1"))
        .await
        .unwrap();
    assert_eq!(overwritten.id(), "conv-1");
    assert_eq!(overwritten.len(), 1);
    assert!(h.repository.load("conv-1", None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_run_batch_keeps_input_order() {
    let h = harness(echo_provider(), |o| o.with_use_cache(false));
    let inputs: Vec<String> = (0..6).map(|i| format!("item {}", i)).collect();

    let results = h
        .conduit
        .run_batch(inputs, 3, &CancellationToken::new())
        .await;

    let contents: Vec<String> = results.into_iter().map(|r| r.unwrap().content()).collect();
    let expected: Vec<String> = (0..6).map(|i| format!("echo: item {}", i)).collect();
    assert_eq!(contents, expected);
    assert_eq!(h.repository.list(None).await.unwrap().len(), 6);
}
