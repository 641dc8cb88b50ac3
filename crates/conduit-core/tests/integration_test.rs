//! Integration tests for conduit core
//!
//! Drives the orchestrator against a scripted provider with file-backed
//! repositories and caches, the way the CLI wires them.

use async_trait::async_trait;
use conduit_core::{
    CacheConfig, Conduit, ConduitCache, ConduitOptions, ConversationRepository, FileRepository,
    GenerationParams, Message, PersistenceMode, ProviderAdapter, ProviderError, Request, Response,
    ResponseCache, ResponseMetadata, StopReason,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Answers every request with a numbered reply and records what it was sent
#[derive(Default)]
struct ScriptedProvider {
    sent: Mutex<Vec<Vec<String>>>,
}

impl ScriptedProvider {
    fn calls(&self) -> usize {
        self.sent.lock().len()
    }

    fn last_sent(&self) -> Vec<String> {
        self.sent.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn dispatch(&self, request: &Request) -> Result<Response, ProviderError> {
        let texts: Vec<String> = request.messages().iter().map(Message::text).collect();
        let reply = format!("reply {}", self.sent.lock().len() + 1);
        self.sent.lock().push(texts);
        Ok(Response::new(
            request.clone(),
            Message::assistant(reply),
            ResponseMetadata::new(request.model(), StopReason::Stop).with_usage(5, 2),
        ))
    }
}

/// Fails the test if it is ever called
struct UnreachableProvider;

#[async_trait]
impl ProviderAdapter for UnreachableProvider {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn dispatch(&self, _request: &Request) -> Result<Response, ProviderError> {
        Err(ProviderError::other("provider should not be called"))
    }
}

fn file_backed(dir: &Path, provider: Arc<dyn ProviderAdapter>) -> (Conduit, Arc<FileRepository>) {
    let repository = Arc::new(FileRepository::new(dir.join("conversations"), "it").unwrap());
    let cache_config = CacheConfig {
        name: "it".into(),
        disk_cache_dir: Some(dir.join("cache")),
        ..Default::default()
    };
    let cache: Arc<dyn ResponseCache> = Arc::new(ConduitCache::from_config(&cache_config).unwrap());
    let options = ConduitOptions::new("it", GenerationParams::new("test-model"))
        .with_system_prompt("You are helpful.")
        .with_cache(Some(cache))
        .with_repository(Some(repository.clone()));
    (Conduit::new(provider, options), repository)
}

#[tokio::test]
async fn test_conversation_resumes_after_restart() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let provider = Arc::new(ScriptedProvider::default());

    let conversation_id = {
        let (conduit, _) = file_backed(dir.path(), provider.clone());
        let mut conversation = conduit.open(PersistenceMode::Resume, None).await.unwrap();
        conduit.run_turn(&mut conversation, "first", &cancel).await.unwrap();
        conduit.run_turn(&mut conversation, "second", &cancel).await.unwrap();
        conversation.id().to_string()
    };

    let (conduit, repository) = file_backed(dir.path(), provider.clone());
    let mut resumed = conduit.open(PersistenceMode::Resume, None).await.unwrap();
    assert_eq!(resumed.id(), conversation_id);
    assert_eq!(resumed.view().unwrap().roles(), "SUAUA");

    conduit.run_turn(&mut resumed, "third", &cancel).await.unwrap();
    assert_eq!(
        provider.last_sent(),
        vec!["You are helpful.", "first", "reply 1", "second", "reply 2", "third"]
    );

    let stored = repository.load(&conversation_id, None).await.unwrap().unwrap();
    assert_eq!(stored.len(), 7);
    assert_eq!(stored.leaf(), resumed.leaf());
}

#[tokio::test]
async fn test_editing_a_message_branches_the_conversation() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let (conduit, repository) = file_backed(dir.path(), Arc::new(ScriptedProvider::default()));

    let mut conversation = conduit.fresh_conversation(None);
    conduit.run_turn(&mut conversation, "tell me a joke", &cancel).await.unwrap();
    let first_answer = conversation.leaf().unwrap().to_string();
    conduit.run_turn(&mut conversation, "another one", &cancel).await.unwrap();
    let original_leaf = conversation.leaf().unwrap().to_string();

    conversation.session_mut().checkout(&first_answer).unwrap();
    conduit.run_turn(&mut conversation, "a different one", &cancel).await.unwrap();

    let session = conversation.session();
    assert_eq!(session.len(), 7);
    assert_eq!(session.children_of(&first_answer).len(), 2);
    assert_eq!(session.leaves().len(), 2);
    assert!(conversation.view().unwrap().content().starts_with("reply"));

    let stored = repository.load(conversation.id(), None).await.unwrap().unwrap();
    assert_eq!(stored.session().conversations().unwrap().len(), 2);
    let old_branch = stored.session().view_at(&original_leaf).unwrap();
    assert_eq!(old_branch.roles(), "SUAUA");
    assert_eq!(old_branch.messages()[3].text(), "another one");
}

#[tokio::test]
async fn test_disk_cache_answers_a_fresh_process() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let provider = Arc::new(ScriptedProvider::default());

    let (conduit, _) = file_backed(dir.path(), provider.clone());
    let first = conduit.query("What is a monad?", &cancel).await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(provider.calls(), 1);

    let (offline, repository) = file_backed(dir.path(), Arc::new(UnreachableProvider));
    let second = offline.query("What is a monad?", &cancel).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.content(), first.content());

    let summaries = repository.list(None).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].conversation_id, second.conversation_id);
}

#[tokio::test]
async fn test_named_conversation_is_found_by_name() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let provider = Arc::new(ScriptedProvider::default());
    let repository = Arc::new(FileRepository::new(dir.path(), "named").unwrap());
    let options = ConduitOptions::new("named", GenerationParams::new("test-model"))
        .with_repository(Some(repository.clone()))
        .with_conversation_name(Some("groceries".into()));
    let conduit = Conduit::new(provider, options);

    let mut conversation = conduit.open(PersistenceMode::Resume, None).await.unwrap();
    conduit.run_turn(&mut conversation, "milk", &cancel).await.unwrap();

    let reopened = conduit.open(PersistenceMode::Resume, None).await.unwrap();
    assert_eq!(reopened.id(), conversation.id());
    assert_eq!(reopened.view().unwrap().roles(), "UA");

    let by_unknown_id = conduit
        .open(PersistenceMode::Resume, Some("not-stored"))
        .await
        .unwrap();
    assert_eq!(by_unknown_id.id(), conversation.id());
    assert_eq!(repository.list(None).await.unwrap()[0].name.as_deref(), Some("groceries"));
}
