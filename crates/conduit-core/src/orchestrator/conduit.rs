//! Turn orchestration

use super::options::ConduitOptions;
use super::title;
use crate::conversation::Conversation;
use crate::error::{ConduitError, ConduitResult};
use crate::events::ProgressEvent;
use crate::message::{Message, MessageContent};
use crate::provider::ProviderAdapter;
use crate::recovery::retry_provider;
use crate::repository::PersistenceMode;
use crate::request::{Request, Response};
use crate::session::Session;
use dashmap::DashMap;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one user turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub conversation_id: String,
    /// Final response; its message is the conversation's new leaf
    pub response: Response,
    /// Whether the final response was replayed from the cache
    pub from_cache: bool,
    /// Whether the repository accepted the updated conversation
    pub persisted: bool,
    /// Tool execution rounds performed
    pub tool_rounds: usize,
}

impl TurnOutcome {
    pub fn content(&self) -> String {
        self.response.content()
    }
}

/// Drives conversations through cache, provider, tools and repository
pub struct Conduit {
    provider: Arc<dyn ProviderAdapter>,
    options: ConduitOptions,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Conduit {
    pub fn new(provider: Arc<dyn ProviderAdapter>, options: ConduitOptions) -> Self {
        Self {
            provider,
            options,
            locks: DashMap::new(),
        }
    }

    pub fn options(&self) -> &ConduitOptions {
        &self.options
    }

    pub fn provider(&self) -> &Arc<dyn ProviderAdapter> {
        &self.provider
    }

    fn emit(&self, event: ProgressEvent) {
        self.options.display.on_event(&event);
    }

    fn lock_for(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_lock(&self, conversation_id: &str) {
        self.locks
            .remove_if(conversation_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Empty conversation rooted at the configured system prompt
    pub fn fresh_conversation(&self, conversation_id: Option<&str>) -> Conversation {
        let session = match conversation_id {
            Some(id) => Session::with_id(id),
            None => Session::new(),
        };
        let mut conversation = Conversation::from_session(session, None);
        if let Some(prompt) = &self.options.system_prompt {
            // An empty session accepts any root.
            let _ = conversation.register(Message::system(prompt.as_str()));
        }
        conversation
    }

    /// Obtain the conversation a session should work on.
    ///
    /// `Overwrite` discards any stored copy of `conversation_id`. `Resume` and
    /// `Chat` load it (falling back to the configured name), or the most
    /// recent conversation when no id is given; a new conversation is started
    /// when nothing is stored.
    pub async fn open(
        &self,
        mode: PersistenceMode,
        conversation_id: Option<&str>,
    ) -> ConduitResult<Conversation> {
        let Some(repository) = &self.options.repository else {
            return Ok(self.fresh_conversation(conversation_id));
        };

        if mode == PersistenceMode::Overwrite {
            if let Some(id) = conversation_id {
                if let Err(e) = repository.remove(id).await {
                    warn!("Could not discard stored conversation {}: {}", id, e);
                }
            }
            return Ok(self.fresh_conversation(conversation_id));
        }

        let name = self.options.conversation_name.as_deref();
        let loaded = match (conversation_id, name) {
            (Some(id), name) => repository.load(id, name).await?,
            (None, Some(name)) => repository.load_by_name(name).await?,
            (None, None) => repository.last().await?,
        };
        match loaded {
            Some(conversation) => {
                debug!(
                    "Resumed conversation {} with {} messages",
                    conversation.id(),
                    conversation.len()
                );
                Ok(conversation)
            }
            None => Ok(self.fresh_conversation(conversation_id)),
        }
    }

    /// One-shot question in a new conversation
    pub async fn query(
        &self,
        text: impl Into<MessageContent>,
        cancel: &CancellationToken,
    ) -> ConduitResult<TurnOutcome> {
        let mut conversation = self.fresh_conversation(None);
        self.run_turn(&mut conversation, text, cancel).await
    }

    /// Independent one-shot questions with at most `concurrency` in flight.
    ///
    /// Results come back in input order.
    pub async fn run_batch(
        &self,
        inputs: Vec<String>,
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> Vec<ConduitResult<TurnOutcome>> {
        let mut results: Vec<(usize, ConduitResult<TurnOutcome>)> =
            futures::stream::iter(inputs.into_iter().enumerate())
                .map(|(index, input)| async move { (index, self.query(input, cancel).await) })
                .buffer_unordered(concurrency.max(1))
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Run one user turn against `conversation`.
    ///
    /// Messages are registered only after a complete response arrives, so a
    /// failed or cancelled call leaves the conversation untouched. Tool calls
    /// are executed and answered until the model stops asking or the round
    /// limit is reached. Cache and repository failures are logged and do not
    /// fail the turn.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_message: impl Into<MessageContent>,
        cancel: &CancellationToken,
    ) -> ConduitResult<TurnOutcome> {
        let conversation_id = conversation.id().to_string();
        let lock = self.lock_for(&conversation_id);
        let outcome = {
            let _guard = lock.lock().await;
            self.run_turn_locked(conversation, user_message.into(), cancel)
                .await
        };
        drop(lock);
        self.release_lock(&conversation_id);

        if let Err(e) = &outcome {
            self.emit(ProgressEvent::Failed {
                conversation_id,
                error: e.to_string(),
            });
        }
        outcome
    }

    async fn run_turn_locked(
        &self,
        conversation: &mut Conversation,
        user_message: MessageContent,
        cancel: &CancellationToken,
    ) -> ConduitResult<TurnOutcome> {
        let view = conversation.view()?;
        let base: Vec<Message> = if self.options.include_history {
            view.to_messages()
        } else {
            view.system().cloned().into_iter().collect()
        };
        let leaf = view.last().cloned();

        let mut turn: Vec<Message> = Vec::new();
        let user = match leaf {
            Some(parent) => Message::user(user_message).reply_to(&parent),
            None => {
                let root = self.options.system_prompt.as_deref().map(Message::system);
                match root {
                    Some(root) => {
                        let user = Message::user(user_message).reply_to(&root);
                        turn.push(root);
                        user
                    }
                    None => Message::user(user_message),
                }
            }
        };
        turn.push(user);
        let mut tool_rounds = 0;

        loop {
            let messages: Vec<Message> = base.iter().chain(turn.iter()).cloned().collect();
            let mut request = Request::new(self.options.params.clone(), messages)?;
            if let Some(tools) = self.options.tools.as_ref().filter(|t| !t.is_empty()) {
                request = request.with_tools(tools.specs());
            }

            let (response, from_cache) = self.complete(&request, conversation.id(), cancel).await?;

            turn.push(response.message().clone());

            let metadata = response.metadata();
            self.emit(ProgressEvent::Completed {
                conversation_id: conversation.id().to_string(),
                duration_ms: metadata.duration_ms,
                input_tokens: metadata.input_tokens,
                output_tokens: metadata.output_tokens,
            });

            let wants_tools = response.message().has_tool_calls();
            let tools = self.options.tools.as_ref();
            match tools {
                Some(tools) if wants_tools && tool_rounds < self.options.max_tool_rounds => {
                    tool_rounds += 1;
                    let mut previous = response.message().clone();
                    for call in response.message().tool_calls() {
                        if cancel.is_cancelled() {
                            return Err(ConduitError::Cancelled);
                        }
                        let result = tools.execute(call, &previous).await;
                        turn.push(result.clone());
                        previous = result;
                    }
                }
                _ => {
                    if wants_tools {
                        warn!(
                            "Stopping with unanswered tool calls in {} after {} rounds",
                            conversation.id(),
                            tool_rounds
                        );
                    }
                    commit(conversation, turn)?;
                    let persisted = self.finish(conversation, cancel).await;
                    info!(
                        conversation_id = %conversation.id(),
                        from_cache,
                        tool_rounds,
                        "turn completed"
                    );
                    return Ok(TurnOutcome {
                        conversation_id: conversation.id().to_string(),
                        response,
                        from_cache,
                        persisted,
                        tool_rounds,
                    });
                }
            }
        }
    }

    /// Title (in chat mode) and persist; failures only warn
    async fn finish(&self, conversation: &mut Conversation, cancel: &CancellationToken) -> bool {
        if self.options.persistence_mode == PersistenceMode::Chat && conversation.title().is_none() {
            let title = self.generate_title(conversation, cancel).await;
            if let Some(title) = title {
                conversation.set_title(title);
            }
        }

        let Some(repository) = &self.options.repository else {
            return false;
        };
        match repository
            .save(conversation, self.options.conversation_name.as_deref())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist conversation {}: {}", conversation.id(), e);
                false
            }
        }
    }

    /// Response for `request`, from the cache when possible.
    ///
    /// The returned message always replies to the request's last message.
    pub(crate) async fn complete(
        &self,
        request: &Request,
        conversation_id: &str,
        cancel: &CancellationToken,
    ) -> ConduitResult<(Response, bool)> {
        if cancel.is_cancelled() {
            return Err(ConduitError::Cancelled);
        }
        let last_id = request
            .last_message()
            .map(|m| m.id().to_string())
            .ok_or_else(|| ConduitError::invalid_input("request has no messages"))?;

        self.emit(ProgressEvent::Started {
            conversation_id: conversation_id.to_string(),
            model: request.model().to_string(),
        });

        let cache = self.options.cache.as_ref().filter(|_| self.options.use_cache);
        if let Some(cache) = cache {
            match cache.get(request).await {
                Ok(Some(hit)) => {
                    self.emit(ProgressEvent::CacheHit {
                        conversation_id: conversation_id.to_string(),
                        fingerprint: request.fingerprint(),
                    });
                    let (_, message, metadata) = hit.into_parts();
                    let message = message.replay(Some(last_id));
                    return Ok((Response::new(request.clone(), message, metadata), true));
                }
                Ok(None) => {}
                Err(e) => warn!("Cache lookup failed, dispatching instead: {}", e),
            }
        }

        let provider = self.provider.clone();
        let dispatched = retry_provider(
            &self.options.retry,
            cancel,
            || {
                let provider = provider.clone();
                async move { provider.dispatch(request).await }
            },
            |attempt, delay, error| {
                self.emit(ProgressEvent::Retrying {
                    conversation_id: conversation_id.to_string(),
                    attempt,
                    delay,
                    reason: error.to_string(),
                })
            },
        )
        .await?;

        let (_, message, metadata) = dispatched.into_parts();
        let message = if message.session_id().is_some_and(|s| s != conversation_id) {
            message.replay(Some(last_id))
        } else {
            message.with_predecessor(last_id)
        };
        let response = Response::new(request.clone(), message, metadata);

        if let Some(cache) = cache {
            if let Err(e) = cache.set(request, &response).await {
                warn!("Failed to cache response: {}", e);
            }
        }
        Ok((response, false))
    }

    /// Short provider-generated title, or the first user message as fallback
    pub async fn generate_title(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> Option<String> {
        match title::title_request(conversation, &self.options.params) {
            Ok(Some(request)) => match self.complete(&request, conversation.id(), cancel).await {
                Ok((response, _)) => {
                    if let Some(title) = title::clean_title(&response.content()) {
                        return Some(title);
                    }
                }
                Err(e) => warn!("Title generation failed for {}: {}", conversation.id(), e),
            },
            Ok(None) => {}
            Err(e) => debug!("Not generating a title for {}: {}", conversation.id(), e),
        }
        conversation.auto_title()
    }
}

impl std::fmt::Debug for Conduit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conduit")
            .field("provider", &self.provider.name())
            .field("options", &self.options)
            .finish()
    }
}

/// Register a finished turn, all or nothing
fn commit(conversation: &mut Conversation, turn: Vec<Message>) -> ConduitResult<()> {
    let mut staged = conversation.clone();
    for message in turn {
        staged.register(message)?;
    }
    *conversation = staged;
    Ok(())
}
