//! Owned conversation aggregate

use super::view::ConversationView;
use crate::error::GraphIntegrityError;
use crate::message::Message;
use crate::session::Session;

/// Number of characters kept when titling from the first user message
const AUTO_TITLE_CHARS: usize = 50;

/// A session plus the metadata persisted with it.
///
/// The conversation identifier is the session identifier.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    session: Session,
    title: Option<String>,
}

impl Conversation {
    /// Start an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation rooted at a system prompt
    pub fn with_system(prompt: impl Into<String>) -> Self {
        let mut session = Session::new();
        // Registering a root into an empty session cannot fail.
        let _ = session.register(Message::system(prompt.into()));
        Self {
            session,
            title: None,
        }
    }

    /// Wrap an existing session
    pub fn from_session(session: Session, title: Option<String>) -> Self {
        Self { session, title }
    }

    pub fn id(&self) -> &str {
        self.session.id()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn leaf(&self) -> Option<&str> {
        self.session.leaf()
    }

    pub fn len(&self) -> usize {
        self.session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }

    /// View positioned at the session leaf
    pub fn view(&self) -> Result<ConversationView<'_>, GraphIntegrityError> {
        self.session.view()
    }

    /// Register a message into the underlying session
    pub fn register(&mut self, message: Message) -> Result<(), GraphIntegrityError> {
        self.session.register(message)
    }

    /// Title derived from the first user message, truncated with an ellipsis
    pub fn auto_title(&self) -> Option<String> {
        let view = self.view().ok()?;
        let text = view.first_user()?.text();
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if text.chars().count() > AUTO_TITLE_CHARS {
            let truncated: String = text.chars().take(AUTO_TITLE_CHARS).collect();
            Some(format!("{}...", truncated))
        } else {
            Some(text.to_string())
        }
    }
}
