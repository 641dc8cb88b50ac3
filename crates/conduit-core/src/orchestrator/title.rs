//! Conversation title generation

use crate::conversation::Conversation;
use crate::error::ConduitResult;
use crate::message::Message;
use crate::prompts::Prompt;
use crate::request::{GenerationParams, Request};
use std::sync::LazyLock;

const TITLE_TEMPLATE: &str = "Generate a concise title for this conversation.\n\
<system_context>{{ system_message }}</system_context>\n\
<user_request>{{ user_message }}</user_request>\n\
Output a noun phrase of 4-7 words that captures the topic. \
No quotes, no punctuation at the end. Just the title.";

const MAX_TITLE_CHARS: usize = 80;

static TITLE_PROMPT: LazyLock<Prompt> = LazyLock::new(|| Prompt::new(TITLE_TEMPLATE));

/// Request asking for a title, or `None` when the conversation does not open
/// with a system message followed by a user message
pub(crate) fn title_request(
    conversation: &Conversation,
    params: &GenerationParams,
) -> ConduitResult<Option<Request>> {
    let view = conversation.view()?;
    let [system, user, ..] = view.messages() else {
        return Ok(None);
    };
    if view.roles().get(..2) != Some("SU") {
        return Ok(None);
    }

    let text = TITLE_PROMPT.render_pairs(&[
        ("system_message", system.text().as_str()),
        ("user_message", user.text().as_str()),
    ])?;
    let params = GenerationParams {
        temperature: Some(0.2),
        max_tokens: Some(32),
        stream: false,
        ..params.clone()
    };
    Request::new(params, vec![Message::user(text)]).map(Some)
}

/// Strip quotes, prefixes and trailing punctuation from a model title
pub(crate) fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .strip_prefix("Title:")
        .or_else(|| line.strip_prefix("title:"))
        .unwrap_or(line)
        .trim();
    let cleaned = line
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c == '`')
        .trim_end_matches(['.', '!', '?', ':'])
        .trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.chars().take(MAX_TITLE_CHARS).collect())
}
