//! Chat session manager.
//!
//! Owns the conversation history and a durable session identifier, and
//! mediates send/clear against the chat collaborator. Sends are optimistic:
//! the user's message is appended before the network call and stays in
//! history even when the call fails. The session identifier survives
//! restarts through a [`SessionStore`] until the user clears the session,
//! which issues a fresh identifier.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::models::{ChatMessage, Sender};
use crate::session_store::SessionStore;

/// Synthetic greeting seeded into every fresh history. Never sent to the
/// backend and not counted toward server-side sequencing.
pub const WELCOME_TEXT: &str = "Hello! How can I help you with your loan eligibility today?";
/// Inline error after a failed send.
pub const SEND_ERROR_TEXT: &str = "Could not send the message. Please try again.";
/// Inline error after a failed clear.
pub const CLEAR_ERROR_TEXT: &str = "Could not clear the chat history. Please try again.";

/// A list marker (`-`, `*`, `•`, `1.`, `1)`) that follows other text on the
/// same line, with the separating blanks. Assistant replies often inline
/// their lists this way; rendering forces each item onto its own line.
static INLINE_LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\n\r])[ \t]+((?:[-*•]|[0-9]+[.)])[ \t])").unwrap());

fn welcome_message() -> ChatMessage {
    ChatMessage::new(Sender::Assistant, WELCOME_TEXT, Utc::now())
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

// ═══════════════════════════════════════════════════════════
// Session manager
// ═══════════════════════════════════════════════════════════

/// State machines: Idle → Sending → Idle and Idle → Clearing → Idle. Each
/// guards only its own re-entry; sends are serialized so an assistant reply
/// always lands directly after its user message.
pub struct ChatSession {
    store: Box<dyn SessionStore>,
    session_id: String,
    messages: Vec<ChatMessage>,
    input: String,
    sending: bool,
    clearing: bool,
    error: Option<String>,
}

impl ChatSession {
    /// Restore the stored session id (or mint a fresh one), persist it, and
    /// seed history with the welcome message.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        let session_id = store.load().unwrap_or_else(new_session_id);
        store.save(&session_id);
        tracing::debug!(%session_id, "Chat session initialized");
        Self {
            store,
            session_id,
            messages: vec![welcome_message()],
            input: String::new(),
            sending: false,
            clearing: false,
            error: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_clearing(&self) -> bool {
        self.clearing
    }

    // ── Send ────────────────────────────────────────────────

    /// Send the current input. No-op on blank input or while a send is in
    /// flight. The user message is appended before the call and is kept on
    /// failure; only an inline error marks the problem.
    pub async fn send_message(&mut self, gateway: &Gateway) {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.sending {
            return;
        }

        self.messages
            .push(ChatMessage::new(Sender::User, text.clone(), Utc::now()));
        self.input.clear();
        self.sending = true;
        self.error = None;

        match gateway.send_chat_message(&self.session_id, &text).await {
            Ok(reply) => {
                if !reply.session_id.is_empty() && reply.session_id != self.session_id {
                    tracing::info!(
                        from = %self.session_id,
                        to = %reply.session_id,
                        "Chat session migrated by server"
                    );
                    self.session_id = reply.session_id.clone();
                    self.store.save(&self.session_id);
                }
                let timestamp = reply
                    .timestamp_utc
                    .as_deref()
                    .and_then(parse_server_timestamp)
                    .unwrap_or_else(Utc::now);
                self.messages
                    .push(ChatMessage::new(Sender::Assistant, reply.reply, timestamp));
            }
            Err(err) => {
                tracing::error!("Failed to send chat message: {err}");
                self.error = Some(SEND_ERROR_TEXT.to_string());
            }
        }
        self.sending = false;
    }

    // ── Clear ───────────────────────────────────────────────

    /// Clear the session. The backend delete is attempted first; any
    /// failure other than "not found" aborts the clear and leaves history
    /// and session id untouched. On success the history resets to a fresh
    /// welcome message and a new session id is generated and persisted.
    pub async fn clear(&mut self, gateway: &Gateway) {
        if self.clearing {
            return;
        }
        self.clearing = true;
        self.error = None;

        if !self.session_id.is_empty() {
            if let Err(err) = gateway.clear_chat_session(&self.session_id).await {
                tracing::error!("Failed to clear chat session: {err}");
                self.error = Some(CLEAR_ERROR_TEXT.to_string());
                self.clearing = false;
                return;
            }
        }

        self.messages = vec![welcome_message()];
        self.session_id = new_session_id();
        self.store.save(&self.session_id);
        self.input.clear();
        self.clearing = false;
        tracing::info!(session_id = %self.session_id, "Chat session cleared");
    }
}

// ═══════════════════════════════════════════════════════════
// Rendering derivations
// ═══════════════════════════════════════════════════════════

fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Force a line break in front of list markers that follow other text on
/// the same line.
pub fn reflow_inline_lists(text: &str) -> String {
    INLINE_LIST_MARKER
        .replace_all(text, "$1\n$2")
        .into_owned()
}

/// Split a message into trimmed, non-empty display lines. Assistant text is
/// reflowed first so inlined list items land on their own lines; user text
/// splits on line breaks only. An empty result falls back to the trimmed
/// original as a single line, or to no lines at all.
pub fn display_lines(message: &ChatMessage) -> Vec<String> {
    let normalized = message.text.replace("\r\n", "\n");
    let prepared = match message.sender {
        Sender::Assistant => reflow_inline_lists(&normalized),
        Sender::User => normalized.clone(),
    };

    let lines: Vec<String> = prepared
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        let fallback = normalized.trim();
        if fallback.is_empty() {
            Vec::new()
        } else {
            vec![fallback.to_string()]
        }
    } else {
        lines
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
