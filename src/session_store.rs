//! Durable storage for the chat session identifier.
//!
//! Exactly one string survives restarts: the session id, kept under a fixed
//! key in the app data directory. The store is read once when the chat
//! session manager initializes and written on every change; nothing else
//! writes it. The trait seam lets tests (and ephemeral runs) swap in an
//! in-memory store.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::config;

/// Where the chat session identifier lives between runs.
pub trait SessionStore: Send + Sync {
    /// The previously stored session id, if any. Blank values count as absent.
    fn load(&self) -> Option<String>;
    /// Persist the current session id, replacing any previous value.
    fn save(&self, session_id: &str);
}

// ═══════════════════════════════════════════════════════════
// File-backed store
// ═══════════════════════════════════════════════════════════

/// Stores the session id as a single-line file.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the fixed location under the app data directory.
    pub fn default_location() -> Self {
        Self::new(config::session_id_path())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn save(&self, session_id: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed preparing session store directory: {e}");
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, session_id) {
            tracing::warn!("Failed persisting chat session id: {e}");
        }
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════

/// Session store that forgets on drop. Used in tests and by front-ends
/// that opt out of durable sessions.
#[derive(Default)]
pub struct MemorySessionStore {
    value: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a session id, as if a previous run saved it.
    pub fn with_value(session_id: &str) -> Self {
        Self {
            value: Mutex::new(Some(session_id.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.value
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(|v| !v.trim().is_empty())
    }

    fn save(&self, session_id: &str) {
        if let Ok(mut guard) = self.value.lock() {
            *guard = Some(session_id.to_string());
        }
    }
}
