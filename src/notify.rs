//! Transient user-facing notifications ("toasts").
//!
//! `ToastCenter` is a clonable handle over a shared queue. It is constructed
//! explicitly and injected into consumers — never a module-level singleton —
//! so its lifetime and teardown are deterministic and testable in isolation.
//! Each toast schedules its own removal on a tokio timer; dismissing a toast
//! cancels its timer, and tearing the center down cancels all of them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Toasts live this long unless the caller overrides it.
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// Floor applied to caller-supplied TTLs.
const MIN_TTL: Duration = Duration::from_millis(1000);

/// How loud the toast is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
}

struct Inner {
    toasts: Mutex<Vec<Toast>>,
    timers: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl Inner {
    /// Remove a toast when its timer fires. The timer entry is dropped
    /// without an abort — the task is already finishing.
    fn expire(&self, id: Uuid) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.retain(|toast| toast.id != id);
        }
        if let Ok(mut timers) = self.timers.lock() {
            timers.remove(&id);
        }
    }

    fn cancel_all_timers(&self) {
        if let Ok(mut timers) = self.timers.lock() {
            for (_, handle) in timers.drain() {
                handle.abort();
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel_all_timers();
    }
}

/// Handle to the shared toast queue. Cheap to clone.
#[derive(Clone)]
pub struct ToastCenter {
    inner: Arc<Inner>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                toasts: Mutex::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Queue a toast with the default TTL. Blank messages (after trimming)
    /// are ignored. Returns the assigned id when the toast was queued.
    pub fn show(&self, message: &str, severity: Severity) -> Option<Uuid> {
        self.show_with_ttl(message, severity, DEFAULT_TTL)
    }

    /// Queue a toast that auto-expires after `max(1s, ttl)`.
    pub fn show_with_ttl(
        &self,
        message: &str,
        severity: Severity,
        ttl: Duration,
    ) -> Option<Uuid> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        let id = Uuid::new_v4();
        if let Ok(mut toasts) = self.inner.toasts.lock() {
            toasts.push(Toast {
                id,
                message: message.to_string(),
                severity,
            });
        }

        // The timer holds only a weak reference so dropping the last handle
        // tears the queue down instead of waiting out pending TTLs.
        let ttl = ttl.max(MIN_TTL);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(id);
            }
        });
        if let Ok(mut timers) = self.inner.timers.lock() {
            timers.insert(id, handle);
        }

        tracing::debug!(%id, ?severity, "Toast queued");
        Some(id)
    }

    /// Remove a toast and cancel its pending expiry. Dismissing an unknown
    /// id is a no-op.
    pub fn dismiss(&self, id: Uuid) {
        if let Ok(mut toasts) = self.inner.toasts.lock() {
            toasts.retain(|toast| toast.id != id);
        }
        if let Ok(mut timers) = self.inner.timers.lock() {
            if let Some(handle) = timers.remove(&id) {
                handle.abort();
            }
        }
    }

    /// Snapshot of the current queue, in insertion order.
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner
            .toasts
            .lock()
            .map(|toasts| toasts.clone())
            .unwrap_or_default()
    }

    /// Remove and return all queued toasts, cancelling their timers.
    /// Used by front-ends that render notifications once and move on.
    pub fn drain(&self) -> Vec<Toast> {
        let drained = self
            .inner
            .toasts
            .lock()
            .map(|mut toasts| std::mem::take(&mut *toasts))
            .unwrap_or_default();
        if let Ok(mut timers) = self.inner.timers.lock() {
            for toast in &drained {
                if let Some(handle) = timers.remove(&toast.id) {
                    handle.abort();
                }
            }
        }
        drained
    }

    /// Cancel every pending expiry and empty the queue.
    pub fn shutdown(&self) {
        self.inner.cancel_all_timers();
        if let Ok(mut toasts) = self.inner.toasts.lock() {
            toasts.clear();
        }
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new()
    }
}
