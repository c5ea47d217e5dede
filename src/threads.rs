use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::transport::AssistantApi;

/// Per-session state held by the registry.
///
/// `thread_id` is guarded by an async mutex so thread creation is
/// single-flight: concurrent first calls for the same session serialize on
/// the lock and only the winner talks to the backend. `submit_gate` is held
/// by the orchestrator across pre-check + submit, closing the in-process
/// race window between checking for an active run and appending a message.
pub(crate) struct SessionState {
    pub(crate) thread_id: tokio::sync::Mutex<Option<String>>,
    pub(crate) submit_gate: tokio::sync::Mutex<()>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            thread_id: tokio::sync::Mutex::new(None),
            submit_gate: tokio::sync::Mutex::new(()),
        }
    }
}

/// Owns the session -> remote thread binding. One thread per session,
/// created lazily; clearing a session drops the binding so the next call
/// starts a fresh thread (no migration of prior messages).
pub struct ThreadRegistry {
    transport: Arc<dyn AssistantApi>,
    sessions: Mutex<HashMap<String, Arc<SessionState>>>,
}

impl ThreadRegistry {
    pub fn new(transport: Arc<dyn AssistantApi>) -> Self {
        Self {
            transport,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn session(&self, session_id: &str) -> Arc<SessionState> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(SessionState::new()))
            .clone()
    }

    /// Return the session's thread id, creating the remote thread on first use.
    pub async fn get_or_create(&self, session_id: &str) -> Result<String> {
        let slot = self.session(session_id);
        let mut thread_id = slot.thread_id.lock().await;
        if let Some(id) = thread_id.as_ref() {
            return Ok(id.clone());
        }
        let id = self.transport.create_thread().await?;
        tracing::info!(session = %session_id, thread_id = %id, "Bound new thread to session");
        *thread_id = Some(id.clone());
        Ok(id)
    }

    /// Drop the session's thread binding ("clear history"). The remote
    /// thread is left behind; the next call simply binds a new one.
    pub fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        if sessions.remove(session_id).is_some() {
            tracing::info!(session = %session_id, "Cleared session thread binding");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockAssistantApi;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let mut transport = MockAssistantApi::new();
        transport
            .expect_create_thread()
            .times(1)
            .returning(|| Ok("thread_1".to_string()));
        let registry = ThreadRegistry::new(Arc::new(transport));

        let first = registry.get_or_create("session_a").await.unwrap();
        let second = registry.get_or_create("session_a").await.unwrap();
        let third = registry.get_or_create("session_a").await.unwrap();
        assert_eq!(first, "thread_1");
        assert_eq!(second, "thread_1");
        assert_eq!(third, "thread_1");
    }

    #[tokio::test]
    async fn concurrent_calls_create_exactly_one_thread() {
        let mut transport = MockAssistantApi::new();
        transport
            .expect_create_thread()
            .times(1)
            .returning(|| Ok("thread_1".to_string()));
        let registry = Arc::new(ThreadRegistry::new(Arc::new(transport)));

        let a = registry.clone();
        let b = registry.clone();
        let (ra, rb) = tokio::join!(
            async move { a.get_or_create("session_a").await },
            async move { b.get_or_create("session_a").await },
        );
        assert_eq!(ra.unwrap(), "thread_1");
        assert_eq!(rb.unwrap(), "thread_1");
    }

    #[tokio::test]
    async fn sessions_get_distinct_threads() {
        let mut transport = MockAssistantApi::new();
        let mut n = 0;
        transport.expect_create_thread().times(2).returning(move || {
            n += 1;
            Ok(format!("thread_{n}"))
        });
        let registry = ThreadRegistry::new(Arc::new(transport));

        let a = registry.get_or_create("session_a").await.unwrap();
        let b = registry.get_or_create("session_b").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn clear_drops_binding_and_next_call_creates_fresh_thread() {
        let mut transport = MockAssistantApi::new();
        let mut n = 0;
        transport.expect_create_thread().times(2).returning(move || {
            n += 1;
            Ok(format!("thread_{n}"))
        });
        let registry = ThreadRegistry::new(Arc::new(transport));

        let first = registry.get_or_create("session_a").await.unwrap();
        registry.clear("session_a");
        let second = registry.get_or_create("session_a").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn failed_creation_leaves_session_unbound() {
        let mut transport = MockAssistantApi::new();
        let mut calls = 0;
        transport.expect_create_thread().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(crate::error::NavigatorError::Internal("down".to_string()))
            } else {
                Ok("thread_1".to_string())
            }
        });
        let registry = ThreadRegistry::new(Arc::new(transport));

        assert!(registry.get_or_create("session_a").await.is_err());
        // The failed attempt must not poison the binding
        let id = registry.get_or_create("session_a").await.unwrap();
        assert_eq!(id, "thread_1");
    }
}
