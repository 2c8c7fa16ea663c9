//! Session caches (C5): `ChatCache` (bounded turn history) and
//! `PolicyContextCache` (per-session materialized policy view). Both are
//! sharded concurrent maps with a background TTL sweep.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;

use qa_core::types::{ChatTurn, PolicyContext, SessionId};

struct Entry<T> {
    value: T,
    last_touched: chrono::DateTime<Utc>,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            last_touched: Utc::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        let age = Utc::now() - self.last_touched;
        age.to_std().map(|age| age > ttl).unwrap_or(false)
    }
}

/// `session_id -> bounded FIFO of ChatTurn`.
///
/// Evicts from the head once the entry exceeds `2 * max_history_turns`
/// messages (§9: "25 turns = 50 messages").
pub struct ChatCache {
    sessions: DashMap<SessionId, Entry<VecDeque<ChatTurn>>>,
    max_messages: usize,
    ttl: Duration,
}

impl ChatCache {
    pub fn new(max_history_turns: usize, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_messages: 2 * max_history_turns,
            ttl,
        }
    }

    /// Enqueue a turn, evicting from the head until the bound is met.
    pub fn append(&self, session_id: &str, turn: ChatTurn) {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Entry::new(VecDeque::new()));
        entry.value.push_back(turn);
        while entry.value.len() > self.max_messages {
            entry.value.pop_front();
        }
        entry.last_touched = Utc::now();
    }

    /// Snapshot of the session's history, oldest first. Callers must not
    /// mutate; this is a copy.
    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Remove every entry whose last touch exceeds the configured TTL.
    /// Returns the number of sessions removed.
    pub fn sweep_expired(&self) -> usize {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_expired(self.ttl))
            .map(|entry| entry.key().clone())
            .collect();
        for key in &expired {
            self.sessions.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// `session_id -> PolicyContext`. At most one entry per session.
pub struct PolicyContextCache {
    sessions: DashMap<SessionId, Entry<PolicyContext>>,
    ttl: Duration,
}

impl PolicyContextCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Overwrites any prior entry for this session.
    pub fn set(&self, session_id: &str, context: PolicyContext) {
        self.sessions
            .insert(session_id.to_string(), Entry::new(context));
    }

    pub fn get(&self, session_id: &str) -> Option<PolicyContext> {
        self.sessions.get(session_id).map(|entry| entry.value.clone())
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn sweep_expired(&self) -> usize {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_expired(self.ttl))
            .map(|entry| entry.key().clone())
            .collect();
        for key in &expired {
            self.sessions.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Spawn the background TTL sweep loop (§4.5). TTL exists only as a
/// safety net for clients that never call cleanup; the normal lifecycle
/// is explicit clear on session end.
pub fn spawn_sweep_task(
    chat_cache: Arc<ChatCache>,
    policy_cache: Arc<PolicyContextCache>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let chat_removed = chat_cache.sweep_expired();
            let policy_removed = policy_cache.sweep_expired();
            if chat_removed > 0 || policy_removed > 0 {
                tracing::debug!(
                    chat_removed,
                    policy_removed,
                    "session cache TTL sweep removed expired entries"
                );
            }
        }
    })
}
