//! Session store: one form session per (channel, user, chat).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::channels::IncomingMessage;
use crate::forms::Session;

/// Identifies the conversation a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub channel: String,
    pub user_id: String,
    pub chat_id: Option<String>,
}

impl SessionKey {
    pub fn from_message(msg: &IncomingMessage) -> Self {
        Self {
            channel: msg.channel.clone(),
            user_id: msg.user_id.clone(),
            chat_id: msg.chat_id().map(str::to_string),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.chat_id {
            Some(chat) => write!(f, "{}:{}@{}", self.channel, self.user_id, chat),
            None => write!(f, "{}:{}", self.channel, self.user_id),
        }
    }
}

struct TrackedSession {
    session: Session,
    last_active: DateTime<Utc>,
}

/// In-memory sessions. Never persisted; a restart forgets all progress.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionKey, TrackedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on the session for `key`, starting from an inactive session
    /// when none exists. Sessions left inactive afterwards are dropped.
    pub async fn with_session<F, R>(&self, key: &SessionKey, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.lock().await;
        let mut tracked = sessions.remove(key).unwrap_or_else(|| TrackedSession {
            session: Session::new(),
            last_active: Utc::now(),
        });

        let result = f(&mut tracked.session);

        if tracked.session.is_active() {
            tracked.last_active = Utc::now();
            sessions.insert(key.clone(), tracked);
        }
        result
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Drop sessions idle for longer than `idle`. Returns how many went.
    pub async fn prune_idle(&self, idle: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle))
        else {
            return 0;
        };
        self.prune_inactive_since(cutoff).await
    }

    async fn prune_inactive_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|key, tracked| {
            let keep = tracked.last_active >= cutoff;
            if !keep {
                tracing::debug!(session = %key, "Pruning idle session");
            }
            keep
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }
}
