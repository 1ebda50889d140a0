//! Per-user session state for the guided dialogue.
//!
//! Sessions live in memory only — a process restart loses in-flight
//! dialogues; completed leads survive in the store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::intake::model::LeadProfile;
use crate::intake::step::DialogueStep;

/// Answers accumulated so far in a guided dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialProfile {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub workplace: Option<String>,
    pub citizenship: Option<String>,
}

impl PartialProfile {
    /// Collapse into a full profile once every field is present.
    pub fn into_profile(self) -> Option<LeadProfile> {
        Some(LeadProfile::Extended {
            name: self.name?,
            age: self.age?,
            workplace: self.workplace?,
            citizenship: self.citizenship?,
        })
    }
}

/// Transient progress marker for one user's in-flight dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_id: i64,
    /// Username captured when the session was opened.
    pub username: Option<String>,
    pub step: DialogueStep,
    pub answers: PartialProfile,
}

impl SessionState {
    pub fn new(user_id: i64, username: Option<String>) -> Self {
        Self {
            user_id,
            username,
            step: DialogueStep::default(),
            answers: PartialProfile::default(),
        }
    }
}

/// Session storage keyed by Telegram user id.
///
/// A trait rather than a bare map so the dialogue engine never touches
/// ambient state and the backing store can be swapped out.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: i64) -> Option<SessionState>;
    async fn set(&self, state: SessionState);
    async fn delete(&self, user_id: i64);
}

/// In-memory session store. Concurrent messages from different users never
/// contend beyond the map lock.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<i64, SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user_id: i64) -> Option<SessionState> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    async fn set(&self, state: SessionState) {
        self.sessions.write().await.insert(state.user_id, state);
    }

    async fn delete(&self, user_id: i64) {
        self.sessions.write().await.remove(&user_id);
    }
}
