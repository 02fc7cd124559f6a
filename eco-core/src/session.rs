//! In-memory session store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::ports::{PortError, SessionStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Persisted login state, shared by every store implementation.
pub struct SessionState {
    /// Whether a user is logged in.
    pub is_logged_in: bool,
    /// Username of the logged in user.
    pub username: Option<String>,
}

impl SessionState {
    /// State of a freshly logged in user.
    #[must_use]
    pub fn logged_in(username: &str) -> Self {
        Self {
            is_logged_in: true,
            username: Some(username.to_owned()),
        }
    }
}

#[derive(Debug, Default)]
/// Session store that forgets everything on exit.
pub struct MemorySessionStore {
    state: Mutex<SessionState>,
}

impl MemorySessionStore {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // The state is plain data, a panicked writer cannot leave it half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn is_logged_in(&self) -> bool {
        self.lock().is_logged_in
    }

    fn username(&self) -> Option<String> {
        self.lock().username.clone()
    }

    fn save(&self, username: &str) -> Result<(), PortError> {
        *self.lock() = SessionState::logged_in(username);
        Ok(())
    }

    fn clear(&self) -> Result<(), PortError> {
        *self.lock() = SessionState::default();
        Ok(())
    }
}
