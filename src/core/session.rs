//! Authentication state injected into the sync engine.

use std::sync::Arc;
use tokio::sync::watch;

/// An authenticated cloud session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Cloud user id; becomes the owner of migrated families
    pub user_id: String,
}

/// Shared, observable session slot. Cloning shares the same slot.
#[derive(Debug, Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionState {
    /// Starts signed out.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(None)),
        }
    }

    /// Starts signed in as `user_id`.
    #[must_use]
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        let state = Self::signed_out();
        state.sign_in(user_id);
        state
    }

    /// Replaces the current session.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        self.tx.send_replace(Some(Session {
            user_id: user_id.into(),
        }));
    }

    /// Drops the current session.
    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// Current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Whether a session exists.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Observes session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_out() {
        let state = SessionState::signed_out();
        assert!(!state.is_authenticated());

        let shared = state.clone();
        shared.sign_in("user-1");
        assert_eq!(state.current().map(|s| s.user_id), Some("user-1".to_string()));

        state.sign_out();
        assert!(!shared.is_authenticated());
    }
}
