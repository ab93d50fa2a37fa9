//! Session context
//!
//! Holds the bearer credential for the lifetime of the console. Every request
//! reads the token from here, and an authorization denial tears the session
//! down in one place. Watchers get the state changes so they can send the
//! user back to login.

use kubedeploy_common::auth::Session;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Authentication state of the console
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Session),
    /// The backend denied a previously valid credential; re-login required
    Expired,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Shared, observable session holder
#[derive(Clone)]
pub struct SessionContext {
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::from_state(SessionState::Anonymous)
    }

    /// Start from a credential persisted by an earlier login
    pub fn with_session(session: Session) -> Self {
        Self::from_state(SessionState::Authenticated(session))
    }

    fn from_state(initial: SessionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { state: Arc::new(tx) }
    }

    pub fn establish(&self, session: Session) {
        info!(user = %session.user.username, "session established");
        self.state.send_replace(SessionState::Authenticated(session));
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().session().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Authenticated(_))
    }

    pub fn is_expired(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Expired)
    }

    /// User-initiated sign out; returns the session that was dropped
    pub fn logout(&self) -> Option<Session> {
        let previous = self.state.send_replace(SessionState::Anonymous);
        previous.session().cloned()
    }

    /// Authorization was denied. Drops the credential and flags the session
    /// as expired. Returns false when there was no session to tear down.
    pub fn expire(&self) -> bool {
        let torn_down = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Authenticated(_)) {
                *state = SessionState::Expired;
                true
            } else {
                false
            }
        });

        if torn_down {
            warn!("authorization denied, session cleared");
        }
        torn_down
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
