//! Session context and Session Guard
//!
//! One [`SessionContext`] is shared by every controller of a client. It is
//! the single source of truth for "authenticated / expired / unknown"; any
//! controller that sees a 401 marks it expired, and every controller checks
//! it before fetching.

use std::sync::{Arc, RwLock};
use syncopate_common::events::{ClientEvent, EventBus, SessionState};
use syncopate_common::models::UserData;
use syncopate_common::{Error, Result};
use tracing::{info, warn};

use crate::gateway::Gateway;

/// Authentication status as last observed
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Unknown,
    Authenticated(UserData),
    Expired,
}

impl SessionStatus {
    fn state(&self) -> SessionState {
        match self {
            SessionStatus::Unknown => SessionState::Unknown,
            SessionStatus::Authenticated(_) => SessionState::Authenticated,
            SessionStatus::Expired => SessionState::Expired,
        }
    }
}

/// Shared session state
pub struct SessionContext {
    status: RwLock<SessionStatus>,
    events: Arc<EventBus>,
}

impl SessionContext {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            status: RwLock::new(SessionStatus::Unknown),
            events,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.status.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.status(), SessionStatus::Expired)
    }

    pub fn user(&self) -> Option<UserData> {
        match self.status() {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn mark_authenticated(&self, user: UserData) {
        self.set(SessionStatus::Authenticated(user));
    }

    pub fn mark_expired(&self) {
        self.set(SessionStatus::Expired);
    }

    /// Back to `Unknown`, e.g. after logout or a fresh login
    pub fn reset(&self) {
        self.set(SessionStatus::Unknown);
    }

    /// Mark expired if `result` is a 401
    pub fn observe<T>(&self, result: &Result<T>) {
        if let Err(Error::SessionExpired) = result {
            self.mark_expired();
        }
    }

    fn set(&self, next: SessionStatus) {
        let changed = {
            let mut status = match self.status.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let changed = status.state() != next.state();
            *status = next.clone();
            changed
        };

        if changed {
            info!(state = ?next.state(), "Session state changed");
            self.events.emit_lossy(ClientEvent::SessionChanged {
                state: next.state(),
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

/// What a screen should do after the identity check
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// HTTP 200; dependent fetches may proceed
    Proceed(UserData),
    /// HTTP 401; show the session-expired interstitial and fetch nothing more
    SessionExpired,
    /// Any other failure, shown as plain text
    Error(String),
}

/// Identity check run when a screen mounts
pub struct SessionGuard {
    gateway: Arc<dyn Gateway>,
    session: Arc<SessionContext>,
}

impl SessionGuard {
    pub fn new(gateway: Arc<dyn Gateway>, session: Arc<SessionContext>) -> Self {
        Self { gateway, session }
    }

    /// Issue `GET /auth/user/` and record the outcome in the session context
    ///
    /// Not retried.
    pub async fn check(&self) -> GuardOutcome {
        match self.gateway.current_user().await {
            Ok(user) => {
                self.session.mark_authenticated(user.clone());
                GuardOutcome::Proceed(user)
            }
            Err(Error::SessionExpired) => {
                self.session.mark_expired();
                GuardOutcome::SessionExpired
            }
            Err(e) => {
                warn!("Session check failed: {}", e);
                GuardOutcome::Error(e.to_string())
            }
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }
}
