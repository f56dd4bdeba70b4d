//! syncopate-client library
//!
//! Client-side state for the Syncopate concert-discovery app: a gateway to
//! the REST backend, the shared session context, the sequential review
//! queue with its decision submitter and aggregation view, and one
//! controller per screen.

pub mod aggregation;
pub mod decision;
pub mod favorites;
pub mod gateway;
pub mod queue;
pub mod screens;
pub mod session;
pub mod view;

pub use aggregation::{AggregationSnapshot, AggregationStatus, AggregationView};
pub use decision::DecisionSubmitter;
pub use favorites::{FavoriteBook, FavoriteToggle};
pub use gateway::{Gateway, HttpGateway, LoginOutcome, RegisterOutcome};
pub use queue::{CandidateQueue, QueuePhase};
pub use session::{GuardOutcome, SessionContext, SessionGuard, SessionStatus};
pub use view::ViewState;

use std::sync::Arc;
use syncopate_common::events::EventBus;

/// Handles shared by every screen controller
#[derive(Clone)]
pub struct ClientContext {
    pub gateway: Arc<dyn Gateway>,
    pub session: Arc<SessionContext>,
    pub events: Arc<EventBus>,
}

impl ClientContext {
    pub fn new(gateway: Arc<dyn Gateway>, events: Arc<EventBus>) -> Self {
        let session = Arc::new(SessionContext::new(events.clone()));
        Self {
            gateway,
            session,
            events,
        }
    }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(self.gateway.clone(), self.session.clone())
    }
}
