//! Decision Submitter
//!
//! Sends one review decision per candidate. The caller advances its queue
//! once the attempt settles, whatever the outcome: a slow or failing
//! endpoint never blocks the user. A failed submission leaves the server
//! without a decision for that candidate; it is not retried.

use std::sync::Arc;
use syncopate_common::events::{ClientEvent, EventBus};
use syncopate_common::{CandidateId, Decision, Error, Result};
use tracing::{info, warn};

use crate::gateway::Gateway;
use crate::session::SessionContext;

pub struct DecisionSubmitter {
    gateway: Arc<dyn Gateway>,
    session: Arc<SessionContext>,
    events: Arc<EventBus>,
}

impl DecisionSubmitter {
    pub fn new(gateway: Arc<dyn Gateway>, session: Arc<SessionContext>, events: Arc<EventBus>) -> Self {
        Self {
            gateway,
            session,
            events,
        }
    }

    /// POST the decision; failures are logged, surfaced and returned
    ///
    /// Nothing is sent once the session is known to be expired.
    pub async fn submit(&self, candidate_id: &CandidateId, decision: Decision) -> Result<()> {
        if self.session.is_expired() {
            warn!(candidate_id = %candidate_id, "Session expired, decision not submitted");
            return Err(Error::SessionExpired);
        }

        let result = self.gateway.review_matching(candidate_id, decision).await;
        self.session.observe(&result);

        match &result {
            Ok(()) => info!(candidate_id = %candidate_id, decision = %decision, "Decision submitted"),
            Err(e) => {
                warn!(candidate_id = %candidate_id, decision = %decision, "Decision submission failed: {}", e);
                self.events.emit_lossy(ClientEvent::ErrorSurfaced {
                    message: e.to_string(),
                });
            }
        }
        result
    }

    /// Parse `"YES"` / `"NO"` and submit
    ///
    /// Any other value is a caller bug: it is logged and nothing is sent.
    pub async fn submit_raw(&self, candidate_id: &CandidateId, decision: &str) -> Result<()> {
        match decision.parse::<Decision>() {
            Ok(decision) => self.submit(candidate_id, decision).await,
            Err(e) => {
                warn!(candidate_id = %candidate_id, "Unapproved action not submitted: {}", e);
                Err(e)
            }
        }
    }
}
