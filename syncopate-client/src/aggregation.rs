//! Aggregation View
//!
//! Resolves the current candidate's associated ids (shared concerts) to
//! display names. Each id gets its own lookup task; names are appended in
//! completion order, so the displayed order is not deterministic.
//!
//! Every restart bumps a generation number (epoch). Lookups are never
//! cancelled, but a lookup whose epoch is no longer current is dropped on
//! arrival instead of appending to the new candidate's list.

use std::sync::Arc;
use syncopate_common::events::{ClientEvent, EventBus};
use syncopate_common::CandidateId;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::gateway::Gateway;
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationStatus {
    /// Never started
    Idle,
    /// Lookups still outstanding; `items` may already hold some names
    Loading { pending: usize },
    Ready,
    /// No associated ids, or none resolved to a name
    NoneFound,
}

/// Accumulator state of the current generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationSnapshot {
    pub epoch: u64,
    pub items: Vec<String>,
    pub requested: usize,
    pub pending: usize,
    pub errors: Vec<String>,
}

impl AggregationSnapshot {
    pub fn status(&self) -> AggregationStatus {
        if self.epoch == 0 {
            AggregationStatus::Idle
        } else if self.pending > 0 {
            AggregationStatus::Loading {
                pending: self.pending,
            }
        } else if self.items.is_empty() {
            AggregationStatus::NoneFound
        } else {
            AggregationStatus::Ready
        }
    }

    /// First lookup failure of this generation
    pub fn page_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

pub struct AggregationView {
    gateway: Arc<dyn Gateway>,
    session: Arc<SessionContext>,
    events: Arc<EventBus>,
    state: Arc<watch::Sender<AggregationSnapshot>>,
}

impl AggregationView {
    pub fn new(gateway: Arc<dyn Gateway>, session: Arc<SessionContext>, events: Arc<EventBus>) -> Self {
        let (tx, _rx) = watch::channel(AggregationSnapshot::default());
        Self {
            gateway,
            session,
            events,
            state: Arc::new(tx),
        }
    }

    /// Clear the accumulator and look up `ids` for a new generation
    ///
    /// Must be called from within a tokio runtime. Returns the new epoch.
    /// No lookups are issued once the session is known to be expired.
    pub fn restart(&self, ids: &[CandidateId]) -> u64 {
        let suppressed = self.session.is_expired();
        let requested = if suppressed { 0 } else { ids.len() };

        let mut epoch = 0;
        self.state.send_modify(|acc| {
            acc.epoch += 1;
            acc.items.clear();
            acc.errors.clear();
            acc.requested = requested;
            acc.pending = requested;
            epoch = acc.epoch;
        });
        self.events.emit_lossy(ClientEvent::AggregationUpdated {
            epoch,
            items: Vec::new(),
        });

        if suppressed {
            debug!(epoch, "Session expired, aggregation lookups suppressed");
            return epoch;
        }

        debug!(epoch, count = ids.len(), "Starting aggregation lookups");
        for id in ids {
            self.spawn_lookup(epoch, id.clone());
        }
        epoch
    }

    fn spawn_lookup(&self, epoch: u64, id: CandidateId) {
        let gateway = self.gateway.clone();
        let session = self.session.clone();
        let events = self.events.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            let result = gateway.concert_by_id(&id).await;
            session.observe(&result);

            let mut appended = None;
            state.send_if_modified(|acc| {
                if acc.epoch != epoch {
                    debug!(epoch, current = acc.epoch, id = %id, "Discarding stale lookup");
                    return false;
                }
                acc.pending = acc.pending.saturating_sub(1);
                match result {
                    Ok(Some(concert)) => acc.items.push(concert.name),
                    Ok(None) => debug!(id = %id, "Lookup resolved to nothing"),
                    Err(e) => {
                        warn!(id = %id, "Aggregation lookup failed: {}", e);
                        acc.errors.push(e.to_string());
                    }
                }
                appended = Some(acc.items.clone());
                true
            });

            if let Some(items) = appended {
                events.emit_lossy(ClientEvent::AggregationUpdated { epoch, items });
            }
        });
    }

    pub fn snapshot(&self) -> AggregationSnapshot {
        self.state.borrow().clone()
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    /// Wait until every lookup of the current generation has settled
    pub async fn wait_settled(&self) -> AggregationSnapshot {
        let mut rx = self.state.subscribe();
        let settled = rx.wait_for(|acc| acc.pending == 0).await;
        match settled {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_status() {
        let mut snap = AggregationSnapshot::default();
        assert_eq!(snap.status(), AggregationStatus::Idle);

        snap.epoch = 1;
        assert_eq!(snap.status(), AggregationStatus::NoneFound);

        snap.requested = 2;
        snap.pending = 2;
        assert_eq!(snap.status(), AggregationStatus::Loading { pending: 2 });

        snap.pending = 0;
        snap.items.push("Osheaga".to_string());
        assert_eq!(snap.status(), AggregationStatus::Ready);
        assert!(snap.page_error().is_none());
    }
}
