//! Favorite toggles
//!
//! The flag flips before the request is sent. A failed request does not
//! flip it back: the write is tagged [`WriteState::Failed`] and the local
//! flag stays diverged from the server until the next refetch.

use std::collections::HashMap;
use std::sync::Arc;
use syncopate_common::events::{ClientEvent, EventBus, WriteState};
use syncopate_common::{CandidateId, Error};
use tracing::{debug, warn};

use crate::gateway::Gateway;
use crate::session::SessionContext;

/// Local favorite flag of one concert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteToggle {
    pub concert_id: CandidateId,
    pub favorite: bool,
    pub write: WriteState,
}

impl FavoriteToggle {
    pub fn new(concert_id: CandidateId, favorite: bool) -> Self {
        Self {
            concert_id,
            favorite,
            write: WriteState::Confirmed,
        }
    }
}

/// Favorite flags of every concert a screen shows
pub struct FavoriteBook {
    gateway: Arc<dyn Gateway>,
    session: Arc<SessionContext>,
    events: Arc<EventBus>,
    entries: HashMap<CandidateId, FavoriteToggle>,
}

impl FavoriteBook {
    pub fn new(gateway: Arc<dyn Gateway>, session: Arc<SessionContext>, events: Arc<EventBus>) -> Self {
        Self {
            gateway,
            session,
            events,
            entries: HashMap::new(),
        }
    }

    /// Replace every local flag with the server's list of favorites
    pub fn reconcile(&mut self, ids: impl IntoIterator<Item = CandidateId>) {
        self.entries.clear();
        for id in ids {
            self.entries
                .insert(id.clone(), FavoriteToggle::new(id, true));
        }
    }

    pub fn is_favorite(&self, concert_id: &CandidateId) -> bool {
        self.entries
            .get(concert_id)
            .map(|t| t.favorite)
            .unwrap_or(false)
    }

    pub fn get(&self, concert_id: &CandidateId) -> Option<&FavoriteToggle> {
        self.entries.get(concert_id)
    }

    pub fn write_state(&self, concert_id: &CandidateId) -> WriteState {
        self.entries
            .get(concert_id)
            .map(|t| t.write.clone())
            .unwrap_or_default()
    }

    /// Flip the flag, then tell the server
    ///
    /// Returns the new local flag, which is kept even if the request fails.
    pub async fn toggle(&mut self, concert_id: &CandidateId) -> bool {
        let favorite = {
            let entry = self
                .entries
                .entry(concert_id.clone())
                .or_insert_with(|| FavoriteToggle::new(concert_id.clone(), false));
            entry.favorite = !entry.favorite;
            entry.write = WriteState::Pending;
            entry.favorite
        };
        self.publish(concert_id);

        let write = if self.session.is_expired() {
            WriteState::Failed(Error::SessionExpired.to_string())
        } else {
            let result = self.gateway.set_favorite(concert_id, favorite).await;
            self.session.observe(&result);
            match result {
                Ok(message) => {
                    debug!(concert_id = %concert_id, favorite, message = ?message, "Favorite confirmed");
                    WriteState::Confirmed
                }
                Err(e) => {
                    warn!(concert_id = %concert_id, favorite, "Favorite update failed: {}", e);
                    WriteState::Failed(e.to_string())
                }
            }
        };

        if let Some(entry) = self.entries.get_mut(concert_id) {
            entry.write = write;
        }
        self.publish(concert_id);
        favorite
    }

    fn publish(&self, concert_id: &CandidateId) {
        if let Some(entry) = self.entries.get(concert_id) {
            self.events.emit_lossy(ClientEvent::FavoriteChanged {
                concert_id: entry.concert_id.clone(),
                favorite: entry.favorite,
                write: entry.write.clone(),
            });
        }
    }
}
