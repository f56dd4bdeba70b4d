//! Candidate Queue
//!
//! An ordered list of candidates fetched once per screen, plus a cursor.
//!
//! ```text
//! Loading ──► Ready ──advance…──► Exhausted
//!    │
//!    ├──► Empty
//!    ├──► SessionExpired
//!    ├──► ServiceUnavailable
//!    └──► Error
//! ```
//!
//! Nothing returns to `Loading` once a fetch settles. Decisions only move
//! the cursor; the list is never reordered.

use syncopate_common::models::Candidate;
use syncopate_common::{Error, Result};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuePhase {
    Loading,
    Ready,
    /// Fetch returned no candidates; drawn the same as `Exhausted`
    Empty,
    /// Cursor reached the end
    Exhausted,
    SessionExpired,
    ServiceUnavailable,
    Error(String),
}

impl QueuePhase {
    /// Phases that draw the "no more candidates" screen
    pub fn is_out_of_candidates(&self) -> bool {
        matches!(self, QueuePhase::Empty | QueuePhase::Exhausted)
    }
}

/// Queue of candidates under review
///
/// Invariant: `cursor <= items.len()`; `cursor == items.len()` means the
/// queue is exhausted.
#[derive(Debug, Clone)]
pub struct CandidateQueue<C> {
    items: Vec<C>,
    cursor: usize,
    phase: QueuePhase,
    load_issued: bool,
}

impl<C: Candidate> Default for CandidateQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Candidate> CandidateQueue<C> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            phase: QueuePhase::Loading,
            load_issued: false,
        }
    }

    /// Claim the single fetch of this queue
    ///
    /// Returns `false` if a fetch was already issued; the caller must not
    /// fetch again.
    pub fn begin_load(&mut self) -> bool {
        if self.load_issued {
            return false;
        }
        self.load_issued = true;
        true
    }

    /// Record the fetch result; ignored unless the queue is still loading
    pub fn finish_load(&mut self, result: Result<Vec<C>>) -> &QueuePhase {
        if self.phase != QueuePhase::Loading {
            return &self.phase;
        }

        match result {
            Ok(items) if items.is_empty() => {
                info!("Candidate queue is empty");
                self.phase = QueuePhase::Empty;
            }
            Ok(items) => {
                info!(count = items.len(), "Candidate queue loaded");
                self.items = items;
                self.cursor = 0;
                self.phase = QueuePhase::Ready;
            }
            Err(Error::SessionExpired) => self.phase = QueuePhase::SessionExpired,
            Err(Error::ServiceUnavailable) => self.phase = QueuePhase::ServiceUnavailable,
            Err(e) => {
                error!("Candidate queue fetch failed: {}", e);
                self.phase = QueuePhase::Error(e.to_string());
            }
        }
        &self.phase
    }

    /// Fetch through `fetch` unless a fetch was already issued
    pub async fn load<F, Fut>(&mut self, fetch: F) -> &QueuePhase
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<C>>>,
    {
        if !self.begin_load() {
            return &self.phase;
        }
        let result = fetch().await;
        self.finish_load(result)
    }

    /// Session expiry observed elsewhere overrides whatever the fetch said
    pub fn expire_session(&mut self) {
        self.phase = QueuePhase::SessionExpired;
    }

    /// A failure that invalidates the whole screen
    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = QueuePhase::Error(message.into());
    }

    /// Move past the current candidate
    ///
    /// Only meaningful while `Ready`. Returns the new current candidate, or
    /// `None` once exhausted.
    pub fn advance(&mut self) -> Option<&C> {
        if self.phase != QueuePhase::Ready {
            return None;
        }
        self.cursor += 1;
        if self.cursor >= self.items.len() {
            self.cursor = self.items.len();
            self.phase = QueuePhase::Exhausted;
            info!("Candidate queue exhausted");
            return None;
        }
        self.items.get(self.cursor)
    }

    pub fn current(&self) -> Option<&C> {
        if self.phase == QueuePhase::Ready {
            self.items.get(self.cursor)
        } else {
            None
        }
    }

    pub fn phase(&self) -> &QueuePhase {
        &self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    /// Fraction of the queue reviewed, for the progress bar
    pub fn progress(&self) -> f64 {
        if self.items.is_empty() {
            return if self.phase.is_out_of_candidates() { 1.0 } else { 0.0 };
        }
        self.cursor as f64 / self.items.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncopate_common::models::PersonCandidate;
    use syncopate_common::CandidateId;

    fn person(id: &str) -> PersonCandidate {
        PersonCandidate {
            id: CandidateId::from(id),
            username: format!("user-{}", id),
            profile_photo: None,
            faculty: None,
            term: None,
            concerts: vec![],
        }
    }

    fn loaded(ids: &[&str]) -> CandidateQueue<PersonCandidate> {
        let mut queue = CandidateQueue::new();
        assert!(queue.begin_load());
        queue.finish_load(Ok(ids.iter().map(|id| person(id)).collect()));
        queue
    }

    #[test]
    fn test_n_advances_exhaust_queue() {
        for n in 1..=5 {
            let ids: Vec<String> = (0..n).map(|i| i.to_string()).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut queue = loaded(&refs);

            assert_eq!(queue.cursor(), 0);
            for step in 0..n {
                assert_eq!(queue.phase(), &QueuePhase::Ready, "step {} of {}", step, n);
                queue.advance();
            }
            assert_eq!(queue.phase(), &QueuePhase::Exhausted);
            assert_eq!(queue.cursor(), n);
            assert!(queue.current().is_none());
            assert_eq!(queue.progress(), 1.0);
        }
    }

    #[test]
    fn test_empty_fetch_is_terminal() {
        let queue = loaded(&[]);
        assert_eq!(queue.phase(), &QueuePhase::Empty);
        assert!(queue.phase().is_out_of_candidates());
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_advance_returns_next_candidate() {
        let mut queue = loaded(&["a", "b"]);
        assert_eq!(queue.current().map(|c| c.id.as_str()), Some("a"));
        assert_eq!(queue.advance().map(|c| c.id.as_str()), Some("b"));
        assert_eq!(queue.cursor(), 1);
        assert_eq!(queue.remaining(), 1);
        assert_eq!(queue.progress(), 0.5);
    }

    #[test]
    fn test_advance_after_exhaustion_is_noop() {
        let mut queue = loaded(&["a"]);
        queue.advance();
        queue.advance();
        assert_eq!(queue.cursor(), 1);
        assert_eq!(queue.phase(), &QueuePhase::Exhausted);
    }

    #[test]
    fn test_load_latch() {
        let mut queue: CandidateQueue<PersonCandidate> = CandidateQueue::new();
        assert!(queue.begin_load());
        assert!(!queue.begin_load());
    }

    #[test]
    fn test_error_mapping() {
        let mut queue: CandidateQueue<PersonCandidate> = CandidateQueue::new();
        queue.finish_load(Err(Error::SessionExpired));
        assert_eq!(queue.phase(), &QueuePhase::SessionExpired);

        let mut queue: CandidateQueue<PersonCandidate> = CandidateQueue::new();
        queue.finish_load(Err(Error::ServiceUnavailable));
        assert_eq!(queue.phase(), &QueuePhase::ServiceUnavailable);

        let mut queue: CandidateQueue<PersonCandidate> = CandidateQueue::new();
        queue.finish_load(Err(Error::Http("connection reset".into())));
        assert_eq!(queue.phase(), &QueuePhase::Error("Network error: connection reset".into()));
    }

    #[test]
    fn test_settled_queue_ignores_late_results() {
        let mut queue = loaded(&["a"]);
        queue.finish_load(Err(Error::SessionExpired));
        assert_eq!(queue.phase(), &QueuePhase::Ready);
    }

    #[tokio::test]
    async fn test_load_fetches_once() {
        let mut queue: CandidateQueue<PersonCandidate> = CandidateQueue::new();
        let calls = std::cell::Cell::new(0);

        queue
            .load(|| {
                calls.set(calls.get() + 1);
                async { Ok(vec![person("a")]) }
            })
            .await;
        let phase = queue
            .load(|| {
                calls.set(calls.get() + 1);
                async { Ok(vec![]) }
            })
            .await;

        assert_eq!(phase, &QueuePhase::Ready);
        assert_eq!(calls.get(), 1);
        assert_eq!(queue.len(), 1);
    }
}
