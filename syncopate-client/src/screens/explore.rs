//! Explore people: swipe-style review of match candidates
//!
//! Mounting issues the session check and the queue fetch concurrently.
//! The session result takes precedence when both settle, so a 401 always
//! lands on the session-expired state even if the queue fetch succeeded
//! first, and nothing from the queue is ever drawn in that case.

use syncopate_common::events::ClientEvent;
use syncopate_common::models::{Candidate, PersonCandidate};
use syncopate_common::{Decision, Error};
use tracing::info;

use crate::aggregation::{AggregationSnapshot, AggregationView};
use crate::decision::DecisionSubmitter;
use crate::queue::{CandidateQueue, QueuePhase};
use crate::session::{GuardOutcome, SessionGuard};
use crate::view::ViewState;
use crate::ClientContext;

/// Shown when the queue is empty or exhausted
pub const OUT_OF_CANDIDATES: &str = "You've reached your matching limit. Please come back later!";

/// The candidate currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreCard {
    pub candidate: PersonCandidate,
    pub position: usize,
    pub total: usize,
    pub progress: f64,
    pub shared_concerts: AggregationSnapshot,
    /// Last swallowed submission failure
    pub notice: Option<String>,
}

pub struct ExplorePeople {
    ctx: ClientContext,
    guard: SessionGuard,
    queue: CandidateQueue<PersonCandidate>,
    submitter: DecisionSubmitter,
    aggregation: AggregationView,
    last_error: Option<String>,
}

impl ExplorePeople {
    pub fn new(ctx: ClientContext) -> Self {
        let guard = ctx.guard();
        let submitter = DecisionSubmitter::new(ctx.gateway.clone(), ctx.session.clone(), ctx.events.clone());
        let aggregation = AggregationView::new(ctx.gateway.clone(), ctx.session.clone(), ctx.events.clone());
        Self {
            ctx,
            guard,
            queue: CandidateQueue::new(),
            submitter,
            aggregation,
            last_error: None,
        }
    }

    /// Session check and queue fetch; repeated calls fetch nothing
    pub async fn mount(&mut self) -> ViewState<ExploreCard> {
        if !self.queue.begin_load() {
            return self.view();
        }

        if self.ctx.session.is_expired() {
            self.queue.expire_session();
            return self.view();
        }

        let gateway = self.ctx.gateway.clone();
        let (guard_outcome, fetched) = tokio::join!(self.guard.check(), gateway.matchings());

        match guard_outcome {
            GuardOutcome::SessionExpired => self.queue.expire_session(),
            GuardOutcome::Error(message) => self.queue.fail(message),
            GuardOutcome::Proceed(_) => {
                self.ctx.session.observe(&fetched);
                self.queue.finish_load(fetched);
            }
        }

        match self.queue.phase() {
            QueuePhase::Ready => {
                self.ctx.events.emit_lossy(ClientEvent::QueueLoaded { len: self.queue.len() });
                self.restart_aggregation();
            }
            QueuePhase::Empty => self.ctx.events.emit_lossy(ClientEvent::QueueExhausted),
            _ => {}
        }
        self.view()
    }

    /// Submit a decision on the current candidate, then move on
    ///
    /// The cursor advances once the submission attempt settles, whether or
    /// not it succeeded.
    pub async fn review(&mut self, decision: Decision) -> ViewState<ExploreCard> {
        let Some(current) = self.queue.current() else {
            return self.view();
        };
        let candidate_id = current.id().clone();

        let result = self.submitter.submit(&candidate_id, decision).await;
        self.after_submission(result.err());
        self.view()
    }

    /// Like [`review`](Self::review) with an untyped decision
    ///
    /// Values other than `YES`/`NO` are not submitted; the cursor still
    /// advances.
    pub async fn review_raw(&mut self, decision: &str) -> ViewState<ExploreCard> {
        let Some(current) = self.queue.current() else {
            return self.view();
        };
        let candidate_id = current.id().clone();

        let result = self.submitter.submit_raw(&candidate_id, decision).await;
        self.after_submission(result.err());
        self.view()
    }

    fn after_submission(&mut self, failure: Option<Error>) {
        let expired = failure.as_ref().is_some_and(Error::is_session_expired);
        match failure {
            None => self.last_error = None,
            // Programming error, already logged by the submitter
            Some(Error::InvalidInput(_)) => {}
            Some(e) if !expired => self.last_error = Some(e.to_string()),
            _ => {}
        }

        self.queue.advance();
        if expired {
            self.queue.expire_session();
            return;
        }
        match self.queue.phase() {
            QueuePhase::Ready => {
                self.ctx.events.emit_lossy(ClientEvent::QueueAdvanced {
                    cursor: self.queue.cursor(),
                    len: self.queue.len(),
                });
                self.restart_aggregation();
            }
            QueuePhase::Exhausted => {
                info!(reviewed = self.queue.len(), "All candidates reviewed");
                self.aggregation.restart(&[]);
                self.ctx.events.emit_lossy(ClientEvent::QueueExhausted);
            }
            _ => {}
        }
    }

    fn restart_aggregation(&self) {
        if let Some(current) = self.queue.current() {
            self.aggregation.restart(current.associated_ids());
        }
    }

    /// What to draw right now
    pub fn view(&self) -> ViewState<ExploreCard> {
        if self.ctx.session.is_expired() {
            return ViewState::SessionExpired;
        }
        match self.queue.phase() {
            QueuePhase::Loading => ViewState::Loading,
            QueuePhase::Empty | QueuePhase::Exhausted => ViewState::Empty(OUT_OF_CANDIDATES.to_string()),
            QueuePhase::SessionExpired => ViewState::SessionExpired,
            QueuePhase::ServiceUnavailable => ViewState::ServiceUnavailable,
            QueuePhase::Error(message) => ViewState::Error(message.clone()),
            QueuePhase::Ready => match self.queue.current() {
                Some(candidate) => ViewState::Ready(ExploreCard {
                    candidate: candidate.clone(),
                    position: self.queue.cursor(),
                    total: self.queue.len(),
                    progress: self.queue.progress(),
                    shared_concerts: self.aggregation.snapshot(),
                    notice: self.last_error.clone(),
                }),
                None => ViewState::Empty(OUT_OF_CANDIDATES.to_string()),
            },
        }
    }

    pub fn queue(&self) -> &CandidateQueue<PersonCandidate> {
        &self.queue
    }

    pub fn aggregation(&self) -> &AggregationView {
        &self.aggregation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
