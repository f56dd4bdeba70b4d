//! Matches screen: confirmed mutual matches

use syncopate_common::events::ClientEvent;
use syncopate_common::models::Match;
use syncopate_common::Result;
use tracing::{error, info, warn};

use crate::session::GuardOutcome;
use crate::view::ViewState;
use crate::ClientContext;

pub const NO_MATCHES: &str = "No matches available right now. Please come back later!";

pub struct MatchesScreen {
    ctx: ClientContext,
    matches: Vec<Match>,
    state: ViewState<()>,
    last_error: Option<String>,
}

impl MatchesScreen {
    pub fn new(ctx: ClientContext) -> Self {
        Self {
            ctx,
            matches: Vec::new(),
            state: ViewState::Loading,
            last_error: None,
        }
    }

    pub async fn mount(&mut self) -> ViewState<Vec<Match>> {
        if self.ctx.session.is_expired() {
            self.state = ViewState::SessionExpired;
            return self.view();
        }

        self.state = ViewState::Loading;
        let guard = self.ctx.guard();
        let gateway = self.ctx.gateway.clone();
        let (outcome, fetched) = tokio::join!(guard.check(), gateway.matches());

        self.state = match outcome {
            GuardOutcome::SessionExpired => ViewState::SessionExpired,
            GuardOutcome::Error(message) => ViewState::Error(message),
            GuardOutcome::Proceed(_) => {
                self.ctx.session.observe(&fetched);
                match fetched {
                    Ok(matches) => {
                        info!(count = matches.len(), "Matches loaded");
                        self.matches = matches;
                        ViewState::Ready(())
                    }
                    Err(e) => {
                        error!("Failed to load matches: {}", e);
                        ViewState::from_error(&e)
                    }
                }
            }
        };
        self.view()
    }

    /// Remove a match locally, then ask the server to delete it
    ///
    /// The row stays removed if the request fails.
    pub async fn reach_out(&mut self, username: &str) -> Result<()> {
        self.matches.retain(|m| m.username != username);

        let result = self.ctx.gateway.delete_match(username).await;
        self.ctx.session.observe(&result);
        match &result {
            Ok(()) => {
                info!(username, "Match removed");
                self.last_error = None;
            }
            Err(e) => {
                warn!(username, "Failed to delete match: {}", e);
                self.last_error = Some(e.to_string());
                self.ctx.events.emit_lossy(ClientEvent::ErrorSurfaced {
                    message: e.to_string(),
                });
            }
        }
        result
    }

    pub fn view(&self) -> ViewState<Vec<Match>> {
        if self.ctx.session.is_expired() {
            return ViewState::SessionExpired;
        }
        match &self.state {
            ViewState::Ready(()) => ViewState::from_items(self.matches.clone(), NO_MATCHES),
            other => other.clone().map(|_| Vec::new()),
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
