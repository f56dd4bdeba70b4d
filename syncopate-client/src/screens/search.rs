//! Concert search (dashboard)

use syncopate_common::events::WriteState;
use syncopate_common::models::{Concert, ConcertQuery};
use syncopate_common::CandidateId;
use tracing::{error, info, warn};

use crate::favorites::FavoriteBook;
use crate::session::GuardOutcome;
use crate::view::ViewState;
use crate::ClientContext;

/// One search result with its local favorite flag
#[derive(Debug, Clone, PartialEq)]
pub struct ConcertRow {
    pub concert: Concert,
    pub favorite: bool,
    pub write: WriteState,
}

pub struct ConcertSearch {
    ctx: ClientContext,
    favorites: FavoriteBook,
    favorites_loaded: bool,
    last_query: Option<ConcertQuery>,
    state: ViewState<Vec<Concert>>,
}

impl ConcertSearch {
    pub fn new(ctx: ClientContext) -> Self {
        let favorites = FavoriteBook::new(ctx.gateway.clone(), ctx.session.clone(), ctx.events.clone());
        Self {
            ctx,
            favorites,
            favorites_loaded: false,
            last_query: None,
            state: ViewState::Loading,
        }
    }

    /// Session check alongside the first search
    pub async fn mount(&mut self, query: ConcertQuery) -> ViewState<Vec<ConcertRow>> {
        let guard = self.ctx.guard();
        let (outcome, _) = tokio::join!(guard.check(), self.run_search(query));

        match outcome {
            GuardOutcome::SessionExpired => self.state = ViewState::SessionExpired,
            GuardOutcome::Error(message) => self.state = ViewState::Error(message),
            GuardOutcome::Proceed(_) => {}
        }
        self.view()
    }

    /// Run a search; favorite flags are fetched alongside the first one
    pub async fn search(&mut self, query: ConcertQuery) -> ViewState<Vec<ConcertRow>> {
        self.run_search(query).await;
        self.view()
    }

    async fn run_search(&mut self, query: ConcertQuery) {
        if self.ctx.session.is_expired() {
            self.state = ViewState::SessionExpired;
            return;
        }

        self.state = ViewState::Loading;
        let gateway = self.ctx.gateway.clone();
        let load_ids = !self.favorites_loaded;

        let (found, ids) = tokio::join!(gateway.search_concerts(&query), async {
            if load_ids {
                Some(gateway.favorite_ids().await)
            } else {
                None
            }
        });

        if let Some(ids) = ids {
            self.ctx.session.observe(&ids);
            match ids {
                Ok(ids) => {
                    self.favorites.reconcile(ids);
                    self.favorites_loaded = true;
                }
                Err(e) => warn!("Could not load favorite flags: {}", e),
            }
        }

        self.ctx.session.observe(&found);
        self.state = match found {
            Ok(concerts) => {
                info!(count = concerts.len(), "Search complete");
                ViewState::from_items(concerts, &query.no_results_message())
            }
            Err(e) => {
                error!("Concert search failed: {}", e);
                ViewState::from_error(&e)
            }
        };
        self.last_query = Some(query);
    }

    /// Flip a concert's favorite flag (optimistic, no rollback)
    pub async fn toggle_favorite(&mut self, concert_id: &CandidateId) -> bool {
        self.favorites.toggle(concert_id).await
    }

    pub fn view(&self) -> ViewState<Vec<ConcertRow>> {
        if self.ctx.session.is_expired() {
            return ViewState::SessionExpired;
        }
        self.state.clone().map(|concerts| {
            concerts
                .into_iter()
                .map(|concert| ConcertRow {
                    favorite: self.favorites.is_favorite(&concert.id),
                    write: self.favorites.write_state(&concert.id),
                    concert,
                })
                .collect()
        })
    }

    pub fn last_query(&self) -> Option<&ConcertQuery> {
        self.last_query.as_ref()
    }

    pub fn favorites(&self) -> &FavoriteBook {
        &self.favorites
    }
}
