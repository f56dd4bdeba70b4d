//! Favorites screen

use syncopate_common::models::Concert;
use syncopate_common::CandidateId;
use tracing::{error, info};

use crate::favorites::FavoriteBook;
use crate::screens::search::ConcertRow;
use crate::session::GuardOutcome;
use crate::view::ViewState;
use crate::ClientContext;

pub const NO_FAVORITES: &str = "You have not favorited any concerts.";

pub struct FavoritesScreen {
    ctx: ClientContext,
    book: FavoriteBook,
    state: ViewState<Vec<Concert>>,
}

impl FavoritesScreen {
    pub fn new(ctx: ClientContext) -> Self {
        let book = FavoriteBook::new(ctx.gateway.clone(), ctx.session.clone(), ctx.events.clone());
        Self {
            ctx,
            book,
            state: ViewState::Loading,
        }
    }

    /// Session check and favorites fetch, run together
    pub async fn mount(&mut self) -> ViewState<Vec<ConcertRow>> {
        if self.ctx.session.is_expired() {
            self.state = ViewState::SessionExpired;
            return self.view();
        }

        self.state = ViewState::Loading;
        let guard = self.ctx.guard();
        let gateway = self.ctx.gateway.clone();
        let (outcome, fetched) = tokio::join!(guard.check(), gateway.favorites());

        self.state = match outcome {
            GuardOutcome::SessionExpired => ViewState::SessionExpired,
            GuardOutcome::Error(message) => ViewState::Error(message),
            GuardOutcome::Proceed(_) => {
                self.ctx.session.observe(&fetched);
                match fetched {
                    Ok(concerts) => {
                        info!(count = concerts.len(), "Favorites loaded");
                        self.book.reconcile(concerts.iter().map(|c| c.id.clone()));
                        ViewState::from_items(concerts, NO_FAVORITES)
                    }
                    Err(e) => {
                        error!("Failed to load favorites: {}", e);
                        ViewState::from_error(&e)
                    }
                }
            }
        };
        self.view()
    }

    /// Un-favoriting keeps the row on screen until the next mount
    pub async fn toggle_favorite(&mut self, concert_id: &CandidateId) -> bool {
        self.book.toggle(concert_id).await
    }

    pub fn view(&self) -> ViewState<Vec<ConcertRow>> {
        if self.ctx.session.is_expired() {
            return ViewState::SessionExpired;
        }
        self.state.clone().map(|concerts| {
            concerts
                .into_iter()
                .map(|concert| ConcertRow {
                    favorite: self.book.is_favorite(&concert.id),
                    write: self.book.write_state(&concert.id),
                    concert,
                })
                .collect()
        })
    }
}
