//! search / favorites / favorite

use anyhow::{bail, Result};
use syncopate_client::screens::{ConcertRow, ConcertSearch, FavoritesScreen};
use syncopate_client::{ClientContext, FavoriteBook, ViewState};
use syncopate_common::events::WriteState;
use syncopate_common::models::ConcertQuery;
use syncopate_common::{CandidateId, Location};

pub async fn search(ctx: ClientContext, location: Location, query: String) -> Result<()> {
    let mut screen = ConcertSearch::new(ctx);
    let view = screen.mount(ConcertQuery::new(location, query)).await;
    print_rows(view)
}

pub async fn favorites(ctx: ClientContext) -> Result<()> {
    let mut screen = FavoritesScreen::new(ctx);
    let view = screen.mount().await;
    print_rows(view)
}

/// Flip one concert's flag, starting from the server's current favorites
pub async fn toggle(ctx: ClientContext, concert_id: String) -> Result<()> {
    let ids = ctx.gateway.favorite_ids().await?;
    let mut book = FavoriteBook::new(ctx.gateway.clone(), ctx.session.clone(), ctx.events.clone());
    book.reconcile(ids);

    let concert_id = CandidateId::new(concert_id);
    let favorite = book.toggle(&concert_id).await;
    if let WriteState::Failed(message) = book.write_state(&concert_id) {
        bail!("Could not update {}: {}", concert_id, message);
    }
    if favorite {
        println!("Added {} to favorites", concert_id);
    } else {
        println!("Removed {} from favorites", concert_id);
    }
    Ok(())
}

fn print_rows(view: ViewState<Vec<ConcertRow>>) -> Result<()> {
    match view {
        ViewState::Ready(rows) => {
            for row in rows {
                let concert = &row.concert;
                let marker = if row.favorite { "*" } else { " " };
                let date = concert
                    .local_date()
                    .map(|d| d.format("%a %b %-d, %Y").to_string())
                    .unwrap_or_else(|| "TBA".to_string());
                let venue = concert.venue_name().unwrap_or("Venue TBA");
                println!("{} [{}] {} | {} | {}", marker, concert.id, concert.name, date, venue);
            }
            Ok(())
        }
        ViewState::Empty(message) => {
            println!("{}", message);
            Ok(())
        }
        ViewState::Loading => Ok(()),
        ViewState::SessionExpired => bail!("Session expired, please log in again"),
        ViewState::ServiceUnavailable => bail!("Concert search is temporarily unavailable"),
        ViewState::Error(message) => bail!(message),
    }
}
