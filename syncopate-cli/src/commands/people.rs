//! explore / matches / reach-out

use anyhow::{bail, Result};
use std::io::Write;
use syncopate_client::screens::{ExploreCard, ExplorePeople, MatchesScreen};
use syncopate_client::{AggregationStatus, ClientContext, ViewState};
use syncopate_common::Decision;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn explore(ctx: ClientContext) -> Result<()> {
    let mut screen = ExplorePeople::new(ctx);
    let mut view = screen.mount().await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if !matches!(view, ViewState::Ready(_)) {
            return finish(view);
        }
        screen.aggregation().wait_settled().await;
        if let ViewState::Ready(card) = screen.view() {
            print_card(&card);
        }

        print!("[y]es / [n]o / [q]uit > ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        view = match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => screen.review(Decision::Yes).await,
            "n" | "no" => screen.review(Decision::No).await,
            "q" | "quit" => return Ok(()),
            _ => {
                println!("Answer y, n or q");
                screen.view()
            }
        };
    }
}

fn print_card(card: &ExploreCard) {
    let person = &card.candidate;
    println!();
    println!("({}/{}) {}", card.position + 1, card.total, person.username);
    let details: Vec<&str> = [person.faculty.as_deref(), person.term.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !details.is_empty() {
        println!("    {}", details.join(", "));
    }

    let shared = &card.shared_concerts;
    match shared.status() {
        AggregationStatus::Ready => println!("    Shared concerts: {}", shared.items.join(", ")),
        AggregationStatus::NoneFound => println!("    No shared concerts found"),
        AggregationStatus::Idle | AggregationStatus::Loading { .. } => {}
    }
    if let Some(error) = shared.page_error() {
        println!("    ({})", error);
    }
    if let Some(notice) = &card.notice {
        println!("    Last decision was not saved: {}", notice);
    }
}

fn finish<T>(view: ViewState<T>) -> Result<()> {
    match view {
        ViewState::Empty(message) => {
            println!("{}", message);
            Ok(())
        }
        ViewState::SessionExpired => bail!("Session expired, please log in again"),
        ViewState::ServiceUnavailable => bail!("Service temporarily unavailable"),
        ViewState::Error(message) => bail!(message),
        ViewState::Loading | ViewState::Ready(_) => Ok(()),
    }
}

pub async fn matches(ctx: ClientContext) -> Result<()> {
    let mut screen = MatchesScreen::new(ctx);
    match screen.mount().await {
        ViewState::Ready(matches) => {
            for m in matches {
                println!("{}", m.username);
            }
            Ok(())
        }
        other => finish(other),
    }
}

pub async fn reach_out(ctx: ClientContext, username: &str) -> Result<()> {
    let mut screen = MatchesScreen::new(ctx);
    if let ViewState::Ready(matches) = screen.mount().await {
        if !matches.iter().any(|m| m.username == username) {
            bail!("{} is not one of your matches", username);
        }
    }
    screen.reach_out(username).await?;
    println!("Reached out to {}", username);
    Ok(())
}
