//! One controller per screen
//!
//! Controllers own their local state and return a [`ViewState`](crate::ViewState)
//! after every operation. They share the gateway, session and event bus
//! through [`ClientContext`](crate::ClientContext).

pub mod auth;
pub mod explore;
pub mod favorites;
pub mod matches;
pub mod search;

pub use auth::AuthFlow;
pub use explore::{ExploreCard, ExplorePeople, OUT_OF_CANDIDATES};
pub use favorites::{FavoritesScreen, NO_FAVORITES};
pub use matches::{MatchesScreen, NO_MATCHES};
pub use search::{ConcertRow, ConcertSearch};
