//! # Syncopate Common Library
//!
//! Shared code for the Syncopate client crates including:
//! - Wire models for the concert/matching REST API
//! - Error taxonomy (`Error` enum)
//! - Configuration loading
//! - Client event types (`ClientEvent` enum) and `EventBus`
//! - Client-side form validation

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod validation;

pub use error::{Error, Result};
pub use models::{CandidateId, Decision, Location};
