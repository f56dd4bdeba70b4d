//! Remote Gateway: the backend REST API as seen by the client
//!
//! Every screen talks to the backend through [`Gateway`], so tests can swap
//! in a scripted implementation. [`HttpGateway`] is the real one.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use syncopate_common::models::{
    Concert, ConcertQuery, LoginRequest, Match, PersonCandidate, RegisterRequest, UserData,
};
use syncopate_common::{CandidateId, Decision, Result};

/// Endpoint paths relative to the API root
pub mod paths {
    pub const CURRENT_USER: &str = "/auth/user/";
    pub const LOGIN: &str = "/auth/login/";
    pub const LOGOUT: &str = "/auth/logout/";
    pub const SEND_MAGIC_LINK: &str = "/auth/register/send_magic_link/";
    pub const VERIFY_TOKEN: &str = "/auth/verify-token/";
    pub const REGISTER_INIT: &str = "/auth/register/init/";
    pub const TOTP_SETUP: &str = "/auth/totp/setup/";
    pub const TOTP_VERIFY: &str = "/auth/totp/verify/";
    pub const CONCERTS: &str = "/concerts/";
    pub const FAVORITES: &str = "/concerts/favorites";
    pub const FAVORITE_IDS: &str = "/concerts/favorites_by_id/";
    pub const FAVORITE: &str = "/concerts/favorite/";
    pub const UNFAVORITE: &str = "/concerts/unfavorite/";
    pub const MATCHINGS: &str = "/concerts/matchings";
    pub const REVIEW_MATCHING: &str = "/concerts/review-matching/";
    pub const MATCHES: &str = "/concerts/matches";
    pub const DELETE_MATCH: &str = "/concerts/delete_match/";
    pub const CONCERT_BY_ID: &str = "/concerts/concert_by_id/";
}

/// Result of a credential login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    /// 401 with `requires_totp`; the form must collect a code and retry
    TotpRequired { message: String },
}

/// Result of `register/init`
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Registered(UserData),
    /// Account pending until a TOTP secret is confirmed
    TotpSetup { setup_token: String },
}

/// Backend API
///
/// Credentials are ambient (session cookie held by the implementation),
/// except the TOTP endpoints which take the registration setup token.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `GET /auth/user/`
    async fn current_user(&self) -> Result<UserData>;

    /// `POST /auth/login/`
    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome>;

    /// `POST /auth/logout/`
    async fn logout(&self) -> Result<()>;

    /// `POST /auth/register/send_magic_link/`
    async fn send_magic_link(&self, email: &str) -> Result<()>;

    /// `GET /auth/verify-token/<token>/`, returning the verified email
    async fn verify_email_token(&self, token: &str) -> Result<String>;

    /// `POST /auth/register/init/`
    async fn register_init(&self, request: &RegisterRequest) -> Result<RegisterOutcome>;

    /// `GET /auth/totp/setup/`, returning the provisioning QR URL
    async fn totp_setup(&self, setup_token: &str) -> Result<String>;

    /// `POST /auth/totp/verify/`
    async fn totp_verify(&self, setup_token: &str, code: &str) -> Result<()>;

    /// `GET /concerts/?location=..&query=..`
    async fn search_concerts(&self, query: &ConcertQuery) -> Result<Vec<Concert>>;

    /// `GET /concerts/favorites`
    async fn favorites(&self) -> Result<Vec<Concert>>;

    /// `GET /concerts/favorites_by_id/`
    async fn favorite_ids(&self) -> Result<Vec<CandidateId>>;

    /// `POST /concerts/favorite/` or `/concerts/unfavorite/`
    ///
    /// Returns the server's confirmation message, if any.
    async fn set_favorite(&self, concert_id: &CandidateId, favorite: bool) -> Result<Option<String>>;

    /// `GET /concerts/matchings`
    async fn matchings(&self) -> Result<Vec<PersonCandidate>>;

    /// `POST /concerts/review-matching/`
    async fn review_matching(&self, matching_id: &CandidateId, decision: Decision) -> Result<()>;

    /// `GET /concerts/matches`
    async fn matches(&self) -> Result<Vec<Match>>;

    /// `POST /concerts/delete_match/`
    async fn delete_match(&self, username: &str) -> Result<()>;

    /// `GET /concerts/concert_by_id/?id=`; `None` when the id resolves to nothing
    async fn concert_by_id(&self, id: &CandidateId) -> Result<Option<Concert>>;
}
