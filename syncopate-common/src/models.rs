//! Wire models for the Syncopate REST API
//!
//! Concert payloads are passed through from Ticketmaster by the backend,
//! so their field names (`localDate`, `_embedded`) follow that API rather
//! than the backend's own snake_case.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ========================================
// Identity
// ========================================

/// Opaque candidate identity
///
/// The backend emits database keys as JSON numbers and Ticketmaster ids as
/// strings. Both are accepted and held as text; equality is textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for CandidateId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for CandidateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => CandidateId(s),
            RawId::Integer(n) => CandidateId(n.to_string()),
            RawId::Unsigned(n) => CandidateId(n.to_string()),
        })
    }
}

/// An entity presented one at a time for review
pub trait Candidate: Clone + Send + Sync + 'static {
    fn id(&self) -> &CandidateId;

    fn display_name(&self) -> &str;

    /// Ids resolved by the aggregation view while this candidate is current
    fn associated_ids(&self) -> &[CandidateId] {
        &[]
    }
}

// ========================================
// Decisions and search parameters
// ========================================

/// A review decision on a matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Yes,
    No,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Yes => write!(f, "YES"),
            Decision::No => write!(f, "NO"),
        }
    }
}

impl FromStr for Decision {
    type Err = Error;

    /// Accepts exactly `YES` or `NO`; the backend's `UNKNOWN` is not a decision
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YES" => Ok(Decision::Yes),
            "NO" => Ok(Decision::No),
            other => Err(Error::InvalidInput(format!("unapproved decision: {:?}", other))),
        }
    }
}

/// Search area understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    #[serde(rename = "ALL")]
    All,
    KW,
    TO,
}

impl Location {
    /// Value of the `location` query parameter
    pub fn code(&self) -> &'static str {
        match self {
            Location::All => "ALL",
            Location::KW => "KW",
            Location::TO => "TO",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Location::All => "all locations",
            Location::KW => "Kitchener-Waterloo",
            Location::TO => "Toronto",
        }
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(Location::All),
            "KW" => Ok(Location::KW),
            "TO" => Ok(Location::TO),
            other => Err(Error::InvalidInput(format!("unknown location: {}", other))),
        }
    }
}

/// Concert search parameters (`GET /concerts/?location=..&query=..`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcertQuery {
    pub location: Location,
    pub query: Option<String>,
}

impl ConcertQuery {
    pub fn new(location: Location, query: impl Into<String>) -> Self {
        let query = query.into();
        let query = query.trim();
        Self {
            location,
            query: (!query.is_empty()).then(|| query.to_string()),
        }
    }

    /// Query pairs in the order the dashboard sends them
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("location", self.location.code().to_string())];
        if let Some(q) = &self.query {
            pairs.push(("query", q.clone()));
        }
        pairs
    }

    /// Text shown when the search returns nothing
    pub fn no_results_message(&self) -> String {
        match (&self.query, self.location) {
            (Some(q), Location::All) => format!("No concerts found for \"{}\"", q),
            (Some(q), loc) => format!("No concerts found for \"{}\" at {}", q, loc.display_name()),
            (None, Location::All) => "No concerts found".to_string(),
            (None, loc) => format!("No concerts found at {}", loc.display_name()),
        }
    }
}

// ========================================
// Concerts
// ========================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcertStart {
    #[serde(rename = "localDate", default)]
    pub local_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcertDates {
    #[serde(default)]
    pub start: ConcertStart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcertImage {
    pub url: String,
    #[serde(default)]
    pub ratio: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub fallback: bool,
}

impl ConcertImage {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    #[serde(default)]
    pub id: Option<CandidateId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcertEmbedded {
    #[serde(default)]
    pub venues: Vec<Venue>,
}

/// A concert as returned by search, favorites and `concert_by_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concert {
    pub id: CandidateId,
    pub name: String,
    #[serde(default)]
    pub dates: ConcertDates,
    #[serde(default)]
    pub images: Vec<ConcertImage>,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<ConcertEmbedded>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Concert {
    /// Largest image by pixel area; the first one wins ties
    pub fn best_image(&self) -> Option<&ConcertImage> {
        self.images
            .iter()
            .fold(None, |best: Option<&ConcertImage>, image| match best {
                Some(b) if b.area() >= image.area() => Some(b),
                _ => Some(image),
            })
    }

    pub fn venue_name(&self) -> Option<&str> {
        self.embedded
            .as_ref()
            .and_then(|e| e.venues.first())
            .map(|v| v.name.as_str())
    }

    pub fn local_date(&self) -> Option<NaiveDate> {
        self.dates
            .start
            .local_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

impl Candidate for Concert {
    fn id(&self) -> &CandidateId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

// ========================================
// People, matchings and matches
// ========================================

/// A person offered for review by `GET /concerts/matchings`
///
/// `id` is the matching's id, not the user's; it is what gets reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonCandidate {
    pub id: CandidateId,
    pub username: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
    /// Concerts both users favorited
    #[serde(default)]
    pub concerts: Vec<CandidateId>,
}

impl PersonCandidate {
    /// Single-letter avatar used when there is no profile photo
    pub fn initial(&self) -> Option<char> {
        self.username.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

impl Candidate for PersonCandidate {
    fn id(&self) -> &CandidateId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.username
    }

    fn associated_ids(&self) -> &[CandidateId] {
        &self.concerts
    }
}

/// A confirmed mutual match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub username: String,
}

// ========================================
// Users
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub favorite_artists: Vec<NamedItem>,
    #[serde(default)]
    pub favorite_genres: Vec<NamedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

// ========================================
// Request / response envelopes
// ========================================

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserResponse {
    pub user: UserData,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConcertsResponse {
    #[serde(default)]
    pub concerts: Vec<Concert>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteIdsResponse {
    #[serde(default)]
    pub concerts: Vec<CandidateId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingsResponse {
    #[serde(default)]
    pub matchings: Vec<PersonCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchesResponse {
    #[serde(default)]
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteRequest<'a> {
    pub concert: &'a CandidateId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewMatchingRequest<'a> {
    #[serde(rename = "matchingId")]
    pub matching_id: &'a CandidateId,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteMatchRequest<'a> {
    pub user: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_code: Option<String>,
}

/// Body of a 401 from `/auth/login/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginChallenge {
    #[serde(default)]
    pub requires_totp: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInitResponse {
    #[serde(default)]
    pub user: Option<UserData>,
    #[serde(default)]
    pub setup_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTokenResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotpSetupResponse {
    pub qr_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotpVerifyRequest<'a> {
    pub code: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidate_id_accepts_numbers_and_strings() {
        let ids: Vec<CandidateId> = serde_json::from_value(json!([12, "vvG1zZ9", 7])).unwrap();
        assert_eq!(ids, vec![CandidateId::from(12), CandidateId::from("vvG1zZ9"), CandidateId::from(7)]);
        assert_eq!(serde_json::to_value(&ids[0]).unwrap(), json!("12"));
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!("YES".parse::<Decision>().unwrap(), Decision::Yes);
        assert_eq!("NO".parse::<Decision>().unwrap(), Decision::No);
        assert!("UNKNOWN".parse::<Decision>().is_err());
        assert!("yes".parse::<Decision>().is_err());
        assert_eq!(serde_json::to_value(Decision::Yes).unwrap(), json!("YES"));
    }

    #[test]
    fn test_review_request_shape() {
        let id = CandidateId::from(3);
        let body = serde_json::to_value(ReviewMatchingRequest {
            matching_id: &id,
            decision: Decision::No,
        })
        .unwrap();
        assert_eq!(body, json!({"matchingId": "3", "decision": "NO"}));
    }

    #[test]
    fn test_concert_from_ticketmaster_payload() {
        let concert: Concert = serde_json::from_value(json!({
            "id": "G5vYZ9",
            "name": "Drake: Anita Max Wynn Tour",
            "dates": {"start": {"localDate": "2024-07-12"}},
            "images": [
                {"url": "small.jpg", "width": 100, "height": 56, "ratio": "16_9", "fallback": false},
                {"url": "large.jpg", "width": 2048, "height": 1152, "ratio": "16_9", "fallback": false},
                {"url": "medium.jpg", "width": 640, "height": 360, "ratio": "16_9", "fallback": false}
            ],
            "_embedded": {"venues": [{"name": "Scotiabank Arena", "id": "KovZpZA7"}]},
            "url": "https://example.test/event"
        }))
        .unwrap();

        assert_eq!(concert.best_image().map(|i| i.url.as_str()), Some("large.jpg"));
        assert_eq!(concert.venue_name(), Some("Scotiabank Arena"));
        assert_eq!(concert.local_date(), NaiveDate::from_ymd_opt(2024, 7, 12));
        assert!(concert.info.is_none());
    }

    #[test]
    fn test_concert_without_images_or_venue() {
        let concert: Concert = serde_json::from_value(json!({"id": 5, "name": "Local Show"})).unwrap();
        assert!(concert.best_image().is_none());
        assert!(concert.venue_name().is_none());
        assert!(concert.local_date().is_none());
    }

    #[test]
    fn test_person_candidate_associated_ids() {
        let person: PersonCandidate = serde_json::from_value(json!({
            "id": 9,
            "username": "ada",
            "concerts": ["c1", "c2"]
        }))
        .unwrap();
        assert_eq!(person.associated_ids().len(), 2);
        assert_eq!(person.initial(), Some('A'));
        assert_eq!(person.display_name(), "ada");
    }

    #[test]
    fn test_no_results_messages() {
        let q = ConcertQuery::new(Location::TO, "Drake");
        assert_eq!(q.no_results_message(), "No concerts found for \"Drake\" at Toronto");
        assert_eq!(
            q.to_pairs(),
            vec![("location", "TO".to_string()), ("query", "Drake".to_string())]
        );

        let blank = ConcertQuery::new(Location::KW, "   ");
        assert!(blank.query.is_none());
        assert_eq!(blank.no_results_message(), "No concerts found at Kitchener-Waterloo");
        assert_eq!(ConcertQuery::default().no_results_message(), "No concerts found");
    }

    #[test]
    fn test_location_parsing() {
        assert_eq!("to".parse::<Location>().unwrap(), Location::TO);
        assert_eq!("ALL".parse::<Location>().unwrap(), Location::All);
        assert!("NYC".parse::<Location>().is_err());
    }
}
