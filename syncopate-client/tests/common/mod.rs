//! Scripted in-memory gateway shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use syncopate_client::{ClientContext, Gateway, LoginOutcome, RegisterOutcome};
use syncopate_common::events::EventBus;
use syncopate_common::models::{
    Concert, ConcertQuery, LoginRequest, Match, PersonCandidate, RegisterRequest, UserData,
};
use syncopate_common::{CandidateId, Decision, Error, Result};
use tokio::sync::Notify;

#[derive(Default)]
pub struct FakeGateway {
    pub user: Mutex<Option<UserData>>,
    pub matchings: Mutex<Vec<PersonCandidate>>,
    pub concerts: Mutex<Vec<Concert>>,
    pub favorites: Mutex<Vec<Concert>>,
    pub favorite_ids: Mutex<Vec<CandidateId>>,
    pub matches: Mutex<Vec<Match>>,
    /// id to concert name for `concert_by_id`
    pub names: Mutex<HashMap<String, String>>,
    pub login_replies: Mutex<VecDeque<LoginOutcome>>,
    pub register_reply: Mutex<Option<RegisterOutcome>>,
    /// endpoint name to HTTP status it fails with
    failures: Mutex<HashMap<&'static str, u16>>,
    /// `concert_by_id` ids that fail with the given status
    lookup_failures: Mutex<HashMap<String, u16>>,
    /// `concert_by_id` lookups held until notified
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        let fake = Self::default();
        *fake.user.lock().unwrap() = Some(user("alice1"));
        Arc::new(fake)
    }

    pub fn fail(&self, endpoint: &'static str, status: u16) {
        self.failures.lock().unwrap().insert(endpoint, status);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failures.lock().unwrap().remove(endpoint);
    }

    /// Fail `concert_by_id` for this id only
    pub fn fail_lookup(&self, id: &str, status: u16) {
        self.lookup_failures
            .lock()
            .unwrap()
            .insert(id.to_string(), status);
    }

    /// Hold lookups of `id` until the returned handle is notified
    pub fn gate(&self, id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(id.to_string(), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, endpoint: &'static str, detail: String) -> Result<()> {
        let entry = if detail.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}:{}", endpoint, detail)
        };
        self.calls.lock().unwrap().push(entry);
        match self.failures.lock().unwrap().get(endpoint) {
            Some(status) => Err(Error::from_status(*status, "")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn current_user(&self) -> Result<UserData> {
        self.record("current_user", String::new())?;
        self.user.lock().unwrap().clone().ok_or(Error::SessionExpired)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        self.record("login", request.totp_code.clone().unwrap_or_default())?;
        Ok(self
            .login_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(LoginOutcome::LoggedIn))
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout", String::new())
    }

    async fn send_magic_link(&self, email: &str) -> Result<()> {
        self.record("send_magic_link", email.to_string())
    }

    async fn verify_email_token(&self, token: &str) -> Result<String> {
        self.record("verify_email_token", token.to_string())?;
        Ok("alice@uwaterloo.ca".to_string())
    }

    async fn register_init(&self, request: &RegisterRequest) -> Result<RegisterOutcome> {
        self.record("register_init", request.email.clone())?;
        Ok(self
            .register_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(RegisterOutcome::TotpSetup {
                setup_token: "setup-123".to_string(),
            }))
    }

    async fn totp_setup(&self, setup_token: &str) -> Result<String> {
        self.record("totp_setup", setup_token.to_string())?;
        Ok("otpauth://totp/syncopate:alice1?secret=ABC".to_string())
    }

    async fn totp_verify(&self, setup_token: &str, code: &str) -> Result<()> {
        self.record("totp_verify", format!("{}:{}", setup_token, code))
    }

    async fn search_concerts(&self, query: &ConcertQuery) -> Result<Vec<Concert>> {
        self.record("search_concerts", query.query.clone().unwrap_or_default())?;
        Ok(self.concerts.lock().unwrap().clone())
    }

    async fn favorites(&self) -> Result<Vec<Concert>> {
        self.record("favorites", String::new())?;
        Ok(self.favorites.lock().unwrap().clone())
    }

    async fn favorite_ids(&self) -> Result<Vec<CandidateId>> {
        self.record("favorite_ids", String::new())?;
        Ok(self.favorite_ids.lock().unwrap().clone())
    }

    async fn set_favorite(&self, concert_id: &CandidateId, favorite: bool) -> Result<Option<String>> {
        self.record("set_favorite", format!("{}:{}", concert_id, favorite))?;
        Ok(Some("ok".to_string()))
    }

    async fn matchings(&self) -> Result<Vec<PersonCandidate>> {
        self.record("matchings", String::new())?;
        Ok(self.matchings.lock().unwrap().clone())
    }

    async fn review_matching(&self, matching_id: &CandidateId, decision: Decision) -> Result<()> {
        self.record("review_matching", format!("{}:{}", matching_id, decision))
    }

    async fn matches(&self) -> Result<Vec<Match>> {
        self.record("matches", String::new())?;
        Ok(self.matches.lock().unwrap().clone())
    }

    async fn delete_match(&self, username: &str) -> Result<()> {
        self.record("delete_match", username.to_string())
    }

    async fn concert_by_id(&self, id: &CandidateId) -> Result<Option<Concert>> {
        self.record("concert_by_id", id.to_string())?;
        let gate = self.gates.lock().unwrap().get(id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let failure = self.lookup_failures.lock().unwrap().get(id.as_str()).copied();
        if let Some(status) = failure {
            return Err(Error::from_status(status, r#"{"error": "Concert lookup failed"}"#));
        }
        let name = self.names.lock().unwrap().get(id.as_str()).cloned();
        Ok(name.map(|name| concert(id.as_str(), &name)))
    }
}

pub fn context(fake: &Arc<FakeGateway>) -> ClientContext {
    let gateway: Arc<dyn Gateway> = fake.clone();
    ClientContext::new(gateway, Arc::new(EventBus::new(64)))
}

pub fn user(username: &str) -> UserData {
    UserData {
        id: 7,
        username: username.to_string(),
        email: None,
        profile: None,
    }
}

pub fn person(id: &str, username: &str, concerts: &[&str]) -> PersonCandidate {
    PersonCandidate {
        id: CandidateId::from(id),
        username: username.to_string(),
        profile_photo: None,
        faculty: Some("Math".to_string()),
        term: Some("3A".to_string()),
        concerts: concerts.iter().map(|c| CandidateId::from(*c)).collect(),
    }
}

pub fn concert(id: &str, name: &str) -> Concert {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "dates": { "start": { "localDate": "2026-11-20" } },
        "images": [],
        "_embedded": { "venues": [{ "name": "Budweiser Stage" }] }
    }))
    .expect("valid concert json")
}
