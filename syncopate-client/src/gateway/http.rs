//! reqwest-backed [`Gateway`]
//!
//! Session credentials are the backend's auth cookie, kept in the client's
//! cookie store after login. No client-side timeout is set; a hung request
//! stays pending until the server or the network gives up.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use syncopate_common::config::normalize_base_url;
use syncopate_common::error::server_message;
use syncopate_common::models::{
    Concert, ConcertQuery, ConcertsResponse, CurrentUserResponse, DeleteMatchRequest,
    EmailRequest, FavoriteIdsResponse, FavoriteRequest, LoginChallenge, LoginRequest, Match,
    MatchesResponse, MatchingsResponse, MessageResponse, PersonCandidate, RegisterInitResponse,
    RegisterRequest, ReviewMatchingRequest, TotpSetupResponse, TotpVerifyRequest, UserData,
    VerifyTokenResponse,
};
use syncopate_common::{CandidateId, Decision, Error, Result};

use super::{paths, Gateway, LoginOutcome, RegisterOutcome};

const USER_AGENT: &str = concat!("syncopate-client/", env!("CARGO_PKG_VERSION"));

const TOKEN_REJECTED: &str = "Link or setup token is invalid or has expired";

/// HTTP client for the Syncopate backend
pub struct HttpGateway {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api`
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and map transport failures and non-2xx statuses
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.dispatch(request, false).await
    }

    /// Send a request authenticated by a one-off token (setup token, email
    /// link) instead of the session cookie
    ///
    /// A 401 here rejects the token; the session is untouched.
    async fn send_with_token(&self, request: RequestBuilder) -> Result<Response> {
        self.dispatch(request, true).await
    }

    async fn dispatch(&self, request: RequestBuilder, token_auth: bool) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Backend returned error status");
        if token_auth && status == StatusCode::UNAUTHORIZED {
            return Err(Error::Api {
                status: status.as_u16(),
                message: server_message(&body).unwrap_or_else(|| TOKEN_REJECTED.to_string()),
            });
        }
        Err(Error::from_status(status.as_u16(), &body))
    }

    /// `/auth/verify-token/<token>/` with the token as one encoded segment
    fn verify_token_url(&self, token: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url(paths::VERIFY_TOKEN))
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("API base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(token)
            .push("");
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");
        let response = self.send(self.http_client.get(&url).query(query)).await?;
        Self::decode(response).await
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");
        self.send(self.http_client.post(&url).json(body)).await
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn current_user(&self) -> Result<UserData> {
        let body: CurrentUserResponse = self.get_json(paths::CURRENT_USER, &[]).await?;
        Ok(body.user)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        let url = self.url(paths::LOGIN);
        tracing::debug!(url = %url, username = %request.username, "POST login");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(LoginOutcome::LoggedIn);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            // A 401 here is a credential or TOTP challenge, not an expired session
            let challenge: LoginChallenge = serde_json::from_str(&body).unwrap_or_default();
            if challenge.requires_totp {
                return Ok(LoginOutcome::TotpRequired {
                    message: challenge
                        .message
                        .unwrap_or_else(|| "TOTP code required".to_string()),
                });
            }
            return Err(Error::Api {
                status: status.as_u16(),
                message: challenge
                    .error
                    .or(challenge.message)
                    .unwrap_or_else(|| "Login failed".to_string()),
            });
        }

        Err(Error::from_status(status.as_u16(), &body))
    }

    async fn logout(&self) -> Result<()> {
        self.post(paths::LOGOUT, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn send_magic_link(&self, email: &str) -> Result<()> {
        self.post(paths::SEND_MAGIC_LINK, &EmailRequest { email }).await?;
        Ok(())
    }

    async fn verify_email_token(&self, token: &str) -> Result<String> {
        let url = self.verify_token_url(token)?;
        tracing::debug!(url = %url, "GET verify token");
        let response = self.send_with_token(self.http_client.get(url)).await?;
        let body: VerifyTokenResponse = Self::decode(response).await?;
        match (body.success, body.email) {
            (true, Some(email)) => Ok(email),
            _ => Err(Error::Api {
                status: 200,
                message: body.error.unwrap_or_else(|| "Verification failed".to_string()),
            }),
        }
    }

    async fn register_init(&self, request: &RegisterRequest) -> Result<RegisterOutcome> {
        let response = self.post(paths::REGISTER_INIT, request).await?;
        let body: RegisterInitResponse = Self::decode(response).await?;
        match (body.setup_token, body.user) {
            (Some(setup_token), _) => Ok(RegisterOutcome::TotpSetup { setup_token }),
            (None, Some(user)) => Ok(RegisterOutcome::Registered(user)),
            (None, None) => Err(Error::Parse(
                "register response carried neither setup_token nor user".to_string(),
            )),
        }
    }

    async fn totp_setup(&self, setup_token: &str) -> Result<String> {
        let url = self.url(paths::TOTP_SETUP);
        tracing::debug!(url = %url, "GET totp setup");
        let response = self
            .send_with_token(self.http_client.get(&url).bearer_auth(setup_token))
            .await?;
        let body: TotpSetupResponse = Self::decode(response).await?;
        Ok(body.qr_url)
    }

    async fn totp_verify(&self, setup_token: &str, code: &str) -> Result<()> {
        let url = self.url(paths::TOTP_VERIFY);
        tracing::debug!(url = %url, "POST totp verify");
        self.send_with_token(
            self.http_client
                .post(&url)
                .bearer_auth(setup_token)
                .json(&TotpVerifyRequest { code }),
        )
        .await?;
        Ok(())
    }

    async fn search_concerts(&self, query: &ConcertQuery) -> Result<Vec<Concert>> {
        let body: ConcertsResponse = self.get_json(paths::CONCERTS, &query.to_pairs()).await?;
        tracing::info!(
            location = query.location.code(),
            query = query.query.as_deref().unwrap_or(""),
            count = body.concerts.len(),
            "Concert search returned"
        );
        Ok(body.concerts)
    }

    async fn favorites(&self) -> Result<Vec<Concert>> {
        let body: ConcertsResponse = self.get_json(paths::FAVORITES, &[]).await?;
        Ok(body.concerts)
    }

    async fn favorite_ids(&self) -> Result<Vec<CandidateId>> {
        let body: FavoriteIdsResponse = self.get_json(paths::FAVORITE_IDS, &[]).await?;
        Ok(body.concerts)
    }

    async fn set_favorite(&self, concert_id: &CandidateId, favorite: bool) -> Result<Option<String>> {
        let path = if favorite { paths::FAVORITE } else { paths::UNFAVORITE };
        let response = self.post(path, &FavoriteRequest { concert: concert_id }).await?;
        let body: MessageResponse = Self::decode(response).await.unwrap_or_default();
        Ok(body.message)
    }

    async fn matchings(&self) -> Result<Vec<PersonCandidate>> {
        let body: MatchingsResponse = self.get_json(paths::MATCHINGS, &[]).await?;
        Ok(body.matchings)
    }

    async fn review_matching(&self, matching_id: &CandidateId, decision: Decision) -> Result<()> {
        self.post(
            paths::REVIEW_MATCHING,
            &ReviewMatchingRequest {
                matching_id,
                decision,
            },
        )
        .await?;
        Ok(())
    }

    async fn matches(&self) -> Result<Vec<Match>> {
        let body: MatchesResponse = self.get_json(paths::MATCHES, &[]).await?;
        Ok(body.matches)
    }

    async fn delete_match(&self, username: &str) -> Result<()> {
        self.post(paths::DELETE_MATCH, &DeleteMatchRequest { user: username })
            .await?;
        Ok(())
    }

    async fn concert_by_id(&self, id: &CandidateId) -> Result<Option<Concert>> {
        let body: ConcertsResponse = self
            .get_json(paths::CONCERT_BY_ID, &[("id", id.to_string())])
            .await?;
        Ok(body.concerts.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer one request with `status` and a JSON `body`; resolves to the
    /// request line that was received
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                received.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + content_length || n == 0 {
                        break;
                    }
                } else if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&received)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });
        (base, handle)
    }

    #[test]
    fn test_verify_token_is_one_path_segment() {
        let gateway = HttpGateway::new("http://localhost:8000/api").unwrap();
        let url = gateway.verify_token_url("ab/c?d#e").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/auth/verify-token/ab%2Fc%3Fd%23e/"
        );
        let url = gateway.verify_token_url("tok123").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/auth/verify-token/tok123/");
    }

    #[tokio::test]
    async fn test_verify_token_request_path() {
        let (base, request) =
            serve_once("200 OK", r#"{"success": true, "email": "alice@uwaterloo.ca"}"#).await;
        let gateway = HttpGateway::new(&base).unwrap();

        let email = gateway.verify_email_token("a/b").await.unwrap();
        assert_eq!(email, "alice@uwaterloo.ca");
        assert_eq!(
            request.await.unwrap(),
            "GET /api/auth/verify-token/a%2Fb/ HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_rejected_setup_token_is_not_session_expiry() {
        let (base, _request) = serve_once("401 Unauthorized", r#"{"error": "Invalid setup token"}"#).await;
        let gateway = HttpGateway::new(&base).unwrap();

        match gateway.totp_setup("stale-token").await {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid setup token");
            }
            other => panic!("expected token rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_totp_code_without_body_message() {
        let (base, _request) = serve_once("401 Unauthorized", "").await;
        let gateway = HttpGateway::new(&base).unwrap();

        match gateway.totp_verify("setup-123", "123456").await {
            Err(Error::Api { status: 401, message }) => assert_eq!(message, TOKEN_REJECTED),
            other => panic!("expected token rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_endpoints_still_map_401_to_expiry() {
        let (base, _request) = serve_once("401 Unauthorized", r#"{"detail": "not logged in"}"#).await;
        let gateway = HttpGateway::new(&base).unwrap();

        assert!(matches!(gateway.matchings().await, Err(Error::SessionExpired)));
    }

    #[test]
    fn test_client_creation() {
        let gateway = HttpGateway::new("http://localhost:8000/api/").unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:8000/api");
        assert_eq!(gateway.url(paths::MATCHINGS), "http://localhost:8000/api/concerts/matchings");
    }

    #[test]
    fn test_client_rejects_bad_base() {
        assert!(HttpGateway::new("localhost:8000").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on loopback is closed on test machines
        let gateway = HttpGateway::new("http://127.0.0.1:9/api").unwrap();
        match gateway.matchings().await {
            Err(Error::Http(_)) => {}
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
