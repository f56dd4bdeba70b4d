//! Login and registration flows
//!
//! Registration is a chain: magic link, token verification, account
//! creation with the verified email, then TOTP enrolment with the setup
//! token the server handed back. [`AuthFlow`] holds the values that carry
//! from one step to the next.

use syncopate_common::models::{LoginRequest, RegisterRequest, UserData};
use syncopate_common::validation::{validate_email, validate_totp_code, LoginForm, RegisterForm};
use syncopate_common::{Error, Result};
use tracing::{info, warn};

use crate::gateway::{LoginOutcome, RegisterOutcome};
use crate::ClientContext;

pub struct AuthFlow {
    ctx: ClientContext,
    requires_totp: bool,
    verified_email: Option<String>,
    setup_token: Option<String>,
}

impl AuthFlow {
    pub fn new(ctx: ClientContext) -> Self {
        Self {
            ctx,
            requires_totp: false,
            verified_email: None,
            setup_token: None,
        }
    }

    /// Whether the server has asked for a TOTP code on this login
    pub fn requires_totp(&self) -> bool {
        self.requires_totp
    }

    /// Validate and submit credentials
    ///
    /// A TOTP challenge switches the flow into code mode; the next call must
    /// carry a code. On success the session is re-checked so every screen
    /// sees the new identity.
    pub async fn login(&mut self, form: &LoginForm) -> Result<LoginOutcome> {
        form.validate(self.requires_totp)?;

        let request = LoginRequest {
            username: form.username.trim().to_string(),
            password: form.password.clone(),
            totp_code: self.requires_totp.then(|| form.totp_code.clone()),
        };

        let outcome = self.ctx.gateway.login(&request).await?;
        match &outcome {
            LoginOutcome::TotpRequired { message } => {
                info!(username = %request.username, "TOTP challenge: {}", message);
                self.requires_totp = true;
            }
            LoginOutcome::LoggedIn => {
                info!(username = %request.username, "Logged in");
                self.requires_totp = false;
                self.ctx.session.reset();
                match self.ctx.gateway.current_user().await {
                    Ok(user) => self.ctx.session.mark_authenticated(user),
                    Err(e) => warn!("Identity check after login failed: {}", e),
                }
            }
        }
        Ok(outcome)
    }

    /// Log out; the local session is cleared even if the request fails
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.ctx.gateway.logout().await;
        self.ctx.session.reset();
        self.requires_totp = false;
        match &result {
            Ok(()) => info!("Logged out"),
            Err(e) => warn!("Logout request failed: {}", e),
        }
        result
    }

    pub async fn whoami(&self) -> Result<UserData> {
        let result = self.ctx.gateway.current_user().await;
        self.ctx.session.observe(&result);
        if let Ok(user) = &result {
            self.ctx.session.mark_authenticated(user.clone());
        }
        result
    }

    /// Step 1: email a registration link
    pub async fn send_magic_link(&mut self, email: &str) -> Result<()> {
        validate_email(email)?;
        let email = email.trim();
        self.ctx.gateway.send_magic_link(email).await?;
        info!(email, "Magic link sent");
        Ok(())
    }

    /// Step 2: exchange the link's token for the verified email
    pub async fn verify_email(&mut self, token: &str) -> Result<String> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidInput("Verification token is required".to_string()));
        }
        let email = self.ctx.gateway.verify_email_token(token).await?;
        info!(email = %email, "Email verified");
        self.verified_email = Some(email.clone());
        Ok(email)
    }

    /// Resume a registration whose email was verified elsewhere
    pub fn set_verified_email(&mut self, email: impl Into<String>) {
        self.verified_email = Some(email.into());
    }

    pub fn verified_email(&self) -> Option<&str> {
        self.verified_email.as_deref()
    }

    /// Step 3: create the account
    pub async fn register(&mut self, form: &RegisterForm) -> Result<RegisterOutcome> {
        let Some(email) = self.verified_email.clone() else {
            return Err(Error::InvalidInput("Email has not been verified".to_string()));
        };
        form.validate()?;

        let request = RegisterRequest {
            username: form.username.trim().to_string(),
            email,
            password: form.password.clone(),
        };
        let outcome = self.ctx.gateway.register_init(&request).await?;
        match &outcome {
            RegisterOutcome::TotpSetup { setup_token } => {
                info!(username = %request.username, "Account pending TOTP setup");
                self.setup_token = Some(setup_token.clone());
            }
            RegisterOutcome::Registered(user) => {
                info!(username = %user.username, "Account registered");
            }
        }
        Ok(outcome)
    }

    /// Resume TOTP enrolment with a token obtained earlier
    pub fn set_setup_token(&mut self, token: impl Into<String>) {
        self.setup_token = Some(token.into());
    }

    pub fn setup_token(&self) -> Option<&str> {
        self.setup_token.as_deref()
    }

    /// Step 4: fetch the provisioning QR URL
    pub async fn totp_setup(&self) -> Result<String> {
        let token = self.require_setup_token()?;
        self.ctx.gateway.totp_setup(token).await
    }

    /// Step 5: confirm the authenticator with a first code
    pub async fn totp_verify(&mut self, code: &str) -> Result<()> {
        validate_totp_code(code)?;
        let token = self.require_setup_token()?;
        self.ctx.gateway.totp_verify(token, code).await?;
        info!("TOTP enrolment complete");
        self.setup_token = None;
        Ok(())
    }

    fn require_setup_token(&self) -> Result<&str> {
        self.setup_token
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("No registration in progress".to_string()))
    }
}
