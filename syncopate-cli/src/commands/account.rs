//! login / logout / whoami / register

use anyhow::{Context, Result};
use clap::Subcommand;
use syncopate_client::screens::AuthFlow;
use syncopate_client::{ClientContext, RegisterOutcome};
use syncopate_common::validation::RegisterForm;

#[derive(Subcommand, Debug)]
pub enum RegisterCommand {
    /// Email a registration link
    SendLink { email: String },
    /// Check the token from the registration link
    Verify { token: String },
    /// Create the account for a verified email
    Init {
        /// Email returned by `register verify`
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "SYNCOPATE_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "SYNCOPATE_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: String,
    },
    /// Print the authenticator provisioning URL
    TotpSetup {
        #[arg(long, env = "SYNCOPATE_SETUP_TOKEN")]
        setup_token: String,
    },
    /// Confirm the authenticator with a first code
    TotpVerify {
        #[arg(long, env = "SYNCOPATE_SETUP_TOKEN")]
        setup_token: String,
        code: String,
    },
}

pub async fn whoami(auth: &AuthFlow) -> Result<()> {
    let user = auth.whoami().await.context("Could not fetch the current user")?;
    match user.email {
        Some(email) => println!("{} <{}>", user.username, email),
        None => println!("{}", user.username),
    }
    Ok(())
}

pub async fn logout(auth: &mut AuthFlow) -> Result<()> {
    auth.logout().await.context("Logout failed")?;
    println!("Logged out");
    Ok(())
}

pub async fn register(command: RegisterCommand, ctx: ClientContext) -> Result<()> {
    let mut flow = AuthFlow::new(ctx);
    match command {
        RegisterCommand::SendLink { email } => {
            flow.send_magic_link(&email).await?;
            println!("Check {} for a registration link", email.trim());
        }
        RegisterCommand::Verify { token } => {
            let email = flow.verify_email(&token).await?;
            println!("Verified {}", email);
            println!("Next: syncopate register init --email {} --username <name>", email);
        }
        RegisterCommand::Init {
            email,
            username,
            password,
            confirm_password,
        } => {
            flow.set_verified_email(email);
            let form = RegisterForm {
                username,
                password,
                confirm_password,
            };
            match flow.register(&form).await? {
                RegisterOutcome::Registered(user) => println!("Registered {}", user.username),
                RegisterOutcome::TotpSetup { setup_token } => {
                    println!("Account created; set up an authenticator to activate it");
                    println!("Setup token: {}", setup_token);
                    println!("Next: syncopate register totp-setup --setup-token <token>");
                }
            }
        }
        RegisterCommand::TotpSetup { setup_token } => {
            flow.set_setup_token(setup_token);
            let qr_url = flow.totp_setup().await?;
            println!("{}", qr_url);
        }
        RegisterCommand::TotpVerify { setup_token, code } => {
            flow.set_setup_token(setup_token);
            flow.totp_verify(code.trim()).await?;
            println!("Authenticator confirmed; you can now log in");
        }
    }
    Ok(())
}
