//! Subcommands

pub mod account;
pub mod concerts;
pub mod config;
pub mod people;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use syncopate_client::screens::AuthFlow;
use syncopate_client::{ClientContext, LoginOutcome};
use syncopate_common::config::TomlConfig;
use syncopate_common::validation::LoginForm;
use syncopate_common::Location;
use tracing::debug;

/// Login used by commands that need a session
#[derive(Args, Debug, Clone, Default)]
pub struct Credentials {
    #[arg(long, short = 'u', global = true, env = "SYNCOPATE_USERNAME")]
    pub username: Option<String>,

    #[arg(long, global = true, env = "SYNCOPATE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Six-digit authenticator code, for accounts with TOTP enabled
    #[arg(long, global = true)]
    pub totp: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check credentials and print who they belong to
    Login,
    /// Log in, then end the session on the server
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Search concerts
    Search {
        /// ALL, KW or TO; defaults to the configured location
        #[arg(long, short = 'l')]
        location: Option<Location>,
        /// Artist, event or venue
        query: Option<String>,
    },
    /// List favorited concerts
    Favorites,
    /// Flip the favorite flag of a concert
    Favorite {
        concert_id: String,
    },
    /// Review people who share your concerts, one at a time
    Explore,
    /// List mutual matches
    Matches,
    /// Reach out to a match, removing it from the list
    ReachOut {
        username: String,
    },
    /// Create an account
    #[command(subcommand)]
    Register(account::RegisterCommand),
    /// Manage the config file
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

pub async fn run(command: Command, credentials: &Credentials, toml_config: &TomlConfig, ctx: ClientContext) -> Result<()> {
    match command {
        Command::Register(cmd) => account::register(cmd, ctx).await,
        Command::Config(_) => bail!("config commands do not talk to the server"),
        Command::Login | Command::Whoami => {
            let auth = signed_in(&ctx, credentials).await?;
            account::whoami(&auth).await
        }
        Command::Logout => {
            let mut auth = signed_in(&ctx, credentials).await?;
            account::logout(&mut auth).await
        }
        Command::Search { location, query } => {
            signed_in(&ctx, credentials).await?;
            let location = location.or(toml_config.default_location).unwrap_or_default();
            concerts::search(ctx, location, query.unwrap_or_default()).await
        }
        Command::Favorites => {
            signed_in(&ctx, credentials).await?;
            concerts::favorites(ctx).await
        }
        Command::Favorite { concert_id } => {
            signed_in(&ctx, credentials).await?;
            concerts::toggle(ctx, concert_id).await
        }
        Command::Explore => {
            signed_in(&ctx, credentials).await?;
            people::explore(ctx).await
        }
        Command::Matches => {
            signed_in(&ctx, credentials).await?;
            people::matches(ctx).await
        }
        Command::ReachOut { username } => {
            signed_in(&ctx, credentials).await?;
            people::reach_out(ctx, &username).await
        }
    }
}

async fn signed_in(ctx: &ClientContext, credentials: &Credentials) -> Result<AuthFlow> {
    let mut auth = AuthFlow::new(ctx.clone());
    login(&mut auth, credentials).await?;
    Ok(auth)
}

/// Log in with the given credentials, answering a TOTP challenge if one comes
async fn login(auth: &mut AuthFlow, credentials: &Credentials) -> Result<()> {
    let (Some(username), Some(password)) = (&credentials.username, &credentials.password) else {
        bail!("This command needs --username and --password (or SYNCOPATE_USERNAME / SYNCOPATE_PASSWORD)");
    };

    let mut form = LoginForm {
        username: username.clone(),
        password: password.clone(),
        totp_code: credentials.totp.clone().unwrap_or_default(),
    };

    if let LoginOutcome::TotpRequired { message } = auth.login(&form).await? {
        debug!("Server asked for a TOTP code");
        if form.totp_code.is_empty() {
            bail!("{} (pass --totp)", message);
        }
        form.totp_code = form.totp_code.trim().to_string();
        if let LoginOutcome::TotpRequired { message } = auth.login(&form).await? {
            bail!(message);
        }
    }
    Ok(())
}
