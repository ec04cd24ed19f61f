//! Studiogate CLI - drive the studio session from a terminal.
//!
//! Stands in for the browser shell: persisted session storage, a router with
//! the navigation guard, and an API client that reacts to 401s.

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use studiogate_core::auth::{Expiry, TokenClaims};
use studiogate_core::config::{Config, StorageBackend};
use studiogate_core::{AppContext, LoginOutcome, MailStore};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "studiogate", version, about = "Studio session and navigation client")]
struct Cli {
    /// Override the API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Keep the session in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and persist the session
    Login {
        email: String,
        /// Path to open after signing in
        #[arg(long)]
        next: Option<String>,
    },
    /// Clear the session
    Logout,
    /// Show the current session
    Status,
    /// Navigate to a path and print where the guard lands
    Visit { path: String },
    /// Fetch the unread mail count
    Unread,
    /// List the route table
    Routes,
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control log level (e.g., RUST_LOG=debug).
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "studiogate.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    if cli.ephemeral {
        config.storage = StorageBackend::Memory;
    }

    let _log_guard = init_tracing(&config);
    info!(api_base = %config.api_base, storage = ?config.storage, "Studiogate starting");

    let ctx = AppContext::from_config(&config)?;

    match cli.command {
        Command::Login { email, next } => login(&ctx, &email, next.as_deref()).await,
        Command::Logout => {
            ctx.session.logout();
            println!("Signed out");
            Ok(())
        }
        Command::Status => {
            status(&ctx);
            Ok(())
        }
        Command::Visit { path } => {
            let landed = ctx.router.push(path.as_str())?;
            println!("{}", landed);
            Ok(())
        }
        Command::Unread => unread(&ctx).await,
        Command::Routes => {
            for route in ctx.router.routes().routes() {
                let access = if route.requires_auth { "protected" } else { "public" };
                match route.redirect {
                    Some(ref to) => println!("{:<16} -> {}", route.path, to),
                    None => println!(
                        "{:<16} {:<10} {}",
                        route.path,
                        access,
                        route.name.as_deref().unwrap_or("-")
                    ),
                }
            }
            Ok(())
        }
    }
}

async fn login(ctx: &AppContext, email: &str, next: Option<&str>) -> Result<()> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    match ctx.session.login(&ctx.api, email, &password).await? {
        LoginOutcome::Applied => {
            let user = ctx.session.user().map(|u| u.email).unwrap_or_default();
            println!("Signed in as {}", user);
        }
        LoginOutcome::Superseded => {
            println!("Login superseded by a newer attempt");
            return Ok(());
        }
    }

    if let Some(next) = next {
        let landed = ctx.router.push(next)?;
        println!("{}", landed);
    }
    Ok(())
}

fn status(ctx: &AppContext) {
    let session = ctx.session.snapshot();
    let Some(user) = session.user.as_ref().filter(|_| session.is_authed()) else {
        println!("Not signed in");
        return;
    };

    println!("Signed in as {} (id {})", user.email, user.id);
    let claims = match TokenClaims::decode(&session.token) {
        Ok(claims) => claims,
        Err(e) => {
            println!("Token cannot be decoded: {}", e);
            return;
        }
    };
    match claims.expiry() {
        Expiry::At(at) if ctx.session.is_expired() => println!("Token expired at {}", at),
        Expiry::At(at) => println!("Token expires at {}", at),
        Expiry::OutOfRange(exp) => println!("Token expires at epoch second {}", exp),
        Expiry::Never => println!("Token has no expiry"),
    }
}

async fn unread(ctx: &AppContext) -> Result<()> {
    let mut mail = MailStore::new();
    mail.fetch_unread(&ctx.api).await;

    if let Some(error) = mail.error {
        anyhow::bail!(error);
    }
    println!("{} unread", mail.unread);
    Ok(())
}
