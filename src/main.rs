use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use reader_tui::api::ReaderClient;
use reader_tui::app::{App, AppEvent};
use reader_tui::config::{self, mask_token, Config, TOKEN_URL};
use reader_tui::keybindings::KeybindingRegistry;
use reader_tui::ui::{self, reader::MarkdownRenderer};

#[derive(Parser, Debug)]
#[command(
    name = "reader",
    version,
    about = "Terminal reader for your Readwise Reader documents"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the stored access token
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Save an access token and check it with Readwise
    SetToken {
        /// Token from https://readwise.io/access_token
        token: String,
    },
    /// Show where to get a token and whether one is configured
    GetToken,
}

/// Build an API client from configuration.
fn build_client(config: &Config, token: secrecy::SecretString) -> Result<ReaderClient> {
    let client = ReaderClient::new(token)
        .context("Failed to create HTTP client")?
        .with_base_url(&config.base_url)
        .with_context(|| format!("Invalid base_url '{}'", config.base_url))?
        .with_auth_url(&config.auth_url)
        .with_context(|| format!("Invalid auth_url '{}'", config.auth_url))?
        .with_timeout(Duration::from_secs(config.request_timeout_secs));
    Ok(client)
}

async fn set_token(token: String) -> Result<()> {
    let path = config::config_path()?;
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let token = token.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }
    config.token = Some(token.clone());
    config
        .save(&path)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    println!("Token saved to {}", path.display());

    let client = build_client(&config, token.into())?;
    match client.validate_token().await {
        Ok(()) => println!("Token verified."),
        Err(e) => {
            tracing::warn!(error = %e, "Token validation failed");
            eprintln!("Warning: the token could not be verified: {}", e);
        }
    }
    Ok(())
}

fn get_token() -> Result<()> {
    let path = config::config_path()?;
    let config = Config::load(&path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    println!("Get your access token at: {}", TOKEN_URL);
    match config.resolve_token() {
        Ok(token) => println!("Token configured: {}", mask_token(token.expose_secret())),
        Err(_) => println!("No token configured. Run: reader config set-token <token>"),
    }
    Ok(())
}

async fn run_tui() -> Result<()> {
    let path = config::config_path()?;
    let config = Config::load(&path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let token = match config.resolve_token() {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let client = Arc::new(build_client(&config, token)?);

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!("{}", warning);
    }

    let renderer = MarkdownRenderer::new(config.wrap_width);
    let mut app = App::new(keybindings, Box::new(renderer));

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, client, event_tx, event_rx).await
}

#[tokio::main]
async fn main() -> Result<()> {
    // stderr keeps stdout clean for command output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Some(Command::Config {
            action: ConfigCommand::SetToken { token },
        }) => set_token(token).await,
        Some(Command::Config {
            action: ConfigCommand::GetToken,
        }) => get_token(),
        None => run_tui().await,
    }
}
