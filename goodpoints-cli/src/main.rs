//! Good Points CLI.

mod commands;
mod config;
mod handlers;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{chat, feed, group};
use tracing_subscriber::EnvFilter;

/// Good Points school messaging CLI
#[derive(Parser)]
#[command(name = "goodpoints")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "plain")]
    format: output::OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authentication
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// 1:1 conversations
    #[command(alias = "c")]
    Chat {
        #[command(subcommand)]
        action: chat::ChatAction,
    },

    /// Ad hoc group sends
    #[command(alias = "g")]
    Group {
        #[command(subcommand)]
        action: group::GroupAction,
    },

    /// Dated activity feeds
    #[command(alias = "f")]
    Feed {
        #[command(subcommand)]
        action: feed::FeedAction,
    },

    /// Show or change the configuration
    Config {
        /// Set the API base URL
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Login with an access token
    Login {
        /// Access token
        #[arg(short, long, env = "GOODPOINTS_TOKEN")]
        token: String,
    },
    /// Logout
    Logout,
    /// Show current auth status
    Status,
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Auth { action } => handle_auth(action),
        Commands::Chat { action } => chat::handle(action, cli.format, cli.verbose).await,
        Commands::Group { action } => group::handle(action, cli.format, cli.verbose).await,
        Commands::Feed { action } => feed::handle(action, cli.format, cli.verbose).await,
        Commands::Config { base_url } => handle_config(base_url),
    }
}

fn handle_config(base_url: Option<String>) -> Result<()> {
    let mut cfg = config::load_config()?;

    if let Some(url) = base_url {
        // Validate before persisting.
        goodpoints::GoodPointsClient::builder()
            .base_url(url.as_str())
            .build()?;
        cfg.base_url = Some(url);
        config::save_config(&cfg)?;
    }

    println!("Config file: {}", config::config_path()?.display());
    println!("Session file: {}", config::session_path()?.display());
    println!(
        "Base URL: {}",
        cfg.base_url
            .as_deref()
            .unwrap_or(goodpoints::client::DEFAULT_BASE_URL)
    );
    println!("Authenticated: {}", cfg.auth.is_some());
    Ok(())
}

fn handle_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { token } => {
            let auth = goodpoints::AuthInfo::new(token);
            anyhow::ensure!(auth.is_valid(), "That does not look like an access token");

            let mut cfg = config::load_config()?;
            cfg.auth = Some(config::AuthConfig { token: auth.token });
            config::save_config(&cfg)?;
            println!("{}", "Logged in".green());
            Ok(())
        }
        AuthAction::Logout => {
            let mut cfg = config::load_config()?;
            cfg.auth = None;
            config::save_config(&cfg)?;
            println!("Logged out");
            Ok(())
        }
        AuthAction::Status => {
            let cfg = config::load_config()?;
            if cfg.auth.is_some() {
                println!("{}", "Logged in".green());
            } else {
                println!("Not logged in");
            }
            Ok(())
        }
    }
}
