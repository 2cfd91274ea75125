//! assoc-console: command-line console for an association backend.
//!
//! Shows the current user's permissions and reconciles server-side
//! notifications (list, acknowledge, open, live watch).

mod app;
mod commands;
mod config;
mod logging;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use assoc_core::{Action, Resource};

use crate::app::Console;
use crate::config::ConsoleConfig;

#[derive(Parser)]
#[command(name = "assoc-console")]
#[command(author, version, about = "Association admin console")]
#[command(propagate_version = true)]
struct Cli {
    /// REST API base URL (overrides ASSOC_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current profile and capability matrix
    Whoami,

    /// Check a single permission (exit code 1 when denied)
    Can {
        /// Action: view, create, edit, delete, validate_user
        action: Action,

        /// Resource: projects, members, finance, tasks, meetings, reports, pendingUsers, chatbot
        resource: Resource,
    },

    /// List notifications
    List {
        /// Only entries visible to the current role
        #[arg(long)]
        scoped: bool,

        /// Only unread entries
        #[arg(long)]
        unread: bool,
    },

    /// Print the unread count
    Unread,

    /// Mark one notification as read
    MarkRead {
        /// Notification id
        id: i64,
    },

    /// Mark every notification as read
    MarkAllRead,

    /// Open a notification: mark it read and show its route
    Open {
        /// Notification id
        id: i64,
    },

    /// Poll for new notifications until Ctrl-C
    Watch {
        /// Only print entries visible to the current role
        #[arg(long)]
        scoped: bool,

        /// Poll period in seconds (overrides ASSOC_POLL_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Store a bearer token
    Login {
        /// Token issued by the backend
        token: String,
    },

    /// Forget the stored bearer token
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = ConsoleConfig::from_env();
    if let Some(url) = cli.api_url {
        let client = config.client.clone().with_base_url(url);
        config = config.with_client(client);
    }
    if let Commands::Watch {
        interval: Some(secs),
        ..
    } = &cli.command
    {
        let reconciler = config.reconciler.clone().with_poll_interval_secs(*secs);
        config = config.with_reconciler(reconciler);
    }
    debug!(base_url = %config.client.base_url, "Configuration loaded");

    let console = Console::from_config(config)?;

    let output = match cli.command {
        Commands::Whoami => commands::whoami(&console).await?,
        Commands::Can { action, resource } => {
            let (allowed, text) = commands::can(&console, action, resource).await;
            println!("{}", text);
            return Ok(if allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            });
        }
        Commands::List { scoped, unread } => commands::list(&console, scoped, unread).await?,
        Commands::Unread => commands::unread(&console).await?,
        Commands::MarkRead { id } => commands::mark_read(&console, id).await?,
        Commands::MarkAllRead => commands::mark_all_read(&console).await?,
        Commands::Open { id } => commands::open(&console, id).await?,
        Commands::Watch { scoped, .. } => {
            commands::watch(&console, scoped).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Login { token } => commands::login(&console, &token)?,
        Commands::Logout => commands::logout(&console)?,
    };

    println!("{}", output);
    Ok(ExitCode::SUCCESS)
}
