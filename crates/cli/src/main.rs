//! Lampstand CLI - browse and moderate the Lampstand Q&A backend.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password read from LAMPSTAND_PASSWORD or stdin)
//! lampstand login -e admin@example.com
//!
//! # Browse
//! lampstand topics list --search grace
//! lampstand topics show 64f1c2
//! lampstand questions list --topic 64f1c2
//! lampstand thread 650a9e
//!
//! # Ask a question
//! lampstand questions ask --topic 64f1c2 "What does grace mean here?"
//!
//! # Admin dashboard
//! lampstand dashboard
//! ```
//!
//! # Environment Variables
//!
//! - `LAMPSTAND_ENV`, `LAMPSTAND_API_URL`, `LAMPSTAND_REQUEST_TIMEOUT_SECS`,
//!   `LAMPSTAND_CACHE_CAPACITY` - client configuration
//! - `LAMPSTAND_CREDENTIALS` - credential file (default: `.lampstand/credentials.json`)
//! - `LAMPSTAND_LOG_FORMAT` - `json` for structured logs, text otherwise
//! - `RUST_LOG` - log filter (default: `lampstand_client=info,lampstand_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lampstand_client::{ApiClient, ClientConfig, FileCredentialStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

const DEFAULT_LOG_FILTER: &str = "lampstand_client=info,lampstand_cli=info";

#[derive(Parser)]
#[command(name = "lampstand")]
#[command(author, version, about = "Lampstand Q&A command-line client")]
struct Cli {
    /// Credential file holding the access token between runs
    #[arg(
        long,
        env = "LAMPSTAND_CREDENTIALS",
        default_value = ".lampstand/credentials.json"
    )]
    credentials: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the access token
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and forget stored credentials
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Browse topics
    Topics {
        #[command(subcommand)]
        action: TopicsAction,
    },
    /// Browse and ask questions
    Questions {
        #[command(subcommand)]
        action: QuestionsAction,
    },
    /// Show a discussion thread as a reply tree
    Thread {
        /// Thread id
        id: String,
    },
    /// Show admin dashboard counters and recent activity
    Dashboard {
        /// Number of activity entries
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum TopicsAction {
    /// List topics
    List {
        #[arg(short, long)]
        page: Option<u32>,
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one topic
    Show {
        /// Topic id
        id: String,
    },
}

#[derive(Subcommand)]
enum QuestionsAction {
    /// List questions
    List {
        /// Only questions under this topic
        #[arg(short, long)]
        topic: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Ask a question under a topic
    Ask {
        /// Topic id
        #[arg(short, long)]
        topic: String,
        /// The question
        question: String,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    // Logs go to stderr so command output on stdout stays machine-readable
    let json = std::env::var("LAMPSTAND_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let store = Arc::new(FileCredentialStore::open(&cli.credentials)?);
    let client = ApiClient::new(&config, store)?;
    client.on_session_expired(|| tracing::warn!("Session expired. Please log in again."));

    tracing::debug!(base_url = %config.base_url, "Client configured");

    match cli.command {
        Commands::Login { email } => commands::session::login(&client, &email).await,
        Commands::Logout => commands::session::logout(&client).await,
        Commands::Whoami => commands::session::whoami(&client).await,
        Commands::Topics { action } => match action {
            TopicsAction::List {
                page,
                limit,
                search,
            } => commands::browse::list_topics(&client, page, limit, search).await,
            TopicsAction::Show { id } => commands::browse::show_topic(&client, &id).await,
        },
        Commands::Questions { action } => match action {
            QuestionsAction::List { topic, page, limit } => {
                commands::browse::list_questions(&client, topic, page, limit).await
            }
            QuestionsAction::Ask { topic, question } => {
                commands::browse::ask_question(&client, &topic, &question).await
            }
        },
        Commands::Thread { id } => commands::browse::show_thread(&client, &id).await,
        Commands::Dashboard { limit } => commands::dashboard::show(&client, limit).await,
    }
}
