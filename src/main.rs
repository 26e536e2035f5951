//! Ollama Chat Client - CLI
//!
//! `chat` with no command starts the interactive REPL; the subcommands run a
//! single operation against the backend and exit.

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use ollama_chat_client::app::{App, SendOutcome};
use ollama_chat_client::dialog::{ConsoleInput, Dialog, DialogAnswer, ScriptedDialog, TerminalDialog};
use ollama_chat_client::models::SessionId;
use ollama_chat_client::prefs::FilePreferences;
use ollama_chat_client::transport::HttpBackend;
use ollama_chat_client::view::TerminalView;
use ollama_chat_client::{repl, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chat")]
#[command(about = "Terminal client for a session-based chat backend")]
struct Cli {
    /// Chat backend URL (overrides config.yaml)
    #[arg(long, env = "CHAT_SERVER_URL")]
    server: Option<String>,

    /// Path to a YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Repl,

    /// Check that the backend is reachable
    Ping,

    /// Session operations
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Print the messages of a chat
    History {
        /// Chat ID
        id: SessionId,
    },

    /// Send one message and stream the reply
    Send {
        /// Chat ID
        id: SessionId,

        /// Message text
        text: String,

        /// Model for this message only
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the selected model, or select a new one
    Model {
        /// Model to select
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List all chats
    List,

    /// Create a chat
    Create {
        /// Chat title (prompted for when omitted)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Rename a chat
    Rename {
        /// Chat ID
        id: SessionId,

        /// New title (prompted for when omitted)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Delete a chat
    Delete {
        /// Chat ID
        id: SessionId,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with chat output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    tracing::debug!(server = %config.server_url, "Using backend");

    let input = ConsoleInput::stdin().shared();
    let dialog: Box<dyn Dialog> = match &cli.command {
        Some(Commands::Sessions {
            action: SessionAction::Delete { yes: true, .. },
        }) => Box::new(ScriptedDialog::new([DialogAnswer::Confirm(true)])),
        _ => Box::new(TerminalDialog::new(input.clone())),
    };

    let backend = HttpBackend::with_connect_timeout(&config.server_url, config.connect_timeout)?;
    let mut app = App::new(
        Arc::new(backend),
        dialog,
        Box::new(TerminalView::stdout()),
        Box::new(FilePreferences::open(&config.preferences_path)),
        &config.default_model,
    );

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl::run(&mut app, input).await,
        Commands::Ping => {
            let message = app.ping().await?;
            println!("{} ({})", message, config.server_url);
            Ok(())
        }
        Commands::Sessions { action } => run_sessions(&mut app, action).await,
        Commands::History { id } => Ok(app.load_session(&id).await?),
        Commands::Send { id, text, model } => {
            if let Some(model) = model {
                app.override_model(&model);
            }
            app.load_session(&id).await?;
            app.set_input(text);
            let Some(reply) = app.start_send().await? else {
                bail!("Nothing to send");
            };
            match repl::stream_reply(&mut app, reply).await {
                SendOutcome::Interrupted => bail!("Reply was cut off"),
                _ => Ok(()),
            }
        }
        Commands::Model { name: None } => {
            println!("{}", app.state().selected_model);
            Ok(())
        }
        Commands::Model { name: Some(name) } => {
            app.select_model(&name);
            match app.state().notice.as_ref() {
                Some(notice) => bail!("{}", notice),
                None => Ok(()),
            }
        }
    }
}

async fn run_sessions(app: &mut App, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::List => {
            app.list_sessions().await?;
        }
        SessionAction::Create { title } => {
            let created = match title {
                Some(title) => app.create_session(&title).await?,
                None => app.prompt_create_session().await?,
            };
            match created {
                Some(session) => println!("Created chat {}: {}", session.id, session.title),
                None => println!("No title given, nothing created"),
            }
        }
        SessionAction::Rename { id, title } => {
            app.list_sessions().await?;
            let old_title = app
                .state()
                .sessions
                .get(&id)
                .map(|s| s.title.clone())
                .ok_or_else(|| anyhow!("No chat with id {}", id))?;
            let renamed = match title {
                Some(title) => app.rename_session(&id, &old_title, &title).await?,
                None => app.edit_session(&id, &old_title).await?,
            };
            match renamed {
                Some(session) => println!("Renamed chat {}: {}", session.id, session.title),
                None => println!("Title unchanged"),
            }
        }
        SessionAction::Delete { id, .. } => {
            if app.delete_session(&id).await? {
                println!("Deleted chat {}", id);
            } else {
                println!("Kept chat {}", id);
            }
        }
    }
    Ok(())
}
