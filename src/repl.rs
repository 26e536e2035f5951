//! Interactive loop: read a line, run it against the `App`
//!
//! Lines starting with `/` are commands; anything else is sent to the open
//! chat. A leading `//` sends a literal slash.

use crate::app::{App, InFlightReply, ReplyProgress, SendOutcome};
use crate::dialog::SharedInput;
use crate::models::SessionId;
use anyhow::Result;
use std::io::Write;
use tracing::debug;

const HELP: &str = "\
Commands:
  /list             list chats
  /new              create a chat
  /open <id>        open a chat and show its history
  /rename <id>      rename a chat
  /delete <id>      delete a chat
  /model [name]     show or switch the model
  /help             this text
  /quit             leave
Anything else is sent to the open chat. Ctrl-C stops a reply.";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    List,
    New,
    Open(SessionId),
    Rename(SessionId),
    Delete(SessionId),
    Model(Option<String>),
    Help,
    Quit,
    Send(String),
    /// Unknown command or missing argument; carries a hint for the user
    Invalid(String),
}

/// Parse a line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<ReplCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(literal) = trimmed.strip_prefix("//") {
        return Some(ReplCommand::Send(format!("/{}", literal)));
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Some(ReplCommand::Send(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (command, None),
    };

    let with_id = |make: fn(SessionId) -> ReplCommand| match arg {
        Some(id) => make(SessionId::new(id)),
        None => ReplCommand::Invalid(format!("usage: /{} <id>", name)),
    };

    Some(match name {
        "list" | "ls" => ReplCommand::List,
        "new" => ReplCommand::New,
        "open" => with_id(ReplCommand::Open),
        "rename" => with_id(ReplCommand::Rename),
        "delete" | "rm" => with_id(ReplCommand::Delete),
        "model" => ReplCommand::Model(arg.map(str::to_string)),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("unknown command /{} (try /help)", other)),
    })
}

/// Run until `/quit` or end of input.
///
/// Request failures are already shown by the view as notices, so they do
/// not end the loop.
pub async fn run(app: &mut App, input: SharedInput) -> Result<()> {
    let _ = app.list_sessions().await;
    println!("Type /help for commands.");

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = input.lock().await.read_line().await?;
        let Some(line) = line else {
            println!();
            break;
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };
        debug!(?command, "REPL command");

        match command {
            ReplCommand::List => {
                let _ = app.list_sessions().await;
            }
            ReplCommand::New => {
                if let Ok(Some(session)) = app.prompt_create_session().await {
                    let _ = app.load_session(&session.id).await;
                }
            }
            ReplCommand::Open(id) => {
                let _ = app.load_session(&id).await;
            }
            ReplCommand::Rename(id) => match app.state().sessions.get(&id) {
                Some(session) => {
                    let old_title = session.title.clone();
                    let _ = app.edit_session(&id, &old_title).await;
                }
                None => println!("No chat {} in the list (try /list)", id),
            },
            ReplCommand::Delete(id) => {
                let _ = app.delete_session(&id).await;
            }
            ReplCommand::Model(None) => println!("model: {}", app.state().selected_model),
            ReplCommand::Model(Some(model)) => app.select_model(&model),
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => break,
            ReplCommand::Invalid(hint) => println!("{}", hint),
            ReplCommand::Send(text) => {
                if app.state().sessions.current_id().is_none() {
                    println!("Open a chat first (/open <id> or /new)");
                    continue;
                }
                app.set_input(text);
                if let Ok(Some(reply)) = app.start_send().await {
                    let outcome = stream_reply(app, reply).await;
                    debug!(?outcome, "Reply ended");
                }
            }
        }
    }

    Ok(())
}

/// Drive a reply to its end, cancelling it on Ctrl-C.
pub async fn stream_reply(app: &mut App, mut reply: InFlightReply) -> SendOutcome {
    loop {
        tokio::select! {
            event = reply.next_event() => {
                if let ReplyProgress::Done(outcome) = app.apply_reply_event(&mut reply, event) {
                    return outcome;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                return app.cancel_reply(&mut reply);
            }
        }
    }
}
