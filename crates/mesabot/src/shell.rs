// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mesabot shell` command implementation.
//!
//! Launches an interactive conversation against the full router stack
//! with a colored prompt and readline history. The shell plays the role
//! of the chat transport: every line typed is an inbound message from
//! `--sender`, and replies print exactly as the remote user would
//! receive them.

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;

use mesabot_botpress::BotpressDialogue;
use mesabot_config::model::MesabotConfig;
use mesabot_core::{
    ChatTransport, DialogueAdapter, HelpdeskAdapter, MesabotError, StorageAdapter,
};
use mesabot_flow::{TechnicianNotifier, TicketFlow};
use mesabot_redmine::RedmineHelpdesk;
use mesabot_router::{MessageRouter, TypingProfile};
use mesabot_session::SessionStore;
use mesabot_storage::SqliteStorage;

use crate::local::{self, LocalTransport, OutputStyle};

/// How long a turn may stay silent before the prompt comes back.
const REPLY_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs the `mesabot shell` interactive REPL.
///
/// Builds the same stack as `serve` with two differences: replies print
/// verbatim instead of as bridge lines, and typing simulation is off,
/// since the delays exist for the benefit of the remote platform.
pub async fn run_shell(config: MesabotConfig, sender: &str) -> Result<(), MesabotError> {
    let sqlite = SqliteStorage::new(config.storage.clone());
    sqlite.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(sqlite);

    let helpdesk: Arc<dyn HelpdeskAdapter> =
        Arc::new(RedmineHelpdesk::new(&config).inspect_err(|_| {
            eprintln!(
                "error: Redmine is not usable. \
                 Set redmine.url and redmine.api_key (or REDMINE_API_KEY)."
            );
        })?);

    let dialogue: Arc<dyn DialogueAdapter> =
        Arc::new(BotpressDialogue::new(&config).inspect_err(|_| {
            eprintln!("error: Botpress is not usable. Set botpress.url and botpress.bot_id.");
        })?);

    let (transport, injector) = LocalTransport::new(OutputStyle::Pretty);
    let transport = Arc::new(transport);
    transport.connect().await?;

    let sessions = Arc::new(SessionStore::with_storage(storage.clone()));

    let mut notifier = TechnicianNotifier::new(helpdesk.clone(), transport.clone());
    if let Some(url) = &config.redmine.url {
        notifier = notifier.with_issue_url_base(url.clone());
    }

    let flow = Arc::new(
        TicketFlow::new(helpdesk)
            .with_storage(storage.clone())
            .with_notifier(Arc::new(notifier))
            .with_page_size(config.redmine.page_size),
    );

    // Typing delays exist for the remote platform; a local REPL only
    // gets slower with them.
    let router = Arc::new(
        MessageRouter::new(transport.clone(), dialogue, flow, sessions)
            .with_storage(storage)
            .with_typing(TypingProfile::instant()),
    );

    let cancel = CancellationToken::new();
    let loop_handle = tokio::spawn(router.run(cancel.clone()));

    // Set up readline editor.
    let mut rl = DefaultEditor::new()
        .map_err(|e| MesabotError::Internal(format!("failed to initialize readline: {e}")))?;

    // Print welcome message.
    println!("{}", "mesabot shell".bold().green());
    println!(
        "Conversing as {}. Type {} to exit.\n",
        sender.cyan(),
        "/quit".yellow()
    );

    // REPL loop.
    let prompt = format!("{}> ", "mesabot".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                let seen = transport.delivered();
                if injector.send(local::make_inbound(sender, trimmed)).is_err() {
                    break;
                }
                if transport.settle(seen, REPLY_TIMEOUT).await == seen {
                    println!("{}", "(no reply)".dimmed());
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    // The router's exit path checkpoints and closes storage.
    drop(injector);
    cancel.cancel();
    loop_handle
        .await
        .map_err(|e| MesabotError::Internal(format!("router task failed: {e}")))??;

    println!("{}", "goodbye".dimmed());
    Ok(())
}
