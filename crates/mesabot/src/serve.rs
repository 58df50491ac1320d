// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mesabot serve` command implementation.
//!
//! Wires the configured adapters to the message router and runs the
//! receive loop until stdin closes or a termination signal arrives. The
//! WhatsApp connection itself lives in a separate bridge process that
//! writes `sender<TAB>body` lines to this process's stdin and reads
//! reply lines of the same shape from its stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use mesabot_botpress::BotpressDialogue;
use mesabot_config::model::MesabotConfig;
use mesabot_core::types::InboundMessage;
use mesabot_core::{
    ChatTransport, DialogueAdapter, HelpdeskAdapter, MesabotError, StorageAdapter,
};
use mesabot_flow::{TechnicianNotifier, TicketFlow};
use mesabot_redmine::RedmineHelpdesk;
use mesabot_router::{MessageRouter, TypingProfile};
use mesabot_session::SessionStore;
use mesabot_storage::SqliteStorage;

use crate::local::{self, LocalTransport, OutputStyle};

/// Runs the `mesabot serve` command.
///
/// Initializes storage and the Redmine and Botpress adapters, builds the
/// ticket flow and message router on top of them, and runs the router
/// until the bridge closes stdin or a termination signal arrives.
pub async fn run_serve(config: MesabotConfig) -> Result<(), MesabotError> {
    // Initialize tracing subscriber.
    init_tracing(&config.agent.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting mesabot serve");

    // Storage first: every other component records through it.
    let sqlite = SqliteStorage::new(config.storage.clone());
    sqlite.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(sqlite);

    let helpdesk: Arc<dyn HelpdeskAdapter> = match RedmineHelpdesk::new(&config) {
        Ok(helpdesk) => Arc::new(helpdesk),
        Err(e) => {
            error!(error = %e, "redmine adapter initialization failed");
            eprintln!(
                "error: Redmine is not usable. \
                 Set redmine.url and redmine.api_key (or REDMINE_API_KEY)."
            );
            return Err(e);
        }
    };

    let dialogue: Arc<dyn DialogueAdapter> = match BotpressDialogue::new(&config) {
        Ok(dialogue) => Arc::new(dialogue),
        Err(e) => {
            error!(error = %e, "botpress adapter initialization failed");
            eprintln!("error: Botpress is not usable. Set botpress.url and botpress.bot_id.");
            return Err(e);
        }
    };

    let (transport, injector) = LocalTransport::new(OutputStyle::Bridge);
    let transport: Arc<dyn ChatTransport> = Arc::new(transport);
    transport.connect().await?;

    let sessions = Arc::new(SessionStore::with_storage(storage.clone()));

    let mut notifier = TechnicianNotifier::new(helpdesk.clone(), transport.clone());
    if let Some(url) = &config.redmine.url {
        notifier = notifier.with_issue_url_base(url.clone());
    }

    let flow = Arc::new(
        TicketFlow::new(helpdesk.clone())
            .with_storage(storage.clone())
            .with_notifier(Arc::new(notifier))
            .with_page_size(config.redmine.page_size),
    );

    let router = Arc::new(
        MessageRouter::new(transport, dialogue, flow, sessions)
            .with_storage(storage)
            .with_typing(TypingProfile::from_config(&config.transport)),
    );

    let reader = tokio::spawn(read_bridge_lines(injector));

    let cancel = install_signal_handler();
    router.run(cancel).await?;

    reader.abort();
    info!("mesabot serve shutdown complete");
    Ok(())
}

/// Feeds `sender<TAB>body` lines from stdin into the transport until EOF.
///
/// Stdin EOF drops the injector, which closes the transport's inbound
/// queue and lets the router loop exit on its own.
async fn read_bridge_lines(injector: UnboundedSender<InboundMessage>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let Some((sender, body)) = parse_bridge_line(&line) else {
                    warn!(line = %line, "malformed bridge line skipped");
                    continue;
                };
                if injector.send(local::make_inbound(sender, &body)).is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!("bridge stdin closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "bridge stdin read error");
                break;
            }
        }
    }
}

/// Splits a bridge line into sender and unescaped body.
///
/// Only the first tab separates; later raw tabs belong to the body.
fn parse_bridge_line(line: &str) -> Option<(&str, String)> {
    let (sender, body) = line.split_once('\t')?;
    let sender = sender.trim();
    if sender.is_empty() {
        return None;
    }
    Some((sender, local::unescape_line(body)))
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// is received. The handler task runs in the background until then.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber from the configured log level.
///
/// `RUST_LOG` wins when set; the fallback applies the configured level
/// globally and quiets the per-request noise of the HTTP stack.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
