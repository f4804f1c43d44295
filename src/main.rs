// Deckmind session host: stdio bridge
//
// Reads one JSON command per line on stdin and writes replies and session
// events as JSON lines on stdout. Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use deckmind_session::{CommandHandler, EventBus, HostOptions, SessionEvent, SessionRegistry};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};

/// Overrides the agent binary
const AGENT_PATH_ENV: &str = "DECKMIND_AGENT_PATH";

/// Overrides the hosting shell
const SHELL_ENV: &str = "DECKMIND_SHELL";

/// Upper bound on waiting for shells to report `session-closed` at exit
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for the registry to settle
const SETTLE_POLL: Duration = Duration::from_millis(20);

fn host_options() -> HostOptions {
    let mut builder = HostOptions::builder();
    if let Ok(agent) = std::env::var(AGENT_PATH_ENV) {
        builder = builder.agent_path(agent);
    }
    if let Ok(shell) = std::env::var(SHELL_ENV) {
        builder = builder.shell(shell);
    }
    builder.build()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let options = host_options();
    log::info!(
        "deckmind-session {} (agent: {})",
        deckmind_session::VERSION,
        options.agent_path
    );

    let bus = Arc::new(EventBus::new());
    let mut events = bus
        .attach_listener()
        .context("event listener already attached")?;
    let registry = SessionRegistry::new(options, bus.clone())?;
    let handler = CommandHandler::new(registry.clone());

    // Single stdout owner so replies and events never interleave mid-line
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let event_tx = out_tx.clone();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let forwarder = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => forward_event(&event_tx, &event),
                    None => break,
                },
                _ = &mut stop_rx => {
                    while let Ok(event) = events.try_recv() {
                        forward_event(&event_tx, &event);
                    }
                    break;
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = handler.handle_json(line).await;
        if out_tx.send(reply).is_err() {
            break;
        }
    }

    log::info!("stdin closed, shutting down");
    registry.shutdown();

    let settled = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        while !registry.is_settled() {
            tokio::time::sleep(SETTLE_POLL).await;
        }
    })
    .await;
    if settled.is_err() {
        log::warn!("Sessions still closing after {:?}", SHUTDOWN_TIMEOUT);
    }

    let _ = stop_tx.send(());
    forwarder.await?;
    drop(out_tx);
    writer.await??;

    Ok(())
}

fn forward_event(out: &mpsc::UnboundedSender<String>, event: &SessionEvent) {
    match serde_json::to_string(event) {
        Ok(line) => {
            let _ = out.send(line);
        }
        Err(e) => log::warn!("Failed to encode {} event: {}", event.name(), e),
    }
}
