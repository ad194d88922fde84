//! Poll loop: wires broadcast log → dedup → targeting → overlay.
//! Runs as a tokio task, polling the log head at a fixed interval.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval, timeout};

use popcast_core::{
    AgentId, AgentStatus, Bounds, Command, DedupCursor, Observation, Station, route,
};
use popcast_log::{AnyLog, BroadcastLog, LogLocation, StatusSink};

use crate::cli::AgentOpts;
use crate::overlay::{OverlayHandle, spawn_overlay};
use crate::placement::RandomPlacement;
use crate::provision;
use crate::server;
use crate::surface::TracingSurface;

/// Bound on the final OFFLINE write.
const OFFLINE_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-connection state of one agent. A new session starts with an
/// uninitialized cursor, so a reconnect never replays the current head.
#[derive(Debug, Clone)]
pub struct AgentSession {
    pub agent_id: AgentId,
    pub cursor: DedupCursor,
}

impl AgentSession {
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            cursor: DedupCursor::new(),
        }
    }
}

/// Run the agent: overlay, status writer, poll loop and UDS server. Waits
/// for a shutdown signal, then reports OFFLINE.
pub async fn run_agent(opts: AgentOpts, socket_path: &str) -> anyhow::Result<()> {
    let identity = provision::resolve_identity(opts.identity_file.as_deref())?;
    let credential = opts.credential.clone().or(identity.credential.clone());

    let location: LogLocation = opts.log_url.parse()?;
    let log = Arc::new(AnyLog::open(&location, credential.as_deref())?);
    tracing::info!(
        agent = %identity.id,
        backend = log.kind(),
        "agent starting, polling every {}ms",
        opts.poll_ms
    );

    // Status writer
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(run_status_writer(
        Arc::clone(&log),
        identity.id.clone(),
        status_rx,
    ));

    // Overlay
    let bounds = Bounds {
        width: opts.screen_width,
        height: opts.screen_height,
    };
    let station = Station::new(Box::new(RandomPlacement::new(bounds)));
    let (overlay, overlay_task) = spawn_overlay(station, TracingSurface::default(), status_tx);

    // Start UDS server
    let server_overlay = overlay.clone();
    let server_socket = socket_path.to_string();
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server::run_server(&server_socket, server_overlay).await {
            tracing::error!("UDS server error: {e}");
        }
    });

    // Start poll loop
    let poll_log = Arc::clone(&log);
    let poll_overlay = overlay.clone();
    let session = AgentSession::new(identity.id.clone());
    let poll_ms = opts.poll_ms.max(1);
    let mut poll_handle = tokio::spawn(async move {
        run_poll_loop(poll_log, session, poll_overlay, poll_ms).await;
    });

    // Wait for shutdown signal (ctrl-c or SIGTERM)
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            tracing::info!("received ctrl-c, shutting down");
        }
    };

    tokio::select! {
        () = shutdown => {}
        _ = &mut poll_handle => {
            tracing::warn!("poll loop exited unexpectedly");
        }
        _ = &mut server_handle => {
            tracing::warn!("server exited unexpectedly");
        }
    }

    poll_handle.abort();
    server_handle.abort();

    // Tear the overlay down; it queues OFFLINE and drops the status sender.
    if let Err(e) = overlay.shutdown().await {
        tracing::debug!("overlay shutdown: {e}");
    }
    drop(overlay);
    let _ = overlay_task.await;

    match timeout(OFFLINE_WRITE_TIMEOUT, writer).await {
        Ok(_) => {}
        Err(_) => tracing::warn!("timed out reporting OFFLINE"),
    }

    // Cleanup socket
    let _ = std::fs::remove_file(socket_path);
    tracing::info!("agent stopped");
    Ok(())
}

/// Forward status changes to the shared field in order. Ends when every
/// sender is dropped and the queue is drained.
pub async fn run_status_writer<S: StatusSink>(
    sink: S,
    agent: AgentId,
    mut rx: mpsc::UnboundedReceiver<AgentStatus>,
) {
    while let Some(status) = rx.recv().await {
        match sink.set_status(&agent, status).await {
            Ok(()) => tracing::debug!("reported {status} for {agent}"),
            Err(e) => tracing::warn!("status write failed ({status}): {e}"),
        }
    }
}

async fn run_poll_loop<L: BroadcastLog>(
    log: Arc<L>,
    mut session: AgentSession,
    overlay: OverlayHandle,
    poll_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(poll_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if let Err(e) = poll_tick(&*log, &mut session, &overlay).await {
            tracing::warn!("poll tick failed: {e}");
        }
    }
}

/// One poll: fetch the head, compare with the cursor, forward a novel
/// addressed entry. Returns the command delivered, if any.
///
/// A fetch failure leaves the cursor untouched; the next tick retries.
pub async fn poll_tick<L: BroadcastLog + ?Sized>(
    log: &L,
    session: &mut AgentSession,
    overlay: &OverlayHandle,
) -> anyhow::Result<Option<Command>> {
    let head = log.fetch_latest().await?;

    match session.cursor.observe(head.as_ref()) {
        Observation::Baseline => {
            match session.cursor.last_id() {
                Some(id) => tracing::debug!("baseline at {id}"),
                None => tracing::debug!("baseline on empty log"),
            }
            return Ok(None);
        }
        Observation::Unchanged => return Ok(None),
        Observation::Novel => {}
    }
    let Some(entry) = head else {
        return Ok(None);
    };

    let Some(command) = route(&entry, &session.agent_id) else {
        tracing::debug!("entry {} not addressed to {}", entry.id, session.agent_id);
        return Ok(None);
    };
    if !command.is_actionable() {
        tracing::debug!("entry {}: {} has no renderer, ignored", entry.id, entry.entry_type);
        return Ok(None);
    }

    tracing::info!("entry {}: {}", entry.id, entry.entry_type);
    overlay.deliver(command.clone()).await?;
    Ok(Some(command))
}
