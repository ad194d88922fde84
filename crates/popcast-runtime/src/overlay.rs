//! Overlay host task: owns the station and the surface.
//!
//! The station is reached only through [`OverlayHandle`]. Timers are not
//! separate tasks: the host sleeps until the station's next deadline and
//! advances it, so every state change happens on this one task.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};

use popcast_core::presenter::PresenterEffect;
use popcast_core::{AgentStatus, Command, Station, StationUpdate, ToastId, ToastView};

use crate::surface::Surface;

const REQUEST_QUEUE: usize = 64;

/// Typed request envelope into the overlay.
#[derive(Debug)]
pub enum OverlayRequest {
    Deliver(Command),
    Dismiss {
        id: ToastId,
        reply: oneshot::Sender<bool>,
    },
    Action {
        id: ToastId,
        reply: oneshot::Sender<bool>,
    },
    LogoFailed {
        id: ToastId,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<OverlaySnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlaySnapshot {
    pub toasts: Vec<ToastView>,
    pub interactive: bool,
    pub status: Option<AgentStatus>,
}

// ─── Handle ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OverlayHandle {
    tx: mpsc::Sender<OverlayRequest>,
}

impl OverlayHandle {
    pub async fn deliver(&self, command: Command) -> anyhow::Result<()> {
        self.tx
            .send(OverlayRequest::Deliver(command))
            .await
            .map_err(|_| anyhow::anyhow!("overlay is gone"))
    }

    pub async fn dismiss(&self, id: ToastId) -> anyhow::Result<bool> {
        self.ask(|reply| OverlayRequest::Dismiss { id, reply }).await
    }

    pub async fn action(&self, id: ToastId) -> anyhow::Result<bool> {
        self.ask(|reply| OverlayRequest::Action { id, reply }).await
    }

    pub async fn logo_failed(&self, id: ToastId) -> anyhow::Result<bool> {
        self.ask(|reply| OverlayRequest::LogoFailed { id, reply })
            .await
    }

    pub async fn snapshot(&self) -> anyhow::Result<OverlaySnapshot> {
        self.ask(|reply| OverlayRequest::Snapshot { reply }).await
    }

    /// Tear the overlay down. Reports OFFLINE before returning.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.ask(|reply| OverlayRequest::Shutdown { reply }).await
    }

    async fn ask<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> OverlayRequest,
    ) -> anyhow::Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| anyhow::anyhow!("overlay is gone"))?;
        rx.await.map_err(|_| anyhow::anyhow!("overlay dropped the request"))
    }
}

// ─── Host ─────────────────────────────────────────────────────────

struct OverlayHost<S: Surface> {
    station: Station,
    surface: S,
    origin: Instant,
    status_tx: mpsc::UnboundedSender<AgentStatus>,
}

/// Start the overlay task. The station is activated (ONLINE) immediately.
pub fn spawn_overlay<S: Surface>(
    station: Station,
    surface: S,
    status_tx: mpsc::UnboundedSender<AgentStatus>,
) -> (OverlayHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
    let host = OverlayHost {
        station,
        surface,
        origin: Instant::now(),
        status_tx,
    };
    let task = tokio::spawn(host.run(rx));
    (OverlayHandle { tx }, task)
}

impl<S: Surface> OverlayHost<S> {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// A deadline past what `Instant` can represent is treated as never.
    fn deadline(&self) -> Option<Instant> {
        self.station
            .next_deadline()
            .and_then(|ms| self.origin.checked_add(Duration::from_millis(ms)))
    }

    async fn run(mut self, mut rx: mpsc::Receiver<OverlayRequest>) {
        let update = self.station.activate();
        self.apply(update);

        loop {
            let deadline = self.deadline();
            tokio::select! {
                req = rx.recv() => match req {
                    Some(OverlayRequest::Shutdown { reply }) => {
                        self.terminate();
                        let _ = reply.send(());
                        return;
                    }
                    Some(req) => self.handle(req),
                    None => break,
                },
                () = wait_until(deadline) => {
                    let update = self.station.advance(self.now_ms());
                    self.apply(update);
                }
            }
        }

        // Every handle dropped: discard instance state.
        self.terminate();
    }

    fn handle(&mut self, req: OverlayRequest) {
        let now_ms = self.now_ms();
        // Catch up first so input never lands on a toast whose timer is due.
        let due = self.station.advance(now_ms);
        self.apply(due);

        match req {
            OverlayRequest::Deliver(command) => {
                let update = self.station.deliver(command, now_ms);
                self.apply(update);
            }
            OverlayRequest::Dismiss { id, reply } => {
                let update = self.station.dismiss(id, now_ms);
                let _ = reply.send(!update.effects.is_empty());
                self.apply(update);
            }
            OverlayRequest::Action { id, reply } => {
                let update = self.station.trigger_action(id, now_ms);
                let _ = reply.send(!update.effects.is_empty());
                self.apply(update);
            }
            OverlayRequest::LogoFailed { id, reply } => {
                let update = self.station.logo_failed(id);
                let _ = reply.send(!update.effects.is_empty());
                self.apply(update);
            }
            OverlayRequest::Snapshot { reply } => {
                let _ = reply.send(OverlaySnapshot {
                    toasts: self.station.views(),
                    interactive: self.station.is_interactive(),
                    status: self.station.status(),
                });
            }
            OverlayRequest::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn terminate(&mut self) {
        let update = self.station.terminate();
        self.apply(update);
        self.surface.render(&[]);
        tracing::debug!("overlay torn down");
    }

    fn apply(&mut self, update: StationUpdate) {
        if update.is_empty() {
            return;
        }
        let StationUpdate {
            effects,
            interactive,
            status,
        } = update;

        let mut rerender = false;
        for effect in effects {
            match effect {
                PresenterEffect::Cue { cue } => self.surface.play_cue(cue),
                PresenterEffect::Shake { id } => self.surface.shake(id),
                PresenterEffect::SpawnSuppressed { origin } => {
                    tracing::debug!("spawn from {origin} suppressed after kill");
                }
                PresenterEffect::Cleared { count } => {
                    tracing::info!("cleared {count} toasts");
                    rerender = true;
                }
                PresenterEffect::Shown { .. }
                | PresenterEffect::Countdown { .. }
                | PresenterEffect::Exiting { .. }
                | PresenterEffect::Removed { .. }
                | PresenterEffect::IconChanged { .. } => rerender = true,
            }
        }

        // Pointer capture must be on before a toast appears and stay on
        // until the last one is gone.
        if interactive == Some(true) {
            self.surface.request_interactive(true);
        }
        if rerender {
            self.surface.render(&self.station.views());
        }
        if interactive == Some(false) {
            self.surface.request_interactive(false);
        }

        if let Some(status) = status {
            if self.status_tx.send(status).is_err() {
                tracing::debug!("status writer gone; dropped {status}");
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::{RecordingSurface, SurfaceCall};
    use popcast_core::presenter::{CascadePlacement, Lifecycle};
    use popcast_core::{Bounds, Cue, EntryId, SpawnRequest, ToastContent};

    fn start() -> (
        OverlayHandle,
        JoinHandle<()>,
        RecordingSurface,
        mpsc::UnboundedReceiver<AgentStatus>,
    ) {
        let station = Station::new(Box::new(CascadePlacement::new(Bounds {
            width: 1920,
            height: 1080,
        })));
        let surface = RecordingSurface::default();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (handle, task) = spawn_overlay(station, surface.clone(), status_tx);
        (handle, task, surface, status_rx)
    }

    fn spawn_cmd(persistent: bool, duration_secs: u64) -> Command {
        Command::Spawn(SpawnRequest {
            origin: EntryId::new("e-1"),
            content: ToastContent {
                company_name: "Acme".into(),
                title: "Hello".into(),
                message: "World".into(),
                logo: None,
                duration_secs,
            },
            persistent,
        })
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AgentStatus>) -> Vec<AgentStatus> {
        let mut out = Vec::new();
        while let Ok(s) = rx.try_recv() {
            out.push(s);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn timed_toast_expires_on_its_own() {
        let (handle, _task, surface, _status) = start();
        handle.deliver(spawn_cmd(false, 2)).await.expect("deliver");
        let snap = handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.toasts.len(), 1);
        assert!(snap.interactive);

        tokio::time::sleep(Duration::from_millis(2_600)).await;
        let snap = handle.snapshot().await.expect("snapshot");
        assert!(snap.toasts.is_empty());
        assert!(!snap.interactive);
        assert_eq!(surface.interactive_changes(), vec![true, false]);
        assert!(
            surface
                .calls()
                .contains(&SurfaceCall::Cue(Cue::Ping { urgent: false }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_toast_reports_locked_then_online_after_kill() {
        let (handle, _task, surface, mut status) = start();
        handle.deliver(spawn_cmd(true, 0)).await.expect("deliver");
        let id = handle.snapshot().await.expect("snapshot").toasts[0].id;

        assert!(handle.dismiss(id).await.expect("dismiss"));
        assert!(surface.calls().contains(&SurfaceCall::Shake(id)));
        assert!(surface.calls().contains(&SurfaceCall::Cue(Cue::Error)));
        assert_eq!(handle.snapshot().await.expect("snapshot").toasts.len(), 1);

        handle.deliver(Command::KillAlerts).await.expect("deliver");
        let snap = handle.snapshot().await.expect("snapshot");
        assert!(snap.toasts.is_empty());
        assert_eq!(snap.status, Some(AgentStatus::Online));
        assert_eq!(
            drain(&mut status),
            vec![AgentStatus::Online, AgentStatus::Locked, AgentStatus::Online]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn action_replicates_after_stagger() {
        let (handle, _task, _surface, _status) = start();
        handle.deliver(spawn_cmd(false, 0)).await.expect("deliver");
        let id = handle.snapshot().await.expect("snapshot").toasts[0].id;

        assert!(handle.action(id).await.expect("action"));
        assert!(handle.snapshot().await.expect("snapshot").toasts.is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let snap = handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.toasts.len(), 2);
        assert!(snap.toasts.iter().all(|t| t.position.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_duration_does_not_expire_early() {
        let (handle, _task, _surface, _status) = start();
        handle.deliver(spawn_cmd(false, u64::MAX)).await.expect("deliver");

        tokio::time::sleep(Duration::from_secs(5)).await;
        let snap = handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.toasts.len(), 1);
        assert_eq!(snap.toasts[0].state, Lifecycle::Visible);
        assert!(snap.interactive);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_toast_is_not_handled() {
        let (handle, _task, _surface, _status) = start();
        assert!(!handle.dismiss(ToastId(42)).await.expect("dismiss"));
        assert!(!handle.logo_failed(ToastId(42)).await.expect("logo"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_reports_offline_and_stops() {
        let (handle, task, surface, mut status) = start();
        handle.deliver(spawn_cmd(false, 0)).await.expect("deliver");
        handle.shutdown().await.expect("shutdown");
        task.await.expect("task");

        assert_eq!(
            drain(&mut status),
            vec![AgentStatus::Online, AgentStatus::Offline]
        );
        assert_eq!(surface.interactive_changes(), vec![true, false]);
        assert!(handle.snapshot().await.is_err());
    }
}
