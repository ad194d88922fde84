//! Per-agent station: presenter, interaction gate and presence reporter
//! composed into one reducer.
//!
//! The gate and the reporter are re-evaluated synchronously after every
//! call, so the caller never has to poll for either.

use crate::dispatch::Command;
use crate::gate::InteractionGate;
use crate::presence::PresenceReporter;
use crate::presenter::{Placement, Presenter, PresenterEffect, ToastId, ToastView};
use crate::types::AgentStatus;

/// Output of one station call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationUpdate {
    pub effects: Vec<PresenterEffect>,
    /// New gate mode, when it changed.
    pub interactive: Option<bool>,
    /// Status to publish, when it changed.
    pub status: Option<AgentStatus>,
}

impl StationUpdate {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.interactive.is_none() && self.status.is_none()
    }
}

pub struct Station {
    presenter: Presenter,
    gate: InteractionGate,
    presence: PresenceReporter,
}

impl Station {
    pub fn new(placement: Box<dyn Placement>) -> Self {
        Self {
            presenter: Presenter::new(placement),
            gate: InteractionGate::new(),
            presence: PresenceReporter::new(),
        }
    }

    // ── Queries ──

    pub fn views(&self) -> Vec<ToastView> {
        self.presenter.views()
    }

    pub fn visible_count(&self) -> usize {
        self.presenter.visible_count()
    }

    pub fn persistent_count(&self) -> usize {
        self.presenter.persistent_count()
    }

    pub fn is_interactive(&self) -> bool {
        self.gate.is_interactive()
    }

    pub fn status(&self) -> Option<AgentStatus> {
        self.presence.current()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.presenter.next_deadline()
    }

    // ── Lifecycle ──

    pub fn activate(&mut self) -> StationUpdate {
        StationUpdate {
            status: Some(self.presence.activate()),
            ..StationUpdate::default()
        }
    }

    /// Termination: drop everything and report OFFLINE.
    pub fn terminate(&mut self) -> StationUpdate {
        self.presenter.teardown();
        StationUpdate {
            effects: Vec::new(),
            interactive: self.gate.reset(),
            status: Some(self.presence.terminate()),
        }
    }

    // ── Inputs ──

    pub fn deliver(&mut self, command: Command, now_ms: u64) -> StationUpdate {
        let kill = matches!(command, Command::KillAlerts);
        let effects = self.presenter.deliver(command, now_ms);
        let mut update = self.settle(effects);
        if kill && self.presence.current().is_some() {
            update.status = Some(self.presence.reset());
        }
        update
    }

    pub fn dismiss(&mut self, id: ToastId, now_ms: u64) -> StationUpdate {
        let effects = self.presenter.dismiss(id, now_ms);
        self.settle(effects)
    }

    pub fn trigger_action(&mut self, id: ToastId, now_ms: u64) -> StationUpdate {
        let effects = self.presenter.trigger_action(id, now_ms);
        self.settle(effects)
    }

    pub fn logo_failed(&mut self, id: ToastId) -> StationUpdate {
        let effects = self.presenter.logo_failed(id);
        self.settle(effects)
    }

    pub fn advance(&mut self, now_ms: u64) -> StationUpdate {
        let effects = self.presenter.advance(now_ms);
        self.settle(effects)
    }

    fn settle(&mut self, effects: Vec<PresenterEffect>) -> StationUpdate {
        StationUpdate {
            effects,
            interactive: self.gate.observe(self.presenter.visible_count()),
            status: self.presence.observe(self.presenter.persistent_count()),
        }
    }
}
