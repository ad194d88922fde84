//! Station presence reporter: presenter state → `Agent.status`.

use crate::types::AgentStatus;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PresenceReporter {
    /// Last status emitted; `None` before activation.
    current: Option<AgentStatus>,
}

impl PresenceReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<AgentStatus> {
        self.current
    }

    /// Agent came up. Always reports ONLINE.
    pub fn activate(&mut self) -> AgentStatus {
        self.set(AgentStatus::Online)
    }

    /// LOCKED while any persistent toast is up, ONLINE otherwise. Emits only
    /// on change, and only after activation.
    pub fn observe(&mut self, persistent_count: usize) -> Option<AgentStatus> {
        let current = self.current?;
        if current == AgentStatus::Offline {
            return None;
        }
        let want = if persistent_count > 0 {
            AgentStatus::Locked
        } else {
            AgentStatus::Online
        };
        (want != current).then(|| self.set(want))
    }

    /// KILL_ALERTS: report ONLINE even when nothing changed.
    pub fn reset(&mut self) -> AgentStatus {
        self.set(AgentStatus::Online)
    }

    /// Termination signal.
    pub fn terminate(&mut self) -> AgentStatus {
        self.set(AgentStatus::Offline)
    }

    fn set(&mut self, status: AgentStatus) -> AgentStatus {
        self.current = Some(status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_before_activation() {
        let mut p = PresenceReporter::new();
        assert_eq!(p.observe(3), None);
        assert_eq!(p.activate(), AgentStatus::Online);
        assert_eq!(p.observe(3), Some(AgentStatus::Locked));
    }

    #[test]
    fn locked_while_persistent_present() {
        let mut p = PresenceReporter::new();
        p.activate();
        assert_eq!(p.observe(0), None);
        assert_eq!(p.observe(1), Some(AgentStatus::Locked));
        assert_eq!(p.observe(2), None);
        assert_eq!(p.observe(0), Some(AgentStatus::Online));
    }

    #[test]
    fn reset_always_reports_online() {
        let mut p = PresenceReporter::new();
        p.activate();
        assert_eq!(p.reset(), AgentStatus::Online);
        assert_eq!(p.current(), Some(AgentStatus::Online));
    }

    #[test]
    fn terminated_reporter_stays_offline() {
        let mut p = PresenceReporter::new();
        p.activate();
        assert_eq!(p.terminate(), AgentStatus::Offline);
        assert_eq!(p.observe(1), None);
    }
}
