//! Overlay interaction gate.
//!
//! The overlay is a full-screen transparent surface. It must let pointer
//! input through to the desktop unless a toast is on screen.

// ─── Gate ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InteractionGate {
    interactive: bool,
}

impl InteractionGate {
    /// Starts pass-through.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Re-evaluate against the visible count. Returns the new mode only on
    /// an empty↔non-empty edge.
    pub fn observe(&mut self, visible_count: usize) -> Option<bool> {
        let want = visible_count > 0;
        if want == self.interactive {
            return None;
        }
        self.interactive = want;
        Some(want)
    }

    /// Back to pass-through, as on surface teardown.
    pub fn reset(&mut self) -> Option<bool> {
        self.observe(0)
    }
}
