//! Rendering surface boundary.
//!
//! A real overlay window implements [`Surface`]; the headless agent ships
//! [`TracingSurface`], which reports what would be on screen as log events.

use popcast_core::presenter::Lifecycle;
use popcast_core::{Cue, ToastIcon, ToastId, ToastView};

pub trait Surface: Send + 'static {
    /// Replace the on-screen set with `toasts`.
    fn render(&mut self, toasts: &[ToastView]);

    /// `true` captures pointer input; `false` lets it through to the desktop.
    fn request_interactive(&mut self, interactive: bool);

    fn play_cue(&mut self, cue: Cue);

    fn shake(&mut self, id: ToastId);
}

/// Headless surface: every call becomes a `tracing` event.
#[derive(Debug, Default)]
pub struct TracingSurface {
    /// Last rendered ids, to log only arrivals and departures.
    shown: Vec<ToastId>,
}

impl Surface for TracingSurface {
    fn render(&mut self, toasts: &[ToastView]) {
        for toast in toasts.iter().filter(|t| !self.shown.contains(&t.id)) {
            let icon = match &toast.icon {
                ToastIcon::Logo(url) => url.as_str(),
                ToastIcon::Glyph(_) => "glyph",
            };
            tracing::info!(
                toast = %toast.id,
                persistent = toast.persistent,
                countdown = toast.remaining_secs,
                icon,
                "toast shown: [{}] {}: {}",
                toast.company_name,
                toast.title,
                toast.message
            );
        }
        for gone in self
            .shown
            .iter()
            .filter(|id| !toasts.iter().any(|t| t.id == **id))
        {
            tracing::info!(toast = %gone, "toast removed");
        }
        for toast in toasts.iter().filter(|t| t.state == Lifecycle::Exiting) {
            tracing::debug!(toast = %toast.id, "toast fading");
        }
        self.shown = toasts.iter().map(|t| t.id).collect();
    }

    fn request_interactive(&mut self, interactive: bool) {
        if interactive {
            tracing::info!("overlay captures pointer");
        } else {
            tracing::info!("overlay is click-through");
        }
    }

    fn play_cue(&mut self, cue: Cue) {
        match cue {
            Cue::Ping { urgent } => tracing::info!(urgent, "cue: ping"),
            Cue::Error => tracing::info!("cue: error"),
        }
    }

    fn shake(&mut self, id: ToastId) {
        tracing::info!(toast = %id, "toast refuses to close");
    }
}
