//! Notification presenter: lifecycle state machine for toast instances.
//!
//! Pure reducer with an internal timer queue. The caller owns the clock and
//! drives it with `advance(now_ms)`; every operation returns the effects the
//! surface has to render.
//!
//! ```text
//! SPAWNED → VISIBLE ─┬─ auto (duration) ─→ EXITING ─ 500ms ─→ REMOVED
//!                    ├─ dismiss        ─→ EXITING ─ 300ms ─→ REMOVED
//!                    ├─ dismiss (persistent) → DISMISS_ATTEMPTED ─ 500ms ─→ VISIBLE
//!                    └─ action         ─→ REMOVED  (+2 children at 100ms / 250ms)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dispatch::{Command, SpawnRequest};
use crate::types::{
    Bounds, Cue, EntryId, GlyphKind, MAX_DURATION_SECS, Position, ToastContent, ToastIcon,
};

/// Fade after an auto-dismiss timer fires.
pub const AUTO_FADE_MS: u64 = 500;
/// Fade after a manual close.
pub const MANUAL_FADE_MS: u64 = 300;
/// Length of the rejection shake on a persistent toast.
pub const SHAKE_MS: u64 = 500;
pub const COUNTDOWN_TICK_MS: u64 = 1_000;
/// Delays of the two children spawned by an action trigger.
pub const HYDRA_STAGGER_MS: [u64; 2] = [100, 250];
/// Window after KILL_ALERTS during which spawns are dropped.
pub const KILL_SUPPRESSION_MS: u64 = 2_000;

// ─── Instance ─────────────────────────────────────────────────────

/// Local toast id. Monotonic per presenter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(pub u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lifecycle {
    Spawned,
    Visible,
    DismissAttempted,
    Exiting,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastInstance {
    pub id: ToastId,
    pub origin: EntryId,
    pub content: ToastContent,
    pub persistent: bool,
    pub remaining_secs: u64,
    /// `None` = stacked in the default corner.
    pub position: Option<Position>,
    pub icon: ToastIcon,
    pub state: Lifecycle,
}

impl ToastInstance {
    fn fallback_glyph(&self) -> GlyphKind {
        if self.persistent {
            GlyphKind::Alert
        } else {
            GlyphKind::Bell
        }
    }
}

/// Render-ready projection of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastView {
    pub id: ToastId,
    pub origin: EntryId,
    pub company_name: String,
    pub title: String,
    pub message: String,
    pub icon: ToastIcon,
    pub persistent: bool,
    pub state: Lifecycle,
    pub remaining_secs: u64,
    pub position: Option<Position>,
    /// Untimed toasts show a close control; timed ones show the countdown.
    pub closable: bool,
}

impl From<&ToastInstance> for ToastView {
    fn from(t: &ToastInstance) -> Self {
        Self {
            id: t.id,
            origin: t.origin.clone(),
            company_name: t.content.company_name.clone(),
            title: t.content.display_title().to_string(),
            message: t.content.message.clone(),
            icon: t.icon.clone(),
            persistent: t.persistent,
            state: t.state,
            remaining_secs: t.remaining_secs,
            position: t.position,
            closable: t.content.duration_secs == 0,
        }
    }
}

// ─── Replication ──────────────────────────────────────────────────

/// User interaction with a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Dismiss,
    Action,
}

/// A spawn scheduled relative to the triggering interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSpawn {
    pub delay_ms: u64,
    pub request: SpawnRequest,
}

/// Children produced by an interaction. Only an action on a non-persistent
/// toast replicates: two identical copies, staggered.
pub fn replicate(instance: &ToastInstance, trigger: Trigger) -> Vec<PendingSpawn> {
    if instance.persistent || trigger != Trigger::Action {
        return Vec::new();
    }
    HYDRA_STAGGER_MS
        .iter()
        .map(|&delay_ms| PendingSpawn {
            delay_ms,
            request: SpawnRequest {
                origin: instance.origin.clone(),
                content: instance.content.clone(),
                persistent: instance.persistent,
            },
        })
        .collect()
}

/// Chooses where replicated toasts appear.
pub trait Placement: Send {
    fn place(&mut self) -> Position;
}

/// Deterministic diagonal cascade, wrapping inside the bounds.
#[derive(Debug, Clone)]
pub struct CascadePlacement {
    bounds: Bounds,
    step: u32,
    n: u32,
}

impl CascadePlacement {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            step: 40,
            n: 0,
        }
    }
}

impl Placement for CascadePlacement {
    fn place(&mut self) -> Position {
        let (max_x, max_y) = self.bounds.max_origin();
        let offset = self.n.saturating_mul(self.step);
        self.n = self.n.wrapping_add(1);
        self.bounds.clamp(offset % max_x, offset % max_y)
    }
}

// ─── Effects ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum PresenterEffect {
    Shown { id: ToastId },
    Countdown { id: ToastId, remaining_secs: u64 },
    Exiting { id: ToastId },
    Removed { id: ToastId },
    /// Rejected dismissal: the surface shakes the toast.
    Shake { id: ToastId },
    IconChanged { id: ToastId },
    Cue { cue: Cue },
    /// A spawn arrived inside the kill suppression window.
    SpawnSuppressed { origin: EntryId },
    Cleared { count: usize },
}

// ─── Timers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum TimerKind {
    CountdownTick,
    AutoDismiss,
    FadeComplete,
    ShakeEnd,
    Replicate(SpawnRequest),
}

#[derive(Debug, Clone)]
struct Timer {
    due_ms: u64,
    seq: u64,
    /// Instance the timer acts on. Replication timers belong to no instance.
    owner: Option<ToastId>,
    kind: TimerKind,
}

// ─── Presenter ────────────────────────────────────────────────────

pub struct Presenter {
    /// Visible set: every instance not yet REMOVED, in spawn order.
    instances: Vec<ToastInstance>,
    timers: Vec<Timer>,
    next_id: u64,
    next_seq: u64,
    suppressed_until_ms: Option<u64>,
    placement: Box<dyn Placement>,
}

impl Presenter {
    pub fn new(placement: Box<dyn Placement>) -> Self {
        Self {
            instances: Vec::new(),
            timers: Vec::new(),
            next_id: 1,
            next_seq: 0,
            suppressed_until_ms: None,
            placement,
        }
    }

    // ── Queries ──

    pub fn visible_count(&self) -> usize {
        self.instances.len()
    }

    pub fn persistent_count(&self) -> usize {
        self.instances.iter().filter(|t| t.persistent).count()
    }

    pub fn get(&self, id: ToastId) -> Option<&ToastInstance> {
        self.instances.iter().find(|t| t.id == id)
    }

    pub fn views(&self) -> Vec<ToastView> {
        self.instances.iter().map(ToastView::from).collect()
    }

    /// Earliest pending timer, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    pub fn is_suppressed(&self, now_ms: u64) -> bool {
        self.suppressed_until_ms.is_some_and(|until| now_ms < until)
    }

    // ── Commands ──

    /// Apply a dispatched command.
    pub fn deliver(&mut self, command: Command, now_ms: u64) -> Vec<PresenterEffect> {
        let mut effects = Vec::new();
        match command {
            Command::Spawn(request) => {
                let urgent = request.persistent;
                if self.spawn(request, None, now_ms, &mut effects).is_some() {
                    effects.push(PresenterEffect::Cue {
                        cue: Cue::Ping { urgent },
                    });
                }
            }
            Command::KillAlerts => self.kill_all(now_ms, &mut effects),
            Command::Reserved { .. } => {}
        }
        effects
    }

    /// Manual close control.
    pub fn dismiss(&mut self, id: ToastId, now_ms: u64) -> Vec<PresenterEffect> {
        let mut effects = Vec::new();
        let Some(idx) = self.interactive_index(id) else {
            return effects;
        };

        if self.instances[idx].persistent {
            self.reject_dismissal(idx, now_ms, &mut effects);
        } else {
            self.instances[idx].state = Lifecycle::Exiting;
            self.cancel_timers(id);
            self.schedule(
                now_ms.saturating_add(MANUAL_FADE_MS),
                Some(id),
                TimerKind::FadeComplete,
            );
            effects.push(PresenterEffect::Exiting { id });
        }
        effects
    }

    /// Action control: replicates a non-persistent toast, is inert on a
    /// persistent one.
    pub fn trigger_action(&mut self, id: ToastId, now_ms: u64) -> Vec<PresenterEffect> {
        let mut effects = Vec::new();
        let Some(idx) = self.interactive_index(id) else {
            return effects;
        };

        if self.instances[idx].persistent {
            self.reject_dismissal(idx, now_ms, &mut effects);
            return effects;
        }

        let children = replicate(&self.instances[idx], Trigger::Action);
        self.remove_at(idx, &mut effects);
        for child in children {
            self.schedule(
                now_ms.saturating_add(child.delay_ms),
                None,
                TimerKind::Replicate(child.request),
            );
        }
        effects
    }

    /// The surface could not load the logo; fall back to a glyph.
    pub fn logo_failed(&mut self, id: ToastId) -> Vec<PresenterEffect> {
        let Some(toast) = self.instances.iter_mut().find(|t| t.id == id) else {
            return Vec::new();
        };
        if matches!(toast.icon, ToastIcon::Glyph(_)) {
            return Vec::new();
        }
        toast.icon = ToastIcon::Glyph(toast.fallback_glyph());
        vec![PresenterEffect::IconChanged { id }]
    }

    /// Fire every timer due at or before `now_ms`, in due order. Each timer
    /// runs at its own due time, so follow-up timers are scheduled from
    /// there rather than from `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> Vec<PresenterEffect> {
        let mut effects = Vec::new();
        while let Some(idx) = self.next_due(now_ms) {
            let timer = self.timers.swap_remove(idx);
            self.fire(timer, &mut effects);
        }
        effects
    }

    /// Drop all instance state, as on surface teardown.
    pub fn teardown(&mut self) {
        self.instances.clear();
        self.timers.clear();
    }

    // ── Internals ──

    fn interactive_index(&self, id: ToastId) -> Option<usize> {
        self.instances
            .iter()
            .position(|t| t.id == id && t.state != Lifecycle::Exiting)
    }

    fn spawn(
        &mut self,
        request: SpawnRequest,
        position: Option<Position>,
        now_ms: u64,
        effects: &mut Vec<PresenterEffect>,
    ) -> Option<ToastId> {
        if self.is_suppressed(now_ms) {
            effects.push(PresenterEffect::SpawnSuppressed {
                origin: request.origin,
            });
            return None;
        }

        let id = ToastId(self.next_id);
        self.next_id += 1;

        let icon = match request.content.logo.as_deref() {
            Some(url) if is_loadable_logo(url) => ToastIcon::Logo(url.to_string()),
            _ if request.persistent => ToastIcon::Glyph(GlyphKind::Alert),
            _ => ToastIcon::Glyph(GlyphKind::Bell),
        };

        let duration = request.content.duration_secs.min(MAX_DURATION_SECS);
        self.instances.push(ToastInstance {
            id,
            origin: request.origin,
            content: request.content,
            persistent: request.persistent,
            remaining_secs: duration,
            position,
            icon,
            state: Lifecycle::Spawned,
        });

        // Arm timers, then become visible.
        if duration > 0 {
            self.schedule(
                now_ms.saturating_add(COUNTDOWN_TICK_MS),
                Some(id),
                TimerKind::CountdownTick,
            );
            self.schedule(
                now_ms.saturating_add(duration * 1_000),
                Some(id),
                TimerKind::AutoDismiss,
            );
        }
        if let Some(toast) = self.instances.last_mut() {
            toast.state = Lifecycle::Visible;
        }
        effects.push(PresenterEffect::Shown { id });
        Some(id)
    }

    fn reject_dismissal(&mut self, idx: usize, now_ms: u64, effects: &mut Vec<PresenterEffect>) {
        let id = self.instances[idx].id;
        self.instances[idx].state = Lifecycle::DismissAttempted;
        self.timers
            .retain(|t| !(t.owner == Some(id) && t.kind == TimerKind::ShakeEnd));
        self.schedule(now_ms.saturating_add(SHAKE_MS), Some(id), TimerKind::ShakeEnd);
        effects.push(PresenterEffect::Shake { id });
        effects.push(PresenterEffect::Cue { cue: Cue::Error });
    }

    fn kill_all(&mut self, now_ms: u64, effects: &mut Vec<PresenterEffect>) {
        let count = self.instances.len();
        for toast in self.instances.drain(..) {
            effects.push(PresenterEffect::Removed { id: toast.id });
        }
        // Pending replications are stale signals too.
        self.timers.clear();
        self.suppressed_until_ms = Some(now_ms.saturating_add(KILL_SUPPRESSION_MS));
        effects.push(PresenterEffect::Cleared { count });
    }

    fn remove_at(&mut self, idx: usize, effects: &mut Vec<PresenterEffect>) {
        let toast = self.instances.remove(idx);
        self.cancel_timers(toast.id);
        effects.push(PresenterEffect::Removed { id: toast.id });
    }

    fn cancel_timers(&mut self, id: ToastId) {
        self.timers.retain(|t| t.owner != Some(id));
    }

    fn schedule(&mut self, due_ms: u64, owner: Option<ToastId>, kind: TimerKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            due_ms,
            seq,
            owner,
            kind,
        });
    }

    fn next_due(&self, now_ms: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(idx, _)| idx)
    }

    fn fire(&mut self, timer: Timer, effects: &mut Vec<PresenterEffect>) {
        let at = timer.due_ms;

        if let TimerKind::Replicate(request) = timer.kind {
            let position = self.placement.place();
            self.spawn(request, Some(position), at, effects);
            return;
        }

        let Some(id) = timer.owner else {
            return;
        };
        let Some(idx) = self.instances.iter().position(|t| t.id == id) else {
            return;
        };

        match timer.kind {
            TimerKind::CountdownTick => {
                let toast = &mut self.instances[idx];
                toast.remaining_secs = toast.remaining_secs.saturating_sub(1);
                let remaining_secs = toast.remaining_secs;
                effects.push(PresenterEffect::Countdown { id, remaining_secs });
                if remaining_secs > 0 {
                    self.schedule(
                        at.saturating_add(COUNTDOWN_TICK_MS),
                        Some(id),
                        TimerKind::CountdownTick,
                    );
                }
            }
            TimerKind::AutoDismiss => {
                self.instances[idx].state = Lifecycle::Exiting;
                self.cancel_timers(id);
                self.schedule(at.saturating_add(AUTO_FADE_MS), Some(id), TimerKind::FadeComplete);
                effects.push(PresenterEffect::Exiting { id });
            }
            TimerKind::FadeComplete => self.remove_at(idx, effects),
            TimerKind::ShakeEnd => {
                let toast = &mut self.instances[idx];
                if toast.state == Lifecycle::DismissAttempted {
                    toast.state = Lifecycle::Visible;
                }
            }
            TimerKind::Replicate(_) => {}
        }
    }
}

fn is_loadable_logo(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://") || lower.starts_with("data:image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presenter() -> Presenter {
        Presenter::new(Box::new(CascadePlacement::new(Bounds {
            width: 1920,
            height: 1080,
        })))
    }

    fn spawn_cmd(persistent: bool, duration_secs: u64) -> Command {
        Command::Spawn(SpawnRequest {
            origin: EntryId::new("e-1"),
            content: ToastContent {
                company_name: "Acme".into(),
                title: "Notice".into(),
                message: "hello".into(),
                logo: None,
                duration_secs,
            },
            persistent,
        })
    }

    fn shown_id(effects: &[PresenterEffect]) -> ToastId {
        effects
            .iter()
            .find_map(|e| match e {
                PresenterEffect::Shown { id } => Some(*id),
                _ => None,
            })
            .expect("a toast was shown")
    }

    #[test]
    fn spawn_becomes_visible_with_ping() {
        let mut p = presenter();
        let effects = p.deliver(spawn_cmd(false, 0), 0);
        let id = shown_id(&effects);
        assert!(effects.contains(&PresenterEffect::Cue {
            cue: Cue::Ping { urgent: false }
        }));
        assert_eq!(p.get(id).map(|t| t.state), Some(Lifecycle::Visible));
        assert_eq!(p.visible_count(), 1);
        assert_eq!(p.next_deadline(), None, "untimed toast arms no timers");
    }

    #[test]
    fn auto_dismiss_exits_then_removes() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 10), 0));

        p.advance(9_999);
        assert_eq!(p.get(id).map(|t| t.state), Some(Lifecycle::Visible));
        assert_eq!(p.get(id).map(|t| t.remaining_secs), Some(1));

        let effects = p.advance(10_000);
        assert!(effects.contains(&PresenterEffect::Exiting { id }));
        assert_eq!(p.visible_count(), 1, "exiting toasts are still visible");

        p.advance(10_499);
        assert_eq!(p.visible_count(), 1);
        let effects = p.advance(10_500);
        assert!(effects.contains(&PresenterEffect::Removed { id }));
        assert_eq!(p.visible_count(), 0);
    }

    #[test]
    fn huge_duration_is_clamped_not_wrapped() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, u64::MAX), 5_000));
        assert_eq!(p.get(id).map(|t| t.remaining_secs), Some(MAX_DURATION_SECS));
        assert!(p.timers.iter().any(|t| {
            t.kind == TimerKind::AutoDismiss && t.due_ms == 5_000 + MAX_DURATION_SECS * 1_000
        }));

        p.advance(65_000);
        assert_eq!(p.get(id).map(|t| t.state), Some(Lifecycle::Visible));
        assert_eq!(p.next_deadline(), Some(66_000));
    }

    #[test]
    fn deadlines_saturate_at_the_end_of_time() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 1), u64::MAX - 10));
        assert_eq!(p.next_deadline(), Some(u64::MAX));

        let effects = p.advance(u64::MAX);
        assert!(effects.contains(&PresenterEffect::Exiting { id }));
        assert!(effects.contains(&PresenterEffect::Removed { id }));
        assert_eq!(p.visible_count(), 0);
    }

    #[test]
    fn late_advance_replays_timers_at_due_time() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 2), 0));
        let effects = p.advance(60_000);
        assert_eq!(
            effects,
            vec![
                PresenterEffect::Countdown {
                    id,
                    remaining_secs: 1
                },
                PresenterEffect::Exiting { id },
                PresenterEffect::Removed { id },
            ]
        );
    }

    #[test]
    fn timer_wins_over_persistence() {
        let mut p = presenter();
        shown_id(&p.deliver(spawn_cmd(true, 3), 0));
        assert_eq!(p.persistent_count(), 1);
        p.advance(3_500);
        assert_eq!(p.persistent_count(), 0);
        assert_eq!(p.visible_count(), 0);
    }

    #[test]
    fn manual_dismiss_fades_in_300ms() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 0), 0));
        let effects = p.dismiss(id, 1_000);
        assert_eq!(effects, vec![PresenterEffect::Exiting { id }]);
        p.advance(1_299);
        assert_eq!(p.visible_count(), 1);
        p.advance(1_300);
        assert_eq!(p.visible_count(), 0);
    }

    #[test]
    fn manual_dismiss_cancels_auto_timer_by_identity() {
        let mut p = presenter();
        let first = shown_id(&p.deliver(spawn_cmd(false, 5), 0));
        let second = shown_id(&p.deliver(spawn_cmd(false, 0), 0));
        p.dismiss(first, 100);
        p.advance(400);
        assert!(p.get(first).is_none());
        // The old 5s timer must not touch the surviving toast.
        let effects = p.advance(10_000);
        assert!(effects.is_empty());
        assert_eq!(p.get(second).map(|t| t.state), Some(Lifecycle::Visible));
    }

    #[test]
    fn persistent_dismiss_is_inert() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(true, 0), 0));
        for attempt in 0..3 {
            let effects = p.dismiss(id, 100 * attempt);
            assert_eq!(
                effects,
                vec![
                    PresenterEffect::Shake { id },
                    PresenterEffect::Cue { cue: Cue::Error }
                ]
            );
            assert_eq!(p.visible_count(), 1);
        }
        assert_eq!(p.get(id).map(|t| t.state), Some(Lifecycle::DismissAttempted));
        p.advance(200 + SHAKE_MS);
        assert_eq!(p.get(id).map(|t| t.state), Some(Lifecycle::Visible));
    }

    #[test]
    fn action_replicates_non_persistent() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 0), 0));

        let effects = p.trigger_action(id, 1_000);
        assert_eq!(effects, vec![PresenterEffect::Removed { id }]);
        assert_eq!(p.visible_count(), 0);

        p.advance(1_100);
        assert_eq!(p.visible_count(), 1);
        p.advance(1_250);
        assert_eq!(p.visible_count(), 2);

        let views = p.views();
        assert!(views.iter().all(|v| v.position.is_some()));
        assert!(views.iter().all(|v| v.message == "hello" && !v.persistent));
        assert_ne!(views[0].id, views[1].id);
    }

    #[test]
    fn action_on_persistent_is_a_dismiss_attempt() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(true, 0), 0));
        let effects = p.trigger_action(id, 0);
        assert!(effects.contains(&PresenterEffect::Shake { id }));
        p.advance(1_000);
        assert_eq!(p.visible_count(), 1);
    }

    #[test]
    fn replicate_is_pure_and_selective() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 0), 0));
        let toast = p.get(id).expect("present").clone();
        assert!(replicate(&toast, Trigger::Dismiss).is_empty());
        let kids = replicate(&toast, Trigger::Action);
        assert_eq!(
            kids.iter().map(|k| k.delay_ms).collect::<Vec<_>>(),
            HYDRA_STAGGER_MS.to_vec()
        );

        let mut persistent = toast;
        persistent.persistent = true;
        assert!(replicate(&persistent, Trigger::Action).is_empty());
    }

    #[test]
    fn kill_clears_and_suppresses() {
        let mut p = presenter();
        for _ in 0..3 {
            p.deliver(spawn_cmd(true, 0), 0);
        }
        let effects = p.deliver(Command::KillAlerts, 500);
        assert!(effects.contains(&PresenterEffect::Cleared { count: 3 }));
        assert_eq!(p.visible_count(), 0);

        let effects = p.deliver(spawn_cmd(false, 0), 2_499);
        assert_eq!(
            effects,
            vec![PresenterEffect::SpawnSuppressed {
                origin: EntryId::new("e-1")
            }]
        );
        assert_eq!(p.visible_count(), 0);

        p.deliver(spawn_cmd(false, 0), 2_500);
        assert_eq!(p.visible_count(), 1);
    }

    #[test]
    fn kill_cancels_pending_replication() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 0), 0));
        p.trigger_action(id, 0);
        p.deliver(Command::KillAlerts, 50);
        p.advance(5_000);
        assert_eq!(p.visible_count(), 0);
        assert_eq!(p.next_deadline(), None);
    }

    #[test]
    fn exiting_toast_ignores_interaction() {
        let mut p = presenter();
        let id = shown_id(&p.deliver(spawn_cmd(false, 0), 0));
        p.dismiss(id, 0);
        assert!(p.dismiss(id, 10).is_empty());
        assert!(p.trigger_action(id, 10).is_empty());
        assert!(p.dismiss(ToastId(999), 10).is_empty());
    }

    #[test]
    fn logo_failure_falls_back_to_glyph() {
        let mut p = presenter();
        let mut cmd = spawn_cmd(true, 0);
        if let Command::Spawn(req) = &mut cmd {
            req.content.logo = Some("https://cdn.example/logo.png".into());
        }
        let id = shown_id(&p.deliver(cmd, 0));
        assert!(matches!(p.get(id).map(|t| &t.icon), Some(ToastIcon::Logo(_))));

        assert_eq!(p.logo_failed(id), vec![PresenterEffect::IconChanged { id }]);
        assert_eq!(
            p.get(id).map(|t| t.icon.clone()),
            Some(ToastIcon::Glyph(GlyphKind::Alert))
        );
        assert!(p.logo_failed(id).is_empty());
    }

    #[test]
    fn unloadable_logo_uses_glyph_immediately() {
        let mut p = presenter();
        let mut cmd = spawn_cmd(false, 0);
        if let Command::Spawn(req) = &mut cmd {
            req.content.logo = Some("not a url".into());
        }
        let id = shown_id(&p.deliver(cmd, 0));
        assert_eq!(
            p.get(id).map(|t| t.icon.clone()),
            Some(ToastIcon::Glyph(GlyphKind::Bell))
        );
    }

    #[test]
    fn toast_ids_are_never_reused() {
        let mut p = presenter();
        let a = shown_id(&p.deliver(spawn_cmd(false, 0), 0));
        p.trigger_action(a, 0);
        p.advance(1_000);
        let ids: Vec<ToastId> = p.views().iter().map(|v| v.id).collect();
        assert!(!ids.contains(&a));
        assert!(ids.iter().all(|id| id.0 > a.0));
    }
}
