//! Per-actor start cooldowns.
//!
//! Each entry holds the monotonic instant after which the actor may start a
//! posture again. Entries are overwritten on every successful start and are
//! never cleared; a stale entry is simply in the past.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::actor::ActorId;

/// Deadline used when `now + cooldown` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Default)]
pub struct CooldownTracker {
    /// Actor → ready-at instant
    ready_at: DashMap<ActorId, Instant>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the actor is still cooling down.
    pub fn is_active(&self, actor: ActorId) -> bool {
        self.is_active_at(actor, Instant::now())
    }

    pub fn is_active_at(&self, actor: ActorId, now: Instant) -> bool {
        self.ready_at
            .get(&actor)
            .map(|ready| now < *ready)
            .unwrap_or(false)
    }

    /// Time left before the actor may start again.
    pub fn remaining(&self, actor: ActorId) -> Duration {
        self.remaining_at(actor, Instant::now())
    }

    pub fn remaining_at(&self, actor: ActorId, now: Instant) -> Duration {
        self.ready_at
            .get(&actor)
            .map(|ready| ready.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Arm the cooldown after a successful start.
    pub fn mark(&self, actor: ActorId, cooldown: Duration) {
        self.mark_at(actor, cooldown, Instant::now());
    }

    pub fn mark_at(&self, actor: ActorId, cooldown: Duration, now: Instant) {
        let ready = now
            .checked_add(cooldown)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        self.ready_at.insert(actor, ready);
    }

    /// Number of tracked actors (including expired entries).
    pub fn len(&self) -> usize {
        self.ready_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready_at.is_empty()
    }
}
