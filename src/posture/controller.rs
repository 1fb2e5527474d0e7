//! Posture controller.
//!
//! Orchestrates both posture tracks for every actor:
//!
//! ```text
//!  crawl track (no actuator)          seated track (SeatRegistry)
//!
//!  ┌──────────────┐  start           ┌──────┐  start K        ┌───────────┐
//!  │ NotCrawling  │────────────────▶ │ None │────────────────▶│ Seated(K) │
//!  │              │◀──────────────── │      │◀────────────────│           │
//!  └──────────────┘  stop / tick     └──────┘  start K again, └─────┬─────┘
//!                                              tick, hooks          │ start J
//!                                                                   ▼
//!                                                         remove(Replaced), start J
//! ```
//!
//! Commands may arrive from a different context than the tick. All state
//! lives in concurrent maps keyed by actor, and the configuration is an
//! `Arc` swapped under a lock, so every operation works against one
//! consistent snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashSet;

use super::actor::{Actor, ActorId, Pose};
use super::config::PostureConfig;
use super::cooldown::CooldownTracker;
use super::geometry::Vec3;
use super::kind::{CrawlToggle, Message, PostureKind, PostureResult, RemovalReason};
use super::ledger::{LedgerAction, LedgerEntry, NoopLedger, PostureLedger};
use super::perms::{OpLevelFallback, PermissionOracle};
use super::seat::{ActuatorFactory, SeatInfo, SeatRegistry};

/// How far ahead a chair request looks for stairs.
pub const CHAIR_REACH: f64 = 5.0;

/// Squared distance an actor may drift before a move-cancel posture ends.
pub const MOVE_THRESHOLD_SQ: f64 = 0.01;

/// Maximum pitch change applied per tick while seated.
pub const MAX_PITCH_STEP: f32 = 8.0;

/// Vertical shift of the bounding box for the obstruction check.
const DANGER_PROBE_HEIGHT: f64 = 0.2;

/// Where a chair seat goes, relative to the actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChairPlacement {
    pub offset: Vec3,
    pub yaw: f32,
}

/// What a reconciliation pass tore down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub crawl_stopped: Vec<(ActorId, RemovalReason)>,
    pub seats_removed: Vec<(ActorId, RemovalReason)>,
    pub orphans: Vec<ActorId>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.crawl_stopped.is_empty() && self.seats_removed.is_empty() && self.orphans.is_empty()
    }
}

/// Move `current` towards `target` by at most [`MAX_PITCH_STEP`].
pub fn ease_pitch(current: f32, target: f32) -> f32 {
    current + (target - current).clamp(-MAX_PITCH_STEP, MAX_PITCH_STEP)
}

pub struct PostureController {
    config: RwLock<Arc<PostureConfig>>,
    crawling: DashSet<ActorId>,
    cooldowns: CooldownTracker,
    seats: SeatRegistry,
    permissions: Box<dyn PermissionOracle>,
    ledger: Box<dyn PostureLedger>,
}

impl PostureController {
    pub fn new(config: PostureConfig, factory: impl ActuatorFactory + 'static) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            crawling: DashSet::new(),
            cooldowns: CooldownTracker::new(),
            seats: SeatRegistry::new(factory),
            permissions: Box::new(OpLevelFallback),
            ledger: Box::new(NoopLedger),
        }
    }

    pub fn with_permissions(mut self, oracle: impl PermissionOracle + 'static) -> Self {
        self.permissions = Box::new(oracle);
        self
    }

    pub fn with_ledger(mut self, ledger: impl PostureLedger + 'static) -> Self {
        self.ledger = Box::new(ledger);
        self
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<PostureConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn seats(&self) -> &SeatRegistry {
        &self.seats
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn is_crawling(&self, actor: ActorId) -> bool {
        self.crawling.contains(&actor)
    }

    pub fn crawling_count(&self) -> usize {
        self.crawling.len()
    }

    pub fn session(&self, actor: ActorId) -> Option<SeatInfo> {
        self.seats.session(actor)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Enable, disable or toggle crawling.
    pub fn request_crawl(&self, actor: &mut dyn Actor, toggle: CrawlToggle) -> PostureResult {
        let config = self.config();
        if !config.core.enabled || !config.postures.crawl.enabled {
            return PostureResult::error(Message::disabled());
        }
        if config.is_world_disabled(actor.world()) {
            return PostureResult::error(Message::disabled());
        }
        if !self.permitted(&*actor, PostureKind::Crawl, &config) {
            return PostureResult::error(Message::no_permission());
        }

        let id = actor.id();
        let currently = self.crawling.contains(&id);
        let target = toggle.target(currently);

        if target == currently {
            let message = if currently {
                PostureKind::Crawl.start_message()
            } else {
                PostureKind::Crawl.stop_message()
            };
            return PostureResult::ok(message);
        }

        if !target {
            self.crawling.remove(&id);
            reset_crawl_visuals(actor);
            self.record(&*actor, PostureKind::Crawl, LedgerAction::Stop);
            return PostureResult::ok(PostureKind::Crawl.stop_message());
        }

        if !crawl_preconditions_met(&*actor, &config) {
            return PostureResult::error(Message::disabled());
        }
        if let Some(denied) = self.cooldown_denial(id) {
            return denied;
        }

        self.crawling.insert(id);
        actor.set_swimming(true);
        actor.set_pose(Pose::Swimming);
        self.record(&*actor, PostureKind::Crawl, LedgerAction::Start);
        self.cooldowns.mark(id, config.cooldown());
        PostureResult::ok(PostureKind::Crawl.start_message())
    }

    /// Start the seated posture `kind`, or stop it if it is already active.
    pub fn request_seat(&self, actor: &mut dyn Actor, kind: PostureKind) -> PostureResult {
        let config = self.config();
        if !kind.is_seated() || !config.core.enabled {
            return PostureResult::error(Message::disabled());
        }
        if config.is_world_disabled(actor.world()) {
            return PostureResult::error(Message::disabled());
        }
        let Some(seat_config) = config.seat(kind).filter(|seat| seat.enabled) else {
            return PostureResult::error(Message::disabled());
        };
        if !self.permitted(&*actor, kind, &config) {
            return PostureResult::error(Message::no_permission());
        }

        if let Some(existing) = self.seats.session(actor.id()) {
            if existing.kind == kind {
                self.seats.remove_seat(actor, RemovalReason::Command);
                self.record(&*actor, kind, LedgerAction::Stop);
                return PostureResult::ok(kind.stop_message());
            }
            self.seats.remove_seat(actor, RemovalReason::Replaced);
        }

        if !seat_preconditions_met(&*actor, kind, &config) {
            return PostureResult::error(Message::disabled());
        }
        if let Some(denied) = self.cooldown_denial(actor.id()) {
            return denied;
        }

        let (extra_offset, yaw_override) = if kind == PostureKind::Chair {
            match chair_placement(&*actor) {
                Some(placement) => (Some(placement.offset), Some(placement.yaw)),
                None => return self.request_seat(actor, PostureKind::Sit),
            }
        } else {
            (None, None)
        };

        match self
            .seats
            .create_seat(actor, kind, seat_config, extra_offset, yaw_override)
        {
            Ok(_) => {
                self.record(&*actor, kind, LedgerAction::Start);
                self.cooldowns.mark(actor.id(), config.cooldown());
                PostureResult::ok(kind.start_message())
            }
            Err(error) => {
                tracing::warn!(
                    actor = %actor.id(),
                    name = actor.name(),
                    %kind,
                    %error,
                    "failed to create seat"
                );
                PostureResult::error(Message::disabled())
            }
        }
    }

    /// Swap in a new configuration on behalf of an admin.
    pub fn reload_config(&self, actor: &dyn Actor, config: PostureConfig) -> PostureResult {
        let current = self.config();
        if !self.permitted(actor, PostureKind::Admin, &current) {
            return PostureResult::error(Message::no_permission());
        }
        self.on_config_reload(config);
        PostureResult::ok(Message::reloaded())
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Re-validate every crawling actor and every seat session.
    pub fn tick<'a, A>(&self, actors: impl IntoIterator<Item = &'a mut A>) -> TickReport
    where
        A: Actor + 'a,
    {
        let config = self.config();
        let mut report = TickReport::default();

        for actor in actors {
            if !config.core.enabled || config.is_world_disabled(actor.world()) {
                self.stop_all(&mut *actor, RemovalReason::Disabled, &mut report);
                continue;
            }
            self.tick_crawl(&mut *actor, &config, &mut report);
            self.tick_seat(&mut *actor, &config, &mut report);
        }

        report.orphans = self.seats.cleanup_orphans();
        report
    }

    fn tick_crawl(&self, actor: &mut dyn Actor, config: &PostureConfig, report: &mut TickReport) {
        let id = actor.id();
        if !self.crawling.contains(&id) {
            return;
        }

        let Some(reason) = crawl_exit_reason(&*actor, config) else {
            actor.set_swimming(true);
            actor.set_pose(Pose::Swimming);
            return;
        };

        self.crawling.remove(&id);
        reset_crawl_visuals(actor);
        tracing::debug!(actor = %id, %reason, "crawl stopped");
        report.crawl_stopped.push((id, reason));
    }

    fn tick_seat(&self, actor: &mut dyn Actor, config: &PostureConfig, report: &mut TickReport) {
        let id = actor.id();
        let Some(session) = self.seats.session(id) else {
            return;
        };
        let kind = session.kind;

        if let Some(reason) = seat_exit_reason(&*actor, &session, config) {
            self.seats.remove_seat(actor, reason);
            report.seats_removed.push((id, reason));
            return;
        }

        let position = actor.position();
        self.seats.reposition(id, position, actor.yaw());
        let pitch = ease_pitch(actor.pitch(), session.target_pitch);
        actor.set_pitch(pitch);

        if config.cancel_on_damage(kind) && actor.is_recently_hurt() {
            self.seats.remove_seat(actor, RemovalReason::Damage);
            report.seats_removed.push((id, RemovalReason::Damage));
        }
    }

    fn stop_all(&self, actor: &mut dyn Actor, reason: RemovalReason, report: &mut TickReport) {
        let id = actor.id();
        if self.crawling.remove(&id).is_some() {
            reset_crawl_visuals(actor);
            report.crawl_stopped.push((id, reason));
        }
        if self.seats.remove_seat(actor, reason).is_some() {
            report.seats_removed.push((id, reason));
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------

    pub fn on_disconnect(&self, actor: &mut dyn Actor) {
        self.crawling.remove(&actor.id());
        self.seats.remove_seat(actor, RemovalReason::Disconnect);
    }

    pub fn on_death(&self, actor: &mut dyn Actor) {
        self.crawling.remove(&actor.id());
        self.seats.remove_seat(actor, RemovalReason::Death);
    }

    pub fn on_world_change(&self, actor: &mut dyn Actor) {
        self.seats.remove_seat(actor, RemovalReason::WorldChange);
        self.crawling.remove(&actor.id());
    }

    pub fn on_teleport(&self, actor: &mut dyn Actor) {
        self.seats.remove_seat(actor, RemovalReason::Teleport);
    }

    /// Install a new configuration. Turning the master switch off stops
    /// everyone immediately instead of waiting for the next tick.
    pub fn on_config_reload(&self, config: PostureConfig) {
        let enabled = config.core.enabled;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);

        if enabled {
            tracing::info!("posture config reloaded");
            return;
        }

        let crawlers = self.crawling.len();
        self.crawling.clear();
        let seats = self.seats.discard_all();
        tracing::info!(crawlers, seats, "postures disabled by config reload");
    }

    /// Tear everything down, e.g. when the host shuts down.
    pub fn shutdown(&self) {
        self.crawling.clear();
        self.seats.discard_all();
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn permitted(&self, actor: &dyn Actor, kind: PostureKind, config: &PostureConfig) -> bool {
        self.permissions.check(
            actor,
            config.permission_node(kind),
            config.fallback_level(kind),
        )
    }

    fn cooldown_denial(&self, actor: ActorId) -> Option<PostureResult> {
        if !self.cooldowns.is_active(actor) {
            return None;
        }
        let remaining = self.cooldowns.remaining(actor).as_secs_f64();
        Some(PostureResult::error(Message::cooldown(remaining)))
    }

    fn record(&self, actor: &dyn Actor, kind: PostureKind, action: LedgerAction) {
        self.ledger.record(LedgerEntry::new(actor, kind, action));
    }
}

impl std::fmt::Debug for PostureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostureController")
            .field("crawling", &self.crawling.len())
            .field("seats", &self.seats)
            .field("cooldowns", &self.cooldowns.len())
            .finish()
    }
}

fn reset_crawl_visuals(actor: &mut dyn Actor) {
    actor.set_swimming(false);
    actor.set_pose(Pose::Standing);
}

fn crawl_preconditions_met(actor: &dyn Actor, config: &PostureConfig) -> bool {
    !(actor.is_spectator()
        || actor.is_removed()
        || actor.is_flying()
        || actor.is_mounted()
        || (config.postures.crawl.water_only && !actor.is_touching_water()))
}

fn seat_preconditions_met(actor: &dyn Actor, kind: PostureKind, config: &PostureConfig) -> bool {
    !(actor.is_spectator()
        || actor.is_removed()
        || actor.is_flying()
        || actor.is_sleeping()
        || actor.is_mounted()
        || (!config.allow_in_water(kind) && actor.is_touching_water()))
}

fn is_suffocating(actor: &dyn Actor) -> bool {
    let probe = actor
        .bounding_box()
        .offset(Vec3::new(0.0, DANGER_PROBE_HEIGHT, 0.0));
    !actor.is_space_empty(&probe)
}

fn crawl_exit_reason(actor: &dyn Actor, config: &PostureConfig) -> Option<RemovalReason> {
    if config.cancel_on_damage(PostureKind::Crawl) && actor.is_recently_hurt() {
        Some(RemovalReason::Damage)
    } else if !config.postures.crawl.enabled || actor.is_spectator() {
        Some(RemovalReason::Disabled)
    } else if actor.is_removed() || actor.is_dead() {
        Some(RemovalReason::Death)
    } else if config.postures.crawl.water_only && !actor.is_touching_water() {
        Some(RemovalReason::Move)
    } else if !actor.is_on_ground() && actor.is_flying() {
        Some(RemovalReason::Move)
    } else if actor.is_mounted() {
        Some(RemovalReason::Unknown)
    } else if config.core.cancel_on_danger && is_suffocating(actor) {
        Some(RemovalReason::Danger)
    } else {
        None
    }
}

fn seat_exit_reason(
    actor: &dyn Actor,
    session: &SeatInfo,
    config: &PostureConfig,
) -> Option<RemovalReason> {
    let kind = session.kind;
    if !config.kind_enabled(kind) {
        Some(RemovalReason::Disabled)
    } else if actor.vehicle() != Some(session.actuator_id) {
        Some(RemovalReason::Unknown)
    } else if actor.is_removed() || actor.is_dead() {
        Some(RemovalReason::Death)
    } else if !config.allow_in_water(kind) && actor.is_touching_water() {
        Some(RemovalReason::Move)
    } else if actor.is_flying() {
        Some(RemovalReason::Move)
    } else if config.cancel_on_move(kind)
        && session.last_position.distance_squared(&actor.position()) > MOVE_THRESHOLD_SQ
    {
        Some(RemovalReason::Move)
    } else {
        None
    }
}

/// Seat placement on the stair the actor is looking at, if any.
pub fn chair_placement(actor: &dyn Actor) -> Option<ChairPlacement> {
    let hit = actor.target_block(CHAIR_REACH)?;
    let (surface, yaw) = hit.stair_seat()?;
    Some(ChairPlacement {
        offset: surface - actor.position(),
        yaw,
    })
}
