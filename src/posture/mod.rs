//! Posture state module.
//!
//! This module provides the posture types and managers:
//!
//! - `kind` - Posture kinds, removal reasons, command outcomes
//! - `actor` - The player-facing view the controller works against
//! - `seat` - Actuator-backed seat sessions
//! - `cooldown` - Per-actor command cooldowns
//! - `config` - JSON configuration with defaults and validation
//! - `perms` - Permission oracle and backend chain
//! - `ledger` - Optional record of command-driven changes
//! - `controller` - Commands, reconciliation tick, lifecycle hooks
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         PostureController                            │
//! │                                                                      │
//! │  config: RwLock<Arc<PostureConfig>>   (swapped on reload)            │
//! │                                                                      │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────┐   │
//! │  │ crawling        │  │ CooldownTracker │  │   SeatRegistry      │   │
//! │  │                 │  │                 │  │                     │   │
//! │  │ {actor_id}      │  │ actor_id →      │  │ actor_id →          │   │
//! │  │                 │  │   ready_at      │  │   SeatSession       │   │
//! │  │                 │  │                 │  │                     │   │
//! │  │                 │  │                 │  │ actuator_id →       │   │
//! │  │                 │  │                 │  │   actor_id          │   │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────┘   │
//! │                                                                      │
//! │  PermissionOracle            PostureLedger          ActuatorFactory  │
//! │  (op-level fallback)         (no-op default)        (host world)     │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use posture_state::posture::{CrawlToggle, PostureConfig, PostureController, PostureKind};
//!
//! let controller = PostureController::new(PostureConfig::load_or_create(path)?, factory);
//!
//! // Commands from a player
//! let result = controller.request_seat(&mut player, PostureKind::Sit);
//! let result = controller.request_crawl(&mut player, CrawlToggle::Toggle);
//!
//! // Once per server tick
//! let report = controller.tick(online_players.iter_mut());
//! ```

pub mod actor;
pub mod config;
pub mod controller;
pub mod cooldown;
pub mod geometry;
pub mod kind;
pub mod ledger;
pub mod perms;
pub mod seat;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use actor::{Actor, ActorId, Pose};
pub use config::{
    ConfigError, CoreConfig, CrawlConfig, FallbackLevels, KindFlags, PermissionsConfig,
    PostureConfig, PosturesConfig, SeatConfig, MAX_COOLDOWN_SECS, MAX_SEAT_OFFSET,
};
pub use controller::{
    chair_placement, ease_pitch, ChairPlacement, PostureController, TickReport, CHAIR_REACH,
    MAX_PITCH_STEP, MOVE_THRESHOLD_SQ,
};
pub use cooldown::CooldownTracker;
pub use geometry::{Aabb, BlockHit, BlockPos, BlockShape, Direction, StairHalf, Vec3};
pub use kind::{CrawlToggle, Message, PostureKind, PostureResult, RemovalReason};
pub use ledger::{LedgerAction, LedgerEntry, NoopLedger, PostureLedger};
pub use perms::{OpLevelFallback, PermissionBackend, PermissionChain, PermissionOracle};
pub use seat::{
    Actuator, ActuatorFactory, ActuatorFlags, ActuatorId, ActuatorSpec, SeatError, SeatInfo,
    SeatRegistry, SeatSession,
};
