//! Posture State Library
//!
//! This crate provides the state layer for player postures: crawling, and
//! the seated family (sit, chair, lay, belly).
//!
//! # Overview
//!
//! The posture module provides:
//!
//! - **Crawl Track** - A flag per actor that forces the swimming pose while
//!   on land. No world entity is involved.
//!
//! - **Seat Registry** - Seated postures ride an invisible actuator entity.
//!   The registry owns every actuator, keeps one session per actor, and
//!   discards the actuator on every exit path.
//!
//! - **Posture Controller** - Command handling with gating, preconditions,
//!   and cooldowns. A per-tick reconciliation pass tears down any posture
//!   whose conditions no longer hold, and lifecycle hooks clean up on
//!   disconnect, death, world change and teleport.
//!
//! - **Configuration** - A JSON file with defaults, deep-merged partial
//!   overrides, validation warnings and atomic reload.
//!
//! # Design Principles
//!
//! 1. **Crawl and seated are independent tracks** - An actor may crawl and
//!    hold a seat at the same time. Only seated kinds exclude each other.
//!
//! 2. **Managers provide indexed access** - Sessions are reachable by actor
//!    and by actuator.
//!
//! 3. **No world access** - The host implements [`Actor`], [`Actuator`] and
//!    [`ActuatorFactory`]. This crate never touches a game engine directly.
//!
//! 4. **Safe to share** - Every manager uses concurrent maps, so commands and
//!    the tick may run from different threads.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use posture_state::{CrawlToggle, Message, PostureConfig, PostureKind};
//!
//! // Partial files keep the defaults for everything they leave out
//! let config = PostureConfig::from_json_str(
//!     r#"{"core": {"cooldownS": 5.0, "disableInWorlds": ["minecraft:the_end"]}}"#,
//! )
//! .unwrap();
//! assert!(config.is_valid());
//! assert_eq!(config.cooldown(), Duration::from_secs(5));
//! assert!(config.is_world_disabled("minecraft:the_end"));
//! assert_eq!(config.permission_node(PostureKind::Sit), "posture.sit");
//! assert_eq!(config.seat(PostureKind::Lay).unwrap().pitch_degrees, 90.0);
//!
//! // Command arguments
//! assert_eq!(CrawlToggle::from_argument("ON"), CrawlToggle::Enable);
//! assert!(CrawlToggle::from_argument("whatever").target(false));
//!
//! // Messages are translation keys plus arguments
//! assert_eq!(PostureKind::Belly.start_message().key, "posture.belly.start");
//! assert_eq!(Message::cooldown(1.5).to_string(), "posture.cmd.cooldown [1.5]");
//! ```
//!
//! Driving the controller needs a host that implements [`Actor`] and
//! [`ActuatorFactory`]:
//!
//! ```rust,ignore
//! let controller = PostureController::new(PostureConfig::default(), MyFactory::new(world));
//!
//! let result = controller.request_seat(&mut player, PostureKind::Lay);
//! controller.tick(players.iter_mut());
//! controller.on_disconnect(&mut player);
//! ```

pub mod posture;

// Re-export everything from posture module at crate root
pub use posture::*;
