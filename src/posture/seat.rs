//! Seat registry.
//!
//! Seated postures are realised by making the actor ride an invisible
//! actuator entity. The registry is the only owner of those actuators: it
//! spawns them, keeps at most one [`SeatSession`] per actor, and discards the
//! actuator on every removal path.
//!
//! Two indexes are kept in step:
//!
//! ```text
//! sessions: actor_id    → SeatSession (owns the actuator)
//! owners:   actuator_id → actor_id
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

use super::actor::{Actor, ActorId};
use super::config::SeatConfig;
use super::geometry::Vec3;
use super::kind::{PostureKind, RemovalReason};

/// World entity id of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActuatorId(pub i32);

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity properties the factory must apply when building an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorFlags {
    pub invisible: bool,
    pub no_gravity: bool,
    pub non_collidable: bool,
    pub rider_capable: bool,
    pub silent: bool,
    pub invulnerable: bool,
    pub small: bool,
}

impl ActuatorFlags {
    /// Flags for a seat marker.
    pub const SEAT: ActuatorFlags = ActuatorFlags {
        invisible: true,
        no_gravity: true,
        non_collidable: true,
        rider_capable: true,
        silent: true,
        invulnerable: true,
        small: true,
    };
}

/// Everything the factory needs to build one actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorSpec {
    pub position: Vec3,
    pub yaw: f32,
    pub flags: ActuatorFlags,
}

impl ActuatorSpec {
    pub fn seat(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            flags: ActuatorFlags::SEAT,
        }
    }
}

/// Handle to one world-spawned actuator.
pub trait Actuator: Send + Sync {
    fn id(&self) -> ActuatorId;

    /// Add the entity to the world. False if the world rejected it.
    fn spawn(&mut self) -> bool;

    fn attach_rider(&mut self, rider: &mut dyn Actor) -> bool {
        rider.mount(self.id())
    }

    /// Remove the entity from the world, dropping any rider. Must tolerate
    /// being called on an actuator that is already gone.
    fn discard(&mut self);

    /// True once the entity is no longer alive in the world, whoever removed it.
    fn is_destroyed(&self) -> bool;

    fn reposition(&mut self, position: Vec3, yaw: f32);
}

pub trait ActuatorFactory: Send + Sync {
    /// Build (but do not spawn) an actuator. `None` if the world cannot host one.
    fn create(&self, actor: &dyn Actor, spec: &ActuatorSpec) -> Option<Box<dyn Actuator>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeatError {
    #[error("seat.create")]
    Create,

    #[error("seat.spawn")]
    Spawn,

    #[error("seat.ride")]
    Ride,
}

/// Live binding of one actor to one actuator.
pub struct SeatSession {
    pub actor_id: ActorId,
    pub kind: PostureKind,
    actuator: Box<dyn Actuator>,

    /// Actuator position minus actor position
    pub offset: Vec3,

    /// Yaw the actuator was spawned with
    pub yaw: f32,

    pub target_pitch: f32,

    /// Actor position at the last reconciliation, for move detection
    pub last_position: Vec3,

    pub started_at: DateTime<Utc>,
}

impl SeatSession {
    pub fn actuator_id(&self) -> ActuatorId {
        self.actuator.id()
    }

    pub fn info(&self) -> SeatInfo {
        SeatInfo {
            actor_id: self.actor_id,
            kind: self.kind,
            actuator_id: self.actuator.id(),
            offset: self.offset,
            yaw: self.yaw,
            target_pitch: self.target_pitch,
            last_position: self.last_position,
            started_at: self.started_at,
        }
    }
}

impl fmt::Debug for SeatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeatSession")
            .field("actor_id", &self.actor_id)
            .field("kind", &self.kind)
            .field("actuator", &self.actuator.id())
            .field("offset", &self.offset)
            .field("last_position", &self.last_position)
            .finish()
    }
}

/// Detached copy of a session, safe to hold while the registry changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatInfo {
    pub actor_id: ActorId,
    pub kind: PostureKind,
    pub actuator_id: ActuatorId,
    pub offset: Vec3,
    pub yaw: f32,
    pub target_pitch: f32,
    pub last_position: Vec3,
    pub started_at: DateTime<Utc>,
}

pub struct SeatRegistry {
    factory: Box<dyn ActuatorFactory>,

    /// Actor → active session
    sessions: DashMap<ActorId, SeatSession>,

    /// Actuator → owning actor
    owners: DashMap<ActuatorId, ActorId>,
}

impl SeatRegistry {
    pub fn new(factory: impl ActuatorFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            sessions: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    /// Seat `actor` on a fresh actuator, replacing any existing session.
    ///
    /// The offset is the configured one plus `extra_offset`; the yaw is
    /// `yaw_override` or the actor's own. On failure nothing is recorded and
    /// any partially built actuator has been discarded.
    pub fn create_seat(
        &self,
        actor: &mut dyn Actor,
        kind: PostureKind,
        seat: &SeatConfig,
        extra_offset: Option<Vec3>,
        yaw_override: Option<f32>,
    ) -> Result<SeatInfo, SeatError> {
        self.remove_seat(actor, RemovalReason::Replaced);

        let offset = seat.offset() + extra_offset.unwrap_or(Vec3::ZERO);
        let yaw = yaw_override.unwrap_or_else(|| actor.yaw());
        let position = actor.position();
        let spec = ActuatorSpec::seat(position + offset, yaw);

        let mut actuator = self.factory.create(&*actor, &spec).ok_or(SeatError::Create)?;

        if !actuator.spawn() {
            actuator.discard();
            return Err(SeatError::Spawn);
        }

        if !actuator.attach_rider(actor) {
            actuator.discard();
            return Err(SeatError::Ride);
        }

        let actor_id = actor.id();
        let actuator_id = actuator.id();
        let session = SeatSession {
            actor_id,
            kind,
            actuator,
            offset,
            yaw,
            target_pitch: seat.pitch_degrees,
            last_position: position,
            started_at: Utc::now(),
        };
        let info = session.info();

        self.owners.insert(actuator_id, actor_id);
        if let Some(mut displaced) = self.sessions.insert(actor_id, session) {
            // A concurrent command seated the same actor in between
            let displaced_id = displaced.actuator.id();
            self.owners.remove_if(&displaced_id, |_, owner| *owner == actor_id);
            displaced.actuator.discard();
            tracing::debug!(
                actor = %actor_id,
                kind = %displaced.kind,
                reason = %RemovalReason::Replaced,
                "seat removed"
            );
        }
        tracing::debug!(actor = %actor_id, %kind, actuator = %actuator_id, "seat created");
        Ok(info)
    }

    pub fn session(&self, actor: ActorId) -> Option<SeatInfo> {
        self.sessions.get(&actor).map(|s| s.info())
    }

    pub fn has_session(&self, actor: ActorId) -> bool {
        self.sessions.contains_key(&actor)
    }

    /// Reverse lookup from actuator to the actor riding it.
    pub fn owner_of(&self, actuator: ActuatorId) -> Option<ActorId> {
        self.owners.get(&actuator).map(|owner| *owner)
    }

    /// Tear down the actor's session, if any. Returns the removed kind.
    pub fn remove_seat(&self, actor: &mut dyn Actor, reason: RemovalReason) -> Option<PostureKind> {
        let (actor_id, mut session) = self.sessions.remove(&actor.id())?;
        let actuator_id = session.actuator.id();

        self.owners.remove(&actuator_id);
        session.actuator.discard();
        if actor.vehicle() == Some(actuator_id) {
            actor.dismount();
        }

        tracing::debug!(actor = %actor_id, kind = %session.kind, %reason, "seat removed");
        Some(session.kind)
    }

    /// Tear down the session riding `actuator`, if any. Returns its owner,
    /// or `None` when that actuator no longer backs a session.
    pub fn remove_by_actuator(&self, actuator: ActuatorId, reason: RemovalReason) -> Option<ActorId> {
        let (_, owner) = self.owners.remove(&actuator)?;
        let (_, mut session) = self
            .sessions
            .remove_if(&owner, |_, s| s.actuator.id() == actuator)?;
        session.actuator.discard();
        tracing::debug!(actor = %owner, %actuator, %reason, "seat removed by actuator");
        Some(owner)
    }

    /// Move the actuator to follow the actor and record the new baseline.
    /// Returns the actuator's new position, or `None` without a session.
    pub fn reposition(&self, actor: ActorId, position: Vec3, yaw: f32) -> Option<Vec3> {
        let mut session = self.sessions.get_mut(&actor)?;
        let target = position + session.offset;
        session.last_position = position;
        session.actuator.reposition(target, yaw);
        Some(target)
    }

    /// Drop every session whose actuator was destroyed out of band.
    /// Returns the affected actors.
    pub fn cleanup_orphans(&self) -> Vec<ActorId> {
        let destroyed: Vec<ActuatorId> = self
            .sessions
            .iter()
            .filter(|s| s.actuator.is_destroyed())
            .map(|s| s.actuator.id())
            .collect();

        destroyed
            .into_iter()
            .filter_map(|id| self.remove_by_actuator(id, RemovalReason::Orphaned))
            .collect()
    }

    /// Tear down every session. Returns how many were removed.
    pub fn discard_all(&self) -> usize {
        let actors: Vec<ActorId> = self.sessions.iter().map(|s| *s.key()).collect();
        let mut removed = 0;

        for actor in actors {
            if let Some((_, mut session)) = self.sessions.remove(&actor) {
                let actuator_id = session.actuator.id();
                self.owners.remove_if(&actuator_id, |_, owner| *owner == actor);
                session.actuator.discard();
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "all seats discarded");
        }
        removed
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.sessions.iter().map(|s| *s.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl fmt::Debug for SeatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeatRegistry")
            .field("sessions", &self.sessions.len())
            .field("owners", &self.owners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::testing::{StubFactory, TestActor};
    use pretty_assertions::assert_eq;

    fn sit_config() -> SeatConfig {
        SeatConfig::new(Vec3::new(0.0, -0.45, 0.0), 0.0)
    }

    #[test]
    fn test_seat_lifecycle() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actor = TestActor::new("Alice");

        let info = registry
            .create_seat(&mut actor, PostureKind::Sit, &sit_config(), None, None)
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(actor.vehicle, Some(info.actuator_id));
        assert_eq!(registry.owner_of(info.actuator_id), Some(actor.id));
        assert!(factory.state(info.actuator_id).spawned);

        let removed = registry.remove_seat(&mut actor, RemovalReason::Command);
        assert_eq!(removed, Some(PostureKind::Sit));
        assert!(registry.is_empty());
        assert!(registry.owner_of(info.actuator_id).is_none());
        assert!(factory.state(info.actuator_id).discarded);
        assert_eq!(actor.vehicle, None);
    }

    #[test]
    fn test_offset_and_yaw_override() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actor = TestActor::new("Alice");
        actor.position = Vec3::new(1.0, 2.0, 3.0);
        actor.yaw = 15.0;
        let seat = SeatConfig::new(Vec3::new(0.1, -0.2, 0.3), 0.0);

        let info = registry
            .create_seat(
                &mut actor,
                PostureKind::Sit,
                &seat,
                Some(Vec3::new(0.4, 0.6, -0.5)),
                Some(90.0),
            )
            .unwrap();

        let expected_offset = Vec3::new(0.1, -0.2, 0.3) + Vec3::new(0.4, 0.6, -0.5);
        let spec = factory.last_spec().unwrap();
        assert_eq!(spec.position, Vec3::new(1.0, 2.0, 3.0) + expected_offset);
        assert_eq!(spec.yaw, 90.0);
        assert_eq!(spec.flags, ActuatorFlags::SEAT);
        assert_eq!(info.offset, expected_offset);
        assert_eq!(info.yaw, 90.0);
        assert_eq!(info.last_position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_default_yaw_is_actor_yaw() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actor = TestActor::new("Alice");
        actor.yaw = 42.0;

        let info = registry
            .create_seat(&mut actor, PostureKind::Lay, &sit_config(), None, None)
            .unwrap();
        assert_eq!(info.yaw, 42.0);
        assert_eq!(factory.last_spec().unwrap().yaw, 42.0);
    }

    #[test]
    fn test_create_replaces_existing() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actor = TestActor::new("Alice");

        let first = registry
            .create_seat(&mut actor, PostureKind::Sit, &sit_config(), None, None)
            .unwrap();
        let second = registry
            .create_seat(&mut actor, PostureKind::Lay, &sit_config(), None, None)
            .unwrap();

        assert_ne!(first.actuator_id, second.actuator_id);
        assert_eq!(registry.len(), 1);
        assert!(factory.state(first.actuator_id).discarded);
        assert!(registry.owner_of(first.actuator_id).is_none());
        assert_eq!(registry.session(actor.id).unwrap().kind, PostureKind::Lay);
        assert_eq!(actor.vehicle, Some(second.actuator_id));
    }

    #[test]
    fn test_create_failures_leave_nothing_behind() {
        let mut actor = TestActor::new("Alice");

        for error in [SeatError::Create, SeatError::Spawn, SeatError::Ride] {
            let factory = StubFactory::new();
            factory.fail_with(error);
            let registry = SeatRegistry::new(factory.clone());

            let result = registry.create_seat(&mut actor, PostureKind::Sit, &sit_config(), None, None);
            assert_eq!(result, Err(error));
            assert!(registry.is_empty());
            assert_eq!(actor.vehicle, None);
            assert!(factory.all_discarded());
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SeatError::Create.to_string(), "seat.create");
        assert_eq!(SeatError::Spawn.to_string(), "seat.spawn");
        assert_eq!(SeatError::Ride.to_string(), "seat.ride");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SeatRegistry::new(StubFactory::new());
        let mut actor = TestActor::new("Alice");

        assert_eq!(registry.remove_seat(&mut actor, RemovalReason::Command), None);
        assert_eq!(registry.remove_by_actuator(ActuatorId(99), RemovalReason::Unknown), None);
    }

    #[test]
    fn test_remove_does_not_dismount_foreign_vehicle() {
        let registry = SeatRegistry::new(StubFactory::new());
        let mut actor = TestActor::new("Alice");

        registry
            .create_seat(&mut actor, PostureKind::Sit, &sit_config(), None, None)
            .unwrap();
        actor.vehicle = Some(ActuatorId(4242));

        registry.remove_seat(&mut actor, RemovalReason::Unknown);
        assert_eq!(actor.vehicle, Some(ActuatorId(4242)));
    }

    #[test]
    fn test_remove_by_actuator() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actor = TestActor::new("Alice");

        let info = registry
            .create_seat(&mut actor, PostureKind::Belly, &sit_config(), None, None)
            .unwrap();

        let owner = registry.remove_by_actuator(info.actuator_id, RemovalReason::Unknown);
        assert_eq!(owner, Some(actor.id));
        assert!(!registry.has_session(actor.id));
        assert!(factory.state(info.actuator_id).discarded);
    }

    #[test]
    fn test_remove_by_stale_actuator() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actor = TestActor::new("Alice");

        let first = registry
            .create_seat(&mut actor, PostureKind::Sit, &sit_config(), None, None)
            .unwrap();
        let second = registry
            .create_seat(&mut actor, PostureKind::Lay, &sit_config(), None, None)
            .unwrap();

        assert_eq!(registry.remove_by_actuator(first.actuator_id, RemovalReason::Unknown), None);
        assert!(registry.has_session(actor.id));
        assert!(!factory.state(second.actuator_id).discarded);
    }

    #[test]
    fn test_concurrent_creates_keep_one_seat() {
        for _ in 0..50 {
            let factory = StubFactory::new();
            let registry = SeatRegistry::new(factory.clone());
            let actor = TestActor::new("Alice");

            std::thread::scope(|scope| {
                for _ in 0..4 {
                    let mut clone = actor.clone();
                    let registry = &registry;
                    scope.spawn(move || {
                        for _ in 0..25 {
                            let _ = registry.create_seat(
                                &mut clone,
                                PostureKind::Sit,
                                &sit_config(),
                                None,
                                None,
                            );
                        }
                    });
                }
            });

            assert_eq!(registry.len(), 1);
            assert_eq!(registry.owners.len(), 1);
            assert_eq!(factory.live(), 1);

            assert_eq!(registry.discard_all(), 1);
            assert!(registry.owners.is_empty());
            assert!(factory.all_discarded());
        }
    }

    #[test]
    fn test_reposition_follows_actor() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actor = TestActor::new("Alice");

        let info = registry
            .create_seat(&mut actor, PostureKind::Sit, &sit_config(), None, None)
            .unwrap();

        let moved = Vec3::new(3.0, 64.0, -1.0);
        let target = registry.reposition(actor.id, moved, 33.0);
        assert_eq!(target, Some(moved + info.offset));

        let state = factory.state(info.actuator_id);
        assert_eq!(state.position, moved + info.offset);
        assert_eq!(state.yaw, 33.0);
        assert_eq!(registry.session(actor.id).unwrap().last_position, moved);

        assert_eq!(registry.reposition(TestActor::new("Bob").id, moved, 0.0), None);
    }

    #[test]
    fn test_cleanup_orphans() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut alice = TestActor::new("Alice");
        let mut bob = TestActor::new("Bob");

        let a = registry
            .create_seat(&mut alice, PostureKind::Sit, &sit_config(), None, None)
            .unwrap();
        registry
            .create_seat(&mut bob, PostureKind::Lay, &sit_config(), None, None)
            .unwrap();

        factory.destroy(a.actuator_id);
        let orphans = registry.cleanup_orphans();

        assert_eq!(orphans, vec![alice.id]);
        assert!(!registry.has_session(alice.id));
        assert!(registry.has_session(bob.id));
        assert!(registry.owner_of(a.actuator_id).is_none());
        assert!(registry.cleanup_orphans().is_empty());
    }

    #[test]
    fn test_discard_all_drains() {
        let factory = StubFactory::new();
        let registry = SeatRegistry::new(factory.clone());
        let mut actors: Vec<TestActor> = (0..3).map(|i| TestActor::new(&format!("P{}", i))).collect();

        for actor in &mut actors {
            registry
                .create_seat(actor, PostureKind::Sit, &sit_config(), None, None)
                .unwrap();
        }
        assert_eq!(registry.actor_ids().len(), 3);

        assert_eq!(registry.discard_all(), 3);
        assert!(registry.is_empty());
        assert!(registry.owners.is_empty());
        assert!(factory.all_discarded());
        assert_eq!(registry.discard_all(), 0);
    }
}
