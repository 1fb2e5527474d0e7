//! Live actor projection.
//!
//! The host game implements [`Actor`] over its player entity. Every check the
//! posture service makes against the world goes through this trait, so the
//! service itself stays free of engine types.

use uuid::Uuid;

use super::geometry::{Aabb, BlockHit, Vec3};
use super::seat::ActuatorId;

/// Stable identity of a player.
pub type ActorId = Uuid;

/// Visual body pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pose {
    #[default]
    Standing,
    Swimming,
}

/// Read/write view of a live player.
pub trait Actor {
    fn id(&self) -> ActorId;

    fn name(&self) -> &str;

    /// Identifier of the world the actor is currently in.
    fn world(&self) -> &str;

    fn is_spectator(&self) -> bool;

    /// Entity has been removed from the world.
    fn is_removed(&self) -> bool;

    fn is_dead(&self) -> bool;

    fn is_sleeping(&self) -> bool;

    fn is_flying(&self) -> bool;

    fn is_on_ground(&self) -> bool;

    fn is_touching_water(&self) -> bool;

    /// Ticks of hurt animation left; anything above zero means recently hurt.
    fn hurt_time(&self) -> u32;

    fn is_recently_hurt(&self) -> bool {
        self.hurt_time() > 0
    }

    /// Operator level used by the fallback permission check.
    fn permission_level(&self) -> u8;

    /// Id of the actuator the actor currently rides, if any.
    fn vehicle(&self) -> Option<ActuatorId>;

    fn is_mounted(&self) -> bool {
        self.vehicle().is_some()
    }

    /// Mount the given actuator. Returns false if the world refused.
    fn mount(&mut self, actuator: ActuatorId) -> bool;

    fn dismount(&mut self);

    fn position(&self) -> Vec3;

    fn yaw(&self) -> f32;

    fn pitch(&self) -> f32;

    fn set_pitch(&mut self, pitch: f32);

    fn set_swimming(&mut self, swimming: bool);

    fn set_pose(&mut self, pose: Pose);

    fn bounding_box(&self) -> Aabb;

    /// True when nothing solid occupies `region`.
    fn is_space_empty(&self, region: &Aabb) -> bool;

    /// Raycast from the eyes along the look direction.
    fn target_block(&self, reach: f64) -> Option<BlockHit>;
}
