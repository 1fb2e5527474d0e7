//! Test doubles for the world-facing traits.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::actor::{Actor, ActorId, Pose};
use super::geometry::{Aabb, BlockHit, Vec3};
use super::seat::{Actuator, ActuatorFactory, ActuatorId, ActuatorSpec, SeatError};

/// Scriptable player. Every flag is a public field.
#[derive(Debug, Clone)]
pub struct TestActor {
    pub id: ActorId,
    pub name: String,
    pub world: String,
    pub spectator: bool,
    pub removed: bool,
    pub dead: bool,
    pub sleeping: bool,
    pub flying: bool,
    pub on_ground: bool,
    pub touching_water: bool,
    pub hurt_time: u32,
    pub op_level: u8,
    pub vehicle: Option<ActuatorId>,
    pub refuse_mount: bool,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub swimming: bool,
    pub pose: Pose,
    pub bounding_box: Aabb,
    pub obstructed: bool,
    pub target: Option<BlockHit>,
}

impl TestActor {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            world: "minecraft:overworld".to_string(),
            spectator: false,
            removed: false,
            dead: false,
            sleeping: false,
            flying: false,
            on_ground: true,
            touching_water: false,
            hurt_time: 0,
            op_level: 0,
            vehicle: None,
            refuse_mount: false,
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            swimming: false,
            pose: Pose::Standing,
            bounding_box: Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)),
            obstructed: false,
            target: None,
        }
    }
}

impl Actor for TestActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn world(&self) -> &str {
        &self.world
    }

    fn is_spectator(&self) -> bool {
        self.spectator
    }

    fn is_removed(&self) -> bool {
        self.removed
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    fn is_flying(&self) -> bool {
        self.flying
    }

    fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    fn is_touching_water(&self) -> bool {
        self.touching_water
    }

    fn hurt_time(&self) -> u32 {
        self.hurt_time
    }

    fn permission_level(&self) -> u8 {
        self.op_level
    }

    fn vehicle(&self) -> Option<ActuatorId> {
        self.vehicle
    }

    fn mount(&mut self, actuator: ActuatorId) -> bool {
        if self.refuse_mount {
            return false;
        }
        self.vehicle = Some(actuator);
        true
    }

    fn dismount(&mut self) {
        self.vehicle = None;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    fn set_swimming(&mut self, swimming: bool) {
        self.swimming = swimming;
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    fn is_space_empty(&self, _region: &Aabb) -> bool {
        !self.obstructed
    }

    fn target_block(&self, _reach: f64) -> Option<BlockHit> {
        self.target
    }
}

/// Observable state of one stub actuator.
#[derive(Debug, Clone, Default)]
pub struct StubState {
    pub spawned: bool,
    pub discarded: bool,
    pub destroyed: bool,
    pub position: Vec3,
    pub yaw: f32,
    pub repositions: usize,
}

pub struct StubActuator {
    id: ActuatorId,
    state: Arc<Mutex<StubState>>,
    fail: Option<SeatError>,
}

impl Actuator for StubActuator {
    fn id(&self) -> ActuatorId {
        self.id
    }

    fn spawn(&mut self) -> bool {
        if self.fail == Some(SeatError::Spawn) {
            return false;
        }
        self.state.lock().unwrap().spawned = true;
        true
    }

    fn attach_rider(&mut self, rider: &mut dyn Actor) -> bool {
        if self.fail == Some(SeatError::Ride) {
            return false;
        }
        rider.mount(self.id)
    }

    fn discard(&mut self) {
        self.state.lock().unwrap().discarded = true;
    }

    fn is_destroyed(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.discarded || state.destroyed
    }

    fn reposition(&mut self, position: Vec3, yaw: f32) {
        let mut state = self.state.lock().unwrap();
        state.position = position;
        state.yaw = yaw;
        state.repositions += 1;
    }
}

#[derive(Default)]
struct FactoryInner {
    next_id: AtomicI32,
    fail: Mutex<Option<SeatError>>,
    built: Mutex<Vec<(ActuatorId, Arc<Mutex<StubState>>)>>,
    specs: Mutex<Vec<ActuatorSpec>>,
}

/// Factory handing out [`StubActuator`]s. Clones share the same log.
#[derive(Clone, Default)]
pub struct StubFactory {
    inner: Arc<FactoryInner>,
}

impl StubFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following creation fail at the given step.
    pub fn fail_with(&self, error: SeatError) {
        *self.inner.fail.lock().unwrap() = Some(error);
    }

    pub fn state(&self, id: ActuatorId) -> StubState {
        self.handle(id).lock().unwrap().clone()
    }

    /// Simulate the world removing the actuator behind our back.
    pub fn destroy(&self, id: ActuatorId) {
        self.handle(id).lock().unwrap().destroyed = true;
    }

    pub fn last_spec(&self) -> Option<ActuatorSpec> {
        self.inner.specs.lock().unwrap().last().copied()
    }

    pub fn built(&self) -> usize {
        self.inner.built.lock().unwrap().len()
    }

    /// Actuators built and not yet discarded.
    pub fn live(&self) -> usize {
        self.inner
            .built
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, state)| !state.lock().unwrap().discarded)
            .count()
    }

    pub fn all_discarded(&self) -> bool {
        self.inner
            .built
            .lock()
            .unwrap()
            .iter()
            .all(|(_, state)| state.lock().unwrap().discarded)
    }

    fn handle(&self, id: ActuatorId) -> Arc<Mutex<StubState>> {
        self.inner
            .built
            .lock()
            .unwrap()
            .iter()
            .find(|(built, _)| *built == id)
            .map(|(_, state)| Arc::clone(state))
            .expect("unknown actuator")
    }
}

impl ActuatorFactory for StubFactory {
    fn create(&self, _actor: &dyn Actor, spec: &ActuatorSpec) -> Option<Box<dyn Actuator>> {
        self.inner.specs.lock().unwrap().push(*spec);
        let fail = *self.inner.fail.lock().unwrap();
        if fail == Some(SeatError::Create) {
            return None;
        }

        let id = ActuatorId(self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 100);
        let state = Arc::new(Mutex::new(StubState {
            position: spec.position,
            yaw: spec.yaw,
            ..StubState::default()
        }));
        self.inner.built.lock().unwrap().push((id, Arc::clone(&state)));

        Some(Box::new(StubActuator { id, state, fail }))
    }
}
