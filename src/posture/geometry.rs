//! World geometry primitives used by seats and chair placement.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point or displacement in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn offset(&self, by: Vec3) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    West,
    East,
    Up,
    Down,
}

impl Direction {
    /// Seat yaw (degrees) for a stair facing this way.
    pub fn seat_yaw(&self) -> f32 {
        match self {
            Self::North => 180.0,
            Self::South => 0.0,
            Self::West => 90.0,
            Self::East => 270.0,
            _ => 0.0,
        }
    }
}

/// Which half of the block a stair occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StairHalf {
    Top,
    Bottom,
}

/// Shape of a block hit by a raycast, reduced to what chair placement needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    Stairs { facing: Direction, half: StairHalf },
    Other,
}

/// Result of a block raycast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHit {
    pub pos: BlockPos,
    pub shape: BlockShape,
}

impl BlockHit {
    /// Upper surface centre of a stair block, or `None` for anything else.
    pub fn stair_seat(&self) -> Option<(Vec3, f32)> {
        match self.shape {
            BlockShape::Stairs { facing, half } => {
                let top = match half {
                    StairHalf::Top => 1.0,
                    StairHalf::Bottom => 0.5,
                };
                let base = Vec3::new(
                    f64::from(self.pos.x) + 0.5,
                    f64::from(self.pos.y) + top,
                    f64::from(self.pos.z) + 0.5,
                );
                Some((base, facing.seat_yaw()))
            }
            BlockShape::Other => None,
        }
    }
}
