//! Replay frame model and the per-frame sampling pipeline

pub mod attributes;
pub mod entity;
pub mod identity;
pub mod parser;
pub mod protocol;
pub mod snapshot;
pub mod stream;

pub use parser::{parse_replay, ParseError, ParseSummary, ReplayParser};
pub use snapshot::SamplePair;

use std::fmt;

/// Transient handle the replay source assigns to a spawned actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team a vehicle plays for (0 = blue, 1 = orange)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Blue,
    Orange,
}

impl TryFrom<u8> for Team {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Blue),
            1 => Ok(Self::Orange),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Rotation as replicated: one quantized 16-bit magnitude per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rotation {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

/// Partial rotation payload; absent axes keep their previous value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationUpdate {
    pub x: Option<u16>,
    pub y: Option<u16>,
    pub z: Option<u16>,
}

/// Rigid-body state payload. Every field is merged independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RigidBodyUpdate {
    pub location: Option<Vector3>,
    pub rotation: Option<RotationUpdate>,
    pub linear_velocity: Option<Vector3>,
    pub angular_velocity: Option<Vector3>,
}

/// One recognized attribute update carried by a replication
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeUpdate {
    RigidBody(RigidBodyUpdate),
    ComponentActive(u8),
    BoostAmount(u8),
    Steer(u8),
    Throttle(u8),
    Handbrake(bool),
    DodgeTorque(Vector3),
    TimeRemaining(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationEvent {
    /// Actor spawned with the given archetype name
    Spawned { archetype: String },
    /// Batch of attribute updates for one actor
    Updated(Vec<AttributeUpdate>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replication {
    pub actor_id: ActorId,
    pub event: ReplicationEvent,
}

impl Replication {
    pub fn spawned(actor_id: u32, archetype: impl Into<String>) -> Self {
        Self {
            actor_id: ActorId(actor_id),
            event: ReplicationEvent::Spawned {
                archetype: archetype.into(),
            },
        }
    }

    pub fn updated(actor_id: u32, updates: Vec<AttributeUpdate>) -> Self {
        Self {
            actor_id: ActorId(actor_id),
            event: ReplicationEvent::Updated(updates),
        }
    }
}

/// One frame of the replay: elapsed time since the previous frame plus its replications
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub delta: f32,
    pub replications: Vec<Replication>,
}
