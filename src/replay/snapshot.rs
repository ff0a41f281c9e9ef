//! Sample clock and fixed-width binary encoding of tracker state
//!
//! Physics record: ball, team 0 car, team 1 car. Per entity, little-endian:
//! location (3 x i32), rotation (3 x u16), linear velocity (3 x i32),
//! angular velocity (3 x i32). Cars append their boost amount as one u8.
//!
//! Control record: team 0 car, team 1 car. Per car, six u8 values:
//! throttle, steer, balance, boosting, jumping, powersliding.
//!
//! Downstream readers rely on these widths and this field order.

use bytes::{BufMut, Bytes, BytesMut};

use super::entity::{PhysicsState, VehicleState};
use super::Vector3;

/// Bytes per ball physics entry
pub const BALL_PHYSICS_LEN: usize = 3 * 4 + 3 * 2 + 3 * 4 + 3 * 4;
/// Bytes per car physics entry (ball layout + boost byte)
pub const VEHICLE_PHYSICS_LEN: usize = BALL_PHYSICS_LEN + 1;
/// Bytes per physics record
pub const PHYSICS_RECORD_LEN: usize = BALL_PHYSICS_LEN + 2 * VEHICLE_PHYSICS_LEN;
/// Bytes per car control entry
pub const VEHICLE_CONTROL_LEN: usize = 6;
/// Bytes per control record
pub const CONTROL_RECORD_LEN: usize = 2 * VEHICLE_CONTROL_LEN;

/// Entities that contribute to the physics stream
pub trait EncodeSample {
    const PHYSICS_LEN: usize;

    fn encode_physics(&self, buf: &mut BytesMut);
}

fn put_vector(buf: &mut BytesMut, v: Vector3) {
    // Float to int casts truncate toward zero
    buf.put_i32_le(v.x as i32);
    buf.put_i32_le(v.y as i32);
    buf.put_i32_le(v.z as i32);
}

impl EncodeSample for PhysicsState {
    const PHYSICS_LEN: usize = BALL_PHYSICS_LEN;

    fn encode_physics(&self, buf: &mut BytesMut) {
        put_vector(buf, self.location);
        buf.put_u16_le(self.rotation.x);
        buf.put_u16_le(self.rotation.y);
        buf.put_u16_le(self.rotation.z);
        put_vector(buf, self.linear_velocity);
        put_vector(buf, self.angular_velocity);
    }
}

impl EncodeSample for VehicleState {
    const PHYSICS_LEN: usize = VEHICLE_PHYSICS_LEN;

    fn encode_physics(&self, buf: &mut BytesMut) {
        self.physics.encode_physics(buf);
        buf.put_u8(self.boost_byte());
    }
}

impl VehicleState {
    /// Boost amount truncated into its byte range
    pub fn boost_byte(&self) -> u8 {
        self.boost_amount.clamp(0.0, 255.0) as u8
    }

    pub fn encode_controls(&self, buf: &mut BytesMut) {
        buf.put_u8(self.throttle);
        buf.put_u8(self.steer);
        buf.put_u8(self.balance);
        buf.put_u8(u8::from(self.boosting));
        buf.put_u8(u8::from(self.jumping));
        buf.put_u8(u8::from(self.powersliding));
    }
}

pub fn encode_physics_sample(
    ball: &PhysicsState,
    team0: &VehicleState,
    team1: &VehicleState,
) -> Bytes {
    let mut buf = BytesMut::with_capacity(PHYSICS_RECORD_LEN);
    ball.encode_physics(&mut buf);
    team0.encode_physics(&mut buf);
    team1.encode_physics(&mut buf);
    debug_assert_eq!(buf.len(), PHYSICS_RECORD_LEN);
    buf.freeze()
}

pub fn encode_control_sample(team0: &VehicleState, team1: &VehicleState) -> Bytes {
    let mut buf = BytesMut::with_capacity(CONTROL_RECORD_LEN);
    team0.encode_controls(&mut buf);
    team1.encode_controls(&mut buf);
    debug_assert_eq!(buf.len(), CONTROL_RECORD_LEN);
    buf.freeze()
}

/// One physics record and its matching control record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePair {
    pub physics: Bytes,
    pub controls: Bytes,
}

impl SamplePair {
    pub fn encode(ball: &PhysicsState, team0: &VehicleState, team1: &VehicleState) -> Self {
        Self {
            physics: encode_physics_sample(ball, team0, team1),
            controls: encode_control_sample(team0, team1),
        }
    }
}

/// Decides when a sample is due, from replay time elapsed since the last one
#[derive(Debug, Clone)]
pub struct SampleClock {
    /// Replay seconds accumulated since the last sample
    since_last: f32,
    /// Sample interval in seconds
    interval: f32,
}

impl SampleClock {
    pub fn new(interval: f32) -> Self {
        Self {
            since_last: 0.0,
            interval,
        }
    }

    /// True once strictly more than one interval has accumulated
    pub fn is_due(&self) -> bool {
        self.since_last > self.interval
    }

    pub fn reset(&mut self) {
        self.since_last = 0.0;
    }

    pub fn advance(&mut self, delta: f32) {
        self.since_last += delta;
    }
}
