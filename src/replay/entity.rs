//! Entity state trackers for the ball and the two cars

use crate::util::time::BOOST_CONSUMPTION_RATE;

use super::attributes::ComponentKind;
use super::{RigidBodyUpdate, Rotation, Vector3};

/// Byte value of a centered analog input
pub const CENTERED: u8 = 128;

/// Physics state shared by the ball and the vehicles
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsState {
    pub location: Vector3,
    pub rotation: Rotation,
    pub linear_velocity: Vector3,
    pub angular_velocity: Vector3,
}

impl PhysicsState {
    /// Merge a rigid-body payload field by field. Absent fields keep their value.
    pub fn apply_physics_update(&mut self, update: &RigidBodyUpdate) {
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(rotation) = update.rotation {
            if let Some(x) = rotation.x {
                self.rotation.x = x;
            }
            if let Some(y) = rotation.y {
                self.rotation.y = y;
            }
            if let Some(z) = rotation.z {
                self.rotation.z = z;
            }
        }
        if let Some(linear_velocity) = update.linear_velocity {
            self.linear_velocity = linear_velocity;
        }
        if let Some(angular_velocity) = update.angular_velocity {
            self.angular_velocity = angular_velocity;
        }
    }
}

/// Car state: physics plus the control inputs we can recover from replication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub physics: PhysicsState,
    /// 0 = full left, 128 = none, 255 = full right
    pub steer: u8,
    /// 0 = full reverse, 128 = none, 255 = full forward
    pub throttle: u8,
    /// Stand-in for the joystick y axis, only known while dodging
    pub balance: u8,
    /// 0-255, kept as a float so per-frame decay accumulates
    pub boost_amount: f32,
    pub boosting: bool,
    pub jumping: bool,
    pub powersliding: bool,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            physics: PhysicsState::default(),
            steer: CENTERED,
            throttle: CENTERED,
            balance: CENTERED,
            boost_amount: 0.0,
            boosting: false,
            jumping: false,
            powersliding: false,
        }
    }
}

impl VehicleState {
    pub fn apply_physics_update(&mut self, update: &RigidBodyUpdate) {
        self.physics.apply_physics_update(update);
    }

    /// Odd values mean the button went down, even values that it was released.
    /// Returns true when this is a dodge press.
    pub fn apply_component_active(&mut self, kind: ComponentKind, value: u8) -> bool {
        let pressed = value % 2 == 1;
        match kind {
            ComponentKind::Boost => self.boosting = pressed,
            ComponentKind::Jump
            | ComponentKind::DoubleJump
            | ComponentKind::Dodge
            | ComponentKind::Flip => self.jumping = pressed,
        }
        kind == ComponentKind::Dodge && pressed
    }

    pub fn apply_boost_amount(&mut self, value: u8) {
        self.boost_amount = f32::from(value);
    }

    /// Drain boost for `delta` seconds if currently boosting.
    /// Must run before the batch's active-flag toggle is applied.
    pub fn decay_boost(&mut self, delta: f32) {
        if self.boosting {
            self.boost_amount = (self.boost_amount - delta * BOOST_CONSUMPTION_RATE).max(0.0);
        }
    }

    pub fn apply_vehicle_controls(
        &mut self,
        steer: Option<u8>,
        throttle: Option<u8>,
        handbrake: Option<bool>,
    ) {
        if let Some(steer) = steer {
            self.steer = steer;
        }
        if let Some(throttle) = throttle {
            self.throttle = throttle;
        }
        if let Some(handbrake) = handbrake {
            self.powersliding = handbrake;
        }
    }

    /// Yields 1, 128 or 255 depending on the sign of the torque's y component
    pub fn apply_dodge_torque(&mut self, y: f32) {
        self.balance = if y > 0.0 {
            255
        } else if y < 0.0 {
            1
        } else {
            CENTERED
        };
    }

    pub fn reset_balance_on_sample(&mut self) {
        self.balance = CENTERED;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::RotationUpdate;

    #[test]
    fn physics_update_merges_each_field_from_its_own_key() {
        let mut state = PhysicsState::default();
        state.apply_physics_update(&RigidBodyUpdate {
            location: Some(Vector3::new(1.0, 2.0, 3.0)),
            rotation: Some(RotationUpdate {
                x: Some(10),
                y: Some(20),
                z: Some(30),
            }),
            linear_velocity: Some(Vector3::new(4.0, 5.0, 6.0)),
            angular_velocity: Some(Vector3::new(7.0, 8.0, 9.0)),
        });

        assert_eq!(state.linear_velocity, Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(state.angular_velocity, Vector3::new(7.0, 8.0, 9.0));

        // Sleeping bodies replicate without velocities
        state.apply_physics_update(&RigidBodyUpdate {
            location: Some(Vector3::new(-1.0, -2.0, -3.0)),
            rotation: Some(RotationUpdate {
                x: None,
                y: Some(21),
                z: None,
            }),
            linear_velocity: None,
            angular_velocity: None,
        });

        assert_eq!(state.location, Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(state.rotation, Rotation { x: 10, y: 21, z: 30 });
        assert_eq!(state.linear_velocity, Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(state.angular_velocity, Vector3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn boost_decays_while_boosting() {
        let mut car = VehicleState {
            boosting: true,
            boost_amount: 100.0,
            ..Default::default()
        };
        car.decay_boost(0.5);
        assert!((car.boost_amount - 57.5).abs() < 1e-4);
    }

    #[test]
    fn boost_decay_floors_at_zero() {
        let mut car = VehicleState {
            boosting: true,
            boost_amount: 10.0,
            ..Default::default()
        };
        car.decay_boost(1.0);
        assert_eq!(car.boost_amount, 0.0);
    }

    #[test]
    fn no_decay_when_not_boosting() {
        let mut car = VehicleState {
            boost_amount: 80.0,
            ..Default::default()
        };
        car.decay_boost(1.0);
        assert_eq!(car.boost_amount, 80.0);
    }

    #[test]
    fn component_parity_is_edge_triggered() {
        let mut car = VehicleState::default();
        assert!(!car.apply_component_active(ComponentKind::Jump, 1));
        assert!(car.jumping);
        car.apply_component_active(ComponentKind::DoubleJump, 2);
        assert!(!car.jumping);

        car.apply_component_active(ComponentKind::Boost, 3);
        assert!(car.boosting);
        assert!(!car.jumping);

        assert!(car.apply_component_active(ComponentKind::Dodge, 5));
        assert!(!car.apply_component_active(ComponentKind::Dodge, 6));
    }

    #[test]
    fn dodge_torque_maps_to_three_values() {
        let mut car = VehicleState::default();
        car.apply_dodge_torque(0.7);
        assert_eq!(car.balance, 255);
        car.apply_dodge_torque(-3.0);
        assert_eq!(car.balance, 1);
        car.apply_dodge_torque(0.0);
        assert_eq!(car.balance, 128);

        car.apply_dodge_torque(1.0);
        car.reset_balance_on_sample();
        assert_eq!(car.balance, CENTERED);
    }

    #[test]
    fn controls_overwrite_only_present_inputs() {
        let mut car = VehicleState::default();
        car.apply_vehicle_controls(Some(200), None, Some(true));
        assert_eq!(car.steer, 200);
        assert_eq!(car.throttle, CENTERED);
        assert!(car.powersliding);
    }
}
