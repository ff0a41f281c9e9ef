//! Decoder wire format (rattletrap JSON) and its conversion into replay frames
//! These types mirror the decoder output; only the fields we sample are declared.

use serde::Deserialize;
use tracing::trace;

use super::attributes::UpdateKind;
use super::parser::ParseError;
use super::{
    ActorId, AttributeUpdate, Frame, RigidBodyUpdate, Replication, ReplicationEvent,
    RotationUpdate, Vector3,
};

/// One frame as emitted under `content.frames`
#[derive(Debug, Clone, Deserialize)]
pub struct FrameWire {
    /// Seconds since the previous frame
    pub delta: Option<f32>,
    #[serde(default)]
    pub replications: Vec<ReplicationWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationWire {
    pub actor_id: ActorIdWire,
    pub value: ReplicationValueWire,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActorIdWire {
    pub value: u32,
}

/// Exactly one of the variants is present; destroyed notices carry nothing we use
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicationValueWire {
    #[serde(default)]
    pub spawned_replication_value: Option<SpawnedWire>,
    #[serde(default)]
    pub updated_replication_value: Option<Vec<AttributeWire>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpawnedWire {
    /// Archetype name
    pub object_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeWire {
    pub name: String,
    #[serde(default)]
    pub value: AttributeValueWire,
}

/// Attribute payload, keyed by value type
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributeValueWire {
    #[serde(default)]
    pub byte_attribute_value: Option<u8>,
    #[serde(default)]
    pub boolean_attribute_value: Option<bool>,
    #[serde(default)]
    pub int_attribute_value: Option<i32>,
    #[serde(default)]
    pub location_attribute_value: Option<VectorWire>,
    #[serde(default)]
    pub rigid_body_state_attribute_value: Option<RigidBodyWire>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VectorWire {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<VectorWire> for Vector3 {
    fn from(v: VectorWire) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuantizedWire {
    pub value: u16,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RotationWire {
    #[serde(default)]
    pub x: Option<QuantizedWire>,
    #[serde(default)]
    pub y: Option<QuantizedWire>,
    #[serde(default)]
    pub z: Option<QuantizedWire>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RigidBodyWire {
    #[serde(default)]
    pub location: Option<VectorWire>,
    #[serde(default)]
    pub rotation: Option<RotationWire>,
    /// Null while the body is sleeping
    #[serde(default)]
    pub linear_velocity: Option<VectorWire>,
    #[serde(default)]
    pub angular_velocity: Option<VectorWire>,
}

impl From<RigidBodyWire> for RigidBodyUpdate {
    fn from(rb: RigidBodyWire) -> Self {
        RigidBodyUpdate {
            location: rb.location.map(Vector3::from),
            rotation: rb.rotation.map(|r| RotationUpdate {
                x: r.x.map(|q| q.value),
                y: r.y.map(|q| q.value),
                z: r.z.map(|q| q.value),
            }),
            linear_velocity: rb.linear_velocity.map(Vector3::from),
            angular_velocity: rb.angular_velocity.map(Vector3::from),
        }
    }
}

impl AttributeWire {
    /// `Ok(None)` for attributes we do not track
    pub fn into_update(self, frame: usize) -> Result<Option<AttributeUpdate>, ParseError> {
        let kind = UpdateKind::from_name(&self.name);
        let value = self.value;
        let update = match kind {
            UpdateKind::Unknown => return Ok(None),
            UpdateKind::RigidBody => value
                .rigid_body_state_attribute_value
                .map(|rb| AttributeUpdate::RigidBody(rb.into())),
            UpdateKind::ComponentActive => value
                .byte_attribute_value
                .map(AttributeUpdate::ComponentActive),
            UpdateKind::BoostAmount => value.byte_attribute_value.map(AttributeUpdate::BoostAmount),
            UpdateKind::Steer => value.byte_attribute_value.map(AttributeUpdate::Steer),
            UpdateKind::Throttle => value.byte_attribute_value.map(AttributeUpdate::Throttle),
            UpdateKind::Handbrake => value
                .boolean_attribute_value
                .map(AttributeUpdate::Handbrake),
            UpdateKind::DodgeTorque => value
                .location_attribute_value
                .map(|v| AttributeUpdate::DodgeTorque(v.into())),
            UpdateKind::TimeRemaining => value
                .int_attribute_value
                .map(AttributeUpdate::TimeRemaining),
        };

        update.map(Some).ok_or(ParseError::MalformedAttribute {
            frame,
            attribute: self.name,
        })
    }
}

impl ReplicationWire {
    /// `Ok(None)` for notices that carry nothing to sample (destroyed actors)
    pub fn into_replication(self, frame: usize) -> Result<Option<Replication>, ParseError> {
        let actor_id = ActorId(self.actor_id.value);

        if let Some(spawned) = self.value.spawned_replication_value {
            return Ok(Some(Replication {
                actor_id,
                event: ReplicationEvent::Spawned {
                    archetype: spawned.object_name,
                },
            }));
        }

        match self.value.updated_replication_value {
            Some(attributes) => {
                let mut updates = Vec::with_capacity(attributes.len());
                for attribute in attributes {
                    if let Some(update) = attribute.into_update(frame)? {
                        updates.push(update);
                    }
                }
                Ok(Some(Replication {
                    actor_id,
                    event: ReplicationEvent::Updated(updates),
                }))
            }
            None => {
                trace!(frame, actor_id = %actor_id, "Skipping replication without spawn or update");
                Ok(None)
            }
        }
    }
}

impl FrameWire {
    /// Convert the frame at position `index` in the stream
    pub fn into_frame(self, index: usize) -> Result<Frame, ParseError> {
        let delta = self.delta.ok_or(ParseError::MissingDelta { frame: index })?;

        let mut replications = Vec::with_capacity(self.replications.len());
        for replication in self.replications {
            if let Some(replication) = replication.into_replication(index)? {
                replications.push(replication);
            }
        }

        Ok(Frame {
            delta,
            replications,
        })
    }
}
