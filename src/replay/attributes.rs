//! Static lookup tables for replicated attribute names and actor archetypes

/// Attribute kinds the sampler understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    RigidBody,
    ComponentActive,
    BoostAmount,
    Steer,
    Throttle,
    Handbrake,
    DodgeTorque,
    TimeRemaining,
    /// Anything else; dropped without error
    Unknown,
}

static UPDATE_KINDS: &[(&str, UpdateKind)] = &[
    ("TAGame.RBActor_TA:ReplicatedRBState", UpdateKind::RigidBody),
    ("TAGame.CarComponent_TA:ReplicatedActive", UpdateKind::ComponentActive),
    (
        "TAGame.CarComponent_Boost_TA:ReplicatedBoostAmount",
        UpdateKind::BoostAmount,
    ),
    ("TAGame.Vehicle_TA:ReplicatedSteer", UpdateKind::Steer),
    ("TAGame.Vehicle_TA:ReplicatedThrottle", UpdateKind::Throttle),
    ("TAGame.Vehicle_TA:bReplicatedHandbrake", UpdateKind::Handbrake),
    ("TAGame.CarComponent_Dodge_TA:DodgeTorque", UpdateKind::DodgeTorque),
    (
        "TAGame.GameEvent_TA:ReplicatedGameStateTimeRemaining",
        UpdateKind::TimeRemaining,
    ),
];

impl UpdateKind {
    pub fn from_name(name: &str) -> Self {
        UPDATE_KINDS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Unknown)
    }
}

/// Auxiliary car components tracked per vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Boost,
    Jump,
    DoubleJump,
    Dodge,
    Flip,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Boost,
        ComponentKind::Jump,
        ComponentKind::DoubleJump,
        ComponentKind::Dodge,
        ComponentKind::Flip,
    ];

    /// Components whose active flag is the jump button
    pub fn is_jump_button(self) -> bool {
        !matches!(self, ComponentKind::Boost)
    }
}

/// What a spawned archetype gets assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnTarget {
    Ball,
    Vehicle,
    Component(ComponentKind),
}

static ARCHETYPES: &[(&str, SpawnTarget)] = &[
    ("Archetypes.Ball.Ball_Default", SpawnTarget::Ball),
    ("Archetypes.Car.Car_Default", SpawnTarget::Vehicle),
    (
        "Archetypes.CarComponents.CarComponent_Boost",
        SpawnTarget::Component(ComponentKind::Boost),
    ),
    (
        "Archetypes.CarComponents.CarComponent_Jump",
        SpawnTarget::Component(ComponentKind::Jump),
    ),
    (
        "Archetypes.CarComponents.CarComponent_DoubleJump",
        SpawnTarget::Component(ComponentKind::DoubleJump),
    ),
    (
        "Archetypes.CarComponents.CarComponent_Dodge",
        SpawnTarget::Component(ComponentKind::Dodge),
    ),
    (
        "Archetypes.CarComponents.CarComponent_FlipCar",
        SpawnTarget::Component(ComponentKind::Flip),
    ),
];

impl SpawnTarget {
    pub fn from_archetype(archetype: &str) -> Option<Self> {
        ARCHETYPES
            .iter()
            .find(|(name, _)| *name == archetype)
            .map(|(_, target)| *target)
    }
}
