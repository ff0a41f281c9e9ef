//! Identity resolution: which spawned actor is the ball, which car belongs to which player

use tracing::{debug, trace, warn};

use super::attributes::{ComponentKind, SpawnTarget};
use super::ActorId;

/// Internal vehicle label, in order of first sight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

/// Which identifier of a vehicle an actor fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleSlot {
    Car,
    Component(ComponentKind),
}

/// Actor identifiers belonging to one vehicle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleIds {
    pub car: Option<ActorId>,
    pub boost: Option<ActorId>,
    pub jump: Option<ActorId>,
    pub double_jump: Option<ActorId>,
    pub dodge: Option<ActorId>,
    pub flip: Option<ActorId>,
}

impl VehicleIds {
    pub fn component(&self, kind: ComponentKind) -> Option<ActorId> {
        match kind {
            ComponentKind::Boost => self.boost,
            ComponentKind::Jump => self.jump,
            ComponentKind::DoubleJump => self.double_jump,
            ComponentKind::Dodge => self.dodge,
            ComponentKind::Flip => self.flip,
        }
    }

    fn slot_mut(&mut self, slot: VehicleSlot) -> &mut Option<ActorId> {
        match slot {
            VehicleSlot::Car => &mut self.car,
            VehicleSlot::Component(ComponentKind::Boost) => &mut self.boost,
            VehicleSlot::Component(ComponentKind::Jump) => &mut self.jump,
            VehicleSlot::Component(ComponentKind::DoubleJump) => &mut self.double_jump,
            VehicleSlot::Component(ComponentKind::Dodge) => &mut self.dodge,
            VehicleSlot::Component(ComponentKind::Flip) => &mut self.flip,
        }
    }

    /// Components of this vehicle whose identifier is `actor_id`
    pub fn components_of(&self, actor_id: ActorId) -> impl Iterator<Item = ComponentKind> + '_ {
        ComponentKind::ALL
            .into_iter()
            .filter(move |kind| self.component(*kind) == Some(actor_id))
    }
}

/// Result of feeding a spawn notice to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Ball,
    Vehicle { player: Player, slot: VehicleSlot },
    /// Known archetype, but no identity changed (ball already set, or a third vehicle)
    Ignored,
}

/// Identity table owned by the frame dispatcher for the lifetime of one parse
#[derive(Debug, Clone, Default)]
pub struct IdentityTable {
    ball: Option<ActorId>,
    vehicles: [VehicleIds; 2],
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ball(&self) -> Option<ActorId> {
        self.ball
    }

    pub fn vehicle(&self, player: Player) -> &VehicleIds {
        &self.vehicles[player.index()]
    }

    /// Record a spawn notice. Returns `None` for archetypes we do not track.
    pub fn on_spawn(&mut self, archetype: &str, actor_id: ActorId) -> Option<Assignment> {
        let Some(target) = SpawnTarget::from_archetype(archetype) else {
            trace!(archetype, actor_id = %actor_id, "Ignoring untracked archetype");
            return None;
        };

        let assignment = match target {
            SpawnTarget::Ball => {
                if self.ball.is_none() {
                    self.ball = Some(actor_id);
                    Assignment::Ball
                } else {
                    Assignment::Ignored
                }
            }
            SpawnTarget::Vehicle => self.assign_sequential(VehicleSlot::Car, actor_id),
            SpawnTarget::Component(kind) => {
                self.assign_sequential(VehicleSlot::Component(kind), actor_id)
            }
        };

        debug!(archetype, actor_id = %actor_id, ?assignment, "Resolved spawn");
        Some(assignment)
    }

    /// Player one takes the value if its slot is empty or already holds it,
    /// otherwise player two does under the same rule.
    fn assign_sequential(&mut self, slot: VehicleSlot, actor_id: ActorId) -> Assignment {
        for player in Player::BOTH {
            let current = self.vehicles[player.index()].slot_mut(slot);
            match *current {
                None => {
                    *current = Some(actor_id);
                    return Assignment::Vehicle { player, slot };
                }
                Some(existing) if existing == actor_id => {
                    return Assignment::Vehicle { player, slot };
                }
                Some(_) => {}
            }
        }

        warn!(
            actor_id = %actor_id,
            ?slot,
            "Both vehicles already resolved, ignoring extra actor"
        );
        Assignment::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAR: &str = "Archetypes.Car.Car_Default";
    const BOOST: &str = "Archetypes.CarComponents.CarComponent_Boost";
    const BALL: &str = "Archetypes.Ball.Ball_Default";

    #[test]
    fn repeated_value_stays_with_player_one() {
        let mut table = IdentityTable::new();
        table.on_spawn(BOOST, ActorId(7));
        let again = table.on_spawn(BOOST, ActorId(7));

        assert_eq!(
            again,
            Some(Assignment::Vehicle {
                player: Player::One,
                slot: VehicleSlot::Component(ComponentKind::Boost),
            })
        );
        assert_eq!(table.vehicle(Player::One).boost, Some(ActorId(7)));
        assert_eq!(table.vehicle(Player::Two).boost, None);
    }

    #[test]
    fn distinct_value_goes_to_player_two() {
        let mut table = IdentityTable::new();
        table.on_spawn(BOOST, ActorId(7));
        table.on_spawn(BOOST, ActorId(9));

        assert_eq!(table.vehicle(Player::One).boost, Some(ActorId(7)));
        assert_eq!(table.vehicle(Player::Two).boost, Some(ActorId(9)));
    }

    #[test]
    fn slots_resolve_independently() {
        let mut table = IdentityTable::new();
        table.on_spawn(CAR, ActorId(3));
        table.on_spawn(BOOST, ActorId(4));
        table.on_spawn(CAR, ActorId(5));

        assert_eq!(table.vehicle(Player::One).car, Some(ActorId(3)));
        assert_eq!(table.vehicle(Player::One).boost, Some(ActorId(4)));
        assert_eq!(table.vehicle(Player::Two).car, Some(ActorId(5)));
        assert_eq!(table.vehicle(Player::Two).boost, None);
    }

    #[test]
    fn third_vehicle_is_ignored() {
        let mut table = IdentityTable::new();
        table.on_spawn(CAR, ActorId(1));
        table.on_spawn(CAR, ActorId(2));
        let third = table.on_spawn(CAR, ActorId(3));

        assert_eq!(third, Some(Assignment::Ignored));
        assert_eq!(table.vehicle(Player::One).car, Some(ActorId(1)));
        assert_eq!(table.vehicle(Player::Two).car, Some(ActorId(2)));
    }

    #[test]
    fn ball_first_writer_wins() {
        let mut table = IdentityTable::new();
        assert_eq!(table.on_spawn(BALL, ActorId(11)), Some(Assignment::Ball));
        assert_eq!(table.on_spawn(BALL, ActorId(12)), Some(Assignment::Ignored));
        assert_eq!(table.ball(), Some(ActorId(11)));
    }

    #[test]
    fn unknown_archetype_changes_nothing() {
        let mut table = IdentityTable::new();
        assert_eq!(table.on_spawn("Archetypes.GameEvent.GameEvent_Soccar", ActorId(1)), None);
        assert_eq!(table.ball(), None);
        assert_eq!(table.vehicle(Player::One), &VehicleIds::default());
    }

    #[test]
    fn components_of_lists_matching_kinds() {
        let mut table = IdentityTable::new();
        table.on_spawn("Archetypes.CarComponents.CarComponent_Dodge", ActorId(20));
        let kinds: Vec<_> = table.vehicle(Player::One).components_of(ActorId(20)).collect();
        assert_eq!(kinds, vec![ComponentKind::Dodge]);
        assert_eq!(table.vehicle(Player::One).components_of(ActorId(21)).count(), 0);
    }
}
