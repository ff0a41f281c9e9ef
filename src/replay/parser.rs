//! Frame dispatcher: drives the replay frame stream, gates recording on kickoff
//! and samples tracker state at a fixed rate

use std::pin::pin;

use futures::{Stream, StreamExt};
use tokio::io::AsyncWrite;
use tracing::{debug, info, trace, warn};

use crate::sink::SampleSink;
use crate::util::time::sample_interval;

use super::attributes::ComponentKind;
use super::entity::{PhysicsState, VehicleState};
use super::identity::{IdentityTable, Player, VehicleIds};
use super::snapshot::{SampleClock, SamplePair};
use super::{ActorId, AttributeUpdate, Frame, Replication, ReplicationEvent, Team};

/// Per-replay parse failures
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("frame {frame} has no delta")]
    MissingDelta { frame: usize },

    #[error("frame {frame}: malformed payload for {attribute}")]
    MalformedAttribute { frame: usize, attribute: String },

    #[error("invalid replay JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame reader stopped unexpectedly")]
    ReaderPanicked,
}

/// What one parse produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub frames: u64,
    pub samples: u64,
    /// Whether the kickoff countdown was ever seen reaching zero
    pub recording_started: bool,
}

/// State machine for one replay. Owns the identity table and every tracker.
pub struct ReplayParser {
    /// Team of the first car seen
    player1_team: Team,
    identities: IdentityTable,
    ball: PhysicsState,
    vehicles: [VehicleState; 2],
    /// Opens once, when the kickoff countdown hits zero
    recording: bool,
    clock: SampleClock,
    summary: ParseSummary,
}

impl ReplayParser {
    pub fn new(player1_team: Team) -> Self {
        Self {
            player1_team,
            identities: IdentityTable::new(),
            ball: PhysicsState::default(),
            vehicles: [VehicleState::default(), VehicleState::default()],
            recording: false,
            clock: SampleClock::new(sample_interval()),
            summary: ParseSummary::default(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn ball(&self) -> &PhysicsState {
        &self.ball
    }

    pub fn vehicle(&self, player: Player) -> &VehicleState {
        &self.vehicles[player.index()]
    }

    pub fn summary(&self) -> ParseSummary {
        self.summary
    }

    /// Process one frame. A returned sample reflects state as of the end of
    /// the previous frame; this frame's updates are applied afterwards.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<SamplePair> {
        self.summary.frames += 1;

        let sample = if self.recording && self.clock.is_due() {
            let pair = self.take_sample();
            self.clock.reset();
            Some(pair)
        } else {
            None
        };

        self.clock.advance(frame.delta);

        for replication in &frame.replications {
            self.apply_replication(replication, frame.delta);
        }

        sample
    }

    /// Vehicles in (team 0, team 1) order
    fn team_order(&self) -> (Player, Player) {
        match self.player1_team {
            Team::Blue => (Player::One, Player::Two),
            Team::Orange => (Player::Two, Player::One),
        }
    }

    fn take_sample(&mut self) -> SamplePair {
        let (team0, team1) = self.team_order();
        let pair = SamplePair::encode(
            &self.ball,
            &self.vehicles[team0.index()],
            &self.vehicles[team1.index()],
        );

        // A dodge direction only counts towards the sample that follows it
        for vehicle in &mut self.vehicles {
            vehicle.reset_balance_on_sample();
        }

        self.summary.samples += 1;
        pair
    }

    fn apply_replication(&mut self, replication: &Replication, delta: f32) {
        match &replication.event {
            ReplicationEvent::Spawned { archetype } => {
                self.identities.on_spawn(archetype, replication.actor_id);
            }
            ReplicationEvent::Updated(updates) => {
                self.watch_countdown(updates);
                self.apply_updates(replication.actor_id, updates, delta);
            }
        }
    }

    /// The gate can open from any actor's update stream
    fn watch_countdown(&mut self, updates: &[AttributeUpdate]) {
        if self.recording {
            return;
        }
        if updates
            .iter()
            .any(|update| matches!(update, AttributeUpdate::TimeRemaining(0)))
        {
            self.recording = true;
            self.summary.recording_started = true;
            debug!(frame = self.summary.frames, "Kickoff detected, recording started");
        }
    }

    fn apply_updates(&mut self, actor_id: ActorId, updates: &[AttributeUpdate], delta: f32) {
        let mut matched = false;

        if self.identities.ball() == Some(actor_id) {
            matched = true;
            for update in updates {
                if let AttributeUpdate::RigidBody(rigid_body) = update {
                    self.ball.apply_physics_update(rigid_body);
                }
            }
        }

        for player in Player::BOTH {
            let ids = self.identities.vehicle(player);
            let vehicle = &mut self.vehicles[player.index()];
            matched |= route_vehicle_updates(vehicle, ids, actor_id, updates, delta);
        }

        if !matched {
            trace!(actor_id = %actor_id, "Dropping update for unresolved actor");
        }
    }
}

/// Apply the parts of an update batch that belong to one vehicle.
/// Returns true if `actor_id` is any of the vehicle's identifiers.
fn route_vehicle_updates(
    vehicle: &mut VehicleState,
    ids: &VehicleIds,
    actor_id: ActorId,
    updates: &[AttributeUpdate],
    delta: f32,
) -> bool {
    let mut matched = false;

    if ids.car == Some(actor_id) {
        matched = true;
        let (mut steer, mut throttle, mut handbrake) = (None, None, None);
        for update in updates {
            match update {
                AttributeUpdate::RigidBody(rigid_body) => vehicle.apply_physics_update(rigid_body),
                AttributeUpdate::Steer(value) => steer = Some(*value),
                AttributeUpdate::Throttle(value) => throttle = Some(*value),
                AttributeUpdate::Handbrake(value) => handbrake = Some(*value),
                _ => {}
            }
        }
        vehicle.apply_vehicle_controls(steer, throttle, handbrake);
    }

    if ids.boost == Some(actor_id) {
        matched = true;
        let authoritative = updates
            .iter()
            .any(|update| matches!(update, AttributeUpdate::BoostAmount(_)));
        // Uses the boosting flag from before this batch
        if !authoritative {
            vehicle.decay_boost(delta);
        }
        for update in updates {
            match update {
                AttributeUpdate::BoostAmount(value) => vehicle.apply_boost_amount(*value),
                AttributeUpdate::ComponentActive(value) => {
                    vehicle.apply_component_active(ComponentKind::Boost, *value);
                }
                _ => {}
            }
        }
    }

    let mut dodge_pressed = false;
    for kind in ids
        .components_of(actor_id)
        .filter(|kind| kind.is_jump_button())
    {
        matched = true;
        for update in updates {
            if let AttributeUpdate::ComponentActive(value) = update {
                dodge_pressed |= vehicle.apply_component_active(kind, *value);
            }
        }
    }

    if dodge_pressed {
        for update in updates {
            if let AttributeUpdate::DodgeTorque(torque) = update {
                vehicle.apply_dodge_torque(torque.y);
            }
        }
    }

    matched
}

/// Pull frames one at a time and append every sample pair to `sink`.
/// Stops at the first stream error; a pair is only written once fully encoded.
pub async fn parse_replay<S, W>(
    frames: S,
    player1_team: Team,
    sink: &SampleSink<W>,
) -> Result<ParseSummary, ParseError>
where
    S: Stream<Item = Result<Frame, ParseError>>,
    W: AsyncWrite + Unpin + Send,
{
    let mut frames = pin!(frames);
    let mut parser = ReplayParser::new(player1_team);

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        if let Some(pair) = parser.process_frame(&frame) {
            sink.write_pair(&pair).await?;
        }
    }

    let summary = parser.summary();
    if summary.recording_started {
        info!(
            frames = summary.frames,
            samples = summary.samples,
            "Replay parsed"
        );
    } else {
        warn!(
            frames = summary.frames,
            "Stream ended without recording anything, no match start detected"
        );
    }

    Ok(summary)
}
