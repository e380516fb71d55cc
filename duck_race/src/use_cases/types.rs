// Use-case level inputs/outputs for the race loop.

use super::progression::RaceProgress;
use super::render::DrawCommand;
use crate::domain::PlayerKind;

#[derive(Debug, Clone)]
pub enum RaceEvent {
    /// Player tap, already mapped to simulation space.
    Pointer { x: f64, y: f64 },
    /// New strength for the player's next splash.
    SplashStrength { value: f64 },
    /// Host is going away; stop requesting frames.
    Stop,
}

/// What a player tap ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    RemovedObstacle,
    Splashed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RaceOutcome {
    /// A duck crossed the finish line.
    Won { name: String, kind: PlayerKind },
    /// The human was knocked out; `reason` is shown instead of a winner.
    HumanLost { reason: String },
}

impl RaceOutcome {
    /// Name reported to the shell: the winner, or the loss message.
    pub fn winner_name(&self) -> &str {
        match self {
            RaceOutcome::Won { name, .. } => name,
            RaceOutcome::HumanLost { reason } => reason,
        }
    }

    pub fn human_won(&self) -> bool {
        matches!(self, RaceOutcome::Won { kind: PlayerKind::Human, .. })
    }
}

#[derive(Debug, Clone)]
pub enum RaceState {
    Waiting,
    Running,
    Finished { winner: String, progress: RaceProgress },
    /// Ended without a result (host stop or shutdown).
    Stopped,
}

#[derive(Debug, Clone)]
pub struct FrameUpdate {
    pub tick: u64,
    pub commands: Vec<DrawCommand>,
}
