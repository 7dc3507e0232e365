//! Game Records
//!
//! Everything needed to re-run a game and prove it reached the same result:
//! the initial state, every accepted command in order, and state-hash
//! checkpoints along the way.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::hash::StateHash;
use crate::game::engine::{apply_move, pass_turn, MoveError, MoveOutcome};
use crate::game::movement::MoveCommand;
use crate::game::state::{GameState, PlayerId, WinCondition};
use crate::CHECKPOINT_INTERVAL;

/// Current record format version.
pub const RECORD_VERSION: u8 = 1;

/// One accepted command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordedCommand {
    /// A move through `apply_move`
    Move {
        /// Mover
        player_id: PlayerId,
        /// What was played
        command: MoveCommand,
    },
    /// A forced pass through `pass_turn`
    Pass {
        /// Passing player
        player_id: PlayerId,
    },
}

/// State hash after a number of applied commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Commands applied so far
    pub command_index: u32,
    /// Turn number at this point
    pub turn_number: u32,
    /// Hash of the state
    pub state_hash: StateHash,
}

/// How the recorded game finished (or where recording stopped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResult {
    /// Turn number of the final state
    pub final_turn: u32,
    /// Winner, if the game ended
    pub winner_id: Option<PlayerId>,
    /// How the winner won
    pub win_condition: Option<WinCondition>,
    /// Hash of the final state
    pub final_state_hash: StateHash,
}

/// Complete record of a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Format version
    pub version: u8,
    /// State before the first command (already `Playing`)
    pub initial_state: GameState,
    /// Hash of `initial_state`
    pub initial_hash: StateHash,
    /// Accepted commands, in order
    pub commands: Vec<RecordedCommand>,
    /// Checkpoints every [`CHECKPOINT_INTERVAL`] commands
    pub checkpoints: Vec<Checkpoint>,
    /// Set once the record is finalized
    pub result: Option<RecordResult>,
}

/// Record encoding and decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// Encoding failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Decoding failed.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Record written by another format version.
    #[error("record version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Version in the record
        got: u8,
    },
}

impl GameRecord {
    /// Start a record from the state before the first command.
    pub fn new(initial_state: GameState) -> Self {
        let initial_hash = initial_state.compute_hash();
        Self {
            version: RECORD_VERSION,
            initial_state,
            initial_hash,
            commands: Vec::new(),
            checkpoints: Vec::new(),
            result: None,
        }
    }

    /// Record a state checkpoint.
    pub fn add_checkpoint(&mut self, command_index: u32, state: &GameState) {
        self.checkpoints.push(Checkpoint {
            command_index,
            turn_number: state.turn_number,
            state_hash: state.compute_hash(),
        });
    }

    /// Close the record with the final state.
    pub fn finalize(&mut self, final_state: &GameState) {
        self.result = Some(RecordResult {
            final_turn: final_state.turn_number,
            winner_id: final_state.winner_id,
            win_condition: final_state.win_condition,
            final_state_hash: final_state.compute_hash(),
        });
    }

    /// Has the record been finalized?
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        serde_json::to_string(self).map_err(|e| ReplayError::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let record: Self =
            serde_json::from_str(json).map_err(|e| ReplayError::Deserialization(e.to_string()))?;
        record.check_version()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        bincode::serialize(self).map_err(|e| ReplayError::Serialization(e.to_string()))
    }

    /// Decode from bincode.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        let record: Self =
            bincode::deserialize(data).map_err(|e| ReplayError::Deserialization(e.to_string()))?;
        record.check_version()
    }

    fn check_version(self) -> Result<Self, ReplayError> {
        if self.version != RECORD_VERSION {
            return Err(ReplayError::VersionMismatch { expected: RECORD_VERSION, got: self.version });
        }
        Ok(self)
    }
}

/// Plays commands through the engine and records the accepted ones.
#[derive(Clone, Debug)]
pub struct GameRecorder {
    record: GameRecord,
    state: GameState,
}

impl GameRecorder {
    /// Start recording from `initial_state`.
    pub fn new(initial_state: GameState) -> Self {
        Self {
            record: GameRecord::new(initial_state.clone()),
            state: initial_state,
        }
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply and record a move. Rejected moves are not recorded.
    pub fn play_move(&mut self, player_id: PlayerId, command: MoveCommand) -> Result<MoveOutcome, MoveError> {
        let outcome = apply_move(&self.state, player_id, &command)?;
        self.accept(RecordedCommand::Move { player_id, command }, &outcome);
        Ok(outcome)
    }

    /// Apply and record a forced pass.
    pub fn pass(&mut self, player_id: PlayerId) -> Result<MoveOutcome, MoveError> {
        let outcome = pass_turn(&self.state, player_id)?;
        self.accept(RecordedCommand::Pass { player_id }, &outcome);
        Ok(outcome)
    }

    fn accept(&mut self, command: RecordedCommand, outcome: &MoveOutcome) {
        self.state = outcome.new_state.clone();
        self.record.commands.push(command);

        let applied = self.record.commands.len() as u32;
        if applied % CHECKPOINT_INTERVAL == 0 {
            self.record.add_checkpoint(applied, &self.state);
        }
    }

    /// Finalize and return the record.
    pub fn finish(mut self) -> GameRecord {
        self.record.finalize(&self.state);
        debug!(
            "Recorded {} commands, {} checkpoints",
            self.record.commands.len(),
            self.record.checkpoints.len()
        );
        self.record
    }
}
