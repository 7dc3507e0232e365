//! Verification API
//!
//! Verify a recorded game by deterministic replay: re-run every command from
//! the initial state and compare each checkpoint and the final hash.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::game::engine::{apply_move, pass_turn, MoveError};
use crate::game::state::GameState;
use crate::replay::transcript::{GameRecord, RecordedCommand};

/// Verification result.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Expected final hash (from the record).
    pub expected_final_hash: StateHash,

    /// Checkpoint verification results.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// Detailed error if verification failed.
    pub error: Option<VerificationError>,
}

/// Result of verifying a single checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointResult {
    /// Commands applied at this checkpoint
    pub command_index: u32,
    /// Expected hash from the record
    pub expected: StateHash,
    /// Computed hash from replay
    pub computed: StateHash,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Why a record failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Record was never finalized.
    #[error("record is incomplete")]
    IncompleteRecord,

    /// Initial state does not hash to the recorded value.
    #[error("initial state hash mismatch")]
    InitialStateMismatch {
        /// Expected hash
        expected: StateHash,
        /// Computed hash
        computed: StateHash,
    },

    /// A recorded command was rejected on replay.
    #[error("command {index} rejected on replay: {error}")]
    CommandRejected {
        /// Zero-based command index
        index: usize,
        /// Engine error
        error: MoveError,
    },

    /// Checkpoint hash mismatch.
    #[error("checkpoint mismatch after {command_index} commands")]
    CheckpointMismatch {
        /// Commands applied at the checkpoint
        command_index: u32,
        /// Expected hash
        expected: StateHash,
        /// Computed hash
        computed: StateHash,
    },

    /// Final state hash mismatch.
    #[error("final state hash mismatch")]
    FinalStateMismatch {
        /// Expected hash
        expected: StateHash,
        /// Computed hash
        computed: StateHash,
    },

    /// Hashes agree but the recorded winner does not.
    #[error("recorded result does not match replay")]
    ResultMismatch,
}

impl VerificationResult {
    fn failed(
        computed: StateHash,
        expected: StateHash,
        checkpoint_results: Vec<CheckpointResult>,
        error: VerificationError,
    ) -> Self {
        warn!("Replay verification failed: {}", error);
        Self {
            valid: false,
            computed_final_hash: computed,
            expected_final_hash: expected,
            checkpoint_results,
            error: Some(error),
        }
    }
}

/// Re-run a record from its initial state.
///
/// Stops at the first rejected command. Does not check hashes.
pub fn replay_commands(record: &GameRecord) -> Result<GameState, VerificationError> {
    let mut state = record.initial_state.clone();
    for (index, command) in record.commands.iter().enumerate() {
        state = apply_recorded(&state, command)
            .map_err(|error| VerificationError::CommandRejected { index, error })?;
    }
    Ok(state)
}

fn apply_recorded(state: &GameState, command: &RecordedCommand) -> Result<GameState, MoveError> {
    let outcome = match command {
        RecordedCommand::Move { player_id, command } => apply_move(state, *player_id, command)?,
        RecordedCommand::Pass { player_id } => pass_turn(state, *player_id)?,
    };
    Ok(outcome.new_state)
}

/// Verify a game record by full replay.
///
/// This is the authoritative verification method.
pub fn replay_game(record: &GameRecord) -> VerificationResult {
    let Some(result) = &record.result else {
        return VerificationResult::failed([0; 32], [0; 32], Vec::new(), VerificationError::IncompleteRecord);
    };

    let mut state = record.initial_state.clone();
    let initial_hash = state.compute_hash();
    if initial_hash != record.initial_hash {
        return VerificationResult::failed(
            initial_hash,
            record.initial_hash,
            Vec::new(),
            VerificationError::InitialStateMismatch { expected: record.initial_hash, computed: initial_hash },
        );
    }

    let mut checkpoint_results = Vec::new();
    let mut checkpoints = record.checkpoints.iter().peekable();

    for (index, command) in record.commands.iter().enumerate() {
        state = match apply_recorded(&state, command) {
            Ok(next) => next,
            Err(error) => {
                return VerificationResult::failed(
                    state.compute_hash(),
                    result.final_state_hash,
                    checkpoint_results,
                    VerificationError::CommandRejected { index, error },
                );
            }
        };

        let applied = index as u32 + 1;
        while let Some(checkpoint) = checkpoints.next_if(|c| c.command_index == applied) {
            let computed = state.compute_hash();
            let valid = computed == checkpoint.state_hash;
            checkpoint_results.push(CheckpointResult {
                command_index: applied,
                expected: checkpoint.state_hash,
                computed,
                valid,
            });

            if !valid {
                return VerificationResult::failed(
                    computed,
                    checkpoint.state_hash,
                    checkpoint_results,
                    VerificationError::CheckpointMismatch {
                        command_index: applied,
                        expected: checkpoint.state_hash,
                        computed,
                    },
                );
            }
        }
    }

    let final_hash = state.compute_hash();
    if final_hash != result.final_state_hash {
        return VerificationResult::failed(
            final_hash,
            result.final_state_hash,
            checkpoint_results,
            VerificationError::FinalStateMismatch { expected: result.final_state_hash, computed: final_hash },
        );
    }
    if state.winner_id != result.winner_id || state.win_condition != result.win_condition {
        return VerificationResult::failed(
            final_hash,
            result.final_state_hash,
            checkpoint_results,
            VerificationError::ResultMismatch,
        );
    }

    debug!("Replay verified: {} commands, final hash {}", record.commands.len(), hex::encode(final_hash));
    VerificationResult {
        valid: true,
        computed_final_hash: final_hash,
        expected_final_hash: result.final_state_hash,
        checkpoint_results,
        error: None,
    }
}
