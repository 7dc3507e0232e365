//! Replay Module
//!
//! Game records and verification by deterministic re-execution.
//!
//! ## Flow
//!
//! 1. Play through a [`GameRecorder`], which records every accepted command
//!    and checkpoints the state hash every few commands
//! 2. Store the finished [`GameRecord`] as JSON or bincode
//! 3. [`replay_game`] re-runs it and checks every hash

pub mod transcript;
pub mod verify;

pub use transcript::{GameRecord, GameRecorder, RecordedCommand, ReplayError, RECORD_VERSION};
pub use verify::{replay_commands, replay_game, VerificationError, VerificationResult};
