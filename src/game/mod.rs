//! Game Rules Module
//!
//! Board setup and every rule of play. Pure and deterministic: each function
//! maps immutable inputs to new values.
//!
//! ## Module Structure
//!
//! - `state`: Game state, pieces, players, ids
//! - `board`: Configuration table and initial-state construction
//! - `movement`: Reachability and legal moves
//! - `combat`: Attack/defense scoring
//! - `push`: Push-chain detection and resolution
//! - `victory`: Win conditions and player elimination
//! - `turn`: Turn order, rounds, starvation
//! - `engine`: `apply_move` / `pass_turn`, the only state transitions
//! - `events`: Per-move event log

pub mod state;
pub mod board;
pub mod movement;
pub mod combat;
pub mod push;
pub mod victory;
pub mod turn;
pub mod engine;
pub mod events;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export key types
pub use state::{GameConfig, GameId, GamePhase, GameState, Piece, PieceId, PieceType, Player, PlayerId, WinCondition};
pub use board::{create_initial_state, start_game, SetupError, SetupOptions};
pub use movement::{get_valid_moves, get_all_valid_moves, get_all_legal_commands, has_legal_moves, MoveCommand, MoveType, ValidMove};
pub use combat::{CombatOutcome, CombatResult};
pub use push::{ChainTerminator, InvariantViolation};
pub use engine::{apply_move, pass_turn, MoveError, MoveOutcome};
pub use events::{GameEvent, GameEventData};
