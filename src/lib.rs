//! # Jarls Rules Engine
//!
//! Deterministic rules engine for Jarls, a hex-grid push strategy game for
//! two to six players.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       JARLS ENGINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── hex.rs      - Axial/cube hex math, lines, rings, keys   │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Rules (pure functions)                    │
//! │  ├── state.rs    - Game state, pieces, players               │
//! │  ├── board.rs    - Setup: starts, warriors, shields          │
//! │  ├── movement.rs - Reachability and legal moves              │
//! │  ├── combat.rs   - Attack/defense scoring                    │
//! │  ├── push.rs     - Push-chain detection and resolution       │
//! │  ├── victory.rs  - Throne / last-standing, elimination       │
//! │  ├── turn.rs     - Turn order, rounds, starvation            │
//! │  └── engine.rs   - apply_move orchestrator                   │
//! │                                                              │
//! │  replay/         - Game records and verification             │
//! │  ├── transcript.rs - Recorded commands and checkpoints       │
//! │  └── verify.rs     - Deterministic re-execution              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **fully deterministic**:
//! - No HashMap (pieces are kept sorted by id, sets are BTreeSet)
//! - No system time, no randomness
//! - Floating point only inside hex rounding, with fixed inputs
//!
//! The same `(state, command)` always yields a bit-identical result, which is
//! what lets [`replay`] check a game by re-running it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod replay;

// Re-export commonly used types
pub use core::hex::{AxialCoord, HexDirection, CENTER};
pub use game::board::{create_initial_state, start_game, SetupOptions};
pub use game::engine::{apply_move, pass_turn, MoveError, MoveOutcome};
pub use game::movement::{get_valid_moves, MoveCommand};
pub use game::state::{GameState, PieceId, PlayerId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fewest players at a table
pub const MIN_PLAYERS: usize = 2;

/// Most players at a table
pub const MAX_PLAYERS: usize = 6;

/// Smallest board that has an interior ring for shields
pub const MIN_BOARD_RADIUS: i32 = 2;

/// Shield layouts tried before setup gives up
pub const MAX_SHIELD_ATTEMPTS: u32 = 12;

/// Rounds without an elimination before the first starvation trigger
pub const STARVATION_INITIAL_ROUNDS: u32 = 10;

/// Rounds between later starvation triggers
pub const STARVATION_INTERVAL_ROUNDS: u32 = 5;

/// Turns between state-hash checkpoints in a game record
pub const CHECKPOINT_INTERVAL: u32 = 10;

/// Domain tag for game-state hashes
pub const STATE_HASH_DOMAIN: &[u8] = b"JARLS_STATE_V1";
