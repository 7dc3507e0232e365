//! Game State Definitions
//!
//! All state types for a game of Jarls.
//! Pieces are kept sorted by id and players in seating order, so every
//! iteration over the state is deterministic.

use std::collections::BTreeSet;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hex::{AxialCoord, CENTER};
use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::movement::MoveType;

// =============================================================================
// IDS
// =============================================================================

/// Unique game identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GameId(pub [u8; 16]);

impl GameId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id, for hosts that allocate games.
    pub fn new_random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// Player identifier. Assigned by seat, starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// Piece identifier. Assigned sequentially during setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "piece-{}", self.0)
    }
}

// =============================================================================
// PIECES
// =============================================================================

/// Kind of piece on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceType {
    /// The player's king. Losing it loses the game; seating it on the throne wins.
    Jarl = 0,
    /// Rank-and-file piece.
    Warrior = 1,
    /// Neutral, immovable shield.
    Obstacle = 2,
}

impl PieceType {
    /// Combat strength.
    #[inline]
    pub fn strength(self) -> u32 {
        match self {
            PieceType::Jarl => 2,
            PieceType::Warrior => 1,
            PieceType::Obstacle => 0,
        }
    }
}

/// A piece on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Unique piece id
    pub id: PieceId,
    /// Jarl, warrior or obstacle
    pub piece_type: PieceType,
    /// Owner (`None` for obstacles)
    pub player_id: Option<PlayerId>,
    /// Current hex
    pub position: AxialCoord,
}

impl Piece {
    /// Create a new piece.
    pub fn new(id: PieceId, piece_type: PieceType, player_id: Option<PlayerId>, position: AxialCoord) -> Self {
        Self { id, piece_type, player_id, position }
    }

    /// Is this a Jarl?
    #[inline]
    pub fn is_jarl(&self) -> bool {
        self.piece_type == PieceType::Jarl
    }

    /// Is this a warrior?
    #[inline]
    pub fn is_warrior(&self) -> bool {
        self.piece_type == PieceType::Warrior
    }

    /// Is this an obstacle?
    #[inline]
    pub fn is_obstacle(&self) -> bool {
        self.piece_type == PieceType::Obstacle
    }

    /// Is this a non-obstacle piece owned by `player`?
    #[inline]
    pub fn is_friendly_to(&self, player: PlayerId) -> bool {
        !self.is_obstacle() && self.player_id == Some(player)
    }

    /// Is this a non-obstacle piece owned by someone other than `player`?
    #[inline]
    pub fn is_enemy_of(&self, player: PlayerId) -> bool {
        !self.is_obstacle() && self.player_id.is_some_and(|owner| owner != player)
    }

    /// Combat strength.
    #[inline]
    pub fn strength(&self) -> u32 {
        self.piece_type.strength()
    }
}

// =============================================================================
// PLAYERS / CONFIG
// =============================================================================

/// A seated player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player id
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Display color (CSS hex)
    pub color: String,
    /// Out of the game?
    pub is_eliminated: bool,
}

/// Board and army sizes for one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of seated players (2-6)
    pub player_count: usize,
    /// Hexes from the throne to the edge
    pub board_radius: i32,
    /// Warriors per player
    pub warrior_count: usize,
    /// Neutral obstacles on the board
    pub obstacle_count: usize,
    /// Turn timer for hosts that enforce one
    pub turn_timer_ms: Option<u64>,
}

// =============================================================================
// PHASE / RESULT / HISTORY
// =============================================================================

/// Lifecycle phase of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Board built, waiting to start
    #[default]
    Setup,
    /// Moves are being played
    Playing,
    /// A winner has been decided
    Ended,
}

/// How a game was won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinCondition {
    /// A Jarl walked onto the throne.
    Throne,
    /// Only one Jarl remains.
    LastStanding,
}

/// One applied move, as kept in `GameState::move_history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistoryEntry {
    /// Turn the move was played on
    pub turn_number: u32,
    /// Round the move was played in
    pub round_number: u32,
    /// Mover
    pub player_id: PlayerId,
    /// Piece that was moved
    pub piece_id: PieceId,
    /// Where the piece started
    pub from: AxialCoord,
    /// Where the piece ended up (unchanged on compression)
    pub to: AxialCoord,
    /// Plain move or attack
    pub move_type: MoveType,
    /// Two-hex move
    pub has_momentum: bool,
    /// Pieces displaced by the push, nearest first
    pub pushed: Vec<PieceId>,
    /// Pieces removed from the board
    pub eliminated: Vec<PieceId>,
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of a game.
///
/// Treated as an immutable value: the engine returns new states and never
/// edits one it was handed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Game identifier
    pub id: GameId,
    /// Lifecycle phase
    pub phase: GamePhase,
    /// Board configuration
    pub config: GameConfig,
    /// Players in seating order
    pub players: Vec<Player>,
    /// All pieces, sorted by id
    pub pieces: Vec<Piece>,
    /// Whose turn it is
    pub current_player_id: PlayerId,
    /// Moves played so far
    pub turn_number: u32,
    /// Current round (starts at 1)
    pub round_number: u32,
    /// Index into the active-player list of this round's first player
    pub first_player_index: usize,
    /// Completed rounds since a piece was last eliminated
    pub rounds_since_elimination: u32,
    /// Winner once ended
    pub winner_id: Option<PlayerId>,
    /// How the winner won
    pub win_condition: Option<WinCondition>,
    /// Every applied move
    pub move_history: Vec<MoveHistoryEntry>,
}

impl GameState {
    /// Assemble a fresh `Setup` state. Pieces are sorted by id.
    pub(crate) fn new(id: GameId, config: GameConfig, players: Vec<Player>, mut pieces: Vec<Piece>) -> Self {
        pieces.sort_by_key(|p| p.id);
        let current_player_id = players.first().map(|p| p.id).unwrap_or(PlayerId(1));
        Self {
            id,
            phase: GamePhase::Setup,
            config,
            players,
            pieces,
            current_player_id,
            turn_number: 0,
            round_number: 1,
            first_player_index: 0,
            rounds_since_elimination: 0,
            winner_id: None,
            win_condition: None,
            move_history: Vec::new(),
        }
    }

    /// Board radius.
    #[inline]
    pub fn radius(&self) -> i32 {
        self.config.board_radius
    }

    /// Get a piece by id.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|index| &self.pieces[index])
    }

    /// Get a piece mutably by id.
    pub(crate) fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        match self.pieces.binary_search_by_key(&id, |p| p.id) {
            Ok(index) => Some(&mut self.pieces[index]),
            Err(_) => None,
        }
    }

    /// Remove a piece, returning it.
    pub(crate) fn remove_piece(&mut self, id: PieceId) -> Option<Piece> {
        match self.pieces.binary_search_by_key(&id, |p| p.id) {
            Ok(index) => Some(self.pieces.remove(index)),
            Err(_) => None,
        }
    }

    /// Piece standing on `position`, if any.
    pub fn piece_at(&self, position: AxialCoord) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.position == position)
    }

    /// Is `position` occupied by any piece (obstacles included)?
    #[inline]
    pub fn is_occupied(&self, position: AxialCoord) -> bool {
        self.piece_at(position).is_some()
    }

    /// Pieces owned by `player`.
    pub fn pieces_of(&self, player: PlayerId) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(move |p| p.player_id == Some(player))
    }

    /// The Jarl of `player`, if still on the board.
    pub fn jarl_of(&self, player: PlayerId) -> Option<&Piece> {
        self.pieces_of(player).find(|p| p.is_jarl())
    }

    /// Every Jarl still on the board.
    pub fn jarls(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.is_jarl())
    }

    /// Obstacle positions.
    pub fn obstacle_positions(&self) -> BTreeSet<AxialCoord> {
        self.pieces
            .iter()
            .filter(|p| p.is_obstacle())
            .map(|p| p.position)
            .collect()
    }

    /// Get a player by id.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Get a player mutably by id.
    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Non-eliminated players in seating order.
    pub fn active_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| !p.is_eliminated)
            .map(|p| p.id)
            .collect()
    }

    /// Is the throne empty?
    #[inline]
    pub fn is_throne_empty(&self) -> bool {
        !self.is_occupied(CENTER)
    }

    /// Is the game over?
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.phase == GamePhase::Ended
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.turn_number, self.round_number, |hasher| {
            hasher.update_uuid(&self.id.0);
            hasher.update_u8(self.phase as u8);
            hasher.update_u32(self.config.player_count as u32);
            hasher.update_i32(self.config.board_radius);
            hasher.update_u32(self.config.warrior_count as u32);
            hasher.update_u32(self.config.obstacle_count as u32);
            match self.config.turn_timer_ms {
                Some(ms) => {
                    hasher.update_bool(true);
                    hasher.update_u64(ms);
                }
                None => hasher.update_bool(false),
            }

            for player in &self.players {
                hasher.update_u8(player.id.0);
                hasher.update_str(&player.name);
                hasher.update_str(&player.color);
                hasher.update_bool(player.is_eliminated);
            }

            // Pieces are sorted by id
            for piece in &self.pieces {
                hasher.update_u32(piece.id.0);
                hasher.update_u8(piece.piece_type as u8);
                hasher.update_opt_u8(piece.player_id.map(|p| p.0));
                hasher.update_coord(piece.position);
            }

            hasher.update_u8(self.current_player_id.0);
            hasher.update_u32(self.first_player_index as u32);
            hasher.update_u32(self.rounds_since_elimination);
            hasher.update_opt_u8(self.winner_id.map(|p| p.0));
            hasher.update_opt_u8(self.win_condition.map(|w| w as u8));

            hasher.update_u32(self.move_history.len() as u32);
            for entry in &self.move_history {
                hasher.update_u32(entry.turn_number);
                hasher.update_u32(entry.round_number);
                hasher.update_u8(entry.player_id.0);
                hasher.update_u32(entry.piece_id.0);
                hasher.update_coord(entry.from);
                hasher.update_coord(entry.to);
                hasher.update_u8(entry.move_type as u8);
                hasher.update_bool(entry.has_momentum);
                hasher.update_u32(entry.pushed.len() as u32);
                for id in &entry.pushed {
                    hasher.update_u32(id.0);
                }
                hasher.update_u32(entry.eliminated.len() as u32);
                for id in &entry.eliminated {
                    hasher.update_u32(id.0);
                }
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
