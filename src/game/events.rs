//! Game Events
//!
//! Ordered log produced by every applied move. Renderers sequence animations
//! from it; servers broadcast it alongside the new state.

use serde::{Serialize, Deserialize};
use crate::core::hex::{AxialCoord, HexDirection};
use crate::game::state::{PieceId, PieceType, PlayerId, WinCondition};

/// Why a piece left the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationCause {
    /// Pushed off the edge of the board.
    Edge,
    /// Removed because its owner lost their Jarl.
    OwnerEliminated,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEventData {
    /// A piece moved under its owner's control
    Move {
        /// Piece that moved
        piece_id: PieceId,
        /// Its owner
        player_id: PlayerId,
        /// Starting hex
        from: AxialCoord,
        /// Landing hex
        to: AxialCoord,
        /// Two-hex move
        has_momentum: bool,
    },

    /// A piece was shoved one hex by a push
    Push {
        /// Piece that was shoved
        piece_id: PieceId,
        /// Hex before the push
        from: AxialCoord,
        /// Hex after the push (may be off the board)
        to: AxialCoord,
        /// Push direction
        direction: HexDirection,
        /// Position in the chain, 0 = the defender
        depth: u32,
    },

    /// A piece left the board
    Eliminated {
        /// Removed piece
        piece_id: PieceId,
        /// Its owner, `None` for obstacles
        player_id: Option<PlayerId>,
        /// Kind of piece removed
        piece_type: PieceType,
        /// Last hex it occupied
        position: AxialCoord,
        /// Edge push or owner's defeat
        cause: EliminationCause,
    },

    /// A player lost their Jarl and is out
    PlayerEliminated {
        /// Player who is out
        player_id: PlayerId,
    },

    /// Control passed to the next player
    TurnEnded {
        /// Player whose turn ended
        player_id: PlayerId,
        /// Player to move next
        next_player_id: PlayerId,
        /// New turn number
        turn_number: u32,
        /// Forced pass with no legal move
        passed: bool,
    },

    /// Every active player has moved this round
    RoundEnded {
        /// Round that just finished
        round_number: u32,
        /// First player of the next round
        next_first_player_id: PlayerId,
    },

    /// Too long without an elimination
    StarvationTriggered {
        /// Completed rounds since the last elimination
        rounds_since_elimination: u32,
        /// First trigger at 10 rounds, else a recurring one
        is_initial: bool,
    },

    /// Game over
    GameEnded {
        /// Winning player
        winner_id: PlayerId,
        /// How they won
        win_condition: WinCondition,
    },
}

/// A game event stamped with the turn it happened on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Turn number when the event occurred
    pub turn_number: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(turn_number: u32, data: GameEventData) -> Self {
        Self { turn_number, data }
    }

    /// Player the event is about, if any.
    pub fn player_id(&self) -> Option<PlayerId> {
        match &self.data {
            GameEventData::Move { player_id, .. } => Some(*player_id),
            GameEventData::Eliminated { player_id, .. } => *player_id,
            GameEventData::PlayerEliminated { player_id } => Some(*player_id),
            GameEventData::TurnEnded { player_id, .. } => Some(*player_id),
            GameEventData::GameEnded { winner_id, .. } => Some(*winner_id),
            GameEventData::Push { .. }
            | GameEventData::RoundEnded { .. }
            | GameEventData::StarvationTriggered { .. } => None,
        }
    }

    /// Create move event.
    pub fn moved(
        turn_number: u32,
        piece_id: PieceId,
        player_id: PlayerId,
        from: AxialCoord,
        to: AxialCoord,
        has_momentum: bool,
    ) -> Self {
        Self::new(
            turn_number,
            GameEventData::Move { piece_id, player_id, from, to, has_momentum },
        )
    }

    /// Create push event.
    pub fn pushed(
        turn_number: u32,
        piece_id: PieceId,
        from: AxialCoord,
        direction: HexDirection,
        depth: u32,
    ) -> Self {
        Self::new(
            turn_number,
            GameEventData::Push {
                piece_id,
                from,
                to: from.neighbor(direction),
                direction,
                depth,
            },
        )
    }

    /// Create piece eliminated event.
    pub fn eliminated(
        turn_number: u32,
        piece_id: PieceId,
        player_id: Option<PlayerId>,
        piece_type: PieceType,
        position: AxialCoord,
        cause: EliminationCause,
    ) -> Self {
        Self::new(
            turn_number,
            GameEventData::Eliminated { piece_id, player_id, piece_type, position, cause },
        )
    }

    /// Create player eliminated event.
    pub fn player_eliminated(turn_number: u32, player_id: PlayerId) -> Self {
        Self::new(turn_number, GameEventData::PlayerEliminated { player_id })
    }

    /// Create game ended event.
    pub fn game_ended(turn_number: u32, winner_id: PlayerId, win_condition: WinCondition) -> Self {
        Self::new(turn_number, GameEventData::GameEnded { winner_id, win_condition })
    }

    /// Is this a piece elimination?
    pub fn is_elimination(&self) -> bool {
        matches!(self.data, GameEventData::Eliminated { .. })
    }
}
