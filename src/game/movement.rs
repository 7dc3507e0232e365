//! Move Validation & Reachability
//!
//! Enumerates where a piece may go this turn.
//!
//! Every piece walks straight lines, up to two hexes per direction:
//! - Warriors may always try two hexes. They may pass over an empty throne
//!   but never land on it.
//! - Jarls may try two hexes only in a direction backed by a draft formation
//!   (two friendly pieces directly behind). A Jarl's walk stops on the throne.
//! - Obstacles, friendly pieces and the board edge end the walk.
//! - An enemy piece ends the walk and is an attack destination.

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::hex::{is_on_board, AxialCoord, HexDirection, CENTER};
use crate::game::combat::{calculate_combat, CombatResult};
use crate::game::state::{GameState, Piece, PieceId, PieceType, PlayerId};

/// Plain move or attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveType {
    /// Onto an empty hex
    Move,
    /// Into an enemy piece
    Attack,
}

/// A move request from a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand {
    /// Piece to move
    pub piece_id: PieceId,
    /// Target hex
    pub destination: AxialCoord,
}

impl MoveCommand {
    /// Create a new command.
    pub fn new(piece_id: PieceId, destination: AxialCoord) -> Self {
        Self { piece_id, destination }
    }
}

/// A hex a piece can reach, before combat is considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachableHex {
    /// Target hex
    pub destination: AxialCoord,
    /// Direction of travel
    pub direction: HexDirection,
    /// Hexes travelled (1 or 2)
    pub distance: i32,
    /// Move or attack
    pub move_type: MoveType,
    /// Two-hex move
    pub has_momentum: bool,
}

/// A legal move, with a combat preview for attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidMove {
    /// Piece that moves
    pub piece_id: PieceId,
    /// Target hex
    pub destination: AxialCoord,
    /// Direction of travel
    pub direction: HexDirection,
    /// Move or attack
    pub move_type: MoveType,
    /// Two-hex move
    pub has_momentum: bool,
    /// Attack preview (attacks only)
    pub combat: Option<CombatResult>,
}

impl ValidMove {
    /// Command that plays this move.
    pub fn command(&self) -> MoveCommand {
        MoveCommand::new(self.piece_id, self.destination)
    }
}

/// Does `jarl` have two friendly pieces directly behind it, opposite `direction`?
pub fn has_draft_formation(state: &GameState, jarl: &Piece, direction: HexDirection) -> bool {
    let Some(owner) = jarl.player_id else {
        return false;
    };
    let back = direction.opposite();
    (1..=2).all(|steps| {
        state
            .piece_at(jarl.position.step(back, steps))
            .is_some_and(|p| p.is_friendly_to(owner))
    })
}

/// Hexes `piece_id` could move to or attack, in direction order.
///
/// Empty for unknown pieces and obstacles.
pub fn get_reachable_hexes(state: &GameState, piece_id: PieceId) -> Vec<ReachableHex> {
    let Some(piece) = state.piece(piece_id) else {
        return Vec::new();
    };
    let Some(owner) = piece.player_id else {
        return Vec::new();
    };
    if piece.is_obstacle() {
        return Vec::new();
    }

    let radius = state.radius();
    let mut reachable = Vec::new();

    for direction in HexDirection::ALL {
        let max_steps = match piece.piece_type {
            PieceType::Jarl if has_draft_formation(state, piece, direction) => 2,
            PieceType::Jarl => 1,
            _ => 2,
        };

        for distance in 1..=max_steps {
            let hex = piece.position.step(direction, distance);
            if !is_on_board(hex, radius) {
                break;
            }

            let reach = |move_type| ReachableHex {
                destination: hex,
                direction,
                distance,
                move_type,
                has_momentum: distance == 2,
            };

            match state.piece_at(hex) {
                Some(other) if other.is_enemy_of(owner) => {
                    if !(piece.is_warrior() && hex == CENTER) {
                        reachable.push(reach(MoveType::Attack));
                    }
                    break;
                }
                // Obstacle or friendly piece
                Some(_) => break,
                None if hex == CENTER => {
                    if piece.is_jarl() {
                        reachable.push(reach(MoveType::Move));
                        break;
                    }
                    // Warriors pass over the throne
                }
                None => reachable.push(reach(MoveType::Move)),
            }
        }
    }

    trace!("{} at {} reaches {} hexes", piece_id, piece.position, reachable.len());
    reachable
}

/// Legal moves for `piece_id`: reachable hexes with combat previews, minus
/// attacks that would be blocked.
///
/// The preview relocates the attacker to the hex just before the defender, so
/// its vacated origin never counts as its own support.
pub fn get_valid_moves(state: &GameState, piece_id: PieceId) -> Vec<ValidMove> {
    let Some(piece) = state.piece(piece_id) else {
        return Vec::new();
    };

    get_reachable_hexes(state, piece_id)
        .into_iter()
        .filter_map(|reach| {
            let combat = match reach.move_type {
                MoveType::Move => None,
                MoveType::Attack => {
                    let defender = state.piece_at(reach.destination)?;
                    let strike_from = reach.destination.neighbor(reach.direction.opposite());
                    let result = calculate_combat(
                        state,
                        piece,
                        strike_from,
                        defender,
                        reach.destination,
                        reach.direction,
                        reach.has_momentum,
                    );
                    if !result.is_push() {
                        return None;
                    }
                    Some(result)
                }
            };

            Some(ValidMove {
                piece_id,
                destination: reach.destination,
                direction: reach.direction,
                move_type: reach.move_type,
                has_momentum: reach.has_momentum,
                combat,
            })
        })
        .collect()
}

/// Every legal move for `player_id`, pieces in id order.
pub fn get_all_valid_moves(state: &GameState, player_id: PlayerId) -> Vec<ValidMove> {
    state
        .pieces_of(player_id)
        .flat_map(|piece| get_valid_moves(state, piece.id))
        .collect()
}

/// Every command `apply_move` accepts from `player_id`, including attacks
/// that would be blocked.
pub fn get_all_legal_commands(state: &GameState, player_id: PlayerId) -> Vec<MoveCommand> {
    state
        .pieces_of(player_id)
        .flat_map(|piece| {
            get_reachable_hexes(state, piece.id)
                .into_iter()
                .map(move |reach| MoveCommand::new(piece.id, reach.destination))
        })
        .collect()
}

/// Does any piece of `player_id` reach at least one hex? A forced pass is
/// allowed only when not.
///
/// A blocked attack still counts: the player must play it.
pub fn has_legal_moves(state: &GameState, player_id: PlayerId) -> bool {
    state
        .pieces_of(player_id)
        .any(|piece| !get_reachable_hexes(state, piece.id).is_empty())
}
