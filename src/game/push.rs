//! Push Chains
//!
//! When an attack wins, the defender and every piece packed in line behind
//! it move together. What happens depends on what ends the chain:
//!
//! | Terminator | Result                                              |
//! |------------|-----------------------------------------------------|
//! | Empty      | Whole chain shifts one hex                          |
//! | Edge       | Farthest piece is eliminated, the rest shift        |
//! | Obstacle   | Compression: nothing moves, attacker stays put      |
//! | Throne     | Compression: a warrior would be pushed onto it      |

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::hex::{is_on_board, AxialCoord, HexDirection, CENTER};
use crate::game::events::{EliminationCause, GameEvent};
use crate::game::state::{GameState, PieceId};

/// What stopped a push chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainTerminator {
    /// An empty hex
    Empty,
    /// The board edge
    Edge,
    /// An obstacle
    Obstacle,
    /// The throne, with a warrior about to be pushed onto it
    Throne,
}

impl ChainTerminator {
    /// Does this terminator compress the chain (nothing moves)?
    #[inline]
    pub fn is_compression(self) -> bool {
        matches!(self, ChainTerminator::Obstacle | ChainTerminator::Throne)
    }
}

/// Pieces that would move together in a push.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResult {
    /// Chained pieces, nearest first
    pub pieces: Vec<PieceId>,
    /// What ended the chain
    pub terminator: ChainTerminator,
    /// Hex of the terminator (off-board for `Edge`)
    pub terminator_position: AxialCoord,
}

/// Result of resolving a push.
#[derive(Clone, Debug)]
pub struct PushResult {
    /// State after the push
    pub new_state: GameState,
    /// Move, Push and Eliminated events in that order
    pub events: Vec<GameEvent>,
    /// Pieces pushed off the board
    pub eliminated_piece_ids: Vec<PieceId>,
}

/// Broken preconditions inside push resolution.
///
/// Unreachable through [`resolve_push`] with a chain from [`detect_chain`];
/// seeing one means a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A referenced piece is not on the board.
    #[error("piece {0} is not on the board")]
    MissingPiece(PieceId),

    /// Resolver called with a chain it does not handle.
    #[error("resolver expected {expected} terminator, got {actual:?}")]
    TerminatorMismatch {
        /// What the resolver handles
        expected: &'static str,
        /// What the chain had
        actual: ChainTerminator,
    },

    /// Push with nothing to push.
    #[error("push chain is empty")]
    EmptyChain,

    /// Attacking piece has no owner.
    #[error("attacker {0} has no owner")]
    UnownedAttacker(PieceId),
}

// =============================================================================
// DETECTION
// =============================================================================

/// Walk from `start` along `direction`, collecting occupied hexes until the
/// chain ends.
///
/// The center only ends a chain when the last chained piece is a warrior;
/// a Jarl may be pushed onto the throne.
pub fn detect_chain(state: &GameState, start: AxialCoord, direction: HexDirection) -> ChainResult {
    let radius = state.radius();
    let mut pieces: Vec<PieceId> = Vec::new();
    let mut last_is_warrior = false;
    let mut hex = start;

    // Any on-board hex leaves the board within 2r + 1 steps
    let bound = 2 * radius.max(0) as usize + 2;
    for _ in 0..bound {
        let terminator = if !is_on_board(hex, radius) {
            Some(ChainTerminator::Edge)
        } else if hex == CENTER && last_is_warrior {
            Some(ChainTerminator::Throne)
        } else {
            match state.piece_at(hex) {
                Some(piece) if piece.is_obstacle() => Some(ChainTerminator::Obstacle),
                Some(piece) => {
                    pieces.push(piece.id);
                    last_is_warrior = piece.is_warrior();
                    None
                }
                None => Some(ChainTerminator::Empty),
            }
        };

        if let Some(terminator) = terminator {
            return ChainResult { pieces, terminator, terminator_position: hex };
        }
        hex = hex.neighbor(direction);
    }

    ChainResult { pieces, terminator: ChainTerminator::Edge, terminator_position: hex }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve a winning attack by `attacker_id` against `chain`.
///
/// Dispatches on the terminator. The input state is never modified.
pub fn resolve_push(
    state: &GameState,
    attacker_id: PieceId,
    direction: HexDirection,
    has_momentum: bool,
    chain: &ChainResult,
) -> Result<PushResult, InvariantViolation> {
    match chain.terminator {
        ChainTerminator::Empty => resolve_simple_push(state, attacker_id, direction, has_momentum, chain),
        ChainTerminator::Edge => resolve_edge_push(state, attacker_id, direction, has_momentum, chain),
        ChainTerminator::Obstacle | ChainTerminator::Throne => resolve_compression(state, attacker_id, chain),
    }
}

/// Chain ends on an empty hex: everything shifts one hex, the attacker takes
/// the defender's hex.
pub fn resolve_simple_push(
    state: &GameState,
    attacker_id: PieceId,
    direction: HexDirection,
    has_momentum: bool,
    chain: &ChainResult,
) -> Result<PushResult, InvariantViolation> {
    if chain.terminator != ChainTerminator::Empty {
        return Err(InvariantViolation::TerminatorMismatch {
            expected: "Empty",
            actual: chain.terminator,
        });
    }
    shift_chain(state, attacker_id, direction, has_momentum, &chain.pieces, None)
}

/// Chain runs off the edge: the farthest piece is eliminated, the rest shift,
/// the attacker takes the defender's hex.
pub fn resolve_edge_push(
    state: &GameState,
    attacker_id: PieceId,
    direction: HexDirection,
    has_momentum: bool,
    chain: &ChainResult,
) -> Result<PushResult, InvariantViolation> {
    if chain.terminator != ChainTerminator::Edge {
        return Err(InvariantViolation::TerminatorMismatch {
            expected: "Edge",
            actual: chain.terminator,
        });
    }
    let (&farthest, survivors) = chain.pieces.split_last().ok_or(InvariantViolation::EmptyChain)?;
    shift_chain(state, attacker_id, direction, has_momentum, survivors, Some(farthest))
}

/// Chain is jammed against an obstacle or the throne: nothing moves, nobody
/// dies, the attacker stays where it was.
pub fn resolve_compression(
    state: &GameState,
    attacker_id: PieceId,
    chain: &ChainResult,
) -> Result<PushResult, InvariantViolation> {
    if !chain.terminator.is_compression() {
        return Err(InvariantViolation::TerminatorMismatch {
            expected: "Obstacle or Throne",
            actual: chain.terminator,
        });
    }
    if chain.pieces.is_empty() {
        return Err(InvariantViolation::EmptyChain);
    }
    for &id in std::iter::once(&attacker_id).chain(&chain.pieces) {
        state.piece(id).ok_or(InvariantViolation::MissingPiece(id))?;
    }

    debug!("Push by {} compressed against {:?}", attacker_id, chain.terminator);
    Ok(PushResult {
        new_state: state.clone(),
        events: Vec::new(),
        eliminated_piece_ids: Vec::new(),
    })
}

/// Shared body of the simple and edge pushes.
///
/// `shifted` move one hex along `direction`; `eliminated`, if any, is the
/// farthest piece and leaves the board. The attacker lands on the hex the
/// first chained piece started on.
fn shift_chain(
    state: &GameState,
    attacker_id: PieceId,
    direction: HexDirection,
    has_momentum: bool,
    shifted: &[PieceId],
    eliminated: Option<PieceId>,
) -> Result<PushResult, InvariantViolation> {
    let turn = state.turn_number;
    let attacker = state.piece(attacker_id).ok_or(InvariantViolation::MissingPiece(attacker_id))?;
    let owner = attacker.player_id.ok_or(InvariantViolation::UnownedAttacker(attacker_id))?;

    let defender_id = shifted.first().copied().or(eliminated).ok_or(InvariantViolation::EmptyChain)?;
    let defender_pos = state
        .piece(defender_id)
        .ok_or(InvariantViolation::MissingPiece(defender_id))?
        .position;

    let mut next = state.clone();
    let mut events = Vec::with_capacity(shifted.len() + 2);
    events.push(GameEvent::moved(turn, attacker_id, owner, attacker.position, defender_pos, has_momentum));

    for (depth, &id) in shifted.iter().enumerate() {
        let piece = next.piece_mut(id).ok_or(InvariantViolation::MissingPiece(id))?;
        let from = piece.position;
        piece.position = from.neighbor(direction);
        events.push(GameEvent::pushed(turn, id, from, direction, depth as u32));
    }

    let mut eliminated_piece_ids = Vec::new();
    if let Some(id) = eliminated {
        let piece = next.remove_piece(id).ok_or(InvariantViolation::MissingPiece(id))?;
        debug!("{} pushed off the board at {}", id, piece.position);
        events.push(GameEvent::eliminated(
            turn,
            id,
            piece.player_id,
            piece.piece_type,
            piece.position,
            EliminationCause::Edge,
        ));
        eliminated_piece_ids.push(id);
    }

    // Attacker moves last so it never shares a hex with the defender
    if let Some(piece) = next.piece_mut(attacker_id) {
        piece.position = defender_pos;
    }

    Ok(PushResult { new_state: next, events, eliminated_piece_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use crate::game::fixtures::{place, playing_state};
    use crate::game::state::{PieceType, PlayerId};

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);
    const EAST: HexDirection = HexDirection::East;

    fn pos(state: &GameState, id: PieceId) -> Option<AxialCoord> {
        state.piece(id).map(|p| p.position)
    }

    #[test]
    fn test_single_piece_to_empty() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), -2, 1);
        let d = place(&mut state, PieceType::Warrior, Some(P2), -1, 1);

        let chain = detect_chain(&state, AxialCoord::new(-1, 1), EAST);
        assert_eq!(chain.pieces, vec![d]);
        assert_eq!(chain.terminator, ChainTerminator::Empty);
        assert_eq!(chain.terminator_position, AxialCoord::new(0, 1));

        let result = resolve_push(&state, a, EAST, false, &chain).unwrap();
        assert_eq!(pos(&result.new_state, d), Some(AxialCoord::new(0, 1)));
        assert_eq!(pos(&result.new_state, a), Some(AxialCoord::new(-1, 1)));
        assert!(result.eliminated_piece_ids.is_empty());

        assert!(matches!(result.events[0].data, GameEventData::Move { piece_id, .. } if piece_id == a));
        assert!(matches!(result.events[1].data, GameEventData::Push { piece_id, depth: 0, .. } if piece_id == d));
        assert_eq!(result.events.len(), 2);

        // Input untouched
        assert_eq!(pos(&state, d), Some(AxialCoord::new(-1, 1)));
    }

    #[test]
    fn test_long_chain_to_empty_shifts_every_piece() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), -3, 1);
        let chained = [
            place(&mut state, PieceType::Warrior, Some(P2), -2, 1),
            place(&mut state, PieceType::Warrior, Some(P1), -1, 1),
            place(&mut state, PieceType::Jarl, Some(P2), 0, 1),
        ];

        let chain = detect_chain(&state, AxialCoord::new(-2, 1), EAST);
        assert_eq!(chain.pieces, chained.to_vec());
        assert_eq!(chain.terminator, ChainTerminator::Empty);
        assert_eq!(chain.terminator_position, AxialCoord::new(1, 1));

        let result = resolve_push(&state, a, EAST, true, &chain).unwrap();
        assert!(result.eliminated_piece_ids.is_empty());
        assert_eq!(pos(&result.new_state, a), Some(AxialCoord::new(-2, 1)));
        for (depth, &id) in chained.iter().enumerate() {
            let from = AxialCoord::new(depth as i32 - 2, 1);
            let to = AxialCoord::new(depth as i32 - 1, 1);
            assert_eq!(pos(&result.new_state, id), Some(to));
            assert_eq!(
                result.events[depth + 1].data,
                GameEventData::Push { piece_id: id, from, to, direction: EAST, depth: depth as u32 }
            );
        }
        assert_eq!(result.events.len(), 4);
        assert!(matches!(result.events[0].data, GameEventData::Move { has_momentum: true, .. }));
    }

    #[test]
    fn test_chain_to_edge_eliminates_farthest() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), 0, 0);
        let d1 = place(&mut state, PieceType::Warrior, Some(P2), 1, 0);
        let d2 = place(&mut state, PieceType::Warrior, Some(P1), 2, 0);
        let d3 = place(&mut state, PieceType::Warrior, Some(P2), 3, 0);

        let chain = detect_chain(&state, AxialCoord::new(1, 0), EAST);
        assert_eq!(chain.pieces, vec![d1, d2, d3]);
        assert_eq!(chain.terminator, ChainTerminator::Edge);
        assert_eq!(chain.terminator_position, AxialCoord::new(4, 0));

        let result = resolve_push(&state, a, EAST, false, &chain).unwrap();
        assert_eq!(result.eliminated_piece_ids, vec![d3]);
        assert_eq!(pos(&result.new_state, d3), None);
        assert_eq!(pos(&result.new_state, d1), Some(AxialCoord::new(2, 0)));
        assert_eq!(pos(&result.new_state, d2), Some(AxialCoord::new(3, 0)));
        assert_eq!(pos(&result.new_state, a), Some(AxialCoord::new(1, 0)));

        assert_eq!(result.events.len(), 4);
        assert!(matches!(result.events[0].data, GameEventData::Move { .. }));
        assert!(matches!(result.events[1].data, GameEventData::Push { depth: 0, .. }));
        assert!(matches!(result.events[2].data, GameEventData::Push { depth: 1, .. }));
        assert!(matches!(
            result.events[3].data,
            GameEventData::Eliminated { cause: EliminationCause::Edge, position, .. } if position == AxialCoord::new(3, 0)
        ));
    }

    #[test]
    fn test_obstacle_compression() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), 0, 0);
        let d = place(&mut state, PieceType::Warrior, Some(P2), 1, 0);
        place(&mut state, PieceType::Obstacle, None, 2, 0);

        let chain = detect_chain(&state, AxialCoord::new(1, 0), EAST);
        assert_eq!(chain.pieces, vec![d]);
        assert_eq!(chain.terminator, ChainTerminator::Obstacle);

        let result = resolve_push(&state, a, EAST, true, &chain).unwrap();
        assert!(result.events.is_empty());
        assert!(result.eliminated_piece_ids.is_empty());
        assert_eq!(result.new_state, state);
    }

    #[test]
    fn test_warrior_cannot_be_pushed_onto_empty_throne() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), 2, 0);
        let d = place(&mut state, PieceType::Warrior, Some(P2), 1, 0);

        let chain = detect_chain(&state, AxialCoord::new(1, 0), HexDirection::West);
        assert_eq!(chain.pieces, vec![d]);
        assert_eq!(chain.terminator, ChainTerminator::Throne);
        assert_eq!(chain.terminator_position, CENTER);

        let result = resolve_push(&state, a, HexDirection::West, false, &chain).unwrap();
        assert_eq!(pos(&result.new_state, a), Some(AxialCoord::new(2, 0)));
        assert_eq!(pos(&result.new_state, d), Some(AxialCoord::new(1, 0)));
    }

    #[test]
    fn test_jarl_can_be_pushed_onto_throne() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), 2, 0);
        let d = place(&mut state, PieceType::Jarl, Some(P2), 1, 0);

        let chain = detect_chain(&state, AxialCoord::new(1, 0), HexDirection::West);
        assert_eq!(chain.terminator, ChainTerminator::Empty);

        let result = resolve_push(&state, a, HexDirection::West, false, &chain).unwrap();
        assert_eq!(pos(&result.new_state, d), Some(CENTER));
    }

    #[test]
    fn test_warrior_behind_throne_occupant_compresses() {
        let mut state = playing_state(2, 3);
        place(&mut state, PieceType::Jarl, Some(P2), 0, 0);
        let w = place(&mut state, PieceType::Warrior, Some(P2), 1, 0);

        let chain = detect_chain(&state, AxialCoord::new(1, 0), HexDirection::West);
        assert_eq!(chain.pieces, vec![w]);
        assert_eq!(chain.terminator, ChainTerminator::Throne);
    }

    #[test]
    fn test_resolvers_reject_wrong_terminator() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), -2, 1);
        place(&mut state, PieceType::Warrior, Some(P2), -1, 1);
        let chain = detect_chain(&state, AxialCoord::new(-1, 1), EAST);

        assert!(matches!(
            resolve_edge_push(&state, a, EAST, false, &chain),
            Err(InvariantViolation::TerminatorMismatch { actual: ChainTerminator::Empty, .. })
        ));
        assert!(matches!(
            resolve_compression(&state, a, &chain),
            Err(InvariantViolation::TerminatorMismatch { .. })
        ));
    }

    #[test]
    fn test_resolvers_report_missing_pieces() {
        let mut state = playing_state(2, 3);
        let a = place(&mut state, PieceType::Jarl, Some(P1), -2, 0);
        let chain = ChainResult {
            pieces: vec![PieceId(77)],
            terminator: ChainTerminator::Empty,
            terminator_position: CENTER,
        };
        assert_eq!(
            resolve_simple_push(&state, a, EAST, false, &chain).unwrap_err(),
            InvariantViolation::MissingPiece(PieceId(77))
        );

        let empty = ChainResult { pieces: vec![], terminator: ChainTerminator::Edge, terminator_position: CENTER };
        assert_eq!(
            resolve_edge_push(&state, a, EAST, false, &empty).unwrap_err(),
            InvariantViolation::EmptyChain
        );
    }
}
