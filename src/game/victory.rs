//! Win Conditions
//!
//! A game ends when a Jarl walks onto the throne or when only one Jarl is
//! left. Losing a Jarl removes its owner and the rest of their army.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hex::CENTER;
use crate::game::events::{EliminationCause, GameEvent};
use crate::game::state::{GameState, PieceId, PlayerId, WinCondition};

/// A decided game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victory {
    /// Winning player
    pub winner_id: PlayerId,
    /// How they won
    pub win_condition: WinCondition,
}

/// Result of [`eliminate_player`].
#[derive(Clone, Debug)]
pub struct EliminationResult {
    /// State with the player marked out and their pieces removed
    pub new_state: GameState,
    /// One `Eliminated` per removed piece, then `PlayerEliminated`
    pub events: Vec<GameEvent>,
    /// Pieces taken off the board
    pub removed_piece_ids: Vec<PieceId>,
}

/// Did `moved_piece_id` just win by walking onto the throne?
///
/// Only a voluntary move counts; a Jarl pushed onto the throne does not win.
pub fn check_throne_victory(state: &GameState, moved_piece_id: PieceId, was_voluntary: bool) -> bool {
    was_voluntary
        && state
            .piece(moved_piece_id)
            .is_some_and(|p| p.is_jarl() && p.position == CENTER)
}

/// Mark `player_id` eliminated and clear their remaining pieces.
///
/// Unknown or already eliminated players leave the state as it was.
pub fn eliminate_player(state: &GameState, player_id: PlayerId) -> EliminationResult {
    if state.player(player_id).map_or(true, |p| p.is_eliminated) {
        return EliminationResult {
            new_state: state.clone(),
            events: Vec::new(),
            removed_piece_ids: Vec::new(),
        };
    }

    let mut next = state.clone();
    if let Some(player) = next.player_mut(player_id) {
        player.is_eliminated = true;
    }

    let turn = state.turn_number;
    let removed: Vec<PieceId> = state.pieces_of(player_id).map(|p| p.id).collect();
    let mut events = Vec::with_capacity(removed.len() + 1);
    for &id in &removed {
        if let Some(piece) = next.remove_piece(id) {
            events.push(GameEvent::eliminated(
                turn,
                id,
                piece.player_id,
                piece.piece_type,
                piece.position,
                EliminationCause::OwnerEliminated,
            ));
        }
    }
    events.push(GameEvent::player_eliminated(turn, player_id));

    debug!("{} eliminated, {} pieces removed", player_id, removed.len());
    EliminationResult { new_state: next, events, removed_piece_ids: removed }
}

/// Owner of the only Jarl left on the board, if exactly one remains.
pub fn check_last_standing(state: &GameState) -> Option<PlayerId> {
    let mut jarls = state.jarls();
    match (jarls.next(), jarls.next()) {
        (Some(last), None) => last.player_id,
        _ => None,
    }
}

/// Throne victory first, then last standing.
pub fn check_win_conditions(
    state: &GameState,
    moved_piece_id: Option<PieceId>,
    was_voluntary: bool,
) -> Option<Victory> {
    let throne = moved_piece_id
        .filter(|&id| check_throne_victory(state, id, was_voluntary))
        .and_then(|id| state.piece(id))
        .and_then(|p| p.player_id)
        .map(|winner_id| Victory { winner_id, win_condition: WinCondition::Throne });

    throne.or_else(|| {
        check_last_standing(state).map(|winner_id| Victory {
            winner_id,
            win_condition: WinCondition::LastStanding,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use crate::game::fixtures::{place, playing_state};
    use crate::game::state::PieceType;

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);
    const P3: PlayerId = PlayerId(3);

    #[test]
    fn test_throne_needs_voluntary_jarl() {
        let mut state = playing_state(2, 3);
        let jarl = place(&mut state, PieceType::Jarl, Some(P1), 0, 0);
        let warrior = place(&mut state, PieceType::Warrior, Some(P2), 1, 0);

        assert!(check_throne_victory(&state, jarl, true));
        assert!(!check_throne_victory(&state, jarl, false));
        assert!(!check_throne_victory(&state, warrior, true));
        assert!(!check_throne_victory(&state, PieceId(99), true));
    }

    #[test]
    fn test_last_standing() {
        let mut state = playing_state(3, 4);
        place(&mut state, PieceType::Jarl, Some(P1), 1, 0);
        place(&mut state, PieceType::Warrior, Some(P2), 2, 0);
        place(&mut state, PieceType::Warrior, Some(P3), 3, 0);
        assert_eq!(check_last_standing(&state), Some(P1));

        place(&mut state, PieceType::Jarl, Some(P2), -1, 0);
        assert_eq!(check_last_standing(&state), None);
    }

    #[test]
    fn test_throne_takes_precedence() {
        let mut state = playing_state(2, 3);
        let jarl = place(&mut state, PieceType::Jarl, Some(P2), 0, 0);

        let by_throne = check_win_conditions(&state, Some(jarl), true);
        assert_eq!(by_throne, Some(Victory { winner_id: P2, win_condition: WinCondition::Throne }));

        let pushed_there = check_win_conditions(&state, Some(jarl), false);
        assert_eq!(pushed_there.map(|v| v.win_condition), Some(WinCondition::LastStanding));
    }

    #[test]
    fn test_no_victory_with_two_jarls() {
        let mut state = playing_state(2, 3);
        let jarl = place(&mut state, PieceType::Jarl, Some(P1), 1, 0);
        place(&mut state, PieceType::Jarl, Some(P2), -1, 0);
        assert_eq!(check_win_conditions(&state, Some(jarl), true), None);
        assert_eq!(check_win_conditions(&state, None, false), None);
    }

    #[test]
    fn test_eliminate_player_cascade() {
        let mut state = playing_state(2, 3);
        let w1 = place(&mut state, PieceType::Warrior, Some(P1), 1, 0);
        let w2 = place(&mut state, PieceType::Warrior, Some(P1), 2, 0);
        let other = place(&mut state, PieceType::Warrior, Some(P2), -1, 0);

        let result = eliminate_player(&state, P1);
        assert_eq!(result.removed_piece_ids, vec![w1, w2]);
        assert!(result.new_state.player(P1).unwrap().is_eliminated);
        assert!(result.new_state.piece(w1).is_none());
        assert!(result.new_state.piece(other).is_some());

        assert_eq!(result.events.len(), 3);
        assert!(result.events[..2].iter().all(|e| matches!(
            e.data,
            GameEventData::Eliminated { cause: EliminationCause::OwnerEliminated, .. }
        )));
        assert_eq!(result.events[2].data, GameEventData::PlayerEliminated { player_id: P1 });

        // Original untouched
        assert!(!state.player(P1).unwrap().is_eliminated);
    }

    #[test]
    fn test_eliminate_player_idempotent() {
        let mut state = playing_state(2, 3);
        place(&mut state, PieceType::Warrior, Some(P1), 1, 0);

        let once = eliminate_player(&state, P1).new_state;
        let twice = eliminate_player(&once, P1);
        assert!(twice.events.is_empty());
        assert_eq!(twice.new_state, once);

        let unknown = eliminate_player(&state, PlayerId(9));
        assert!(unknown.events.is_empty());
        assert_eq!(unknown.new_state, state);
    }
}
