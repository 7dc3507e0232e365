//! Hand-built positions for unit tests.

use crate::core::hex::AxialCoord;
use crate::game::board::PLAYER_COLORS;
use crate::game::state::{
    GameConfig, GameId, GamePhase, GameState, Piece, PieceId, PieceType, Player, PlayerId,
};

/// Empty board of `radius` with `players` seated, already `Playing`.
pub(crate) fn playing_state(players: usize, radius: i32) -> GameState {
    let config = GameConfig {
        player_count: players,
        board_radius: radius,
        warrior_count: 0,
        obstacle_count: 0,
        turn_timer_ms: None,
    };
    let players = (0..players)
        .map(|i| Player {
            id: PlayerId(i as u8 + 1),
            name: format!("P{}", i + 1),
            color: PLAYER_COLORS[i].to_string(),
            is_eliminated: false,
        })
        .collect();

    let mut state = GameState::new(GameId::new([0; 16]), config, players, Vec::new());
    state.phase = GamePhase::Playing;
    state
}

/// Drop a piece on `(q, r)` and return its id.
pub(crate) fn place(
    state: &mut GameState,
    piece_type: PieceType,
    player_id: Option<PlayerId>,
    q: i32,
    r: i32,
) -> PieceId {
    let id = PieceId(state.pieces.last().map_or(1, |p| p.id.0 + 1));
    state
        .pieces
        .push(Piece::new(id, piece_type, player_id, AxialCoord::new(q, r)));
    id
}
