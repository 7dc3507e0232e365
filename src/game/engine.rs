//! Move Orchestrator
//!
//! The only place moves turn into new states. Each call is atomic: either
//! the whole move applies and a new state comes back, or an error comes back
//! and nothing changed.
//!
//! ## Pipeline
//!
//! 1. Validate phase, turn and piece ownership
//! 2. Clamp a Jarl's two-hex move across the empty throne onto the throne
//! 3. Check the destination against the piece's reachable hexes
//! 4. Score attacks, then resolve the push chain (or close in on a
//!    defender that holds)
//! 5. Cascade player elimination for every Jarl that fell
//! 6. Record history and check for victory
//! 7. Otherwise hand the turn on

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::core::hex::{direction_between, hex_distance, AxialCoord, CENTER};
use crate::game::combat::{calculate_combat, CombatOutcome, CombatResult};
use crate::game::events::GameEvent;
use crate::game::movement::{get_reachable_hexes, has_draft_formation, has_legal_moves, MoveCommand, MoveType};
use crate::game::push::{detect_chain, resolve_push, ChainTerminator, InvariantViolation};
use crate::game::state::{
    GamePhase, GameState, MoveHistoryEntry, Piece, PieceId, PieceType, PlayerId,
};
use crate::game::turn::advance_turn;
use crate::game::victory::{check_win_conditions, eliminate_player};

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Moves are only accepted while playing.
    #[error("game is {actual:?}, moves need {expected:?}")]
    WrongPhase {
        /// Required phase
        expected: GamePhase,
        /// Actual phase
        actual: GamePhase,
    },

    /// No such player in this game.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    /// Player is already out.
    #[error("{0} has been eliminated")]
    PlayerEliminated(PlayerId),

    /// Someone else is to move.
    #[error("not {player}'s turn ({current} to move)")]
    NotYourTurn {
        /// Who tried to move
        player: PlayerId,
        /// Whose turn it is
        current: PlayerId,
    },

    /// No such piece on the board.
    #[error("unknown piece {0}")]
    UnknownPiece(PieceId),

    /// Piece belongs to someone else (or nobody).
    #[error("{piece} does not belong to {player}")]
    NotYourPiece {
        /// Requested piece
        piece: PieceId,
        /// Requesting player
        player: PlayerId,
    },

    /// Destination is not reachable this turn.
    #[error("{piece} cannot reach {destination}")]
    IllegalDestination {
        /// Requested piece
        piece: PieceId,
        /// Requested hex
        destination: AxialCoord,
    },

    /// Passing is only allowed with no legal move.
    #[error("{0} has legal moves and cannot pass")]
    HasLegalMoves(PlayerId),

    /// Internal rules failure.
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Accepted move.
#[derive(Clone, Debug)]
pub struct MoveOutcome {
    /// State after the move
    pub new_state: GameState,
    /// Everything that happened, in order
    pub events: Vec<GameEvent>,
    /// Combat details for attacks
    pub combat: Option<CombatResult>,
}

/// Apply `command` for `player_id`.
///
/// The input state is never modified. Rejections are logged at `warn`,
/// invariant violations at `error`.
pub fn apply_move(
    state: &GameState,
    player_id: PlayerId,
    command: &MoveCommand,
) -> Result<MoveOutcome, MoveError> {
    play(state, player_id, command).map_err(|e| report(state, player_id, e))
}

/// Forced pass for a player with no legal move.
pub fn pass_turn(state: &GameState, player_id: PlayerId) -> Result<MoveOutcome, MoveError> {
    pass(state, player_id).map_err(|e| report(state, player_id, e))
}

fn report(state: &GameState, player_id: PlayerId, err: MoveError) -> MoveError {
    match &err {
        MoveError::Invariant(violation) => {
            error!("Invariant violation on turn {} by {}: {}", state.turn_number, player_id, violation)
        }
        _ => warn!("Rejected move by {} on turn {}: {}", player_id, state.turn_number, err),
    }
    err
}

fn validate_turn(state: &GameState, player_id: PlayerId) -> Result<(), MoveError> {
    if state.phase != GamePhase::Playing {
        return Err(MoveError::WrongPhase { expected: GamePhase::Playing, actual: state.phase });
    }
    let player = state.player(player_id).ok_or(MoveError::UnknownPlayer(player_id))?;
    if player.is_eliminated {
        return Err(MoveError::PlayerEliminated(player_id));
    }
    if state.current_player_id != player_id {
        return Err(MoveError::NotYourTurn { player: player_id, current: state.current_player_id });
    }
    Ok(())
}

fn pass(state: &GameState, player_id: PlayerId) -> Result<MoveOutcome, MoveError> {
    validate_turn(state, player_id)?;
    if has_legal_moves(state, player_id) {
        return Err(MoveError::HasLegalMoves(player_id));
    }

    debug!("{} passes turn {}", player_id, state.turn_number);
    let advance = advance_turn(state, false, true);
    Ok(MoveOutcome { new_state: advance.new_state, events: advance.events, combat: None })
}

/// A Jarl drafting two hexes straight across the empty throne stops on it.
///
/// Without a draft formation the command is left alone and fails reachability.
fn clamp_to_throne(state: &GameState, piece: &Piece, destination: AxialCoord) -> AxialCoord {
    if !piece.is_jarl() || hex_distance(piece.position, destination) != 2 || !state.is_throne_empty() {
        return destination;
    }
    match direction_between(piece.position, destination) {
        Some(direction)
            if piece.position.neighbor(direction) == CENTER && has_draft_formation(state, piece, direction) =>
        {
            CENTER
        }
        _ => destination,
    }
}

/// Board-level result of one move, before history, victory and turn order.
struct Resolution {
    state: GameState,
    events: Vec<GameEvent>,
    combat: Option<CombatResult>,
    to: AxialCoord,
    pushed: Vec<PieceId>,
    eliminated: Vec<PieceId>,
}

/// A blocked attacker advances to the hex in front of the defender.
///
/// Nothing is pushed or captured. A warrior never stops on the throne, so
/// one charging across it stays where it was.
fn close_in(
    state: &GameState,
    piece: &Piece,
    strike_from: AxialCoord,
    has_momentum: bool,
    combat: CombatResult,
) -> Resolution {
    let stays = strike_from == piece.position || (strike_from == CENTER && !piece.is_jarl());
    let to = if stays { piece.position } else { strike_from };

    let mut next = state.clone();
    let mut events = Vec::new();
    if to != piece.position {
        if let Some(moving) = next.piece_mut(piece.id) {
            moving.position = to;
        }
        if let Some(owner) = piece.player_id {
            events.push(GameEvent::moved(state.turn_number, piece.id, owner, piece.position, to, has_momentum));
        }
    }

    Resolution {
        state: next,
        events,
        combat: Some(combat),
        to,
        pushed: Vec::new(),
        eliminated: Vec::new(),
    }
}

fn play(state: &GameState, player_id: PlayerId, command: &MoveCommand) -> Result<MoveOutcome, MoveError> {
    validate_turn(state, player_id)?;

    let piece = state.piece(command.piece_id).ok_or(MoveError::UnknownPiece(command.piece_id))?;
    if !piece.is_friendly_to(player_id) {
        return Err(MoveError::NotYourPiece { piece: piece.id, player: player_id });
    }

    let destination = clamp_to_throne(state, piece, command.destination);
    let reach = get_reachable_hexes(state, piece.id)
        .into_iter()
        .find(|r| r.destination == destination)
        .ok_or(MoveError::IllegalDestination { piece: piece.id, destination })?;

    let resolution = match reach.move_type {
        MoveType::Move => {
            let mut next = state.clone();
            if let Some(moving) = next.piece_mut(piece.id) {
                moving.position = destination;
            }
            Resolution {
                state: next,
                events: vec![GameEvent::moved(
                    state.turn_number,
                    piece.id,
                    player_id,
                    piece.position,
                    destination,
                    reach.has_momentum,
                )],
                combat: None,
                to: destination,
                pushed: Vec::new(),
                eliminated: Vec::new(),
            }
        }
        MoveType::Attack => {
            let defender = state
                .piece_at(destination)
                .ok_or(InvariantViolation::EmptyChain)?;
            let strike_from = destination.neighbor(reach.direction.opposite());
            let combat = calculate_combat(
                state,
                piece,
                strike_from,
                defender,
                destination,
                reach.direction,
                reach.has_momentum,
            );

            match combat.outcome {
                CombatOutcome::Push { direction } => {
                    let chain = detect_chain(state, destination, direction);
                    let push = resolve_push(state, piece.id, direction, reach.has_momentum, &chain)?;
                    debug!(
                        "{} pushes {} pieces {:?} ({:?}), attack {} vs defense {}",
                        piece.id,
                        chain.pieces.len(),
                        direction,
                        chain.terminator,
                        combat.attack.total,
                        combat.defense.total
                    );

                    let pushed = match chain.terminator {
                        ChainTerminator::Empty => chain.pieces.clone(),
                        ChainTerminator::Edge => chain.pieces[..chain.pieces.len().saturating_sub(1)].to_vec(),
                        ChainTerminator::Obstacle | ChainTerminator::Throne => Vec::new(),
                    };
                    let to = if chain.terminator.is_compression() { piece.position } else { destination };

                    Resolution {
                        state: push.new_state,
                        events: push.events,
                        combat: Some(combat),
                        to,
                        pushed,
                        eliminated: push.eliminated_piece_ids,
                    }
                }
                CombatOutcome::Blocked => {
                    debug!(
                        "{} blocked at {}, attack {} vs defense {}",
                        piece.id, destination, combat.attack.total, combat.defense.total
                    );
                    close_in(state, piece, strike_from, reach.has_momentum, combat)
                }
            }
        }
    };

    let Resolution { state: mut next, mut events, combat, to, pushed, mut eliminated } = resolution;

    // Every Jarl that fell takes its owner's army with it
    let fallen: Vec<PlayerId> = eliminated
        .iter()
        .filter_map(|id| state.piece(*id))
        .filter(|p| p.piece_type == PieceType::Jarl)
        .filter_map(|p| p.player_id)
        .collect();
    for owner in fallen {
        let cascade = eliminate_player(&next, owner);
        next = cascade.new_state;
        events.extend(cascade.events);
        eliminated.extend(cascade.removed_piece_ids);
    }

    next.move_history.push(MoveHistoryEntry {
        turn_number: state.turn_number,
        round_number: state.round_number,
        player_id,
        piece_id: piece.id,
        from: piece.position,
        to,
        move_type: reach.move_type,
        has_momentum: reach.has_momentum,
        pushed,
        eliminated: eliminated.clone(),
    });

    debug!(
        "Turn {}: {} moved {} {} -> {}",
        state.turn_number, player_id, piece.id, piece.position, to
    );

    // A Jarl that never left the throne has not arrived on it
    let arrived = to != piece.position;
    if let Some(victory) = check_win_conditions(&next, Some(piece.id), arrived) {
        next.phase = GamePhase::Ended;
        next.winner_id = Some(victory.winner_id);
        next.win_condition = Some(victory.win_condition);
        events.push(GameEvent::game_ended(state.turn_number, victory.winner_id, victory.win_condition));
        debug!("Game over: {} wins by {:?}", victory.winner_id, victory.win_condition);
        return Ok(MoveOutcome { new_state: next, events, combat });
    }

    let advance = advance_turn(&next, !eliminated.is_empty(), false);
    events.extend(advance.events);
    Ok(MoveOutcome { new_state: advance.new_state, events, combat })
}
