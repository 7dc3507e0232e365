//! Turns, Rounds and Starvation
//!
//! Players move in seating order, skipping the eliminated. A round ends when
//! control would return to the round's designated first player; the next
//! round then starts one seat later, so the first move rotates around the
//! table.
//!
//! Starvation is the tie-break pressure for stalled games: after
//! [`STARVATION_INITIAL_ROUNDS`] rounds without an elimination, and every
//! [`STARVATION_INTERVAL_ROUNDS`] after that, a trigger is reported. What the
//! trigger forces is up to the host.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::events::{GameEvent, GameEventData};
use crate::game::state::{GameState, PlayerId};
use crate::{STARVATION_INITIAL_ROUNDS, STARVATION_INTERVAL_ROUNDS};

/// A starvation trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarvationTrigger {
    /// Rounds since the last elimination
    pub rounds_since_elimination: u32,
    /// First trigger of this stall
    pub is_initial: bool,
}

/// Result of [`advance_turn`].
#[derive(Clone, Debug)]
pub struct TurnAdvance {
    /// State with the next player to move
    pub new_state: GameState,
    /// `TurnEnded`, then `RoundEnded` and `StarvationTriggered` when they apply
    pub events: Vec<GameEvent>,
}

/// Next non-eliminated player after `after` in seating order, wrapping.
///
/// `after` may itself be eliminated.
pub fn next_player(state: &GameState, after: PlayerId) -> Option<PlayerId> {
    let seats = state.players.len();
    let start = state.players.iter().position(|p| p.id == after)?;
    (1..=seats)
        .map(|offset| &state.players[(start + offset) % seats])
        .find(|p| !p.is_eliminated)
        .map(|p| p.id)
}

/// Designated first player of the current round.
pub fn round_first_player(state: &GameState) -> Option<PlayerId> {
    let active = state.active_players();
    if active.is_empty() {
        return None;
    }
    Some(active[state.first_player_index % active.len()])
}

/// Starvation trigger for the current stall, if one is due.
pub fn check_starvation_trigger(state: &GameState) -> Option<StarvationTrigger> {
    let rounds = state.rounds_since_elimination;
    let is_initial = rounds == STARVATION_INITIAL_ROUNDS;
    let recurring = rounds > STARVATION_INITIAL_ROUNDS
        && (rounds - STARVATION_INITIAL_ROUNDS) % STARVATION_INTERVAL_ROUNDS == 0;

    (is_initial || recurring).then_some(StarvationTrigger {
        rounds_since_elimination: rounds,
        is_initial,
    })
}

/// Hand the turn on after the current player has moved or passed.
///
/// Increments the turn counter, detects round completion, rotates the first
/// player and updates the starvation counter.
pub fn advance_turn(state: &GameState, eliminated_this_move: bool, passed: bool) -> TurnAdvance {
    let mut next = state.clone();
    let mover = state.current_player_id;
    next.turn_number += 1;

    let mut events = Vec::new();
    let mut upcoming = next_player(&next, mover).unwrap_or(mover);
    let mut round_ended = None;

    let active = next.active_players();
    if !active.is_empty()
        && next.turn_number > 0
        && Some(upcoming) == round_first_player(&next)
    {
        let completed = next.round_number;
        next.round_number += 1;
        next.first_player_index = (next.first_player_index + 1) % active.len();
        upcoming = active[next.first_player_index];
        round_ended = Some(completed);
        debug!("Round {} complete, {} opens round {}", completed, upcoming, next.round_number);
    }

    if eliminated_this_move {
        next.rounds_since_elimination = 0;
    } else if round_ended.is_some() {
        next.rounds_since_elimination += 1;
    }

    next.current_player_id = upcoming;
    events.push(GameEvent::new(
        state.turn_number,
        GameEventData::TurnEnded {
            player_id: mover,
            next_player_id: upcoming,
            turn_number: next.turn_number,
            passed,
        },
    ));

    if let Some(round_number) = round_ended {
        events.push(GameEvent::new(
            state.turn_number,
            GameEventData::RoundEnded { round_number, next_first_player_id: upcoming },
        ));

        if let Some(trigger) = check_starvation_trigger(&next) {
            debug!(
                "Starvation triggered after {} rounds without elimination",
                trigger.rounds_since_elimination
            );
            events.push(GameEvent::new(
                state.turn_number,
                GameEventData::StarvationTriggered {
                    rounds_since_elimination: trigger.rounds_since_elimination,
                    is_initial: trigger.is_initial,
                },
            ));
        }
    }

    TurnAdvance { new_state: next, events }
}
