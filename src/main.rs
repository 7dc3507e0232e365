//! Jarls Engine Demo
//!
//! Plays a deterministic greedy game between the named players, records it
//! and verifies the record by replay.
//!
//! ```text
//! jarls-engine [NAME...]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use jarls::{
    core::hex::CENTER,
    create_initial_state,
    game::{
        events::GameEventData,
        movement::{get_all_legal_commands, get_all_valid_moves, MoveType, ValidMove},
        state::GameState,
    },
    replay::{replay_game, GameRecorder},
    start_game, SetupOptions, VERSION,
};

/// Stop a stalled demo game after this many commands.
const MAX_DEMO_COMMANDS: usize = 400;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Jarls Engine v{}", VERSION);

    let mut names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        names = vec!["Alice".to_string(), "Bob".to_string()];
    }

    demo_game(&names)
}

/// Rank a move for the greedy demo policy. Higher is better.
fn score(state: &GameState, candidate: &ValidMove) -> i32 {
    let Some(piece) = state.piece(candidate.piece_id) else {
        return i32::MIN;
    };

    if piece.is_jarl() && candidate.destination == CENTER {
        return 1_000;
    }

    let attack_bonus = match (&candidate.move_type, &candidate.combat) {
        (MoveType::Attack, Some(combat)) => 100 + (combat.attack.total as i32 - combat.defense.total as i32),
        _ => 0,
    };
    let toward_throne = piece.position.distance(CENTER) - candidate.destination.distance(CENTER);
    let jarl_weight = if piece.is_jarl() { 2 } else { 1 };

    attack_bonus + toward_throne * 10 * jarl_weight
}

fn demo_game(names: &[String]) -> Result<()> {
    info!("=== Starting Demo Game ===");

    let setup = create_initial_state(names, &SetupOptions::default()).context("setup failed")?;
    let state = start_game(&setup).context("start failed")?;

    info!("Game ID: {}", state.id.to_uuid_string());
    info!(
        "Board radius {}, {} warriors each, {} pieces",
        state.config.board_radius,
        state.config.warrior_count,
        state.pieces.len()
    );
    for player in &state.players {
        info!("{} {} ({})", player.id, player.name, player.color);
    }

    let mut recorder = GameRecorder::new(state);
    let mut total_events = 0;

    for _ in 0..MAX_DEMO_COMMANDS {
        if recorder.state().is_ended() {
            break;
        }

        let player = recorder.state().current_player_id;
        let moves = get_all_valid_moves(recorder.state(), player);
        // max_by_key keeps the last maximum; reverse so the first listed move wins ties
        let best = moves
            .iter()
            .rev()
            .max_by_key(|m| score(recorder.state(), m))
            .map(|m| m.command())
            .or_else(|| get_all_legal_commands(recorder.state(), player).first().copied());

        let outcome = match best {
            Some(command) => recorder.play_move(player, command)?,
            None => recorder.pass(player)?,
        };
        total_events += outcome.events.len();

        for event in &outcome.events {
            match &event.data {
                GameEventData::PlayerEliminated { player_id } => {
                    info!("Turn {}: {} eliminated", event.turn_number, player_id);
                }
                GameEventData::StarvationTriggered { rounds_since_elimination, .. } => {
                    info!("Starvation: {} rounds without elimination", rounds_since_elimination);
                }
                GameEventData::GameEnded { winner_id, win_condition } => {
                    info!("Game ended! Winner: {} by {:?}", winner_id, win_condition);
                }
                _ => {}
            }
        }
    }

    let record = recorder.finish();
    let Some(result) = record.result else {
        bail!("record was not finalized");
    };

    info!("=== Game Results ===");
    info!("Commands: {}, events: {}", record.commands.len(), total_events);
    info!("Final turn: {}", result.final_turn);
    match result.winner_id {
        Some(winner) => info!("Winner: {}", winner),
        None => info!("No winner after {} commands", MAX_DEMO_COMMANDS),
    }
    info!("Final State Hash: {}", hex::encode(result.final_state_hash));

    info!("=== Verifying Determinism ===");
    let encoded = record.to_bytes()?;
    info!("Record size: {} bytes ({} checkpoints)", encoded.len(), record.checkpoints.len());

    let verification = replay_game(&jarls::replay::GameRecord::from_bytes(&encoded)?);
    info!("Replay State Hash: {}", hex::encode(verification.computed_final_hash));

    if verification.valid {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        bail!("determinism failure: {:?}", verification.error)
    }
}
