//! Benchmarks for the move pipeline.
//!
//! Legal-move generation and `apply_move` are the hot path for hosts and bots.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use jarls::game::movement::{get_all_legal_commands, get_all_valid_moves};
use jarls::replay::{replay_game, GameRecord, GameRecorder};
use jarls::{apply_move, create_initial_state, start_game, GameState, SetupOptions};

const NAMES: [&str; 6] = ["Alice", "Bob", "Cara", "Dag", "Eir", "Frey"];

fn opening(players: usize) -> GameState {
    let setup = create_initial_state(&NAMES[..players], &SetupOptions::default()).expect("setup");
    start_game(&setup).expect("start")
}

/// First-listed-move self-play, recorded for replay benchmarks.
fn recorded_game(players: usize, commands: usize) -> GameRecord {
    let mut recorder = GameRecorder::new(opening(players));
    for _ in 0..commands {
        if recorder.state().is_ended() {
            break;
        }
        let player = recorder.state().current_player_id;
        let command = get_all_valid_moves(recorder.state(), player)
            .first()
            .map(|m| m.command())
            .or_else(|| get_all_legal_commands(recorder.state(), player).first().copied());
        match command {
            Some(command) => recorder.play_move(player, command).expect("legal move"),
            None => recorder.pass(player).expect("forced pass"),
        };
    }
    recorder.finish()
}

fn bench_valid_moves(c: &mut Criterion) {
    for players in [2, 6] {
        let state = opening(players);
        let player = state.current_player_id;
        c.bench_function(&format!("valid_moves_{players}p"), |b| {
            b.iter(|| black_box(get_all_valid_moves(black_box(&state), player)));
        });
    }
}

fn bench_apply_move(c: &mut Criterion) {
    let state = opening(4);
    let player = state.current_player_id;
    let command = get_all_valid_moves(&state, player)[0].command();

    c.bench_function("apply_move_4p", |b| {
        b.iter(|| black_box(apply_move(black_box(&state), player, black_box(&command))));
    });
}

fn bench_replay(c: &mut Criterion) {
    let record = recorded_game(3, 100);
    c.bench_function("replay_100_commands_3p", |b| {
        b.iter(|| black_box(replay_game(black_box(&record))));
    });
}

criterion_group!(benches, bench_valid_moves, bench_apply_move, bench_replay);
criterion_main!(benches);
