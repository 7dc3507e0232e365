//! Board Setup
//!
//! Deterministic construction of the opening position: per-player-count
//! configuration, Jarl starting hexes, warrior formations and the symmetric
//! obstacle ("shield") layout.
//!
//! Angles are never computed with trigonometry. Positions are chosen by index
//! along hex rings (see [`hex_ring`]), whose k-th hex sits at roughly
//! `k * 60° / radius`. Rotating by a whole number of ring steps is exact.

use std::collections::{BTreeSet, VecDeque};
use thiserror::Error;
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::hex::{
    get_all_neighbors, get_board_hex_count, hex_line, hex_ring, is_on_board, AxialCoord, CENTER,
};
use crate::game::state::{
    GameConfig, GameId, GamePhase, GameState, Piece, PieceId, PieceType, Player, PlayerId,
};
use crate::{MAX_PLAYERS, MAX_SHIELD_ATTEMPTS, MIN_BOARD_RADIUS, MIN_PLAYERS};

/// Seat colors, in seating order.
pub const PLAYER_COLORS: [&str; MAX_PLAYERS] = [
    "#c0392b", // red
    "#2980b9", // blue
    "#27ae60", // green
    "#f1c40f", // yellow
    "#8e44ad", // purple
    "#e67e22", // orange
];

/// `(players, radius, warriors, obstacles)`
const CONFIG_TABLE: [(usize, i32, usize, usize); 5] = [
    (2, 3, 5, 3),
    (3, 5, 5, 4),
    (4, 6, 4, 4),
    (5, 7, 4, 5),
    (6, 8, 4, 6),
];

/// Setup errors. Raised synchronously; the caller must change parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Player count outside 2-6.
    #[error("invalid player count {0}: must be between {MIN_PLAYERS} and {MAX_PLAYERS}")]
    InvalidPlayerCount(usize),

    /// Board too small for the armies and obstacles.
    #[error("board radius {radius} cannot hold {required} pieces")]
    InvalidRadius {
        /// Requested radius.
        radius: i32,
        /// Pieces that must fit besides the throne.
        required: usize,
    },

    /// No obstacle layout keeps every Jarl's path to the throne open.
    #[error("no obstacle layout keeps every path to the throne open after {attempts} attempts")]
    ShieldPlacementUnsatisfiable {
        /// Layouts tried.
        attempts: u32,
    },

    /// Operation not allowed in this phase.
    #[error("game is {actual:?}, expected {expected:?}")]
    WrongPhase {
        /// Required phase.
        expected: GamePhase,
        /// Actual phase.
        actual: GamePhase,
    },
}

/// Optional overrides for [`create_initial_state`].
#[derive(Clone, Debug, Default)]
pub struct SetupOptions {
    /// Turn timer to record in the config.
    pub turn_timer_ms: Option<u64>,
    /// Board radius instead of the table value.
    pub radius_override: Option<i32>,
    /// Explicit game id. Derived from the setup when absent.
    pub game_id: Option<GameId>,
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Table configuration for `player_count` players.
pub fn get_config_for_player_count(player_count: usize) -> Result<GameConfig, SetupError> {
    CONFIG_TABLE
        .iter()
        .find(|(players, ..)| *players == player_count)
        .map(|&(player_count, board_radius, warrior_count, obstacle_count)| GameConfig {
            player_count,
            board_radius,
            warrior_count,
            obstacle_count,
            turn_timer_ms: None,
        })
        .ok_or(SetupError::InvalidPlayerCount(player_count))
}

// =============================================================================
// STARTING POSITIONS
// =============================================================================

/// Round `numerator / denominator` to the nearest integer (half up).
#[inline]
fn div_round(numerator: usize, denominator: usize) -> usize {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Edge hexes for `player_count` Jarls, spread as evenly as the ring allows.
///
/// Jarl `i` takes edge-ring index `round(i * 6r / n)`. Every gap is at least
/// `r` ring steps, i.e. at least 60°.
pub fn calculate_starting_positions(player_count: usize, radius: i32) -> Vec<AxialCoord> {
    let ring = hex_ring(CENTER, radius);
    (0..player_count)
        .map(|i| ring[div_round(i * ring.len(), player_count) % ring.len()])
        .collect()
}

// =============================================================================
// WARRIORS
// =============================================================================

/// Warrior hexes for one army.
///
/// First fills the straight line from the Jarl toward the throne, skipping
/// blocked hexes and the throne itself, then floods breadth-first through the
/// neighbors of warriors already placed. May return fewer than `count` hexes
/// when the board is full.
pub fn place_warriors(
    jarl_pos: AxialCoord,
    count: usize,
    blocked: &BTreeSet<AxialCoord>,
    radius: i32,
) -> Vec<AxialCoord> {
    let mut placed: Vec<AxialCoord> = Vec::with_capacity(count);
    let free = |hex: AxialCoord, placed: &[AxialCoord]| {
        hex != CENTER
            && hex != jarl_pos
            && is_on_board(hex, radius)
            && !blocked.contains(&hex)
            && !placed.contains(&hex)
    };

    for hex in hex_line(jarl_pos, CENTER) {
        if placed.len() == count {
            return placed;
        }
        if free(hex, &placed) {
            placed.push(hex);
        }
    }

    // Seed the flood with the line, falling back to the Jarl if it was fully blocked
    let mut frontier: VecDeque<AxialCoord> = placed.iter().copied().collect();
    frontier.push_back(jarl_pos);
    let mut seen: BTreeSet<AxialCoord> = frontier.iter().copied().collect();

    while placed.len() < count {
        let Some(hex) = frontier.pop_front() else {
            break;
        };
        for neighbor in get_all_neighbors(hex) {
            if placed.len() == count {
                break;
            }
            if !seen.insert(neighbor) {
                continue;
            }
            if free(neighbor, &placed) {
                placed.push(neighbor);
                frontier.push_back(neighbor);
            }
        }
    }

    placed
}

// =============================================================================
// SHIELDS
// =============================================================================

/// Obstacle hexes with the same rotational pattern in every player's sector.
///
/// Obstacle `k` goes to sector `k % n`, layer `k / n`. Each layer uses one
/// interior ring (outermost first) and sits at the middle of its sector, so
/// it lands between two Jarls rather than in front of one. Never places on
/// the center or the edge.
pub fn generate_symmetrical_shields(player_count: usize, radius: i32, count: usize) -> Vec<AxialCoord> {
    shield_layout(player_count, radius, count, 0)
}

/// Shield layout rotated `rotation` ring steps along every ring.
fn shield_layout(player_count: usize, radius: i32, count: usize, rotation: usize) -> Vec<AxialCoord> {
    let ring_count = (radius - 1).max(0) as usize;
    if ring_count == 0 || player_count == 0 {
        return Vec::new();
    }

    let mut shields: Vec<AxialCoord> = Vec::with_capacity(count);
    for slot in 0..count {
        let sector = slot % player_count;
        let layer = slot / player_count;
        let distance = radius - 1 - (layer % ring_count) as i32;
        let ring = hex_ring(CENTER, distance);

        let midpoint = div_round((2 * sector + 1) * ring.len(), 2 * player_count);
        let start = midpoint + rotation + layer / ring_count;

        if let Some(hex) = (0..ring.len())
            .map(|step| ring[(start + step) % ring.len()])
            .find(|hex| !shields.contains(hex))
        {
            shields.push(hex);
        }
    }

    shields
}

/// Is the straight line from `position` to the throne free of obstacles?
pub fn has_path_to_throne(position: AxialCoord, obstacles: &BTreeSet<AxialCoord>, radius: i32) -> bool {
    if !is_on_board(position, radius) {
        return false;
    }
    hex_line(position, CENTER)
        .iter()
        .skip(1)
        .all(|hex| !obstacles.contains(hex))
}

/// Path check for one starting position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThronePath {
    /// Seat index of the player
    pub player_index: usize,
    /// Jarl starting hex
    pub position: AxialCoord,
    /// Straight line to the throne is clear
    pub has_path: bool,
}

/// Per-player result of [`validate_shield_placement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShieldValidation {
    /// One entry per starting position, in seating order
    pub paths: Vec<ThronePath>,
}

impl ShieldValidation {
    /// Does every player have a clear path?
    pub fn is_valid(&self) -> bool {
        self.paths.iter().all(|p| p.has_path)
    }

    /// Seats whose path is blocked.
    pub fn blocked_players(&self) -> Vec<usize> {
        self.paths
            .iter()
            .filter(|p| !p.has_path)
            .map(|p| p.player_index)
            .collect()
    }
}

/// Report, per player, whether `obstacles` block the straight path to the throne.
///
/// Does not retry; callers regenerate the layout on failure.
pub fn validate_shield_placement(
    starting_positions: &[AxialCoord],
    obstacles: &BTreeSet<AxialCoord>,
    radius: i32,
) -> ShieldValidation {
    let paths = starting_positions
        .iter()
        .enumerate()
        .map(|(player_index, &position)| ThronePath {
            player_index,
            position,
            has_path: has_path_to_throne(position, obstacles, radius),
        })
        .collect();
    ShieldValidation { paths }
}

// =============================================================================
// INITIAL STATE
// =============================================================================

/// Game id derived from the setup, for callers that do not supply one.
fn derive_game_id<S: AsRef<str>>(names: &[S], config: &GameConfig) -> GameId {
    let mut hasher = StateHasher::for_game_id();
    for name in names {
        hasher.update_str(name.as_ref());
    }
    hasher.update_u32(config.board_radius as u32);
    hasher.update_u32(config.warrior_count as u32);
    hasher.update_u32(config.obstacle_count as u32);

    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    GameId::new(bytes)
}

/// Build the opening position for `names.len()` players, in `Setup` phase.
pub fn create_initial_state<S: AsRef<str>>(
    names: &[S],
    options: &SetupOptions,
) -> Result<GameState, SetupError> {
    let player_count = names.len();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
        return Err(SetupError::InvalidPlayerCount(player_count));
    }

    let mut config = get_config_for_player_count(player_count)?;
    config.turn_timer_ms = options.turn_timer_ms;
    if let Some(radius) = options.radius_override {
        config.board_radius = radius;
    }

    let radius = config.board_radius;
    let required = player_count * (1 + config.warrior_count) + config.obstacle_count;
    if radius < MIN_BOARD_RADIUS || required >= get_board_hex_count(radius) {
        return Err(SetupError::InvalidRadius { radius, required });
    }

    let starts = calculate_starting_positions(player_count, radius);

    let obstacles = (0..MAX_SHIELD_ATTEMPTS)
        .map(|attempt| shield_layout(player_count, radius, config.obstacle_count, attempt as usize))
        .map(|layout| layout.into_iter().collect::<BTreeSet<_>>())
        .find(|layout| {
            layout.len() == config.obstacle_count
                && validate_shield_placement(&starts, layout, radius).is_valid()
        })
        .ok_or(SetupError::ShieldPlacementUnsatisfiable { attempts: MAX_SHIELD_ATTEMPTS })?;

    let mut pieces: Vec<Piece> = Vec::with_capacity(required);
    let mut next_id = 1u32;
    let mut alloc = || {
        let id = PieceId(next_id);
        next_id += 1;
        id
    };

    let mut blocked: BTreeSet<AxialCoord> = obstacles.clone();
    blocked.extend(starts.iter().copied());

    let mut players = Vec::with_capacity(player_count);
    for (index, (name, &jarl_pos)) in names.iter().zip(&starts).enumerate() {
        let player_id = PlayerId(index as u8 + 1);
        players.push(Player {
            id: player_id,
            name: name.as_ref().to_string(),
            color: PLAYER_COLORS[index].to_string(),
            is_eliminated: false,
        });

        pieces.push(Piece::new(alloc(), PieceType::Jarl, Some(player_id), jarl_pos));

        let warriors = place_warriors(jarl_pos, config.warrior_count, &blocked, radius);
        if warriors.len() < config.warrior_count {
            return Err(SetupError::InvalidRadius { radius, required });
        }
        for hex in warriors {
            blocked.insert(hex);
            pieces.push(Piece::new(alloc(), PieceType::Warrior, Some(player_id), hex));
        }
    }

    for &hex in &obstacles {
        pieces.push(Piece::new(alloc(), PieceType::Obstacle, None, hex));
    }

    let id = options.game_id.unwrap_or_else(|| derive_game_id(names, &config));
    debug!(
        "Created game {} for {} players (radius {}, {} pieces)",
        id.to_uuid_string(),
        player_count,
        radius,
        pieces.len()
    );

    Ok(GameState::new(id, config, players, pieces))
}

/// Move a `Setup` game into `Playing`.
pub fn start_game(state: &GameState) -> Result<GameState, SetupError> {
    if state.phase != GamePhase::Setup {
        return Err(SetupError::WrongPhase {
            expected: GamePhase::Setup,
            actual: state.phase,
        });
    }

    let mut next = state.clone();
    next.phase = GamePhase::Playing;
    debug!("Game {} started, {} to move", next.id.to_uuid_string(), next.current_player_id);
    Ok(next)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hex::{hex_distance, hex_to_pixel, is_on_edge};

    fn angle_of(hex: AxialCoord) -> f64 {
        let (x, y) = hex_to_pixel(hex, 1.0);
        y.atan2(x)
    }

    fn angular_gap(a: f64, b: f64) -> f64 {
        let diff = (a - b).abs() % std::f64::consts::TAU;
        diff.min(std::f64::consts::TAU - diff)
    }

    #[test]
    fn test_config_table() {
        let two = get_config_for_player_count(2).unwrap();
        assert_eq!(two.board_radius, 3);
        assert_eq!(two.warrior_count, 5);
        assert_eq!(two.obstacle_count, 3);

        for n in 2..=6 {
            assert_eq!(get_config_for_player_count(n).unwrap().player_count, n);
        }
        assert_eq!(get_config_for_player_count(1), Err(SetupError::InvalidPlayerCount(1)));
        assert_eq!(get_config_for_player_count(7), Err(SetupError::InvalidPlayerCount(7)));
    }

    #[test]
    fn test_starting_positions_spread() {
        for n in 2..=6 {
            for radius in 2..=9 {
                let starts = calculate_starting_positions(n, radius);
                assert_eq!(starts.len(), n);

                let unique: BTreeSet<_> = starts.iter().collect();
                assert_eq!(unique.len(), n, "duplicate start for n={n} r={radius}");

                for &hex in &starts {
                    assert_eq!(hex_distance(hex, CENTER), radius);
                }

                for (i, a) in starts.iter().enumerate() {
                    for b in &starts[i + 1..] {
                        let gap = angular_gap(angle_of(*a), angle_of(*b));
                        assert!(
                            gap >= std::f64::consts::FRAC_PI_3 - 1e-9,
                            "n={n} r={radius}: {a} and {b} only {gap} apart"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_two_player_starts_are_opposite() {
        let starts = calculate_starting_positions(2, 3);
        assert_eq!(starts, vec![AxialCoord::new(3, 0), AxialCoord::new(-3, 0)]);
    }

    #[test]
    fn test_warriors_fill_line_first() {
        let jarl = AxialCoord::new(3, 0);
        let blocked = BTreeSet::from([jarl]);
        let warriors = place_warriors(jarl, 2, &blocked, 3);
        assert_eq!(warriors, vec![AxialCoord::new(2, 0), AxialCoord::new(1, 0)]);
    }

    #[test]
    fn test_warriors_avoid_blocked_and_throne() {
        let jarl = AxialCoord::new(3, 0);
        let blocked = BTreeSet::from([jarl, AxialCoord::new(2, 0)]);
        let warriors = place_warriors(jarl, 8, &blocked, 3);

        assert_eq!(warriors.len(), 8);
        assert_eq!(warriors[0], AxialCoord::new(1, 0));
        for hex in &warriors {
            assert_ne!(*hex, CENTER);
            assert!(!blocked.contains(hex));
            assert!(is_on_board(*hex, 3));
        }
        let unique: BTreeSet<_> = warriors.iter().collect();
        assert_eq!(unique.len(), warriors.len());
    }

    #[test]
    fn test_warriors_flood_from_jarl_when_line_blocked() {
        let jarl = AxialCoord::new(2, 0);
        let blocked = BTreeSet::from([jarl, AxialCoord::new(1, 0)]);
        let warriors = place_warriors(jarl, 2, &blocked, 2);
        assert_eq!(warriors, vec![AxialCoord::new(2, -1), AxialCoord::new(1, 1)]);
        for hex in &warriors {
            assert_eq!(hex_distance(*hex, jarl), 1);
        }
    }

    #[test]
    fn test_shields_interior_and_symmetric() {
        let shields = generate_symmetrical_shields(2, 3, 3);
        assert_eq!(shields.len(), 3);
        for hex in &shields {
            assert_ne!(*hex, CENTER);
            assert!(!is_on_edge(*hex, 3));
            assert!(is_on_board(*hex, 3));
        }
        // The first layer is a half-turn pair
        assert_eq!(shields[1], crate::core::hex::rotate_hex(shields[0], 3));

        let six = generate_symmetrical_shields(6, 8, 6);
        for (i, hex) in six.iter().enumerate() {
            assert_eq!(*hex, crate::core::hex::rotate_hex(six[0], i as i32));
        }
    }

    #[test]
    fn test_shield_validation_reports_blocked_player() {
        let starts = calculate_starting_positions(2, 3);
        let blocking = BTreeSet::from([AxialCoord::new(1, 0)]);
        let report = validate_shield_placement(&starts, &blocking, 3);
        assert!(!report.is_valid());
        assert_eq!(report.blocked_players(), vec![0]);

        assert!(has_path_to_throne(AxialCoord::new(-3, 0), &blocking, 3));
        assert!(!has_path_to_throne(AxialCoord::new(3, 0), &blocking, 3));
        assert!(!has_path_to_throne(AxialCoord::new(9, 0), &BTreeSet::new(), 3));
    }

    #[test]
    fn test_two_player_initial_state() {
        let state = create_initial_state(&["Alice", "Bob"], &SetupOptions::default()).unwrap();

        assert_eq!(state.phase, GamePhase::Setup);
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.current_player_id, PlayerId(1));
        assert_eq!(state.turn_number, 0);
        assert_eq!(state.round_number, 1);

        let non_obstacles = state.pieces.iter().filter(|p| !p.is_obstacle()).count();
        assert_eq!(non_obstacles, 12);

        let jarls: Vec<_> = state.jarls().collect();
        assert_eq!(jarls.len(), 2);
        for jarl in jarls {
            assert_eq!(hex_distance(jarl.position, CENTER), 3);
        }

        let obstacles: Vec<_> = state.pieces.iter().filter(|p| p.is_obstacle()).collect();
        assert_eq!(obstacles.len(), 3);
        for rock in obstacles {
            assert_ne!(rock.position, CENTER);
            assert!(!is_on_edge(rock.position, 3));
        }
    }

    #[test]
    fn test_every_table_size_builds_valid_board() {
        let names = ["A", "B", "C", "D", "E", "F"];
        for n in 2..=6 {
            let state = create_initial_state(&names[..n], &SetupOptions::default()).unwrap();
            let radius = state.radius();

            let positions: BTreeSet<_> = state.pieces.iter().map(|p| p.position).collect();
            assert_eq!(positions.len(), state.pieces.len(), "overlap with {n} players");

            for piece in &state.pieces {
                assert!(is_on_board(piece.position, radius));
                assert_ne!(piece.position, CENTER);
            }
            for player in &state.players {
                assert_eq!(state.pieces_of(player.id).filter(|p| p.is_jarl()).count(), 1);
                assert_eq!(
                    state.pieces_of(player.id).filter(|p| p.is_warrior()).count(),
                    state.config.warrior_count
                );
            }

            let starts: Vec<_> = state.jarls().map(|j| j.position).collect();
            assert!(validate_shield_placement(&starts, &state.obstacle_positions(), radius).is_valid());
        }
    }

    #[test]
    fn test_setup_errors() {
        let one = create_initial_state(&["Solo"], &SetupOptions::default());
        assert_eq!(one, Err(SetupError::InvalidPlayerCount(1)));

        let seven = create_initial_state(&["a", "b", "c", "d", "e", "f", "g"], &SetupOptions::default());
        assert_eq!(seven, Err(SetupError::InvalidPlayerCount(7)));

        let tiny = SetupOptions { radius_override: Some(1), ..SetupOptions::default() };
        assert!(matches!(
            create_initial_state(&["A", "B"], &tiny),
            Err(SetupError::InvalidRadius { radius: 1, .. })
        ));
    }

    #[test]
    fn test_small_radius_override_regenerates_shields() {
        let options = SetupOptions { radius_override: Some(2), ..SetupOptions::default() };
        let state = create_initial_state(&["A", "B"], &options).unwrap();
        assert_eq!(state.radius(), 2);

        let starts: Vec<_> = state.jarls().map(|j| j.position).collect();
        assert!(validate_shield_placement(&starts, &state.obstacle_positions(), 2).is_valid());
    }

    #[test]
    fn test_setup_is_deterministic() {
        let a = create_initial_state(&["Alice", "Bob", "Cara"], &SetupOptions::default()).unwrap();
        let b = create_initial_state(&["Alice", "Bob", "Cara"], &SetupOptions::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.compute_hash(), b.compute_hash());

        let id = GameId::new([9; 16]);
        let options = SetupOptions { game_id: Some(id), turn_timer_ms: Some(30_000), ..SetupOptions::default() };
        let c = create_initial_state(&["Alice", "Bob", "Cara"], &options).unwrap();
        assert_eq!(c.id, id);
        assert_eq!(c.config.turn_timer_ms, Some(30_000));
        assert_eq!(c.pieces, a.pieces);
    }

    #[test]
    fn test_start_game_once() {
        let state = create_initial_state(&["Alice", "Bob"], &SetupOptions::default()).unwrap();
        let started = start_game(&state).unwrap();
        assert_eq!(started.phase, GamePhase::Playing);
        assert_eq!(state.phase, GamePhase::Setup);
        assert!(matches!(start_game(&started), Err(SetupError::WrongPhase { .. })));
    }
}
