//! Hex Coordinate Math
//!
//! Axial and cube coordinates for the hexagonal board.
//!
//! ```text
//!            NW (0,-1)   NE (1,-1)
//!                 \       /
//!     W (-1,0) ── ( q , r ) ── E (1,0)
//!                 /       \
//!            SW (-1,1)   SE (0,1)
//! ```
//!
//! The board is a hexagon of hexes centered on the throne at `(0, 0)`.
//! Directions are ordered counter-clockwise starting East, and every
//! neighbor list in the crate follows that order.
//!
//! Everything here is integer math except the two inverse mappings that must
//! round fractional positions (`cube_round`, `hex_line`, `pixel_to_hex`).

use std::fmt;
use std::ops::{Add, Neg, Sub};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The throne hex.
pub const CENTER: AxialCoord = AxialCoord::new(0, 0);

/// Sub-hex offset applied to both endpoints of a line so that interpolated
/// points never sit exactly on a hex boundary. Components sum to zero.
const LINE_NUDGE: (f64, f64, f64) = (1e-6, 1e-6, -2e-6);

const SQRT_3: f64 = 1.732_050_807_568_877_2;

// =============================================================================
// AXIAL COORDINATE
// =============================================================================

/// Axial hex coordinate.
///
/// Ordered by `(q, r)` so it can key `BTreeMap`/`BTreeSet` deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AxialCoord {
    /// Column axis
    pub q: i32,
    /// Row axis
    pub r: i32,
}

impl AxialCoord {
    /// Create a new coordinate.
    #[inline]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Derived cube component.
    #[inline]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Multiply both components by an integer.
    #[inline]
    pub const fn scale(self, factor: i32) -> Self {
        Self::new(self.q * factor, self.r * factor)
    }

    /// Neighbor in the given direction.
    #[inline]
    pub fn neighbor(self, direction: HexDirection) -> Self {
        self + direction.offset()
    }

    /// Hex `steps` away in the given direction.
    #[inline]
    pub fn step(self, direction: HexDirection, steps: i32) -> Self {
        self + direction.offset().scale(steps)
    }

    /// Distance to another hex.
    #[inline]
    pub fn distance(self, other: Self) -> i32 {
        hex_distance(self, other)
    }
}

impl Add for AxialCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.q + other.q, self.r + other.r)
    }
}

impl Sub for AxialCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.q - other.q, self.r - other.r)
    }
}

impl Neg for AxialCoord {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.q, -self.r)
    }
}

impl fmt::Debug for AxialCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

impl fmt::Display for AxialCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

// =============================================================================
// CUBE COORDINATE
// =============================================================================

/// Cube hex coordinate. Invariant: `q + r + s == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeCoord {
    /// Q axis
    pub q: i32,
    /// R axis
    pub r: i32,
    /// S axis
    pub s: i32,
}

impl CubeCoord {
    /// Create a new cube coordinate.
    ///
    /// Debug-asserts the `q + r + s == 0` invariant.
    #[inline]
    pub fn new(q: i32, r: i32, s: i32) -> Self {
        debug_assert_eq!(q + r + s, 0, "cube coordinate off the plane");
        Self { q, r, s }
    }
}

/// Axial to cube.
#[inline]
pub fn axial_to_cube(hex: AxialCoord) -> CubeCoord {
    CubeCoord { q: hex.q, r: hex.r, s: hex.s() }
}

/// Cube to axial (drops `s`).
#[inline]
pub fn cube_to_axial(cube: CubeCoord) -> AxialCoord {
    AxialCoord::new(cube.q, cube.r)
}

// =============================================================================
// DIRECTIONS
// =============================================================================

/// The six hex directions, counter-clockwise from East.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HexDirection {
    /// (+1, 0)
    East = 0,
    /// (+1, -1)
    NorthEast = 1,
    /// (0, -1)
    NorthWest = 2,
    /// (-1, 0)
    West = 3,
    /// (-1, +1)
    SouthWest = 4,
    /// (0, +1)
    SouthEast = 5,
}

impl HexDirection {
    /// All directions in neighbor order.
    pub const ALL: [HexDirection; 6] = [
        HexDirection::East,
        HexDirection::NorthEast,
        HexDirection::NorthWest,
        HexDirection::West,
        HexDirection::SouthWest,
        HexDirection::SouthEast,
    ];

    /// Index 0-5.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction from index, wrapping modulo 6.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    /// Axial offset of one step.
    pub const fn offset(self) -> AxialCoord {
        match self {
            HexDirection::East => AxialCoord::new(1, 0),
            HexDirection::NorthEast => AxialCoord::new(1, -1),
            HexDirection::NorthWest => AxialCoord::new(0, -1),
            HexDirection::West => AxialCoord::new(-1, 0),
            HexDirection::SouthWest => AxialCoord::new(-1, 1),
            HexDirection::SouthEast => AxialCoord::new(0, 1),
        }
    }

    /// Opposite direction: `(d + 3) mod 6`.
    #[inline]
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Rotate counter-clockwise by `steps` sixths of a turn (negative = clockwise).
    #[inline]
    pub fn rotate(self, steps: i32) -> Self {
        let turned = (self.index() as i32 + steps).rem_euclid(6);
        Self::from_index(turned as usize)
    }
}

/// Direction of a straight line from `from` to `to`, if they share an axis.
pub fn direction_between(from: AxialCoord, to: AxialCoord) -> Option<HexDirection> {
    let delta = to - from;
    let distance = hex_distance(from, to);
    if distance == 0 {
        return None;
    }
    HexDirection::ALL
        .into_iter()
        .find(|dir| dir.offset().scale(distance) == delta)
}

// =============================================================================
// DISTANCE / NEIGHBORS / ROTATION
// =============================================================================

/// Hex distance: `(|Δq| + |Δr| + |Δs|) / 2`.
#[inline]
pub fn hex_distance(a: AxialCoord, b: AxialCoord) -> i32 {
    let dq = (a.q - b.q).abs();
    let dr = (a.r - b.r).abs();
    let ds = (a.s() - b.s()).abs();
    (dq + dr + ds) / 2
}

/// Neighbor of `hex` in `direction`.
#[inline]
pub fn get_neighbor(hex: AxialCoord, direction: HexDirection) -> AxialCoord {
    hex.neighbor(direction)
}

/// All six neighbors, counter-clockwise from East.
pub fn get_all_neighbors(hex: AxialCoord) -> [AxialCoord; 6] {
    HexDirection::ALL.map(|dir| hex.neighbor(dir))
}

/// Rotate `hex` about the center by `steps` sixths of a turn, counter-clockwise.
pub fn rotate_hex(hex: AxialCoord, steps: i32) -> AxialCoord {
    let mut cube = axial_to_cube(hex);
    for _ in 0..steps.rem_euclid(6) {
        cube = CubeCoord { q: -cube.s, r: -cube.q, s: -cube.r };
    }
    cube_to_axial(cube)
}

// =============================================================================
// ROUNDING / LINES
// =============================================================================

/// Round a fractional cube position to the nearest hex.
///
/// Each component is rounded independently, then the one with the largest
/// rounding error is recomputed from the other two so `q + r + s == 0` holds.
pub fn cube_round(q: f64, r: f64, s: f64) -> CubeCoord {
    let mut rq = q.round();
    let mut rr = r.round();
    let mut rs = s.round();

    let q_diff = (rq - q).abs();
    let r_diff = (rr - r).abs();
    let s_diff = (rs - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    } else {
        rs = -rq - rr;
    }

    CubeCoord::new(rq as i32, rr as i32, rs as i32)
}

/// Straight line of hexes from `a` to `b`, both inclusive.
///
/// Has `distance(a, b) + 1` points, each one step from the last. The
/// interpolation weights both endpoints symmetrically, so
/// `hex_line(b, a)` is exactly `hex_line(a, b)` reversed.
pub fn hex_line(a: AxialCoord, b: AxialCoord) -> Vec<AxialCoord> {
    let n = hex_distance(a, b);
    if n == 0 {
        return vec![a];
    }

    let (nq, nr, ns) = LINE_NUDGE;
    let ca = axial_to_cube(a);
    let cb = axial_to_cube(b);
    let (aq, ar, as_) = (ca.q as f64 + nq, ca.r as f64 + nr, ca.s as f64 + ns);
    let (bq, br, bs) = (cb.q as f64 + nq, cb.r as f64 + nr, cb.s as f64 + ns);
    let total = n as f64;

    (0..=n)
        .map(|i| {
            let wa = (n - i) as f64;
            let wb = i as f64;
            let cube = cube_round(
                (aq * wa + bq * wb) / total,
                (ar * wa + br * wb) / total,
                (as_ * wa + bs * wb) / total,
            );
            cube_to_axial(cube)
        })
        .collect()
}

// =============================================================================
// BOARD MEMBERSHIP
// =============================================================================

/// Is `hex` within `radius` of the center?
#[inline]
pub fn is_on_board(hex: AxialCoord, radius: i32) -> bool {
    hex_distance(hex, CENTER) <= radius
}

/// Is `hex` on the outermost ring?
#[inline]
pub fn is_on_edge(hex: AxialCoord, radius: i32) -> bool {
    hex_distance(hex, CENTER) == radius
}

/// Number of hexes on a board of `radius`: `3r² + 3r + 1`.
#[inline]
pub fn get_board_hex_count(radius: i32) -> usize {
    (3 * radius * radius + 3 * radius + 1) as usize
}

/// Every hex on the board, sorted by `(q, r)`.
pub fn get_board_hexes(radius: i32) -> Vec<AxialCoord> {
    let mut hexes = Vec::with_capacity(get_board_hex_count(radius));
    for q in -radius..=radius {
        let r_min = (-radius).max(-q - radius);
        let r_max = radius.min(-q + radius);
        for r in r_min..=r_max {
            hexes.push(AxialCoord::new(q, r));
        }
    }
    hexes
}

/// Ring of hexes exactly `radius` from `center`.
///
/// Starts at the East corner and walks counter-clockwise, so index `k` of a
/// ring around the throne sits at roughly `k * 60° / radius`.
pub fn hex_ring(center: AxialCoord, radius: i32) -> Vec<AxialCoord> {
    if radius == 0 {
        return vec![center];
    }

    let mut ring = Vec::with_capacity((6 * radius) as usize);
    for side in HexDirection::ALL {
        let mut hex = center.step(side, radius);
        let walk = side.rotate(2);
        for _ in 0..radius {
            ring.push(hex);
            hex = hex.neighbor(walk);
        }
    }
    ring
}

// =============================================================================
// KEYS
// =============================================================================

/// Errors parsing a position key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexKeyError {
    /// Key is not of the form `q,r`.
    #[error("malformed hex key: {0:?}")]
    Malformed(String),

    /// A component is not an integer.
    #[error("invalid component {component:?} in hex key {key:?}")]
    InvalidComponent {
        /// The whole key.
        key: String,
        /// The offending component.
        component: String,
    },
}

/// Canonical map key for a hex: `"q,r"`.
pub fn hex_to_key(hex: AxialCoord) -> String {
    format!("{},{}", hex.q, hex.r)
}

/// Parse a key produced by [`hex_to_key`].
pub fn key_to_hex(key: &str) -> Result<AxialCoord, HexKeyError> {
    let (q, r) = key
        .split_once(',')
        .ok_or_else(|| HexKeyError::Malformed(key.to_string()))?;

    let parse = |component: &str| {
        component.parse::<i32>().map_err(|_| HexKeyError::InvalidComponent {
            key: key.to_string(),
            component: component.to_string(),
        })
    };

    Ok(AxialCoord::new(parse(q)?, parse(r)?))
}

// =============================================================================
// PIXEL LAYOUT
// =============================================================================

/// Center of `hex` in pixels for a pointy-top layout of hex `size`.
pub fn hex_to_pixel(hex: AxialCoord, size: f64) -> (f64, f64) {
    let x = size * (SQRT_3 * hex.q as f64 + SQRT_3 / 2.0 * hex.r as f64);
    let y = size * (1.5 * hex.r as f64);
    (x, y)
}

/// Hex containing pixel `(x, y)` for a pointy-top layout of hex `size`.
pub fn pixel_to_hex(x: f64, y: f64, size: f64) -> AxialCoord {
    let q = (SQRT_3 / 3.0 * x - y / 3.0) / size;
    let r = (2.0 / 3.0 * y) / size;
    cube_to_axial(cube_round(q, r, -q - r))
}

// =============================================================================
// TESTS
// =============================================================================
