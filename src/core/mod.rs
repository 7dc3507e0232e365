//! Core deterministic primitives.
//!
//! Hex geometry and state hashing. Nothing in this module knows about
//! pieces or players; the game rules build on top of it.

pub mod hex;
pub mod hash;

// Re-export core types
pub use hex::{AxialCoord, CubeCoord, HexDirection, CENTER};
pub use hash::{StateHash, StateHasher, compute_state_hash};
