//! Combat Resolution
//!
//! Pure attack/defense scoring. The same function backs move previews and
//! authoritative resolution, so a preview can never disagree with the result.

use serde::{Serialize, Deserialize};

use crate::core::hex::{AxialCoord, HexDirection};
use crate::game::state::{GameState, Piece, PieceId};

/// Strength components on one side of a fight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatBreakdown {
    /// 2 for a Jarl, 1 for a warrior
    pub base_strength: u32,
    /// 1 for a two-hex attack. Always 0 on defense.
    pub momentum: u32,
    /// Strength of the friendly piece directly behind (support or bracing)
    pub support: u32,
    /// Sum of the above
    pub total: u32,
}

impl CombatBreakdown {
    fn new(base_strength: u32, momentum: u32, support: u32) -> Self {
        Self {
            base_strength,
            momentum,
            support,
            total: base_strength + momentum + support,
        }
    }
}

/// Result of an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    /// Attack wins; the defender's chain is pushed along `direction`.
    Push {
        /// Push direction (the attack direction)
        direction: HexDirection,
    },
    /// Defense holds.
    Blocked,
}

/// Scored attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    /// Attacking piece
    pub attacker_id: PieceId,
    /// Defending piece
    pub defender_id: PieceId,
    /// Attack side
    pub attack: CombatBreakdown,
    /// Defense side
    pub defense: CombatBreakdown,
    /// Push or blocked
    pub outcome: CombatOutcome,
}

impl CombatResult {
    /// Did the attack win?
    #[inline]
    pub fn is_push(&self) -> bool {
        matches!(self.outcome, CombatOutcome::Push { .. })
    }

    /// Push direction, if the attack won.
    pub fn push_direction(&self) -> Option<HexDirection> {
        match self.outcome {
            CombatOutcome::Push { direction } => Some(direction),
            CombatOutcome::Blocked => None,
        }
    }
}

/// Strength of the piece on `hex` if it is a non-obstacle owned by the same
/// player as `owner` and is not `exclude`.
fn backing_strength(state: &GameState, hex: AxialCoord, owner: &Piece, exclude: PieceId) -> u32 {
    let Some(owner_id) = owner.player_id else {
        return 0;
    };
    state
        .piece_at(hex)
        .filter(|p| p.id != exclude && p.is_friendly_to(owner_id))
        .map_or(0, |p| p.strength())
}

/// Score `attacker` (standing on `attacker_pos`) hitting `defender` on
/// `defender_pos` along `direction`.
///
/// `attacker_pos` is the hex the attacker strikes from, i.e. the hex just
/// before the defender. The attacker itself never counts as its own support,
/// which matters for two-hex attacks whose origin is directly behind.
pub fn calculate_combat(
    state: &GameState,
    attacker: &Piece,
    attacker_pos: AxialCoord,
    defender: &Piece,
    defender_pos: AxialCoord,
    direction: HexDirection,
    has_momentum: bool,
) -> CombatResult {
    let support = backing_strength(state, attacker_pos.neighbor(direction.opposite()), attacker, attacker.id);
    let attack = CombatBreakdown::new(attacker.strength(), u32::from(has_momentum), support);

    let bracing = backing_strength(state, defender_pos.neighbor(direction), defender, attacker.id);
    let defense = CombatBreakdown::new(defender.strength(), 0, bracing);

    // Ties favor the defender
    let outcome = if attack.total > defense.total {
        CombatOutcome::Push { direction }
    } else {
        CombatOutcome::Blocked
    };

    CombatResult {
        attacker_id: attacker.id,
        defender_id: defender.id,
        attack,
        defense,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixtures::{place, playing_state};
    use crate::game::state::{PieceType, PlayerId};

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    /// P1 attacker on (0, 0) hits a P2 defender on (1, 0), heading East.
    fn duel(
        attacker: PieceType,
        defender: PieceType,
        has_momentum: bool,
        setup: impl FnOnce(&mut GameState),
    ) -> CombatResult {
        let mut state = playing_state(2, 4);
        let a = place(&mut state, attacker, Some(P1), 0, 0);
        let d = place(&mut state, defender, Some(P2), 1, 0);
        setup(&mut state);

        let attacker = state.piece(a).unwrap().clone();
        let defender = state.piece(d).unwrap().clone();
        calculate_combat(
            &state,
            &attacker,
            AxialCoord::new(0, 0),
            &defender,
            AxialCoord::new(1, 0),
            HexDirection::East,
            has_momentum,
        )
    }

    #[test]
    fn test_combat_table() {
        use PieceType::{Jarl, Warrior};

        let cases = [
            (Warrior, Warrior, false, false),
            (Warrior, Warrior, true, true),
            (Jarl, Warrior, false, true),
            (Warrior, Jarl, false, false),
            (Warrior, Jarl, true, false),
        ];

        for (attacker, defender, momentum, pushes) in cases {
            let result = duel(attacker, defender, momentum, |_| {});
            assert_eq!(
                result.is_push(),
                pushes,
                "{attacker:?} (momentum {momentum}) vs {defender:?}: {result:?}"
            );
        }
    }

    #[test]
    fn test_breakdown_totals() {
        let result = duel(PieceType::Jarl, PieceType::Warrior, true, |_| {});
        assert_eq!(result.attack, CombatBreakdown { base_strength: 2, momentum: 1, support: 0, total: 3 });
        assert_eq!(result.defense, CombatBreakdown { base_strength: 1, momentum: 0, support: 0, total: 1 });
        assert_eq!(result.push_direction(), Some(HexDirection::East));
    }

    #[test]
    fn test_support_from_behind() {
        let result = duel(PieceType::Warrior, PieceType::Warrior, false, |state| {
            place(state, PieceType::Jarl, Some(P1), -1, 0);
        });
        assert_eq!(result.attack.support, 2);
        assert!(result.is_push());
    }

    #[test]
    fn test_enemy_behind_attacker_gives_no_support() {
        let result = duel(PieceType::Warrior, PieceType::Warrior, false, |state| {
            place(state, PieceType::Warrior, Some(P2), -1, 0);
        });
        assert_eq!(result.attack.support, 0);
        assert!(!result.is_push());
    }

    #[test]
    fn test_bracing_from_behind_defender() {
        let result = duel(PieceType::Jarl, PieceType::Warrior, false, |state| {
            place(state, PieceType::Warrior, Some(P2), 2, 0);
        });
        assert_eq!(result.defense.support, 1);
        assert_eq!(result.outcome, CombatOutcome::Blocked);
        assert_eq!(result.push_direction(), None);
    }

    #[test]
    fn test_obstacles_neither_support_nor_brace() {
        let result = duel(PieceType::Warrior, PieceType::Warrior, true, |state| {
            place(state, PieceType::Obstacle, None, -1, 0);
            place(state, PieceType::Obstacle, None, 2, 0);
        });
        assert_eq!(result.attack.support, 0);
        assert_eq!(result.defense.support, 0);
        assert!(result.is_push());
    }

    #[test]
    fn test_attacker_origin_not_counted_as_support() {
        // Two-hex attack from (-1, 0): strikes from (0, 0), origin directly behind
        let mut state = playing_state(2, 4);
        let a = place(&mut state, PieceType::Warrior, Some(P1), -1, 0);
        let d = place(&mut state, PieceType::Warrior, Some(P2), 1, 0);
        let attacker = state.piece(a).unwrap().clone();
        let defender = state.piece(d).unwrap().clone();

        let result = calculate_combat(
            &state,
            &attacker,
            AxialCoord::new(0, 0),
            &defender,
            AxialCoord::new(1, 0),
            HexDirection::East,
            true,
        );
        assert_eq!(result.attack.support, 0);
        assert_eq!(result.attack.total, 2);
    }

    #[test]
    fn test_combat_is_deterministic() {
        let first = duel(PieceType::Warrior, PieceType::Jarl, true, |_| {});
        let second = duel(PieceType::Warrior, PieceType::Jarl, true, |_| {});
        assert_eq!(first, second);
    }
}
