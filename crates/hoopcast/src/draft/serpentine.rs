// Serpentine (snake) draft arithmetic.
//
// Odd rounds run positions 1..N, even rounds run N..1. Pick numbers are
// absolute and 1-based across the whole draft.

/// Number of teams in the league. The draft arithmetic and the recommendation
/// prompt both assume a 10-team league.
pub const LEAGUE_SIZE: u32 = 10;

/// 1-based round containing `pick`.
pub fn round_of(pick: u32) -> u32 {
    (pick.saturating_sub(1) / LEAGUE_SIZE) + 1
}

/// 1-based position of `pick` within its round, counted in pick order.
pub fn position_in_round(pick: u32) -> u32 {
    (pick.saturating_sub(1) % LEAGUE_SIZE) + 1
}

/// Absolute pick number for the given 1-based draft slot in the given round.
///
/// `"I'm drafting at position 3 in round 2"` resolves to pick 13. `None` when
/// the pick number does not fit in a `u32`.
pub fn pick_from_round_position(round: u32, position: u32) -> Option<u32> {
    round
        .saturating_sub(1)
        .checked_mul(LEAGUE_SIZE)?
        .checked_add(position)
}

/// The user's next pick after `current`: the mirrored slot in the following
/// round.
///
/// From an odd round, position `p` maps to `N - p + 1` in the next round;
/// from an even round it maps back to `p`. So pick 1 is followed by pick 20,
/// and pick 11 by pick 21. `None` past the last representable round.
pub fn next_pick(current: u32) -> Option<u32> {
    let round = round_of(current);
    let position = position_in_round(current);
    let mapped = if round % 2 == 1 {
        LEAGUE_SIZE - position + 1
    } else {
        position
    };
    round.checked_mul(LEAGUE_SIZE)?.checked_add(mapped)
}
