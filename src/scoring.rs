//! Points for answers and end-of-game winner computation.

use std::time::Duration;

use crate::types::{GameOutcome, LeaderboardEntry};

/// Upper bound (inclusive) of elapsed time for each tier, fastest first
const TIERS: [(Duration, u32); 3] = [
    (Duration::from_secs(3), 5),
    (Duration::from_secs(7), 3),
    (Duration::from_secs(10), 2),
];

/// Points for one answer, given time since the round opened.
///
/// Wrong answers score nothing. Correct answers score 5 up to 3s, 3 up to 7s,
/// 2 up to 10s and nothing after that.
pub fn score(elapsed: Duration, is_correct: bool) -> u32 {
    if !is_correct {
        return 0;
    }

    TIERS
        .iter()
        .find(|(limit, _)| elapsed <= *limit)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

/// Everyone sharing the top score wins. Expects the leaderboard already sorted
/// so tied winners come out in leaderboard order.
pub fn winners(leaderboard: &[LeaderboardEntry]) -> GameOutcome {
    let Some(top) = leaderboard.iter().map(|e| e.score).max() else {
        return GameOutcome::NoParticipants;
    };

    let (participant_ids, names): (Vec<_>, Vec<_>) = leaderboard
        .iter()
        .filter(|e| e.score == top)
        .map(|e| (e.id.clone(), e.name.clone()))
        .unzip();

    GameOutcome::Winners {
        participant_ids,
        names,
        score: top,
    }
}
