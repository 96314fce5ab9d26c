//! Monte-Carlo game simulation, used to empirically cross-check the exact evaluator.

use rand::Rng;

use crate::config::{free_bacon, is_swap, Ruleset, DICE_SIDES, FERAL_HOGS_ABSDIFF, GOAL, MOD_TROT};
use crate::strategy::Strategy;

fn take_turn(rng: &mut impl Rng, num_rolls: u32, opp_score: u32) -> u32 {
    if num_rolls == 0 {
        return free_bacon(opp_score);
    }
    let mut total = 0u32;
    for _ in 0..num_rolls {
        let outcome = rng.random_range(1..=DICE_SIDES);
        if outcome == 1 {
            return 1;
        }
        total += outcome;
    }
    total
}

/// Play one complete game under `ruleset` and return whether `a` won.
#[must_use]
pub fn play_one_game(ruleset: Ruleset, a: &Strategy, b: &Strategy, rng: &mut impl Rng) -> bool {
    let mut player = 0u32;
    let mut last_trot = false;
    let mut round_mod = 0u32;
    let mut score_a = 0u32;
    let mut score_b = 0u32;
    let mut last_rolls_a = 0u32;
    let mut last_rolls_b = 0u32;

    while score_a.max(score_b) < GOAL {
        let num_rolls = if player == 0 { a.get(score_a, score_b) } else { b.get(score_b, score_a) }.expect("scores stay in range");
        let num_rolls = u32::from(num_rolls);
        let outcome = if player == 0 {
            take_turn(rng, num_rolls, score_b)
        } else {
            take_turn(rng, num_rolls, score_a)
        };

        if player == 0 {
            score_a += outcome;
            if ruleset.enable_feral_hogs && (num_rolls as i64 - last_rolls_a as i64).unsigned_abs() == u64::from(FERAL_HOGS_ABSDIFF) {
                score_a += 3;
            }
            last_rolls_a = num_rolls;
        } else {
            score_b += outcome;
            if ruleset.enable_feral_hogs && (num_rolls as i64 - last_rolls_b as i64).unsigned_abs() == u64::from(FERAL_HOGS_ABSDIFF) {
                score_b += 3;
            }
            last_rolls_b = num_rolls;
        }

        if ruleset.enable_swine_swap && is_swap(score_b, score_a) {
            std::mem::swap(&mut score_a, &mut score_b);
        }

        if !ruleset.enable_time_trot || round_mod != num_rolls || last_trot {
            player ^= 1;
            last_trot = false;
        } else {
            last_trot = true;
        }
        round_mod = (round_mod + 1) % MOD_TROT;
    }

    score_a > score_b
}

/// Estimate `win_rate(a, b)` by sampling `n_per_side` games with `a` first
/// and `n_per_side` games with `b` first.
#[must_use]
pub fn win_rate_by_sampling(ruleset: Ruleset, a: &Strategy, b: &Strategy, n_per_side: u32, rng: &mut impl Rng) -> f64 {
    let mut wins = 0u32;
    for _ in 0..n_per_side {
        if play_one_game(ruleset, a, b, rng) {
            wins += 1;
        }
    }
    for _ in 0..n_per_side {
        if !play_one_game(ruleset, b, a, rng) {
            wins += 1;
        }
    }
    f64::from(wins) / f64::from(2 * n_per_side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sampling_agrees_with_exact_evaluator() {
        let mut a = Strategy::new("a", "a");
        a.set_const(4).unwrap();
        let mut b = Strategy::new("b", "b");
        b.set_const(5).unwrap();

        let ruleset = Ruleset::none();
        let mut eval = Evaluator::new(ruleset);
        let exact = eval.win_rate(&a, &b);

        let mut rng = StdRng::seed_from_u64(42);
        let sampled = win_rate_by_sampling(ruleset, &a, &b, 20_000, &mut rng);

        assert!((sampled - exact).abs() < 0.02, "exact={exact} sampled={sampled}");
    }

    #[test]
    fn every_game_terminates_with_a_winner() {
        let mut a = Strategy::new("a", "a");
        a.set_const(3).unwrap();
        let mut b = Strategy::new("b", "b");
        b.set_const(6).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            play_one_game(Ruleset::all(), &a, &b, &mut rng);
        }
    }
}
