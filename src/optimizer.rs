//! Local and exact strategy improvement.

use crate::config::{Ruleset, GOAL, MAX_ROLLS, MIN_ROLLS};
use crate::evaluator::Evaluator;
use crate::strategy::Strategy;

/// Coordinate-wise hill climbing: re-evaluate the whole game from scratch
/// for every candidate roll count at every cell. Slow but never mistakes a
/// locally-better cell for a globally-better one.
///
/// Mutates `strat` in place over up to `steps` cells, visited in row-major
/// `(our_score, opp_score)` order.
pub fn train_strategy(ruleset: Ruleset, strat: &mut Strategy, opponent: &Strategy, steps: u32) {
    let mut eval = Evaluator::new(ruleset);
    let mut clone = strat.clone();
    let mut done = 0u32;

    'outer: for i in 0..GOAL {
        for j in 0..GOAL {
            let mut best_wr = f64::MIN;
            let mut best_roll = MIN_ROLLS;
            for rolls in MIN_ROLLS..=MAX_ROLLS {
                clone.set(i, j, rolls).expect("in-range cell and roll");
                let wr = eval.win_rate(&clone, opponent);
                if wr > best_wr {
                    best_wr = wr;
                    best_roll = rolls;
                }
            }
            strat.set(i, j, best_roll).expect("in-range cell and roll");
            clone.set(i, j, best_roll).expect("in-range cell and roll");
            done += 1;
            if done >= steps {
                break 'outer;
            }
        }
    }
}

/// Greedy local variant: only the subtree rooted at the cell being tuned is
/// recomputed, by invalidating that one DP entry before each candidate
/// instead of clearing the whole table. Much faster, but a change can make
/// the strategy strictly worse elsewhere in the table since entries that
/// transitively depend on this cell are not invalidated. Advisory only —
/// no monotone-improvement guarantee.
pub fn train_strategy_greedy(ruleset: Ruleset, strat: &mut Strategy, opponent: &Strategy, steps: u32) {
    let mut eval = Evaluator::new(ruleset);
    let initial_trot = u32::from(ruleset.enable_time_trot);
    eval.compute(strat, opponent, 0, 0, 0, 0, 0, 0, initial_trot);

    let mut done = 0u32;
    'outer: for i in 0..GOAL {
        for j in 0..GOAL {
            let mut best_wr = f64::MIN;
            let mut best_roll = MIN_ROLLS;
            for rolls in MIN_ROLLS..=MAX_ROLLS {
                strat.set(i, j, rolls).expect("in-range cell and roll");
                eval.invalidate(i, j, 0, 0, 0, 0, 0);
                let wr = eval.compute(strat, opponent, i, j, 0, 0, 0, 0, 0);
                if wr > best_wr {
                    best_wr = wr;
                    best_roll = rolls;
                }
            }
            strat.set(i, j, best_roll).expect("in-range cell and roll");
            done += 1;
            if done >= steps {
                break 'outer;
            }
        }
    }
}

/// Exact retrograde construction of an optimal strategy under the
/// simplified ruleset (no Time Trot, no Feral Hogs, Swine Swap enabled).
///
/// Visits total-score diagonals `t = 2*GOAL-2 .. 0` in decreasing order; at
/// each `(i, j)` with `i + j == t`, every legal roll count leads only to
/// states with strictly larger total score, which are already finalized, so
/// each cell can be solved exactly in one pass.
pub fn make_optimal_strategy(strat: &mut Strategy) {
    let ruleset = Ruleset::simplified();
    let mut eval = Evaluator::new(ruleset);
    eval.clear();

    for t in (0..=(2 * GOAL - 2)).rev() {
        let j_lo = t.saturating_sub(GOAL - 1);
        let j_hi = t.min(GOAL - 1);
        for j in j_lo..=j_hi {
            let i = t - j;
            let mut best_wr = f64::MIN;
            let mut best_roll = MIN_ROLLS;
            for rolls in MIN_ROLLS..=MAX_ROLLS {
                strat.set(i, j, rolls).expect("in-range cell and roll");
                eval.invalidate(i, j, 0, 0, 0, 0, 0);
                let wr = eval.compute(strat, strat, i, j, 0, 0, 0, 0, 0);
                if wr > best_wr {
                    best_wr = wr;
                    best_roll = rolls;
                }
            }
            strat.set(i, j, best_roll).expect("in-range cell and roll");
            eval.set_cached(i, j, 0, 0, 0, 0, 0, best_wr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_training_produces_a_legal_strategy() {
        let mut strat = Strategy::new("s", "s");
        strat.set_const(4).unwrap();
        let mut opponent = Strategy::new("o", "o");
        opponent.set_const(4).unwrap();

        train_strategy_greedy(Ruleset::none(), &mut strat, &opponent, 50);

        for i in 0..10 {
            for j in 0..10 {
                let roll = strat.get(i, j).unwrap();
                assert!((MIN_ROLLS..=MAX_ROLLS).contains(&(roll as u32)));
            }
        }
    }

    #[test]
    fn global_training_improves_or_matches_initial_win_rate() {
        let mut strat = Strategy::new("s", "s");
        strat.set_const(3).unwrap();
        let mut opponent = Strategy::new("o", "o");
        opponent.set_const(5).unwrap();

        let mut eval = Evaluator::new(Ruleset::none());
        let before = eval.win_rate(&strat, &opponent);

        train_strategy(Ruleset::none(), &mut strat, &opponent, 40);

        let after = eval.win_rate(&strat, &opponent);
        assert!(after >= before - 1e-9, "before={before} after={after}");
    }

    #[test]
    fn optimal_strategy_beats_a_constant_strategy_under_swine_swap() {
        let mut optimal = Strategy::new("optimal", "optimal");
        make_optimal_strategy(&mut optimal);

        let mut constant_four = Strategy::new("four", "four");
        constant_four.set_const(4).unwrap();

        let mut eval = Evaluator::new(Ruleset::simplified());
        let wr = eval.win_rate_going_first(&optimal, &constant_four);
        assert!(wr > 0.55, "got {wr}");
    }
}
