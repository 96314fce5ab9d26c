//! Exact win-rate evaluation: a memoized expectation over the game tree.

use crate::config::{free_bacon, is_swap, Ruleset, FERAL_HOGS_ABSDIFF, GOAL, MAX_ROLLS, MOD_TROT};
use crate::dice::{self, DiceTable};
use crate::strategy::Strategy;

/// Owns one DP table and computes win rates between pairs of strategies.
///
/// The table's shape depends on which rules are active: dimensions tied to
/// a disabled rule are not merely pinned to index zero, they are absent
/// from the allocation entirely. With every optional rule off the table
/// holds `GOAL * GOAL * 2` cells; with all of them on it holds roughly
/// `GOAL^2 * 2 * (MAX_ROLLS+1)^2 * MOD_TROT * 2` cells.
pub struct Evaluator<'a> {
    ruleset: Ruleset,
    dice: &'a DiceTable,
    table: Vec<f64>,
}

impl<'a> Evaluator<'a> {
    /// Build an evaluator against the process-wide dice table.
    #[must_use]
    pub fn new(ruleset: Ruleset) -> Self {
        Self::with_dice_table(ruleset, dice::global())
    }

    /// Build an evaluator against a caller-supplied dice table (useful for
    /// tests that build a small table instead of the full `MAX_ROLLS` one).
    #[must_use]
    pub fn with_dice_table(ruleset: Ruleset, dice: &'a DiceTable) -> Self {
        let size = Self::table_size(&ruleset);
        Self {
            ruleset,
            dice,
            table: vec![0.0; size],
        }
    }

    fn table_size(ruleset: &Ruleset) -> usize {
        let mut size = (GOAL * GOAL * 2) as usize;
        if ruleset.enable_feral_hogs {
            size *= ((MAX_ROLLS + 1) * (MAX_ROLLS + 1)) as usize;
        }
        if ruleset.enable_time_trot {
            size *= (MOD_TROT * 2) as usize;
        }
        size
    }

    /// Reset every DP cell to "unfilled". Cheap: reuses the existing
    /// allocation rather than dropping and rebuilding it.
    pub fn clear(&mut self) {
        self.table.fill(0.0);
    }

    /// Reset a single DP cell to "unfilled", collapsing disabled dimensions
    /// the same way [`Evaluator::compute`] does. Used by the greedy
    /// optimizer to force recomputation of one subtree without clearing the
    /// whole table.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn invalidate(&mut self, score: u32, opp_score: u32, who: u32, last_rolls: u32, opp_last_rolls: u32, turn_mod: u32, trot_active: u32) {
        let idx = self.collapsed_index(score, opp_score, who, last_rolls, opp_last_rolls, turn_mod, trot_active);
        self.table[idx] = 0.0;
    }

    /// Directly store a known win probability in a cell, bypassing
    /// recomputation. Used by the retrograde optimizer, which already knows
    /// the value of the candidate it committed to.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn set_cached(&mut self, score: u32, opp_score: u32, who: u32, last_rolls: u32, opp_last_rolls: u32, turn_mod: u32, trot_active: u32, value: f64) {
        let idx = self.collapsed_index(score, opp_score, who, last_rolls, opp_last_rolls, turn_mod, trot_active);
        self.table[idx] = value + 1.0;
    }

    #[allow(clippy::too_many_arguments)]
    fn collapsed_index(&self, score: u32, opp_score: u32, who: u32, last_rolls: u32, opp_last_rolls: u32, turn_mod: u32, trot_active: u32) -> usize {
        let (last_rolls, opp_last_rolls) = if self.ruleset.enable_feral_hogs { (last_rolls, opp_last_rolls) } else { (0, 0) };
        let (turn_mod, trot_active) = if self.ruleset.enable_time_trot { (turn_mod, trot_active) } else { (0, 0) };
        self.index(score, opp_score, who, last_rolls, opp_last_rolls, turn_mod, trot_active)
    }

    #[inline]
    fn index(&self, score: u32, opp_score: u32, who: u32, last_rolls: u32, opp_last_rolls: u32, turn_mod: u32, trot_active: u32) -> usize {
        let mut idx = score as usize;
        idx = idx * GOAL as usize + opp_score as usize;
        idx = idx * 2 + who as usize;
        if self.ruleset.enable_feral_hogs {
            idx = idx * (MAX_ROLLS + 1) as usize + last_rolls as usize;
            idx = idx * (MAX_ROLLS + 1) as usize + opp_last_rolls as usize;
        }
        if self.ruleset.enable_time_trot {
            idx = idx * MOD_TROT as usize + turn_mod as usize;
            idx = idx * 2 + trot_active as usize;
        }
        idx
    }

    /// Average of "A goes first" and "B goes first" win probabilities for A,
    /// computed against one freshly cleared table.
    #[must_use]
    pub fn win_rate(&mut self, a: &Strategy, b: &Strategy) -> f64 {
        self.clear();
        let initial_trot = u32::from(self.ruleset.enable_time_trot);
        let p0 = self.compute(a, b, 0, 0, 0, 0, 0, 0, initial_trot);
        let p1 = self.compute(b, a, 0, 0, 1, 0, 0, 0, initial_trot);
        (p0 + (1.0 - p1)) / 2.0
    }

    /// Probability that `a` wins when `a` moves first.
    #[must_use]
    pub fn win_rate_going_first(&mut self, a: &Strategy, b: &Strategy) -> f64 {
        self.clear();
        let initial_trot = u32::from(self.ruleset.enable_time_trot);
        self.compute(a, b, 0, 0, 0, 0, 0, 0, initial_trot)
    }

    /// Probability that `a` wins when `b` moves first.
    #[must_use]
    pub fn win_rate_going_last(&mut self, a: &Strategy, b: &Strategy) -> f64 {
        self.clear();
        let initial_trot = u32::from(self.ruleset.enable_time_trot);
        1.0 - self.compute(b, a, 0, 0, 0, 0, 0, 0, initial_trot)
    }

    /// Probability that `strat` eventually reaches [`GOAL`] before
    /// `opp_strat`, given it is `strat`'s turn in the supplied state.
    ///
    /// `who` does not affect the result; it only keeps the "A first" and
    /// "B first" halves of [`Evaluator::win_rate`] from colliding in the
    /// same table.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        &mut self,
        strat: &Strategy,
        opp_strat: &Strategy,
        score: u32,
        opp_score: u32,
        who: u32,
        last_rolls: u32,
        opp_last_rolls: u32,
        turn_mod: u32,
        trot_active: u32,
    ) -> f64 {
        let (last_rolls_c, opp_last_rolls_c) = if self.ruleset.enable_feral_hogs {
            (last_rolls, opp_last_rolls)
        } else {
            (0, 0)
        };
        let (turn_mod_c, trot_active_c) = if self.ruleset.enable_time_trot {
            (turn_mod, trot_active)
        } else {
            (0, 0)
        };

        let idx = self.index(score, opp_score, who, last_rolls_c, opp_last_rolls_c, turn_mod_c, trot_active_c);
        let stored = self.table[idx];
        if stored != 0.0 {
            return stored - 1.0;
        }

        let rolls = u32::from(strat.get(score, opp_score).expect("score indices are always in range"));

        let p = if rolls == 0 {
            self.take_turn(
                strat,
                opp_strat,
                score,
                opp_score,
                who,
                last_rolls,
                opp_last_rolls,
                turn_mod,
                trot_active,
                rolls,
                free_bacon(opp_score),
            )
        } else {
            let mut total = 0u64;
            let ways_one = self.dice.get(rolls, 1);
            let mut acc = self.take_turn(strat, opp_strat, score, opp_score, who, last_rolls, opp_last_rolls, turn_mod, trot_active, rolls, 1)
                * ways_one as f64;
            total += ways_one;
            for k in (2 * rolls)..=(6 * rolls) {
                let w = self.dice.get(rolls, k);
                if w == 0 {
                    continue;
                }
                acc += self.take_turn(strat, opp_strat, score, opp_score, who, last_rolls, opp_last_rolls, turn_mod, trot_active, rolls, k) * w as f64;
                total += w;
            }
            acc / total as f64
        };

        self.table[idx] = p + 1.0;
        p
    }

    #[allow(clippy::too_many_arguments)]
    fn take_turn(
        &mut self,
        strat: &Strategy,
        opp_strat: &Strategy,
        score: u32,
        opp_score: u32,
        who: u32,
        last_rolls: u32,
        opp_last_rolls: u32,
        turn_mod: u32,
        trot_active: u32,
        rolls: u32,
        k: u32,
    ) -> f64 {
        let mut new_score = score + k;
        let mut new_opp = opp_score;

        if self.ruleset.enable_feral_hogs && (rolls as i64 - last_rolls as i64).unsigned_abs() == u64::from(FERAL_HOGS_ABSDIFF) {
            new_score += 3;
        }
        if self.ruleset.enable_swine_swap && is_swap(new_score, new_opp) {
            std::mem::swap(&mut new_score, &mut new_opp);
        }

        if new_score >= GOAL {
            return 1.0;
        }
        if new_opp >= GOAL {
            return 0.0;
        }

        let next_turn = (turn_mod + 1) % MOD_TROT;
        if self.ruleset.enable_time_trot && trot_active != 0 && turn_mod == rolls {
            self.compute(strat, opp_strat, new_score, new_opp, who, rolls, opp_last_rolls, next_turn, 0)
        } else {
            1.0 - self.compute(opp_strat, strat, new_opp, new_score, who ^ 1, opp_last_rolls, rolls, next_turn, 1)
        }
    }
}
