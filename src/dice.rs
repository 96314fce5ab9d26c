//! Dice-outcome combinatorics table.
//!
//! `DiceTable::get(r, s)` is the exact number of permutations of `r` dice
//! that sum to `s`, collapsed by the Pig Out rule (any die showing `1`
//! forces the whole turn-score to `1`). Built once per process behind a
//! one-shot initialization gate and shared by every [`crate::evaluator::Evaluator`].

use std::sync::OnceLock;

use crate::config::{DICE_SIDES, MAX_ROLLS};

/// Flat, offset-indexed table of `ways[r][s]`.
///
/// Mirrors this lineage's existing PMF lookup layout (a single contiguous
/// buffer plus a per-row offset table) rather than a ragged `Vec<Vec<_>>`,
/// for cache locality in the evaluator's hot inner loop.
#[derive(Debug, Clone)]
pub struct DiceTable {
    data: Box<[u64]>,
    offsets: Box<[usize]>,
    max_rolls: u32,
}

impl DiceTable {
    /// Build the table for `r ∈ [0, max_rolls]`, `s ∈ [0, DICE_SIDES * r]`.
    #[must_use]
    pub fn build(max_rolls: u32) -> Self {
        let sides = DICE_SIDES;
        let row_len = (sides * max_rolls + 1) as usize;
        let mut offsets = Vec::with_capacity(max_rolls as usize + 1);
        let mut data = vec![0u64; row_len * (max_rolls as usize + 1)];
        for r in 0..=max_rolls {
            offsets.push(r as usize * row_len);
        }

        data[offsets[0]] = 1; // ways[0][0] = 1

        let mut pow6 = 1u64;
        let mut pow5 = 1u64;
        for r in 1..=max_rolls {
            pow6 *= u64::from(sides);
            pow5 *= u64::from(sides - 1);
            let row = offsets[r as usize];
            let prev_row = offsets[(r - 1) as usize];

            // ways[r][1] = 6^r - 5^r
            data[row + 1] = pow6 - pow5;

            if r == 1 {
                // ways[1][s] = 1 for s in [1, sides]; s == 1 already set above,
                // and the Pig Out collapse means s == 1 is the *only* outcome
                // through a 1, so the remaining sides-1 faces fill [2, sides].
                for s in 2..=sides {
                    data[row + s as usize] = 1;
                }
                continue;
            }

            let prev_low = 2 * (r - 1);
            let lo = 2 * r;
            let hi = sides * r;

            // Sliding window of width DICE_SIDES over the previous row.
            let mut window: u64 = ((hi - sides + 1)..hi)
                .map(|k| prev_row_value(&data, prev_row, prev_low, sides * (r - 1), k))
                .sum();

            // Each step first slides the window down by one sum (dropping the
            // die-value-1 contribution, admitting the die-value-6 one), then
            // records the result, mirroring the order the recurrence needs:
            // the window at `s` must already exclude `prev_row[s + 1]` and
            // include `prev_row[s - sides]` before it is stored.
            let mut s = hi;
            loop {
                let drop = s - 1;
                if drop >= prev_low {
                    window -= prev_row_value(&data, prev_row, prev_low, sides * (r - 1), drop);
                }
                if let Some(add) = s.checked_sub(sides) {
                    if add >= prev_low {
                        window += prev_row_value(&data, prev_row, prev_low, sides * (r - 1), add);
                    }
                }
                data[row + s as usize] = window;
                if s == lo {
                    break;
                }
                s -= 1;
            }
        }

        Self {
            data: data.into_boxed_slice(),
            offsets: offsets.into_boxed_slice(),
            max_rolls,
        }
    }

    /// Number of permutations of `r` dice summing to `s`. Returns `0` for
    /// any `s` outside the row's populated range.
    #[must_use]
    #[inline]
    pub fn get(&self, r: u32, s: u32) -> u64 {
        debug_assert!(r <= self.max_rolls, "r={r} exceeds max_rolls={}", self.max_rolls);
        let row = self.offsets[r as usize];
        let row_len = if (r as usize + 1) < self.offsets.len() {
            self.offsets[r as usize + 1] - row
        } else {
            self.data.len() - row
        };
        if (s as usize) < row_len {
            self.data[row + s as usize]
        } else {
            0
        }
    }

    /// Largest roll count this table was built for.
    #[must_use]
    pub fn max_rolls(&self) -> u32 {
        self.max_rolls
    }
}

/// Helper for the sliding window: reads `ways[r-1][k]` respecting the row's
/// valid range (`[2(r-1), 6(r-1)] ∪ {1}`), treating everything else as zero.
fn prev_row_value(data: &[u64], prev_row: usize, prev_low: u32, prev_high: u32, k: u32) -> u64 {
    if k == 1 || (k >= prev_low && k <= prev_high) {
        data[prev_row + k as usize]
    } else {
        0
    }
}

static GLOBAL: OnceLock<DiceTable> = OnceLock::new();

/// The process-wide dice table, built once for [`MAX_ROLLS`] on first use.
#[must_use]
pub fn global() -> &'static DiceTable {
    GLOBAL.get_or_init(|| DiceTable::build(MAX_ROLLS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_one_is_flat_except_pig_out() {
        let table = DiceTable::build(MAX_ROLLS);
        let row1: Vec<u64> = (0..=6).map(|s| table.get(1, s)).collect();
        assert_eq!(row1, vec![0, 1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn row_two_literals() {
        let table = DiceTable::build(MAX_ROLLS);
        assert_eq!(table.get(2, 1), 11);
        // Two dice with neither showing 1 sum over {2..6}x{2..6}: a
        // triangular distribution peaking at 5 ways for s=8.
        assert_eq!(table.get(2, 4), 1);
        assert_eq!(table.get(2, 7), 4);
        assert_eq!(table.get(2, 8), 5);
        assert_eq!(table.get(2, 12), 1);
        let sum: u64 = (0..=12).map(|s| table.get(2, s)).sum();
        assert_eq!(sum, 36);
    }

    #[test]
    fn every_row_sums_to_six_to_the_r() {
        let table = DiceTable::build(MAX_ROLLS);
        for r in 0..=MAX_ROLLS {
            let sum: u64 = (0..=DICE_SIDES * MAX_ROLLS).map(|s| table.get(r, s)).sum();
            assert_eq!(sum, 6u64.pow(r), "row {r} does not sum to 6^{r}");
        }
    }

    #[test]
    fn ways_r1_formula_holds() {
        let table = DiceTable::build(MAX_ROLLS);
        for r in 1..=MAX_ROLLS {
            assert_eq!(table.get(r, 1), 6u64.pow(r) - 5u64.pow(r));
        }
    }

    #[test]
    fn zero_outside_support() {
        let table = DiceTable::build(MAX_ROLLS);
        for r in 1..=MAX_ROLLS {
            assert_eq!(table.get(r, 0), 0);
            if 2 * r > 0 {
                assert_eq!(table.get(r, 2 * r - 1), 0);
            }
            assert_eq!(table.get(r, DICE_SIDES * r + 1), 0);
        }
    }

    #[test]
    fn global_table_is_shared() {
        let a = global() as *const DiceTable;
        let b = global() as *const DiceTable;
        assert_eq!(a, b);
    }
}
