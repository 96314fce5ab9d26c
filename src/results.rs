//! A round-robin's outcome: a lower-triangular win-probability matrix plus rankings.

use std::fmt;

use crate::config::WIN_EPSILON;
use crate::strategy::Strategy;

/// One entry of [`Results::rankings`]: a strategy index and how many other
/// strategies it beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranking {
    pub index: usize,
    pub wins: usize,
}

/// The outcome of a round-robin tournament among a fixed set of strategies.
///
/// Only the lower triangle (`table[i][0..i]`) is stored; `get` derives the
/// upper triangle and diagonal from it.
#[derive(Debug, Clone)]
pub struct Results {
    strategies: Vec<Strategy>,
    table: Vec<Vec<f64>>,
}

impl Results {
    /// Build an empty results table for `strategies`, all entries unset
    /// (`0.0`). Strategies are stored detached, independent of any session.
    #[must_use]
    pub fn new(strategies: Vec<Strategy>) -> Self {
        let table = (0..strategies.len()).map(|i| vec![0.0; i]).collect();
        Self { strategies, table }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.strategies.iter().map(Strategy::id).collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    /// Index of a strategy by id, if present.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.strategies.iter().position(|s| s.id() == id)
    }

    /// Record the win probability of `i` over `j` (`j < i` required; the
    /// opposite entry is derived, not stored).
    pub(crate) fn set(&mut self, i: usize, j: usize, p: f64) {
        debug_assert!(j < i, "store only the lower triangle: i={i} j={j}");
        self.table[i][j] = p;
    }

    /// Win probability of strategy `i` over strategy `j`. `0.5` on the
    /// diagonal; derived as `1 - get(j, i)` above the diagonal.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        use std::cmp::Ordering;
        match i.cmp(&j) {
            Ordering::Equal => 0.5,
            Ordering::Greater => self.table[i][j],
            Ordering::Less => 1.0 - self.table[j][i],
        }
    }

    /// Whether `i` is a decisive winner over `j`, beyond [`WIN_EPSILON`].
    #[must_use]
    pub fn is_win(&self, i: usize, j: usize) -> bool {
        self.get(i, j) > 0.5 + WIN_EPSILON
    }

    /// Strategies ranked by win count (descending), ties broken by name.
    #[must_use]
    pub fn rankings(&self) -> Vec<Ranking> {
        let mut rankings: Vec<Ranking> = (0..self.len())
            .map(|i| {
                let wins = (0..self.len()).filter(|&j| j != i && self.is_win(i, j)).count();
                Ranking { index: i, wins }
            })
            .collect();
        rankings.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| self.strategies[a.index].name().cmp(self.strategies[b.index].name())));
        rankings
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ranking in self.rankings() {
            writeln!(f, "{:>3} wins  {}", ranking.wins, self.strategies[ranking.index].name())?;
        }
        Ok(())
    }
}
