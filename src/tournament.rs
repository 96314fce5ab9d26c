//! Parallel round-robin dispatch: reuse prior results where possible, compute the rest.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::Ruleset;
use crate::evaluator::Evaluator;
use crate::results::Results;
use crate::strategy::Strategy;

/// Run a full round-robin among `strategies` using `ruleset`, reusing any
/// entry from `prior` whose matchup is still valid (same two strategies, by
/// id and byte-identical roll tables), and computing everything else across
/// a pool of `num_threads` workers.
#[must_use]
pub fn run(ruleset: Ruleset, strategies: &[Strategy], prior: Option<&Results>, num_threads: usize) -> Results {
    let snapshot: Vec<Strategy> = strategies.to_vec();
    let n = snapshot.len();

    let old_index_of_new: HashMap<usize, usize> = match prior {
        Some(prior) => snapshot
            .iter()
            .enumerate()
            .filter_map(|(new_idx, s)| {
                let old_idx = prior.index_of(s.id())?;
                if prior.strategies()[old_idx].equals(s) {
                    Some((new_idx, old_idx))
                } else {
                    None
                }
            })
            .collect(),
        None => HashMap::new(),
    };

    let mut results = Results::new(snapshot.clone());
    let mut queued: Vec<(usize, usize)> = Vec::new();

    for i in 0..n {
        for j in 0..i {
            let reused = match (old_index_of_new.get(&i), old_index_of_new.get(&j), prior) {
                (Some(&oi), Some(&oj), Some(prior)) => Some(prior.get(oi, oj)),
                _ => None,
            };
            match reused {
                Some(p) => {
                    log::debug!("tournament: reusing matchup ({i}, {j}) from prior results");
                    results.set(i, j, p);
                }
                None => queued.push((i, j)),
            }
        }
    }

    log::info!("tournament: {} matchups reused, {} queued for {n} strategies", n * n.saturating_sub(1) / 2 - queued.len(), queued.len());

    if !queued.is_empty() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .expect("failed to build tournament thread pool");

        let computed: Vec<(usize, usize, f64)> = pool.install(|| {
            queued
                .par_iter()
                .map(|&(i, j)| {
                    let mut eval = Evaluator::new(ruleset);
                    let wr = eval.win_rate(&snapshot[i], &snapshot[j]);
                    (i, j, wr)
                })
                .collect()
        });

        for (i, j, wr) in computed {
            results.set(i, j, wr);
        }
    }

    log::info!("tournament: dispatch complete");
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_strategy(id: &str, rolls: u32) -> Strategy {
        let mut s = Strategy::new(id, id);
        s.set_const(rolls).unwrap();
        s
    }

    #[test]
    fn full_run_produces_zero_sum_matchups() {
        let strategies = vec![constant_strategy("a", 3), constant_strategy("b", 4), constant_strategy("c", 5)];
        let results = run(Ruleset::none(), &strategies, None, 2);
        for i in 0..3 {
            for j in 0..i {
                assert!((results.get(i, j) + results.get(j, i) - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn rerun_with_identical_strategies_reuses_every_entry() {
        let strategies = vec![constant_strategy("a", 3), constant_strategy("b", 4)];
        let first = run(Ruleset::none(), &strategies, None, 2);
        let second = run(Ruleset::none(), &strategies, Some(&first), 2);
        assert_eq!(first.get(1, 0), second.get(1, 0));
    }

    #[test]
    fn changed_strategy_forces_recompute_of_its_matchups() {
        let strategies = vec![constant_strategy("a", 3), constant_strategy("b", 4)];
        let first = run(Ruleset::none(), &strategies, None, 2);

        let changed = vec![constant_strategy("a", 6), constant_strategy("b", 4)];
        let second = run(Ruleset::none(), &changed, Some(&first), 2);
        assert_ne!(first.get(1, 0), second.get(1, 0));
    }
}
