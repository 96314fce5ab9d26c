//! A named collection of strategies with a cached pairwise win-rate table.

use std::collections::HashMap;

use rand::Rng;

use crate::config::Ruleset;
use crate::error::SessionError;
use crate::evaluator::Evaluator;
use crate::results::Results;
use crate::strategy::{self, Strategy};
use crate::tournament;

/// Hook for an embedding application's persistence layer. The core calls
/// these after any mutation but performs no filesystem I/O itself; an
/// application wires a concrete implementation in to get autosave behavior.
pub trait SerializationSink {
    fn on_strategies_changed(&mut self, _strategies: &[Strategy]) {}
    fn on_results_changed(&mut self, _results: &Results) {}
    fn on_config_changed(&mut self, _config: &HashMap<String, String>) {}
}

/// A no-op sink, used when a session has nothing wired up.
#[derive(Debug, Default)]
struct NullSink;
impl SerializationSink for NullSink {}

/// A session owns a set of uniquely-named strategies, the rules under which
/// they're evaluated, a string-to-string config map, and an optional cached
/// [`Results`] from the last tournament run.
pub struct Session {
    id: u64,
    ruleset: Ruleset,
    strategies: HashMap<String, Strategy>,
    order: Vec<String>,
    config: HashMap<String, String>,
    results: Option<Results>,
    sink: Box<dyn SerializationSink>,
}

impl Session {
    #[must_use]
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            id: strategy::next_session_id(),
            ruleset,
            strategies: HashMap::new(),
            order: Vec::new(),
            config: HashMap::new(),
            results: None,
            sink: Box::new(NullSink),
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn SerializationSink>) {
        self.sink = sink;
    }

    /// Add an existing, detached strategy under its own id.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyOwned`] if it is owned by a different session.
    pub fn add(&mut self, strat: Strategy) -> Result<(), SessionError> {
        if !strat.attach(self.id) {
            return Err(SessionError::AlreadyOwned(strat.id().to_string()));
        }
        let id = strat.id().to_string();
        if !self.strategies.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.strategies.insert(id, strat);
        self.notify_strategies_changed();
        Ok(())
    }

    /// Create and add a new strategy with every cell set to `fill_value`.
    ///
    /// # Panics
    ///
    /// Panics if `fill_value` is outside `[MIN_ROLLS, MAX_ROLLS]`; callers
    /// that can't guarantee that should build a [`Strategy`] with
    /// [`Strategy::set_const`] directly and handle its `Result`.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyOwned`] if `id` collides with a strategy
    /// already owned by another session.
    pub fn add_new(&mut self, id: impl Into<String>, name: impl Into<String>, fill_value: u32) -> Result<(), SessionError> {
        let mut strat = Strategy::new(id, name);
        strat.set_const(fill_value).expect("fill_value out of range");
        self.add(strat)
    }

    /// Create and add a new strategy with every cell independently random.
    pub fn add_random(&mut self, id: impl Into<String>, name: impl Into<String>, rng: &mut impl Rng) -> Result<(), SessionError> {
        let mut strat = Strategy::new(id, name);
        strat.set_random(rng);
        self.add(strat)
    }

    /// Remove and detach a strategy by id.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownStrategy`] if `id` is not present.
    pub fn remove(&mut self, id: &str) -> Result<Strategy, SessionError> {
        let strat = self.strategies.remove(id).ok_or_else(|| SessionError::UnknownStrategy(id.to_string()))?;
        strat.detach(self.id);
        self.order.retain(|existing| existing != id);
        self.notify_strategies_changed();
        Ok(strat)
    }

    /// Detach and drop every strategy, and discard any cached results.
    pub fn clear(&mut self) {
        for strat in self.strategies.values() {
            strat.detach(self.id);
        }
        self.strategies.clear();
        self.order.clear();
        self.results = None;
        self.notify_strategies_changed();
    }

    /// # Errors
    ///
    /// [`SessionError::UnknownStrategy`] if `id` is not present.
    pub fn get(&self, id: &str) -> Result<&Strategy, SessionError> {
        self.strategies.get(id).ok_or_else(|| SessionError::UnknownStrategy(id.to_string()))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.strategies.contains_key(id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|id| self.strategies[id].name()).collect()
    }

    #[must_use]
    pub fn strategies(&self) -> Vec<&Strategy> {
        self.order.iter().map(|id| &self.strategies[id]).collect()
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.insert(key.into(), value.into());
        self.sink.on_config_changed(&self.config);
    }

    /// # Errors
    ///
    /// [`SessionError::UnknownConfigKey`] if `key` is not present.
    pub fn config(&self, key: &str) -> Result<&str, SessionError> {
        self.config.get(key).map(String::as_str).ok_or_else(|| SessionError::UnknownConfigKey(key.to_string()))
    }

    /// # Errors
    ///
    /// [`SessionError::UnknownStrategy`] if either id is not present.
    pub fn win_rate(&self, a: &str, b: &str) -> Result<f64, SessionError> {
        let (a, b) = (self.get(a)?, self.get(b)?);
        Ok(Evaluator::new(self.ruleset).win_rate(a, b))
    }

    /// # Errors
    ///
    /// [`SessionError::UnknownStrategy`] if either id is not present.
    pub fn win_rate_going_first(&self, a: &str, b: &str) -> Result<f64, SessionError> {
        let (a, b) = (self.get(a)?, self.get(b)?);
        Ok(Evaluator::new(self.ruleset).win_rate_going_first(a, b))
    }

    /// # Errors
    ///
    /// [`SessionError::UnknownStrategy`] if either id is not present.
    pub fn win_rate_going_last(&self, a: &str, b: &str) -> Result<f64, SessionError> {
        let (a, b) = (self.get(a)?, self.get(b)?);
        Ok(Evaluator::new(self.ruleset).win_rate_going_last(a, b))
    }

    /// Run a full round-robin tournament across every strategy currently in
    /// this session, reusing any still-valid entries from the last run.
    pub fn run(&mut self, num_threads: usize) -> &Results {
        let snapshot: Vec<Strategy> = self.strategies().into_iter().cloned().collect();
        let results = tournament::run(self.ruleset, &snapshot, self.results.as_ref(), num_threads);
        self.sink.on_results_changed(&results);
        self.results = Some(results);
        self.results.as_ref().expect("just assigned")
    }

    #[must_use]
    pub fn cached_results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    fn notify_strategies_changed(&mut self) {
        let snapshot: Vec<Strategy> = self.strategies().into_iter().cloned().collect();
        self.sink.on_strategies_changed(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_round_trips() {
        let mut session = Session::new(Ruleset::none());
        session.add_new("a", "Alpha", 4).unwrap();
        assert_eq!(session.get("a").unwrap().name(), "Alpha");
        assert!(session.contains("a"));
    }

    #[test]
    fn adding_an_owned_strategy_to_another_session_fails() {
        let owned_elsewhere = Strategy::new("a", "a");
        assert!(owned_elsewhere.attach(999));

        let mut session = Session::new(Ruleset::none());
        assert!(matches!(session.add(owned_elsewhere), Err(SessionError::AlreadyOwned(_))));
    }

    #[test]
    fn removing_a_strategy_detaches_it_for_reuse_elsewhere() {
        let mut first = Session::new(Ruleset::none());
        first.add_new("a", "a", 4).unwrap();
        let strat = first.remove("a").unwrap();

        let mut second = Session::new(Ruleset::none());
        assert!(second.add(strat).is_ok());
    }

    #[test]
    fn unknown_id_lookup_is_an_error() {
        let session = Session::new(Ruleset::none());
        assert!(matches!(session.get("missing"), Err(SessionError::UnknownStrategy(_))));
    }

    #[test]
    fn clear_detaches_every_strategy() {
        let mut session = Session::new(Ruleset::none());
        session.add_new("a", "a", 4).unwrap();
        session.clear();
        assert!(!session.contains("a"));
        assert!(session.ids().is_empty());
    }

    #[test]
    fn win_rate_is_zero_sum() {
        let mut session = Session::new(Ruleset::none());
        session.add_new("a", "a", 3).unwrap();
        session.add_new("b", "b", 5).unwrap();
        let ab = session.win_rate("a", "b").unwrap();
        let ba = session.win_rate("b", "a").unwrap();
        assert!((ab + ba - 1.0).abs() < 1e-9);
    }

    #[test]
    fn run_populates_and_caches_results() {
        let mut session = Session::new(Ruleset::none());
        session.add_new("a", "a", 3).unwrap();
        session.add_new("b", "b", 5).unwrap();
        session.run(2);
        assert!(session.cached_results().is_some());
    }
}
