use crate::error::EngineError;
use crate::selection::{IndexPicker, SelectionPolicy};
use crate::sequence::RateSequence;
use crate::storage::{self, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Running,
    Stopped,
}

/// The frozen result of a catch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Catch {
    pub value: f64,
    pub index: usize,
    pub new_best: bool,
}

/// Status change caused by an engine call. The host arms or cancels its
/// cycle timer from this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Stopped(Catch),
    Resumed,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineOptions {
    pub policy: SelectionPolicy,
    pub initial_index: usize,
    /// Seed for the random policy. `None` draws from entropy.
    pub seed: Option<u64>,
}

/// The catch-the-rate state machine.
///
/// `Running --catch--> Stopped --reset--> Running`; `advance` only moves the
/// active index while running. The best value never decreases and is written
/// to the store only when it strictly improves.
pub struct RateGameEngine {
    sequence: RateSequence,
    picker: IndexPicker,
    initial_index: usize,
    active_index: usize,
    status: Status,
    caught: Option<Catch>,
    best: Option<f64>,
    store: Box<dyn KeyValueStore>,
}

impl RateGameEngine {
    /// Build an engine, loading the persisted best from `store`.
    pub fn new(
        sequence: RateSequence,
        store: Box<dyn KeyValueStore>,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let persisted = storage::load_best(store.as_ref());
        Self::with_best(sequence, persisted, store, options)
    }

    /// Build an engine with an already-known persisted best.
    pub fn with_best(
        sequence: RateSequence,
        persisted_best: Option<f64>,
        store: Box<dyn KeyValueStore>,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        if options.initial_index >= sequence.len() {
            return Err(EngineError::InvalidConfig(format!(
                "initial index {} is out of range for {} rates",
                options.initial_index,
                sequence.len()
            )));
        }
        tracing::debug!(
            rates = sequence.len(),
            policy = %options.policy,
            initial_index = options.initial_index,
            best = ?persisted_best,
            "engine ready"
        );
        Ok(Self {
            sequence,
            picker: IndexPicker::new(options.policy, options.seed),
            initial_index: options.initial_index,
            active_index: options.initial_index,
            status: Status::Running,
            caught: None,
            best: persisted_best.filter(|b| b.is_finite()),
            store,
        })
    }

    /// Move to the next index under the configured policy.
    pub fn advance(&mut self) -> Result<usize, EngineError> {
        if self.status == Status::Stopped {
            return Err(EngineError::InvalidState {
                operation: "advance",
                status: self.status,
            });
        }
        self.active_index = self.picker.next(self.active_index, self.sequence.len());
        Ok(self.active_index)
    }

    /// Freeze the active rate. A second call while stopped changes nothing.
    pub fn catch(&mut self) -> Transition {
        if self.status == Status::Stopped {
            return Transition::Unchanged;
        }

        let index = self.active_index;
        let value = self.active_value();
        let new_best = self.best.map_or(true, |best| value > best);

        self.status = Status::Stopped;
        let caught = Catch {
            value,
            index,
            new_best,
        };
        self.caught = Some(caught);

        if new_best {
            self.best = Some(value);
            self.persist_best(value);
        }
        tracing::info!(value, index, new_best, "rate caught");

        Transition::Stopped(caught)
    }

    /// Back to running at the initial index. The best value is kept.
    pub fn reset(&mut self) -> Transition {
        let was_stopped = self.status == Status::Stopped;
        self.status = Status::Running;
        self.caught = None;
        self.active_index = self.initial_index;
        if was_stopped {
            tracing::debug!("round reset");
            Transition::Resumed
        } else {
            Transition::Unchanged
        }
    }

    fn persist_best(&mut self, value: f64) {
        // In-memory best stays authoritative whether or not this lands.
        storage::write_best(self.store.as_mut(), value);
    }

    pub fn sequence(&self) -> &RateSequence {
        &self.sequence
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.picker.policy()
    }

    pub fn initial_index(&self) -> usize {
        self.initial_index
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_value(&self) -> f64 {
        self.sequence.values()[self.active_index]
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn caught(&self) -> Option<Catch> {
        self.caught
    }

    pub fn caught_value(&self) -> Option<f64> {
        self.caught.map(|c| c.value)
    }

    pub fn caught_index(&self) -> Option<usize> {
        self.caught.map(|c| c.index)
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best
    }
}

impl std::fmt::Debug for RateGameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGameEngine")
            .field("rates", &self.sequence.len())
            .field("policy", &self.picker.policy())
            .field("active_index", &self.active_index)
            .field("status", &self.status)
            .field("caught", &self.caught)
            .field("best", &self.best)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, UnavailableStore, BEST_KEY};
    use assert_matches::assert_matches;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn sequential(initial_index: usize) -> EngineOptions {
        EngineOptions {
            policy: SelectionPolicy::Sequential,
            initial_index,
            seed: None,
        }
    }

    fn engine_with(values: Vec<f64>, store: &MemoryStore, options: EngineOptions) -> RateGameEngine {
        RateGameEngine::new(
            RateSequence::new(values).unwrap(),
            Box::new(store.clone()),
            options,
        )
        .unwrap()
    }

    #[test]
    fn starts_running_with_nothing_caught() {
        let engine = engine_with(vec![0.1, 0.5], &MemoryStore::new(), sequential(1));
        assert_eq!(engine.status(), Status::Running);
        assert_eq!(engine.active_index(), 1);
        assert_eq!(engine.caught_value(), None);
        assert_eq!(engine.caught_index(), None);
        assert_eq!(engine.best_value(), None);
    }

    #[test]
    fn initial_index_out_of_range_is_invalid_config() {
        let result = RateGameEngine::new(
            RateSequence::new(vec![1.0, 2.0]).unwrap(),
            Box::new(MemoryStore::new()),
            sequential(2),
        );
        assert_matches!(result, Err(EngineError::InvalidConfig(_)));
    }

    #[test]
    fn sequential_advance_wraps_for_every_call_count() {
        for len in 1..6usize {
            for initial in 0..len {
                let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
                let mut engine = engine_with(values, &MemoryStore::new(), sequential(initial));
                for calls in 1..=(3 * len) {
                    let idx = engine.advance().unwrap();
                    assert_eq!(idx, (initial + calls) % len);
                    assert_eq!(engine.active_index(), idx);
                }
            }
        }
    }

    #[test]
    fn random_advance_is_seeded_and_in_range() {
        let options = EngineOptions {
            policy: SelectionPolicy::Random,
            initial_index: 0,
            seed: Some(99),
        };
        let values = RateSequence::classic().values().to_vec();
        let mut a = engine_with(values.clone(), &MemoryStore::new(), options);
        let mut b = engine_with(values, &MemoryStore::new(), options);
        for _ in 0..100 {
            let idx = a.advance().unwrap();
            assert!(idx < 31);
            assert_eq!(idx, b.advance().unwrap());
        }
    }

    #[test]
    fn advance_while_stopped_is_invalid_state() {
        let mut engine = engine_with(vec![1.0, 2.0, 3.0], &MemoryStore::new(), sequential(0));
        engine.advance().unwrap();
        engine.catch();
        assert_matches!(
            engine.advance(),
            Err(EngineError::InvalidState {
                operation: "advance",
                status: Status::Stopped
            })
        );
        assert_eq!(engine.active_index(), 1);
    }

    #[test]
    fn catch_is_idempotent() {
        let store = MemoryStore::new();
        let mut engine = engine_with(vec![0.1, 0.5, 1.0], &store, sequential(1));

        let first = engine.catch();
        let snapshot = (engine.caught_value(), engine.caught_index(), engine.best_value());
        let second = engine.catch();

        assert_matches!(first, Transition::Stopped(Catch { index: 1, new_best: true, .. }));
        assert_eq!(second, Transition::Unchanged);
        assert_eq!(
            (engine.caught_value(), engine.caught_index(), engine.best_value()),
            snapshot
        );
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn reset_after_catch_keeps_best() {
        let mut engine = engine_with(vec![0.1, 0.5, 1.0], &MemoryStore::new(), sequential(0));
        engine.advance().unwrap();
        engine.catch();
        assert_eq!(engine.reset(), Transition::Resumed);
        assert_eq!(engine.status(), Status::Running);
        assert_eq!(engine.caught_value(), None);
        assert_eq!(engine.caught_index(), None);
        assert_eq!(engine.active_index(), 0);
        assert_eq!(engine.best_value(), Some(0.5));
    }

    #[test]
    fn reset_while_running_rewinds_without_transition() {
        let mut engine = engine_with(vec![0.1, 0.5, 1.0], &MemoryStore::new(), sequential(0));
        engine.advance().unwrap();
        assert_eq!(engine.reset(), Transition::Unchanged);
        assert_eq!(engine.active_index(), 0);
        assert!(engine.is_running());
    }

    #[test]
    fn full_round_scenario() {
        let store = MemoryStore::new();
        let mut engine = engine_with(vec![0.1, 0.5, 1.0], &store, sequential(0));

        engine.advance().unwrap();
        engine.advance().unwrap();
        assert_eq!(engine.active_index(), 2);

        engine.catch();
        assert_eq!(engine.caught_value(), Some(1.0));
        assert_eq!(engine.best_value(), Some(1.0));
        assert_eq!(store.value(BEST_KEY), Some("1".to_string()));

        engine.reset();
        assert_eq!(engine.status(), Status::Running);
        assert_eq!(engine.caught_value(), None);
        assert_eq!(engine.active_index(), 0);
        assert_eq!(engine.best_value(), Some(1.0));
    }

    #[test]
    fn persisted_best_is_reported_before_any_catch() {
        let store = MemoryStore::with_entry(BEST_KEY, "3.5");
        let engine = engine_with(vec![0.1, 0.5], &store, sequential(0));
        assert_eq!(engine.best_value(), Some(3.5));
    }

    #[test]
    fn lower_catch_neither_regresses_nor_writes() {
        let store = MemoryStore::with_entry(BEST_KEY, "1");
        let mut engine = engine_with(vec![0.1, 0.5, 1.0], &store, sequential(0));

        let transition = engine.catch();

        assert_matches!(transition, Transition::Stopped(Catch { value, new_best: false, .. }) if value == 0.1);
        assert_eq!(engine.best_value(), Some(1.0));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn equal_catch_is_not_a_new_best() {
        let store = MemoryStore::with_entry(BEST_KEY, "0.5");
        let mut engine = engine_with(vec![0.5], &store, sequential(0));
        assert_matches!(engine.catch(), Transition::Stopped(Catch { new_best: false, .. }));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn malformed_persisted_best_defaults_to_absent() {
        let store = MemoryStore::with_entry(BEST_KEY, "not a number");
        let mut engine = engine_with(vec![0.1], &store, sequential(0));
        assert_eq!(engine.best_value(), None);

        engine.catch();
        assert_eq!(engine.best_value(), Some(0.1));
        assert_eq!(store.value(BEST_KEY), Some("0.1".to_string()));
    }

    #[test]
    fn gameplay_survives_unavailable_storage() {
        let mut engine = RateGameEngine::new(
            RateSequence::new(vec![2.0, 4.0]).unwrap(),
            Box::new(UnavailableStore::new("disk gone")),
            sequential(0),
        )
        .unwrap();
        assert_eq!(engine.best_value(), None);

        engine.advance().unwrap();
        assert_matches!(engine.catch(), Transition::Stopped(Catch { new_best: true, .. }));
        assert_eq!(engine.best_value(), Some(4.0));

        engine.reset();
        engine.catch();
        assert_eq!(engine.best_value(), Some(4.0));
    }

    #[test]
    fn best_tracks_running_maximum_over_random_play() {
        let values = vec![0.7, 3.2, 0.1, 9.9, 4.4, 2.0];
        let store = MemoryStore::with_entry(BEST_KEY, "1.5");
        let mut engine = engine_with(
            values,
            &store,
            EngineOptions {
                policy: SelectionPolicy::Random,
                initial_index: 0,
                seed: Some(2024),
            },
        );
        let mut driver = StdRng::seed_from_u64(5);
        let mut expected = 1.5_f64;
        let mut previous = engine.best_value();

        for _ in 0..200 {
            match driver.gen_range(0..3) {
                0 => {
                    let _ = engine.advance();
                }
                1 => {
                    if let Transition::Stopped(caught) = engine.catch() {
                        expected = expected.max(caught.value);
                    }
                }
                _ => {
                    engine.reset();
                }
            }
            let best = engine.best_value().unwrap();
            assert!(best >= previous.unwrap());
            assert_eq!(best, expected);
            previous = Some(best);
        }
        assert_eq!(
            store.value(BEST_KEY).map(|v| v.parse::<f64>().unwrap()),
            Some(expected)
        );
    }
}
