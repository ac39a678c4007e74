//! Learned transition model for Dyna-Q planning
//!
//! Every real update appends its observed outcome. Planning replays
//! uniformly sampled outcomes through the Q-update rule without touching
//! the environment.

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::Action;
use crate::guard::state::StateKey;

/// One recorded outcome of taking an action in a state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub next_state: StateKey,
    pub reward: f64,
}

/// A full replayable transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: StateKey,
    pub action: Action,
    pub next_state: StateKey,
    pub reward: f64,
}

/// Append-only map from (state, action) to observed outcomes
#[derive(Debug, Clone, Default)]
pub struct ExperienceModel {
    outcomes: AHashMap<(StateKey, Action), Vec<Outcome>>,
    /// Keys in first-recorded order so sampling is reproducible
    keys: Vec<(StateKey, Action)>,
}

impl ExperienceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, state: StateKey, action: Action, next_state: StateKey, reward: f64) {
        let outcome = Outcome { next_state, reward };
        match self.outcomes.get_mut(&(state, action)) {
            Some(list) => list.push(outcome),
            None => {
                self.keys.push((state, action));
                self.outcomes.insert((state, action), vec![outcome]);
            }
        }
    }

    /// Uniform key, then uniform outcome for that key. `None` when empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Transition> {
        if self.keys.is_empty() {
            return None;
        }
        let (state, action) = self.keys[rng.gen_range(0..self.keys.len())];
        let list = self.outcomes.get(&(state, action))?;
        let outcome = list[rng.gen_range(0..list.len())];
        Some(Transition {
            state,
            action,
            next_state: outcome.next_state,
            reward: outcome.reward,
        })
    }

    pub fn outcomes(&self, state: &StateKey, action: Action) -> &[Outcome] {
        self.outcomes
            .get(&(*state, action))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, state: &StateKey, action: Action) -> bool {
        self.outcomes.contains_key(&(*state, action))
    }

    /// Number of distinct (state, action) pairs
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries in first-recorded order
    pub fn entries(&self) -> impl Iterator<Item = (StateKey, Action, &[Outcome])> + '_ {
        self.keys
            .iter()
            .map(move |&(s, a)| (s, a, self.outcomes(&s, a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::state::Mode;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn key(bucket: u32) -> StateKey {
        StateKey {
            mode: Mode::Search,
            visible: false,
            distance_bucket: bucket,
            north: false,
            south: true,
            east: false,
            west: false,
            time_since_seen: 3,
            in_room: true,
        }
    }

    #[test]
    fn test_empty_model_samples_nothing() {
        let model = ExperienceModel::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(model.sample(&mut rng).is_none());
    }

    #[test]
    fn test_outcomes_are_appended() {
        let mut model = ExperienceModel::new();
        model.record(key(1), Action::Up, key(2), -1.0);
        model.record(key(1), Action::Up, key(3), 5.0);
        model.record(key(2), Action::Left, key(2), -1.0);

        assert_eq!(model.len(), 2);
        assert_eq!(model.outcomes(&key(1), Action::Up).len(), 2);
        assert_eq!(model.outcomes(&key(1), Action::Up)[1].reward, 5.0);
        assert!(model.outcomes(&key(4), Action::Up).is_empty());
    }

    #[test]
    fn test_samples_only_recorded_pairs() {
        let mut model = ExperienceModel::new();
        model.record(key(1), Action::Up, key(2), -1.0);
        model.record(key(2), Action::Right, key(3), 20.0);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            let t = model.sample(&mut rng).unwrap();
            assert!(model.contains(&t.state, t.action));
            assert!(model
                .outcomes(&t.state, t.action)
                .iter()
                .any(|o| o.next_state == t.next_state && o.reward == t.reward));
        }
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut model = ExperienceModel::new();
        model.record(key(3), Action::Down, key(1), 0.0);
        model.record(key(1), Action::Up, key(1), 0.0);
        let order: Vec<u32> = model.entries().map(|(s, _, _)| s.distance_bucket).collect();
        assert_eq!(order, vec![3, 1]);
    }
}
