//! Tabular action values keyed by `StateKey`

use ahash::AHashMap;

use crate::core::types::Action;
use crate::guard::state::StateKey;

/// Action-value vector, indexed by `Action::index`
pub type ActionValues = [f64; Action::COUNT];

/// One step of the tabular Q-learning rule
///
/// `Q(s,a) <- (1 - alpha) * Q(s,a) + alpha * (r + gamma * max_a' Q(s',a'))`
pub fn q_update(old: f64, reward: f64, max_future: f64, alpha: f64, gamma: f64) -> f64 {
    (1.0 - alpha) * old + alpha * (reward + gamma * max_future)
}

/// Index of the largest value, lowest index on ties
pub fn argmax(values: &ActionValues) -> Action {
    let mut best = 0;
    for i in 1..values.len() {
        if values[i] > values[best] {
            best = i;
        }
    }
    Action::ALL[best]
}

/// Q-table with lazily zero-initialised rows
#[derive(Debug, Clone, Default)]
pub struct QTable {
    rows: AHashMap<StateKey, ActionValues>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-insert the zero vector for `key`
    pub fn row_mut(&mut self, key: StateKey) -> &mut ActionValues {
        self.rows.entry(key).or_insert([0.0; Action::COUNT])
    }

    /// Values for `key`, zeros if never seen; does not insert
    pub fn values(&self, key: &StateKey) -> ActionValues {
        self.rows.get(key).copied().unwrap_or([0.0; Action::COUNT])
    }

    pub fn value(&self, key: &StateKey, action: Action) -> f64 {
        self.values(key)[action.index()]
    }

    pub fn max_value(&mut self, key: StateKey) -> f64 {
        self.row_mut(key).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn best_action(&mut self, key: StateKey) -> Action {
        argmax(self.row_mut(key))
    }

    /// Apply the update rule in place and return the new value
    pub fn update(
        &mut self,
        state: StateKey,
        action: Action,
        reward: f64,
        next_state: StateKey,
        alpha: f64,
        gamma: f64,
    ) -> f64 {
        let max_future = self.max_value(next_state);
        let slot = &mut self.row_mut(state)[action.index()];
        *slot = q_update(*slot, reward, max_future, alpha, gamma);
        *slot
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.rows.iter()
    }

    pub fn insert(&mut self, key: StateKey, values: ActionValues) {
        self.rows.insert(key, values);
    }
}
