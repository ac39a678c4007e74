//! JSON persistence for learned guard state
//!
//! Tables and the experience model are stored as entry lists since
//! `StateKey` is not a valid JSON object key.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{GuardError, Result};
use crate::core::types::Action;
use crate::guard::model::{ExperienceModel, Outcome};
use crate::guard::q_table::{ActionValues, QTable};
use crate::guard::state::StateKey;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub state: StateKey,
    pub values: ActionValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub state: StateKey,
    pub action: Action,
    pub outcomes: Vec<Outcome>,
}

/// Everything a guard has learned: both tables, the model, and epsilon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub version: u32,
    pub epsilon: f64,
    pub chase: Vec<TableEntry>,
    pub search: Vec<TableEntry>,
    pub model: Vec<ModelEntry>,
}

impl PolicySnapshot {
    pub fn capture(chase: &QTable, search: &QTable, model: &ExperienceModel, epsilon: f64) -> Self {
        let entries = |table: &QTable| {
            table
                .iter()
                .map(|(state, values)| TableEntry {
                    state: *state,
                    values: *values,
                })
                .collect::<Vec<_>>()
        };
        Self {
            version: SNAPSHOT_VERSION,
            epsilon,
            chase: entries(chase),
            search: entries(search),
            model: model
                .entries()
                .map(|(state, action, outcomes)| ModelEntry {
                    state,
                    action,
                    outcomes: outcomes.to_vec(),
                })
                .collect(),
        }
    }

    /// Check the snapshot is loadable: known version, epsilon a probability
    ///
    /// Table rows may carry any mode. Planning replays the shared model
    /// into the active table, and bootstrapping touches the next state's
    /// row, so cross-mode keys are normal after training.
    pub fn validate(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GuardError::SnapshotMismatch(format!(
                "version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(GuardError::SnapshotMismatch(format!(
                "epsilon {} outside [0, 1]",
                self.epsilon
            )));
        }
        Ok(())
    }

    pub fn tables(&self) -> (QTable, QTable) {
        let build = |entries: &[TableEntry]| {
            let mut table = QTable::new();
            for entry in entries {
                table.insert(entry.state, entry.values);
            }
            table
        };
        (build(self.chase.as_slice()), build(self.search.as_slice()))
    }

    pub fn experience(&self) -> ExperienceModel {
        let mut model = ExperienceModel::new();
        for entry in &self.model {
            for outcome in &entry.outcomes {
                model.record(entry.state, entry.action, outcome.next_state, outcome.reward);
            }
        }
        model
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), rows = self.chase.len() + self.search.len(), "saved policy");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::state::Mode;

    fn key(mode: Mode, bucket: u32) -> StateKey {
        StateKey {
            mode,
            visible: mode == Mode::Chase,
            distance_bucket: bucket,
            north: true,
            south: false,
            east: false,
            west: false,
            time_since_seen: 0,
            in_room: false,
        }
    }

    fn sample() -> PolicySnapshot {
        let mut chase = QTable::new();
        chase.update(key(Mode::Chase, 1), Action::Up, 10.0, key(Mode::Chase, 0), 0.7, 0.9);
        let mut search = QTable::new();
        search.update(key(Mode::Search, 3), Action::Left, -1.0, key(Mode::Search, 3), 0.7, 0.9);
        let mut model = ExperienceModel::new();
        model.record(key(Mode::Chase, 1), Action::Up, key(Mode::Chase, 0), 10.0);
        model.record(key(Mode::Chase, 1), Action::Up, key(Mode::Chase, 1), -1.0);
        PolicySnapshot::capture(&chase, &search, &model, 0.5)
    }

    #[test]
    fn test_json_preserves_learning() {
        let snapshot = sample();
        let restored = PolicySnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();

        let (chase, search) = restored.tables();
        assert_eq!(chase.value(&key(Mode::Chase, 1), Action::Up), 7.0);
        assert!((search.value(&key(Mode::Search, 3), Action::Left) + 0.7).abs() < 1e-12);

        let model = restored.experience();
        assert_eq!(model.len(), 1);
        assert_eq!(model.outcomes(&key(Mode::Chase, 1), Action::Up).len(), 2);
        assert_eq!(restored.epsilon, 0.5);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut snapshot = sample();
        snapshot.version = 99;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            PolicySnapshot::from_json(&json),
            Err(GuardError::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_accepts_rows_of_any_mode() {
        let mut snapshot = sample();
        snapshot.chase.push(TableEntry {
            state: key(Mode::Search, 2),
            values: [1.0, 0.0, 0.0, 0.0],
        });
        snapshot.search.push(TableEntry {
            state: key(Mode::Patrol, 4),
            values: [0.0; 4],
        });
        let restored = PolicySnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        let (chase, search) = restored.tables();
        assert_eq!(chase.value(&key(Mode::Search, 2), Action::Up), 1.0);
        assert_eq!(search.len(), 2);
    }

    #[test]
    fn test_garbage_is_a_serde_error() {
        assert!(matches!(
            PolicySnapshot::from_json("{ not json"),
            Err(GuardError::SerdeError(_))
        ));
    }
}
