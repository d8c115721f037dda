use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::catalog::ModuleCatalog;
use crate::model::exercise::ExerciseRecord;
use crate::model::ids::ModuleId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unknown module: {0}")]
    UnknownModule(ModuleId),

    #[error("malformed progress data: {0}")]
    Malformed(String),

    #[error("failed to serialize progress: {0}")]
    Serialization(String),
}

//
// ─── MODULE PROGRESS ───────────────────────────────────────────────────────────
//

/// Exercise history for one module, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgress {
    #[serde(default)]
    pub exercises: Vec<ExerciseRecord>,
    #[serde(default, with = "date_or_empty")]
    pub last_activity: Option<NaiveDate>,
}

impl ModuleProgress {
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    /// Scores that count toward averages, in completion order.
    pub fn valid_scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.exercises.iter().filter_map(ExerciseRecord::score_value)
    }
}

//
// ─── PROGRESS STORE ────────────────────────────────────────────────────────────
//

/// Module id → exercise history. Absent modules read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressStore {
    modules: BTreeMap<ModuleId, ModuleProgress>,
}

impl ProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` to the module's history and bump its last activity.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownModule` if `id` is not in `catalog`.
    pub fn record_exercise(
        &mut self,
        catalog: &ModuleCatalog,
        id: &ModuleId,
        record: ExerciseRecord,
    ) -> Result<(), ProgressError> {
        if !catalog.contains(id.as_str()) {
            return Err(ProgressError::UnknownModule(id.clone()));
        }
        let entry = self.modules.entry(id.clone()).or_default();
        entry.last_activity = Some(record.date);
        entry.exercises.push(record);
        Ok(())
    }

    #[must_use]
    pub fn module(&self, id: &str) -> Option<&ModuleProgress> {
        self.modules.get(id)
    }

    #[must_use]
    pub fn exercise_count(&self, id: &str) -> usize {
        self.module(id).map_or(0, ModuleProgress::exercise_count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &ModuleProgress)> {
        self.modules.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.values().all(|m| m.exercises.is_empty())
    }

    /// Immutable copy for read-only aggregation.
    #[must_use]
    pub fn snapshot(&self) -> ProgressStore {
        self.clone()
    }

    /// Replace the contents with the persisted blob.
    ///
    /// Entries for modules outside `catalog` are dropped and their ids returned.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Malformed` if `bytes` is not a valid progress
    /// blob. The store is left unchanged in that case.
    pub fn hydrate(
        &mut self,
        bytes: &[u8],
        catalog: &ModuleCatalog,
    ) -> Result<Vec<ModuleId>, ProgressError> {
        let parsed: BTreeMap<ModuleId, ModuleProgress> =
            serde_json::from_slice(bytes).map_err(|e| ProgressError::Malformed(e.to_string()))?;

        let mut dropped = Vec::new();
        let modules = parsed
            .into_iter()
            .filter(|(id, _)| {
                let known = catalog.contains(id.as_str());
                if !known {
                    dropped.push(id.clone());
                }
                known
            })
            .collect();
        self.modules = modules;
        Ok(dropped)
    }

    /// Serialize the full store as a JSON object keyed by module id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Serialization` if encoding fails.
    pub fn persist(&self) -> Result<Vec<u8>, ProgressError> {
        serde_json::to_vec(&self.modules).map_err(|e| ProgressError::Serialization(e.to_string()))
    }
}

/// Serde adapter for dates persisted as `YYYY-MM-DD` or `""` when unset.
pub(crate) mod date_or_empty {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(trimmed, FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
