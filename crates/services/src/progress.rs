use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use storage::{KeyValueRepository, StateKey};
use tutor_core::model::{
    ExerciseRecord, ModuleCatalog, ModuleId, ProgressError, ProgressStore, StreakState,
    update_streak,
};
use tutor_core::{Clock, Metrics};

use crate::error::ProgressServiceError;

struct TrackerState {
    progress: ProgressStore,
    streak: StreakState,
}

/// Owns the learner's exercise history and streak, and keeps both persisted.
///
/// Recording, flushing and the streak recompute run under one lock, so callers
/// see them as a single step.
pub struct ProgressTracker {
    clock: Clock,
    catalog: Arc<ModuleCatalog>,
    repo: Arc<dyn KeyValueRepository>,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<ModuleCatalog>,
        repo: Arc<dyn KeyValueRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            repo,
            state: Mutex::new(TrackerState {
                progress: ProgressStore::new(),
                streak: StreakState::default(),
            }),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Hydrate progress and streak from storage, then advance the streak for
    /// the loaded exercise count.
    ///
    /// Unreadable or malformed state is logged and replaced by empty defaults.
    pub async fn load(&self) {
        let mut state = self.state.lock().await;

        match self.repo.get(StateKey::Progress).await {
            Ok(Some(raw)) => match state.progress.hydrate(raw.as_bytes(), &self.catalog) {
                Ok(dropped) => {
                    if !dropped.is_empty() {
                        warn!(?dropped, "ignored progress for modules outside the catalog");
                    }
                }
                Err(err) => warn!(error = %err, "stored progress is malformed, starting empty"),
            },
            Ok(None) => debug!("no stored progress"),
            Err(err) => warn!(error = %err, "failed to read stored progress"),
        }

        match self.repo.get(StateKey::Streak).await {
            Ok(Some(raw)) => match serde_json::from_str::<StreakState>(&raw) {
                Ok(streak) => state.streak = streak,
                Err(err) => warn!(error = %err, "stored streak is malformed, starting at zero"),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to read stored streak"),
        }

        let total = Metrics::new(&state.progress, &self.catalog).total_exercise_count();
        let prior = state.streak;
        state.streak = update_streak(total, self.clock.today(), prior);
        if state.streak != prior
            && let Err(err) = self.flush_streak(state.streak).await
        {
            warn!(error = %err, "failed to store advanced streak");
        }

        info!(
            exercises = total,
            streak = state.streak.count,
            "progress loaded"
        );
    }

    /// Append an exercise, advance the streak, and flush both.
    ///
    /// Returns the streak after the update.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` if the module is not in the
    /// catalog, or `ProgressServiceError::Storage` if flushing fails. In the
    /// latter case the in-memory progress and streak have already been updated.
    pub async fn record_exercise(
        &self,
        id: &ModuleId,
        record: ExerciseRecord,
    ) -> Result<StreakState, ProgressServiceError> {
        let mut state = self.state.lock().await;
        let before = Metrics::new(&state.progress, &self.catalog).total_exercise_count();

        state.progress.record_exercise(&self.catalog, id, record)?;

        let after = Metrics::new(&state.progress, &self.catalog).total_exercise_count();
        let prior = state.streak;
        if after > before {
            state.streak = update_streak(after, self.clock.today(), prior);
        }

        let progress_flushed = self.flush_progress(&state.progress).await;
        let streak_flushed = if state.streak == prior {
            Ok(())
        } else {
            self.flush_streak(state.streak).await
        };
        progress_flushed?;
        streak_flushed?;

        info!(module = %id, total = after, streak = state.streak.count, "exercise recorded");
        Ok(state.streak)
    }

    async fn flush_progress(&self, progress: &ProgressStore) -> Result<(), ProgressServiceError> {
        let blob = String::from_utf8(progress.persist()?)
            .map_err(|e| ProgressError::Serialization(e.to_string()))?;
        self.repo.put(StateKey::Progress, &blob).await?;
        Ok(())
    }

    async fn flush_streak(&self, streak: StreakState) -> Result<(), ProgressServiceError> {
        let blob = serde_json::to_string(&streak)
            .map_err(|e| ProgressError::Serialization(e.to_string()))?;
        self.repo.put(StateKey::Streak, &blob).await?;
        Ok(())
    }

    /// Immutable copy of the current progress.
    pub async fn snapshot(&self) -> ProgressStore {
        self.state.lock().await.progress.snapshot()
    }

    pub async fn streak(&self) -> StreakState {
        self.state.lock().await.streak
    }

    /// Streak as shown today (zero once a day has been missed).
    pub async fn displayed_streak(&self) -> u32 {
        self.state.lock().await.streak.displayed(self.clock.today())
    }

    pub async fn exercise_count(&self, id: &ModuleId) -> usize {
        self.state.lock().await.progress.exercise_count(id.as_str())
    }
}
