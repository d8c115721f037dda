use std::sync::Arc;

use tracing::warn;

use storage::{KeyValueRepository, StateKey};
use tutor_core::model::ExperienceLevel;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn KeyValueRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn KeyValueRepository>) -> Self {
        Self { repo }
    }

    /// Load the persisted experience level.
    ///
    /// Missing, unknown or unreadable values fall back to the default level.
    pub async fn load_level(&self) -> ExperienceLevel {
        match self.repo.get(StateKey::ExperienceLevel).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
                warn!(error = %err, "ignoring stored experience level");
                ExperienceLevel::default()
            }),
            Ok(None) => ExperienceLevel::default(),
            Err(err) => {
                warn!(error = %err, "failed to read experience level");
                ExperienceLevel::default()
            }
        }
    }

    /// Persist a new experience level.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn save_level(&self, level: ExperienceLevel) -> Result<(), SettingsServiceError> {
        self.repo
            .put(StateKey::ExperienceLevel, level.as_str())
            .await?;
        Ok(())
    }
}
