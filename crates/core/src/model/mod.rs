mod catalog;
mod exercise;
mod ids;
mod level;
mod progress;
mod streak;

pub use catalog::{CatalogError, Module, ModuleCatalog};
pub use exercise::ExerciseRecord;
pub use ids::ModuleId;
pub use level::{ExperienceLevel, LevelParseError};
pub use progress::{ModuleProgress, ProgressError, ProgressStore};
pub use streak::{StreakState, update_streak};
