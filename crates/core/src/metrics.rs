//! Derived learning statistics.
//!
//! Everything here is a pure function of a progress snapshot and the module
//! catalog. Malformed scores are filtered out, never reported.

use chrono::NaiveDate;

use crate::model::{ExerciseRecord, Module, ModuleCatalog, ModuleId, ModuleProgress, ProgressStore};

/// Progress awarded per completed exercise, in percent.
pub const PERCENT_PER_EXERCISE: usize = 20;

/// Read-only view over a progress snapshot and its catalog.
#[derive(Debug, Clone, Copy)]
pub struct Metrics<'a> {
    progress: &'a ProgressStore,
    catalog: &'a ModuleCatalog,
}

/// One dashboard row for a module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSummary<'a> {
    pub module: &'a Module,
    pub exercise_count: usize,
    pub progress_percent: u8,
    pub average_score: f64,
    pub last_activity: Option<NaiveDate>,
}

/// An exercise tagged with the module it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem<'a> {
    pub module_id: &'a ModuleId,
    pub record: &'a ExerciseRecord,
}

impl<'a> Metrics<'a> {
    #[must_use]
    pub fn new(progress: &'a ProgressStore, catalog: &'a ModuleCatalog) -> Self {
        Self { progress, catalog }
    }

    fn module(&self, id: &str) -> Option<&'a ModuleProgress> {
        self.progress.module(id)
    }

    /// `min(count * 20, 100)`; zero for absent or empty modules.
    #[must_use]
    pub fn module_progress_percent(&self, id: &str) -> u8 {
        let count = self.progress.exercise_count(id);
        let percent = count.saturating_mul(PERCENT_PER_EXERCISE).min(100);
        u8::try_from(percent).unwrap_or(100)
    }

    /// Mean of the module's valid scores, or zero when it has none.
    #[must_use]
    pub fn module_average_score(&self, id: &str) -> f64 {
        self.module(id).map_or(0.0, |m| mean(m.valid_scores()))
    }

    #[must_use]
    pub fn total_exercise_count(&self) -> usize {
        self.catalog
            .iter()
            .map(|m| self.progress.exercise_count(m.id().as_str()))
            .sum()
    }

    /// Mean of every valid score across the catalog, not weighted by module.
    #[must_use]
    pub fn overall_average_score(&self) -> f64 {
        mean(
            self.catalog
                .iter()
                .filter_map(|m| self.module(m.id().as_str()))
                .flat_map(ModuleProgress::valid_scores),
        )
    }

    #[must_use]
    pub fn modules_completed_count(&self) -> usize {
        self.catalog
            .iter()
            .filter(|m| self.module_progress_percent(m.id().as_str()) == 100)
            .count()
    }

    /// Mean module progress across the whole catalog, rounded.
    #[must_use]
    pub fn overall_progress_percent(&self) -> u8 {
        if self.catalog.is_empty() {
            return 0;
        }
        let sum: u32 = self
            .catalog
            .iter()
            .map(|m| u32::from(self.module_progress_percent(m.id().as_str())))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let avg = f64::from(sum) / self.catalog.len() as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = avg.round() as u8;
        rounded
    }

    /// Module with the strictly greatest average; the earliest wins ties.
    #[must_use]
    pub fn strongest_module(&self) -> Option<&'a Module> {
        let mut best: Option<(&Module, f64)> = None;
        for module in self.catalog.iter() {
            let avg = self.module_average_score(module.id().as_str());
            if avg > best.map_or(0.0, |(_, s)| s) {
                best = Some((module, avg));
            }
        }
        best.map(|(m, _)| m)
    }

    /// Module with the smallest positive average.
    ///
    /// Modules without valid scores are skipped rather than counted as weakest.
    #[must_use]
    pub fn weakest_module(&self) -> Option<&'a Module> {
        let mut worst: Option<(&Module, f64)> = None;
        for module in self.catalog.iter() {
            let avg = self.module_average_score(module.id().as_str());
            if avg > 0.0 && avg < worst.map_or(f64::INFINITY, |(_, s)| s) {
                worst = Some((module, avg));
            }
        }
        worst.map(|(m, _)| m)
    }

    /// Least-progressed module; the earliest wins ties.
    #[must_use]
    pub fn recommended_module(&self) -> Option<&'a Module> {
        let mut lowest: Option<(&Module, u8)> = None;
        for module in self.catalog.iter() {
            let percent = self.module_progress_percent(module.id().as_str());
            if lowest.is_none_or(|(_, p)| percent < p) {
                lowest = Some((module, percent));
            }
        }
        lowest.map(|(m, _)| m)
    }

    #[must_use]
    pub fn module_summary(&self, id: &str) -> Option<ModuleSummary<'a>> {
        let module = self.catalog.get(id)?;
        Some(ModuleSummary {
            module,
            exercise_count: self.progress.exercise_count(id),
            progress_percent: self.module_progress_percent(id),
            average_score: self.module_average_score(id),
            last_activity: self.module(id).and_then(|m| m.last_activity),
        })
    }

    /// Every exercise in the catalog, newest date first.
    ///
    /// Exercises sharing a date keep catalog-then-append order.
    #[must_use]
    pub fn recent_activity(&self) -> Vec<ActivityItem<'a>> {
        let mut items: Vec<ActivityItem<'a>> = self
            .catalog
            .iter()
            .filter_map(|m| self.module(m.id().as_str()).map(|p| (m.id(), p)))
            .flat_map(|(module_id, progress)| {
                progress
                    .exercises
                    .iter()
                    .map(move |record| ActivityItem { module_id, record })
            })
            .collect();
        items.sort_by(|a, b| b.record.date.cmp(&a.record.date));
        items
    }
}

fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = scores.fold((0.0, 0_u32), |(sum, count), s| (sum + s, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(ids: &[&str]) -> ModuleCatalog {
        ModuleCatalog::new(
            ids.iter()
                .map(|id| Module::new(*id, id.to_uppercase(), "").unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn add(store: &mut ProgressStore, catalog: &ModuleCatalog, id: &str, score: &str, d: u32) {
        let record = ExerciseRecord::new(score, "", day(d), id, "");
        store
            .record_exercise(catalog, &ModuleId::new(id), record)
            .unwrap();
    }

    #[test]
    fn progress_percent_caps_at_one_hundred() {
        let catalog = catalog(&["a"]);
        let mut store = ProgressStore::new();
        for n in 0..7 {
            let percent = Metrics::new(&store, &catalog).module_progress_percent("a");
            assert_eq!(usize::from(percent), (n * 20).min(100));
            add(&mut store, &catalog, "a", "5", 1);
        }
        assert_eq!(Metrics::new(&store, &catalog).module_progress_percent("missing"), 0);
    }

    #[test]
    fn overall_average_ignores_invalid_scores() {
        let catalog = catalog(&["a", "b"]);
        let mut store = ProgressStore::new();
        assert_eq!(Metrics::new(&store, &catalog).overall_average_score(), 0.0);

        add(&mut store, &catalog, "a", "8", 1);
        assert_eq!(Metrics::new(&store, &catalog).overall_average_score(), 8.0);

        add(&mut store, &catalog, "b", "0", 2);
        add(&mut store, &catalog, "b", "n/a", 2);
        let metrics = Metrics::new(&store, &catalog);
        assert_eq!(metrics.overall_average_score(), 8.0);
        assert_eq!(metrics.module_average_score("b"), 0.0);
        assert_eq!(metrics.total_exercise_count(), 3);
    }

    #[test]
    fn overall_average_is_flattened_not_module_weighted() {
        let catalog = catalog(&["a", "b"]);
        let mut store = ProgressStore::new();
        add(&mut store, &catalog, "a", "10", 1);
        add(&mut store, &catalog, "a", "10", 1);
        add(&mut store, &catalog, "b", "4", 1);
        let avg = Metrics::new(&store, &catalog).overall_average_score();
        assert!((avg - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recommends_least_progressed_module() {
        let catalog = catalog(&["a", "b", "c"]);
        let mut store = ProgressStore::new();
        for _ in 0..2 {
            add(&mut store, &catalog, "a", "6", 1);
        }
        for _ in 0..5 {
            add(&mut store, &catalog, "c", "6", 1);
        }
        let metrics = Metrics::new(&store, &catalog);
        assert_eq!(metrics.recommended_module().map(|m| m.id().as_str()), Some("b"));
        assert_eq!(metrics.modules_completed_count(), 1);
        // (40 + 0 + 100) / 3 = 46.67
        assert_eq!(metrics.overall_progress_percent(), 47);
    }

    #[test]
    fn recommended_ties_go_to_catalog_order() {
        let catalog = catalog(&["x", "y"]);
        let store = ProgressStore::new();
        let metrics = Metrics::new(&store, &catalog);
        assert_eq!(metrics.recommended_module().map(|m| m.id().as_str()), Some("x"));
        assert!(Metrics::new(&store, &ModuleCatalog::new(vec![]).unwrap())
            .recommended_module()
            .is_none());
    }

    #[test]
    fn weakest_skips_modules_without_valid_scores() {
        let catalog = catalog(&["d", "e"]);
        let mut store = ProgressStore::new();
        add(&mut store, &catalog, "d", "0", 1);
        add(&mut store, &catalog, "e", "2", 1);
        add(&mut store, &catalog, "e", "4", 1);
        let metrics = Metrics::new(&store, &catalog);
        assert_eq!(metrics.weakest_module().map(|m| m.id().as_str()), Some("e"));
        assert_eq!(metrics.strongest_module().map(|m| m.id().as_str()), Some("e"));
    }

    #[test]
    fn strongest_and_weakest_are_none_without_scores() {
        let catalog = catalog(&["a", "b"]);
        let store = ProgressStore::new();
        let metrics = Metrics::new(&store, &catalog);
        assert!(metrics.strongest_module().is_none());
        assert!(metrics.weakest_module().is_none());
    }

    #[test]
    fn strongest_ties_keep_first_module() {
        let catalog = catalog(&["a", "b", "c"]);
        let mut store = ProgressStore::new();
        add(&mut store, &catalog, "a", "6", 1);
        add(&mut store, &catalog, "b", "9", 1);
        add(&mut store, &catalog, "c", "9", 1);
        let metrics = Metrics::new(&store, &catalog);
        assert_eq!(metrics.strongest_module().map(|m| m.id().as_str()), Some("b"));
        assert_eq!(metrics.weakest_module().map(|m| m.id().as_str()), Some("a"));
    }

    #[test]
    fn recent_activity_is_newest_first() {
        let catalog = catalog(&["a", "b"]);
        let mut store = ProgressStore::new();
        add(&mut store, &catalog, "a", "6", 3);
        add(&mut store, &catalog, "a", "7", 1);
        add(&mut store, &catalog, "b", "8", 2);
        let metrics = Metrics::new(&store, &catalog);
        let dates: Vec<u32> = metrics
            .recent_activity()
            .iter()
            .map(|item| chrono::Datelike::day(&item.record.date))
            .collect();
        assert_eq!(dates, [3, 2, 1]);

        let summary = metrics.module_summary("a").unwrap();
        assert_eq!(summary.exercise_count, 2);
        assert_eq!(summary.progress_percent, 40);
        assert_eq!(summary.last_activity, Some(day(1)));
    }
}
