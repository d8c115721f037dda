use services::AppServices;
use tutor_core::Metrics;

const RECENT_LIMIT: usize = 5;

pub async fn print(services: &AppServices) {
    let catalog = services.catalog();
    let progress = services.progress();
    let snapshot = progress.snapshot().await;
    let streak = progress.displayed_streak().await;
    let level = services.settings().load_level().await;
    let metrics = Metrics::new(&snapshot, &catalog);

    println!("PM Interview Tutor ({level})");
    println!();
    println!("  Overall progress   {:>3}%", metrics.overall_progress_percent());
    println!("  Exercises          {:>4}", metrics.total_exercise_count());
    println!("  Average score      {:>4.1}", metrics.overall_average_score());
    println!(
        "  Modules completed  {:>4} / {}",
        metrics.modules_completed_count(),
        catalog.len()
    );
    println!("  Day streak         {streak:>4}");
    println!();

    println!("Modules");
    for module in catalog.iter() {
        let Some(summary) = metrics.module_summary(module.id().as_str()) else {
            continue;
        };
        let last = summary
            .last_activity
            .map_or_else(|| "-".to_owned(), |d| d.format("%Y-%m-%d").to_string());
        println!(
            "  {:<26} {:>3}%  {:>2} done  avg {:>4.1}  last {last}",
            module.name(),
            summary.progress_percent,
            summary.exercise_count,
            summary.average_score,
        );
    }
    println!();

    if let Some(module) = metrics.strongest_module() {
        println!("  Strongest:   {}", module.name());
    }
    if let Some(module) = metrics.weakest_module() {
        println!("  Weakest:     {}", module.name());
    }
    if let Some(module) = metrics.recommended_module() {
        println!("  Recommended: {} ({})", module.name(), module.description());
    }

    let recent = metrics.recent_activity();
    if recent.is_empty() {
        println!();
        println!("No exercises yet. Run `tutor` to start practicing.");
        return;
    }
    println!();
    println!("Recent activity");
    for item in recent.iter().take(RECENT_LIMIT) {
        let record = item.record;
        println!(
            "  {}  {:<26} #{:<3} score {}",
            record.date.format("%Y-%m-%d"),
            record.topic,
            record.exercise_number,
            record.score,
        );
    }
}
