// Colored terminal output for posteriors, run reports, and precision curves.
//
// main.rs delegates all display formatting here.

use colored::Colorize;

use crate::model::{CorpusStats, RunReport, WordProbabilities};
use crate::places::models::Place;

/// Display the ranked words of one place.
pub fn display_posterior(title: &str, posterior: &WordProbabilities) {
    println!("\n{}", format!("=== {} ===", title).bold());
    if posterior.is_empty() {
        println!("  {}", "(no words)".dimmed());
        return;
    }

    let bar_width: usize = 20;
    for (rank, (word, p)) in posterior.ranked().into_iter().enumerate() {
        let filled = (p * bar_width as f64).round() as usize;
        let bar = format!(
            "[{}{}]",
            "=".repeat(filled.min(bar_width)),
            " ".repeat(bar_width.saturating_sub(filled))
        );
        let bar = if rank == 0 { bar.green() } else { bar.dimmed() };
        println!("  {:<24} {} {:.3}", word, bar, p);
    }
}

/// Display the top core word of each place, up to `limit` rows.
pub fn display_core_words<'a>(
    places: impl IntoIterator<Item = (&'a Place, &'a WordProbabilities)>,
    limit: usize,
) {
    println!(
        "\n  {:>8}  {:<40} {:<20} {:>6}",
        "Id".dimmed(),
        "Title".dimmed(),
        "Core word".dimmed(),
        "P".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for (place, posterior) in places.into_iter().take(limit) {
        let (word, p) = posterior.top().unwrap_or(("-", 0.0));
        println!(
            "  {:>8}  {:<40} {:<20} {:>6.3}",
            place.id,
            super::truncate_chars(&place.title, 37),
            colorize_probability(word, p),
            p,
        );
    }
    println!();
}

/// Display the outcome of an EM run.
pub fn display_run_report(report: &RunReport) {
    let status = if report.converged {
        "converged".green()
    } else {
        "step cap reached".yellow()
    };
    println!(
        "Model {}: {} after {} step(s), max delta {:.2e}",
        report.model.to_string().bold(),
        status,
        report.steps,
        report.final_delta
    );
    if report.tied_places > 0 {
        println!(
            "  {} place(s) end with their top two words tied; tied words rank in title order",
            report.tied_places.to_string().yellow()
        );
    }
}

/// Display a precision curve as a table.
pub fn display_precision_curve(curve: &[(usize, f64)]) {
    println!("\n{}", "=== Precision ===".bold());
    println!("  {:>8}  {:>9}", "Samples".dimmed(), "Precision".dimmed());
    for (size, precision) in curve {
        println!(
            "  {:>8}  {:>9}",
            size,
            colorize_probability(&format!("{precision:.3}"), *precision)
        );
    }
    println!();
}

/// Display corpus statistics.
pub fn display_stats(stats: &CorpusStats) {
    println!("Places: {}", stats.places);
    println!(
        "Vocabulary: {} words ({} occurrences)",
        stats.vocabulary, stats.occurrences
    );
    println!(
        "Tiles: {} ({} places without a tile)",
        stats.tiles, stats.untiled_places
    );
}

fn colorize_probability(text: &str, p: f64) -> colored::ColoredString {
    match p {
        p if p >= 0.75 => text.green().bold(),
        p if p >= 0.5 => text.green(),
        p if p >= 0.25 => text.yellow(),
        _ => text.dimmed(),
    }
}
