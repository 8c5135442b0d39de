//! Terminal styling utilities

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static FILTER: Emoji<'_, '_> = Emoji("🧹 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ____              ____
    |  _ \ _   _  ___ / ___|  ___ ___  _ __ ___
    | | | | | | |/ _ \\___ \ / __/ _ \| '__/ _ \
    | |_| | |_| | (_) |___) | (_| (_) | | |  __/
    |____/ \__,_|\___/|____/ \___\___/|_|  \___|
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("×").magenta().bold(),
        style("Two targets, one score").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(input: &Path, preset: &str, config: &PipelineConfig, outputs: &[&Path]) {
    let box_width = 60;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!("    │ {:<width$}│", style("⚙️  Configuration").cyan().bold(), width = box_width - 3);
    println!("    ├{}┤", line);
    card_row(FOLDER, "Input", &truncate_path(input, 36), box_width);
    card_row(CHART, "Preset", preset, box_width);
    card_row(
        TARGET,
        "Targets",
        &truncate_string(
            &format!("{} × {}", config.primary_target, config.secondary_target),
            36,
        ),
        box_width,
    );
    for output in outputs {
        card_row(SAVE, "Output", &truncate_path(output, 36), box_width);
    }
    println!("    ├{}┤", line);
    card_row(
        FILTER,
        "Imputation",
        &config
            .imputation
            .map_or("off".to_string(), |k| format!("k-NN, k = {}", k)),
        box_width,
    );
    card_row(
        FILTER,
        "Variance filter",
        &config
            .variance_threshold
            .map_or("off".to_string(), |t| format!("< {}", t)),
        box_width,
    );
    card_row(
        TREE,
        "Importance",
        &format!(
            "{} trees, ref {}",
            config.forest.n_trees, config.reduction_reference
        ),
        box_width,
    );
    card_row(
        TREE,
        "Boosting",
        &format!(
            "{} est, lr {}, depth {}",
            config.evaluation.boosting.n_estimators,
            config.evaluation.boosting.learning_rate,
            config.evaluation.boosting.max_depth
        ),
        box_width,
    );
    card_row(
        CHART,
        "Split",
        &format!(
            "{:.0}% test, seed {}",
            config.evaluation.test_fraction * 100.0,
            config.evaluation.split_seed
        ),
        box_width,
    );
    println!("    └{}┘", line);
    println!();
}

fn card_row(icon: Emoji<'_, '_>, label: &str, value: &str, box_width: usize) {
    let label = format!("{}:", label);
    println!(
        "    │  {}{:<17}{:<width$}│",
        icon,
        label,
        style(value).yellow(),
        width = box_width - 23
    );
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print the elapsed time of a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Scoring complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, threshold_info: Option<&str>) {
    if let Some(info) = threshold_info {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

/// Print a labelled metric value
pub fn print_metric(label: &str, value: f64) {
    println!(
        "      {} {}",
        style(format!("{}:", label)).dim(),
        style(format!("{:.4}", value)).cyan().bold()
    );
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(count - max_len + 3).collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_card_renders_every_preset() {
        let outputs = [Path::new("/tmp/touch_scores.json"), Path::new("/tmp/touch_accuracy.svg")];
        for config in [PipelineConfig::sensor(), PipelineConfig::eeg()] {
            print_config(Path::new("/data/touch.csv"), "sensor", &config, &outputs);
        }
        card_row(TREE, "Importance", "100 trees", 60);
    }

    #[test]
    fn test_truncate_string_keeps_tail() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("/a/very/long/path.csv", 10), "...ath.csv");
    }
}
