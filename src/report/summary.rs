//! Run summary table

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::TargetEvaluation;

/// Feature counts, accuracies and stage timings of one run
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub initial_features: usize,
    pub imputed_cells: usize,
    pub dropped_variance: usize,
    /// `(target, features kept)` after the importance filter
    pub retained_by_target: Vec<(String, usize)>,
    pub evaluations: Vec<TargetEvaluation>,
    pub composite_score: Option<f64>,
    pub load_time: Duration,
    pub clean_time: Duration,
    pub variance_time: Duration,
    pub importance_time: Duration,
    pub evaluate_time: Duration,
}

impl PipelineSummary {
    pub fn new(initial_features: usize) -> Self {
        Self {
            initial_features,
            ..Default::default()
        }
    }

    pub fn set_imputed_cells(&mut self, cells: usize) {
        self.imputed_cells = cells;
    }

    pub fn add_variance_drops(&mut self, dropped: &[String]) {
        self.dropped_variance = dropped.len();
    }

    pub fn add_retained(&mut self, target: &str, count: usize) {
        self.retained_by_target.push((target.to_string(), count));
    }

    pub fn add_evaluation(&mut self, evaluation: TargetEvaluation) {
        self.evaluations.push(evaluation);
    }

    pub fn set_composite_score(&mut self, score: f64) {
        self.composite_score = Some(score);
    }

    pub fn total_time(&self) -> Duration {
        self.load_time + self.clean_time + self.variance_time + self.importance_time + self.evaluate_time
    }

    /// Render the summary as a table (without indentation).
    pub fn render_table(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Initial Features"),
            Cell::new(self.initial_features),
        ]);

        if self.imputed_cells > 0 {
            table.add_row(vec![
                Cell::new("🩹 Imputed Cells"),
                Cell::new(self.imputed_cells).fg(Color::Yellow),
            ]);
        }

        table.add_row(vec![
            Cell::new("🗑️  Dropped (Variance)"),
            Cell::new(self.dropped_variance).fg(if self.dropped_variance == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);

        for (target, count) in &self.retained_by_target {
            table.add_row(vec![
                Cell::new(format!("✅ Features for {}", target)),
                Cell::new(count).fg(Color::Green),
            ]);
        }

        for evaluation in &self.evaluations {
            table.add_row(vec![
                Cell::new(format!("🎯 Accuracy ({})", evaluation.target)),
                Cell::new(format!("{:.4}", evaluation.accuracy)).fg(Color::Cyan),
            ]);
        }

        if let Some(score) = self.composite_score {
            table.add_row(vec![
                Cell::new("⭐ Composite Score"),
                Cell::new(format!("{:.4}", score))
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
            ]);
        }

        table.add_row(vec![
            Cell::new("⏱️  Total Time"),
            Cell::new(format_duration(self.total_time())),
        ]);

        table.to_string()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.render_table().lines() {
            println!("    {}", line);
        }

        println!();
        println!(
            "      {} load {} · clean {} · variance {} · importance {} · evaluate {}",
            style("Timing:").dim(),
            format_duration(self.load_time),
            format_duration(self.clean_time),
            format_duration(self.variance_time),
            format_duration(self.importance_time),
            format_duration(self.evaluate_time),
        );
    }
}

/// Format a duration as seconds with two decimals, or milliseconds when short.
pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
