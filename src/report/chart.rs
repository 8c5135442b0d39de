//! Two-bar accuracy chart
//!
//! The y axis is fixed to [0, 1] and each bar carries its value with two
//! decimals. The chart renders as text for the terminal and as a standalone
//! SVG document.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::{validate_accuracy, PipelineResult, TargetEvaluation};

const BAR_WIDTH: usize = 10;
const GAP: usize = 4;

const SVG_WIDTH: f64 = 420.0;
const SVG_HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 50.0;
const BAR_COLORS: [&str; 2] = ["#4c72b0", "#dd8452"];

/// Accuracy of two targets side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyChart {
    bars: [(String, f64); 2],
}

impl AccuracyChart {
    pub fn new(
        first: (impl Into<String>, f64),
        second: (impl Into<String>, f64),
    ) -> PipelineResult<Self> {
        let first = (first.0.into(), first.1);
        let second = (second.0.into(), second.1);
        validate_accuracy(&first.0, first.1)?;
        validate_accuracy(&second.0, second.1)?;
        Ok(Self {
            bars: [first, second],
        })
    }

    pub fn from_evaluations(evaluations: &[TargetEvaluation; 2]) -> PipelineResult<Self> {
        Self::new(
            (evaluations[0].target.as_str(), evaluations[0].accuracy),
            (evaluations[1].target.as_str(), evaluations[1].accuracy),
        )
    }

    pub fn bars(&self) -> &[(String, f64); 2] {
        &self.bars
    }

    /// Plain-text rendering, `height` rows tall above the axis.
    pub fn render_text(&self, height: usize) -> Vec<String> {
        let height = height.max(2);
        let filled: Vec<usize> = self
            .bars
            .iter()
            .map(|(_, acc)| (acc * height as f64).round() as usize)
            .collect();

        let mut lines = Vec::with_capacity(height + 3);
        for level in (1..=height + 1).rev() {
            let axis = if level == height + 1 {
                "     ".to_string()
            } else if level == height {
                format!("{:.2}", 1.0)
            } else if level == height.div_ceil(2) {
                format!("{:.2}", level as f64 / height as f64)
            } else {
                "    ".to_string()
            };

            let mut line = format!("{:>5} │", axis.trim_end());
            for (i, (_, acc)) in self.bars.iter().enumerate() {
                line.push_str(&" ".repeat(GAP));
                let cell = if filled[i] >= level {
                    "█".repeat(BAR_WIDTH)
                } else if filled[i] + 1 == level {
                    format!("{:^width$}", format!("{:.2}", acc), width = BAR_WIDTH)
                } else {
                    " ".repeat(BAR_WIDTH)
                };
                line.push_str(&cell);
            }
            lines.push(line.trim_end().to_string());
        }

        let axis_len = 2 * (GAP + BAR_WIDTH) + GAP;
        lines.push(format!("{:>5} └{}", "0.00", "─".repeat(axis_len)));

        let mut labels = " ".repeat(7);
        for (name, _) in &self.bars {
            labels.push_str(&" ".repeat(GAP));
            labels.push_str(&format!(
                "{:^width$}",
                truncate_label(name, BAR_WIDTH),
                width = BAR_WIDTH
            ));
        }
        lines.push(labels.trim_end().to_string());
        lines
    }

    /// Print the chart to the terminal with colored bars.
    pub fn display(&self) {
        println!();
        for line in self.render_text(10) {
            println!("    {}", style(line).cyan());
        }
        println!();
    }

    /// Standalone SVG document for the chart.
    pub fn to_svg(&self) -> String {
        let plot_w = SVG_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = SVG_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let y_of = |v: f64| MARGIN_TOP + plot_h * (1.0 - v);
        let slot = plot_w / 2.0;
        let bar_w = slot * 0.5;

        let mut lines: Vec<String> = Vec::new();
        lines.push(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = SVG_WIDTH,
            h = SVG_HEIGHT
        ));
        lines.push(r#"  <rect width="100%" height="100%" fill="white"/>"#.to_string());

        for tick in 0..=4 {
            let v = tick as f64 * 0.25;
            let y = y_of(v);
            lines.push(format!(
                r##"  <line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#dddddd"/>"##,
                x1 = MARGIN_LEFT,
                x2 = SVG_WIDTH - MARGIN_RIGHT,
            ));
            lines.push(format!(
                r#"  <text x="{x}" y="{y:.1}" font-size="12" text-anchor="end" dominant-baseline="middle">{v:.2}</text>"#,
                x = MARGIN_LEFT - 8.0,
            ));
        }

        for (i, (name, acc)) in self.bars.iter().enumerate() {
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            let top = y_of(*acc);
            lines.push(format!(
                r#"  <rect x="{x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{h:.1}" fill="{color}"/>"#,
                h = plot_h * acc,
                color = BAR_COLORS[i],
            ));
            lines.push(format!(
                r#"  <text x="{cx:.1}" y="{ty:.1}" font-size="13" text-anchor="middle">{acc:.2}</text>"#,
                cx = x + bar_w / 2.0,
                ty = top - 6.0,
            ));
            lines.push(format!(
                r#"  <text x="{cx:.1}" y="{ly:.1}" font-size="13" text-anchor="middle">{label}</text>"#,
                cx = x + bar_w / 2.0,
                ly = SVG_HEIGHT - MARGIN_BOTTOM + 20.0,
                label = escape_xml(name),
            ));
        }

        lines.push(format!(
            r#"  <line x1="{x}" y1="{top}" x2="{x}" y2="{bottom}" stroke="black"/>"#,
            x = MARGIN_LEFT,
            top = MARGIN_TOP,
            bottom = SVG_HEIGHT - MARGIN_BOTTOM,
        ));
        lines.push(format!(
            r#"  <line x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="black"/>"#,
            x1 = MARGIN_LEFT,
            x2 = SVG_WIDTH - MARGIN_RIGHT,
            y = SVG_HEIGHT - MARGIN_BOTTOM,
        ));
        lines.push(format!(
            r#"  <text x="16" y="{y:.1}" font-size="13" text-anchor="middle" transform="rotate(-90 16 {y:.1})">Accuracy</text>"#,
            y = MARGIN_TOP + plot_h / 2.0,
        ));
        lines.push("</svg>".to_string());
        let mut svg = lines.join("\n");
        svg.push('\n');
        svg
    }

    pub fn write_svg(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_svg())
            .with_context(|| format!("Failed to write accuracy chart to {}", path.display()))
    }
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_chars - 1).collect();
        format!("{}…", head)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
