//! Terminal Presenter
//!
//! Prints the ranked view as a plain-text table or as a JSON array.

use std::io::{self, Write};
use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{Category, ScoredToken};
use crate::ports::Presenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonFrame<'a> {
    query: &'a str,
    tokens: &'a [ScoredToken],
}

pub struct TablePresenter {
    format: OutputFormat,
}

impl TablePresenter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a view into a string (text or JSON)
    pub fn format_view(&self, view: &[ScoredToken], query: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&JsonFrame { query, tokens: view })
                .unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e)),
            OutputFormat::Text => format_table(view, query),
        }
    }
}

impl Presenter for TablePresenter {
    fn render(&self, view: &[ScoredToken], query: &str) {
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", self.format_view(view, query)) {
            tracing::warn!("Failed to write ranked view: {}", e);
        }
    }
}

fn format_table(view: &[ScoredToken], query: &str) -> String {
    let mut lines = Vec::with_capacity(view.len() + 3);

    if !query.trim().is_empty() {
        lines.push(format!("Filter: \"{}\" ({} matches)", query.trim(), view.len()));
    }
    if view.is_empty() {
        lines.push("No tokens to display".to_string());
        return lines.join("\n");
    }

    lines.push(format!(
        "{:>4}  {:<10} {:<22} {:>14} {:>8} {:>8} {:>8} {:>10} {:>10}",
        "#", "SYMBOL", "NAME", "PRICE", "1H %", "24H %", "DONE %", "MOMENTUM", "VOLUME"
    ));

    for (i, token) in view.iter().enumerate() {
        let snap = &token.snapshot;
        let marker = if token.highlighted { "*" } else { " " };
        lines.push(format!(
            "{:>3}{} {} {:<9} {:<22} {:>14} {:>8} {:>8} {:>8.1} {:>10.3} {:>10}",
            i + 1,
            marker,
            arrow(token.category),
            truncate(&snap.symbol, 9),
            truncate(&snap.display_name, 22),
            format_price(snap.price),
            format_change(snap.change_pct_1h),
            format_change(snap.change_pct_24h),
            token.completion_pct,
            token.momentum_score,
            format_volume(snap.volume_24h),
        ));
    }

    lines.join("\n")
}

fn arrow(category: Category) -> &'static str {
    match category {
        Category::Pumping => "+",
        Category::Dumping => "-",
        Category::Neutral => "=",
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("{:.2}", price)
    } else if price >= 0.0001 {
        format!("{:.6}", price)
    } else {
        format!("{:.3e}", price)
    }
}

fn format_change(change: Option<f64>) -> String {
    match change {
        Some(c) => format!("{:+.2}", c),
        None => "-".to_string(),
    }
}

fn format_volume(volume: f64) -> String {
    if volume >= 1e9 {
        format!("{:.2}B", volume / 1e9)
    } else if volume >= 1e6 {
        format!("{:.2}M", volume / 1e6)
    } else if volume >= 1e3 {
        format!("{:.1}K", volume / 1e3)
    } else {
        format!("{:.0}", volume)
    }
}
