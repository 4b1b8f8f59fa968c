//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::domain::models::{FinalStatus, Severity};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Borderless list table with upper-cased headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Health percentage colored by threshold.
pub fn health_cell(health: u32, minimum_passing: u32) -> Cell {
    let color = if health >= 100 {
        Color::Green
    } else if health >= minimum_passing {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{health}%")).fg(color)
}

/// Health percentage styled for inline text.
pub fn styled_health(health: u32, minimum_passing: u32) -> String {
    let text = style(format!("{health}%")).bold();
    if health >= 100 {
        text.green().to_string()
    } else if health >= minimum_passing {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

pub fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::Yellow,
        Severity::Medium => Color::Cyan,
    };
    Cell::new(severity.as_str()).fg(color)
}

pub fn styled_status(status: FinalStatus) -> String {
    match status {
        FinalStatus::Success => style(status.as_str()).green().bold().to_string(),
        FinalStatus::Acceptable => style(status.as_str()).yellow().bold().to_string(),
        FinalStatus::MaxIterationsReached | FinalStatus::Error => {
            style(status.as_str()).red().bold().to_string()
        }
    }
}

/// `$1,234,567` style dollar formatting.
pub fn dollars(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}

pub fn heading(text: &str) -> String {
    style(text).bold().underlined().to_string()
}
