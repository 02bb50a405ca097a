//! Output formatting utilities
//!
//! Output format selection, table styling and coloured informational lines.

use crate::error::{BlobscoutError, Result};
use clap::ValueEnum;
use crossterm::style::{Color as CrosstermColor, Stylize};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style},
    Table,
};

/// Output format options
#[derive(Debug, Clone, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tree,
    Table,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = BlobscoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(BlobscoutError::invalid_argument(format!(
                "Unknown output format '{other}'. Expected tree, table, json or yaml"
            ))),
        }
    }
}

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub warning: CrosstermColor,
    pub error: CrosstermColor,
    pub info: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            warning: CrosstermColor::Yellow,
            error: CrosstermColor::Red,
            info: CrosstermColor::Cyan,
        }
    }
}

/// Display utilities for informational lines
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
}

impl DisplayUtils {
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
        }
    }

    fn styled(&self, symbol: &str, message: &str, color: CrosstermColor) -> String {
        if self.no_color {
            format!("{} {}", symbol, message)
        } else {
            format!("{} {}", symbol, message.with(color))
        }
    }

    /// Print an info message to stderr, keeping stdout for documents
    pub fn print_notice(&self, message: &str) {
        eprintln!("{}", self.styled("ℹ", message, self.theme.info));
    }

    pub fn print_warning(&self, message: &str) {
        eprintln!("{}", self.styled("⚠", message, self.theme.warning));
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{}", self.styled("✗", message, self.theme.error));
    }
}

/// Convenience function for formatting a table with default settings
pub fn format_table(mut table: Table, no_color: bool) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Padding::new(1, 1, 0, 0));

    if !no_color {
        table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
    }

    table.to_string()
}
