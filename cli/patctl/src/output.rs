//! Output formatting for CLI commands.

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

const CLI_SCHEMA_VERSION: &str = "pat.cli.v1";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Print data in the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No items found.".dimmed());
            } else {
                let table = Table::new(data).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            println!("{}", format_json(data, "[]"));
        }
    }
}

/// Print a single item as JSON, wrapped in the schema envelope.
pub fn print_single<T: Serialize>(data: &T) {
    println!("{}", format_json(data, "{}"));
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

fn format_json<T: Serialize + ?Sized>(data: &T, fallback: &str) -> String {
    let value = serde_json::to_value(data).unwrap_or_else(|_| serde_json::json!({}));
    serde_json::to_string_pretty(&wrap_with_schema(value)).unwrap_or_else(|_| fallback.to_string())
}

fn wrap_with_schema(value: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "schemaVersion": CLI_SCHEMA_VERSION,
        "data": value
    })
}
