//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use sauce_harness::{RunResult, TestSuite};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for RunResult {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Status", "Attempts", "Cases", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite_name.clone(),
            if self.passed { "PASSED" } else { "FAILED" }.to_string(),
            self.attempts.to_string(),
            self.cases.len().to_string(),
            format!("{} ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Row for the `validate` listing
#[derive(Debug, Serialize)]
pub struct SuiteOverview {
    pub suite: String,
    pub cases: usize,
    pub expecting_error: usize,
    pub items: usize,
}

impl From<&TestSuite> for SuiteOverview {
    fn from(suite: &TestSuite) -> Self {
        Self {
            suite: suite.name().to_string(),
            cases: suite.len(),
            expecting_error: suite.cases().iter().filter(|c| !c.expects_success()).count(),
            items: suite.cases().iter().map(|c| c.items.len()).sum(),
        }
    }
}

impl TableDisplay for SuiteOverview {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Cases", "Expecting error", "Cart items"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.cases.to_string(),
            self.expecting_error.to_string(),
            self.items.to_string(),
        ]
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("⚠️  {}", message.yellow());
}
