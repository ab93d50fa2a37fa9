///! Output formatting for CLI
///!
///! Unified output formatting across all CLI commands.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        }
    }
}

/// Print rows as a table, or the raw items as JSON/YAML
pub fn print_output<T, R>(items: &[T], format: OutputFormat, row: impl Fn(&T) -> R) -> anyhow::Result<()>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => print_table(items.iter().map(row).collect()),
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Yaml => print_yaml(&items)?,
    }
    Ok(())
}

/// Print a single item; tables fall back to `detail`
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat, detail: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print!("{}", detail(data)),
        OutputFormat::Json => print_json(data)?,
        OutputFormat::Yaml => print_yaml(data)?,
    }
    Ok(())
}

/// Print data as a table using the tabled crate
pub fn print_table<T: Tabled>(data: Vec<T>) {
    if data.is_empty() {
        println!("{}", "No results found".yellow());
        return;
    }

    let table = Table::new(data);
    println!("{}", table);
}

/// Print data as pretty-printed JSON
pub fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    println!("{}", yaml);
    Ok(())
}

/// Print a success message with green checkmark
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a success message for resource creation
pub fn print_created(resource_type: &str, namespace: &str, name: &str) {
    println!(
        "{} {} '{}' created in namespace {}",
        "✓".green().bold(),
        resource_type.green(),
        name.green().bold(),
        namespace.dimmed()
    );
}

/// Print a success message for resource deletion
pub fn print_deleted(resource_type: &str, namespace: &str, name: &str) {
    println!(
        "{} {} '{}/{}' deleted",
        "✓".green().bold(),
        resource_type.green(),
        namespace,
        name.green().bold()
    );
}

/// Print an info message with blue i
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message with yellow triangle
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Age of a resource relative to `now` (e.g. "45s", "5m", "2h", "3d")
pub fn format_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else {
        return "-".to_string();
    };

    let secs = (now - created).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}
