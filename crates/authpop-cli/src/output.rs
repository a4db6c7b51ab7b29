//! Output formatting utilities.

use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Outputs a result in the specified format.
///
/// JSON serializes the whole `value`; table and quiet modes print its `rows`.
/// In quiet mode `quiet_line` picks the one value printed per row.
pub fn output<V, T, F>(
    value: &V,
    rows: &[T],
    format: OutputFormat,
    quiet_line: F,
) -> crate::CliResult<()>
where
    V: Serialize + ?Sized,
    T: Tabled,
    F: Fn(&T) -> &str,
{
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                info("No results found.");
            } else {
                println!("{}", render_table(rows));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Quiet => {
            for row in rows {
                println!("{}", quiet_line(row));
            }
        }
    }
    Ok(())
}

/// Renders rows as a rounded table.
pub fn render_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).with(Style::rounded()).to_string()
}

/// Prompts for a value, returning `current` when the answer is empty.
pub fn prompt(label: &str, current: &str) -> crate::CliResult<String> {
    print!("{label} [{current}]: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    let trimmed = input.trim();
    Ok(if trimmed.is_empty() {
        current.to_string()
    } else {
        trimmed.to_string()
    })
}

/// Prompts for confirmation.
pub fn confirm(message: &str) -> crate::CliResult<bool> {
    print!("{message} [y/N]: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}
