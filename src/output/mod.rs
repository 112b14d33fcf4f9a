use anyhow::{Context, Result};
use std::path::Path;

use crate::fetcher::FetchResult;

/// Render a fetch result as two-space indented JSON, non-ASCII kept literal
pub fn format_as_json(result: &FetchResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize fetch result")
}

/// Save fetch result to file
pub fn save_to_file(result: &FetchResult, path: &Path) -> Result<()> {
    let content = format_as_json(result)?;

    fs_err::write(path, content)?;
    Ok(())
}

/// Print fetch result to console
pub fn print_to_console(result: &FetchResult) -> Result<()> {
    let content = format_as_json(result)?;

    println!("{}", content);
    Ok(())
}
