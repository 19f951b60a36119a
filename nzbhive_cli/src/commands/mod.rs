pub mod decode;
pub mod indexers;
pub mod search;
pub mod stats;

use nzbhive_core::error::SearchError;

pub type Result<T> = std::result::Result<T, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Search(#[from] SearchError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Render a byte count the way indexers report them (binary multiples).
pub fn human_size(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const KB: f64 = 1024.0;

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Parse a `1.5GB` / `700 MB` style argument into bytes.
pub fn parse_size_arg(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| CommandError::InvalidInput(format!("size without a unit: {trimmed}")))?;
    let (value, unit) = trimmed.split_at(split);
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidInput(format!("unparseable size: {trimmed}")))?;

    let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
        "KB" => 1024.0,
        "MB" => 1024.0 * 1024.0,
        "GB" => 1024.0 * 1024.0 * 1024.0,
        "TB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "B" => 1.0,
        other => {
            return Err(CommandError::InvalidInput(format!(
                "unknown size unit: {other}"
            )))
        }
    };
    Ok((value * multiplier).round() as u64)
}
