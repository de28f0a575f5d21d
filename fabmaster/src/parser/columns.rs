//! Header lookup, unit scaling and lenient field parsing shared by every
//! section processor.

use thiserror::Error;

use super::tokenizer::Row;
use crate::diagnostics::Diagnostics;
use crate::geometry::{ki_round, MAX_COORD};

/// A required header column is absent from a section header row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not find column label {column}")]
pub struct ColumnNotFound {
    pub column: String,
}

/// Internal units (nm) per source unit.
pub const IU_PER_MILS: f64 = 25_400.0;
pub const IU_PER_INCH: f64 = 25_400_000.0;
pub const IU_PER_MM: f64 = 1_000_000.0;
pub const IU_PER_MICRON: f64 = 1_000.0;

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Find `name` in a header row, ignoring case and underscores.
pub fn resolve_column(header: &[String], name: &str) -> Result<usize, ColumnNotFound> {
    let wanted = normalize_label(name);
    header
        .iter()
        .position(|cell| normalize_label(cell) == wanted)
        .ok_or_else(|| ColumnNotFound {
            column: wanted,
        })
}

/// Read the units token from the row following a section header.
///
/// The token sits somewhere in cells 7..=9. A short or unrecognised row falls
/// back to mils with a warning.
pub fn scale_factor(rows: &[Row], units_row: usize, diags: &mut Diagnostics) -> f64 {
    let line = Some(units_row + 1);
    let Some(row) = rows.get(units_row) else {
        diags.warn("missing units row, defaulting to mils", line);
        return IU_PER_MILS;
    };

    let found = row.iter().skip(7).take(3).find_map(|cell| match cell.trim() {
        "MILS" => Some(IU_PER_MILS),
        "MILLIMETERS" => Some(IU_PER_MM),
        "MICRONS" => Some(IU_PER_MICRON),
        "INCHES" => Some(IU_PER_INCH),
        _ => None,
    });

    match found {
        Some(scale) => scale,
        None => {
            diags.warn("could not find units value, defaulting to mils", line);
            IU_PER_MILS
        }
    }
}

/// Parse the longest numeric prefix of `text`; anything unparseable is 0.
pub fn read_double(text: &str) -> f64 {
    try_read_double(text).unwrap_or(0.0)
}

/// Longest finite numeric prefix of `text`, or `None` when there is none.
pub fn try_read_double(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<f64>() {
        return value.is_finite().then_some(value);
    }

    let bytes = text.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut best = 0;
    while end < bytes.len() {
        let b = bytes[end];
        match b {
            b'+' | b'-' if end == 0 || matches!(bytes[end - 1], b'e' | b'E') => {}
            b'0'..=b'9' => {
                seen_digit = true;
                best = end + 1;
            }
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }

    text[..best].parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn read_int(text: &str) -> i64 {
    read_double(text).round() as i64
}

/// Scale a source value into internal units.
///
/// Values beyond the board range are clamped to it.
pub fn scaled(text: &str, scale: f64) -> i64 {
    let value = read_double(text) * scale;
    if value.abs() > MAX_COORD as f64 {
        tracing::warn!("coordinate {} out of range, clamped", text);
    }
    ki_round(value)
}

/// Scale a source Y value into internal units, flipping to Y-down.
pub fn scaled_y(text: &str, scale: f64) -> i64 {
    scaled(text, scale).saturating_neg()
}

/// Cell at `col`, or empty when the row is short.
pub fn cell(row: &Row, col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Cell at an optional column.
pub fn opt_cell(row: &Row, col: Option<usize>) -> &str {
    col.map(|c| cell(row, c)).unwrap_or("")
}

/// Parse an `id seq [subseq]` record tag.
pub fn parse_record_tag(tag: &str) -> Option<(i32, i32, i32)> {
    let mut parts = tag.split_whitespace().map(|p| p.parse::<i32>());
    let id = parts.next()?.ok()?;
    let seq = parts.next()?.ok()?;
    let subseq = match parts.next() {
        Some(Ok(v)) => v,
        Some(Err(_)) => return None,
        None => 0,
    };
    Some((id, seq, subseq))
}
