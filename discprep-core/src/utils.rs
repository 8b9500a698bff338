//! Utility functions for parsing and formatting scanner values and names.
//!
//! This module provides general-purpose helpers used throughout the
//! discprep-core library: duration and size parsing for MakeMKV attribute
//! values, byte/duration formatting for logs, and filename helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})$").expect("valid duration regex"));

static SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([\d.]+)\s*([KMGTP])(i?)B$").expect("valid size regex")
});

/// Parses a scanner duration like "01:46:20" into seconds.
///
/// Returns `None` for anything that is not `H+:MM:SS`; a malformed duration is
/// an unknown value, not an error.
#[must_use]
pub fn parse_duration_to_seconds(value: &str) -> Option<u64> {
    let caps = DURATION_RE.captures(value.trim())?;
    let hours: u64 = caps[1].parse().ok()?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)
}

/// Parses a scanner size like "4.3 GB" or "12.5 GiB" into bytes.
///
/// SI units (`KB`..`PB`) use powers of 1000, IEC units (`KiB`..`PiB`) powers
/// of 1024. The result is rounded to the nearest byte. Unrecognised units or
/// numbers yield `None`.
#[must_use]
pub fn parse_size_to_bytes(value: &str) -> Option<u64> {
    let caps = SIZE_RE.captures(value.trim())?;
    let number: f64 = caps[1].parse().ok()?;
    let base: f64 = if caps[3].is_empty() { 1000.0 } else { 1024.0 };
    let exponent = match caps[2].to_ascii_uppercase().as_str() {
        "K" => 1,
        "M" => 2,
        "G" => 3,
        "T" => 4,
        "P" => 5,
        _ => return None,
    };
    let bytes = number * base.powi(exponent);
    if !bytes.is_finite() || bytes < 0.0 {
        return None;
    }
    Some(bytes.round() as u64)
}

/// Formats seconds as HH:MM:SS (e.g., 3725 -> "01:02:05").
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Removes characters that are not allowed in file names on common platforms.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turns a volume label like "THE_MATRIX_DISC_1" into a search-friendly
/// title guess ("The Matrix").
#[must_use]
pub fn normalize_volume_title(volume: &str) -> String {
    let spaced = volume.replace(['_', '-'], " ");
    let mut title = spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ");

    for suffix in [" Disc 1", " Disc 2", " Disc 3", " Blu Ray", " Dvd"] {
        title = title.replace(suffix, "");
    }
    title.trim().to_string()
}
