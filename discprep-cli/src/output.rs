//! Terminal presentation helpers: headings, key/value lines, the title table
//! and the review spinner.

use std::fmt::Display;
use std::time::Duration;

use console::style;
use discprep_core::model::Title;
use discprep_core::utils::{format_bytes, format_duration};
use indicatif::{ProgressBar, ProgressStyle};

/// Print a heading with a rule above and below.
pub fn print_heading(text: &str) {
    let line = style("=".repeat(50)).blue();
    println!("\n{line}");
    println!("{}", style(format!(" {text} ")).bold().white());
    println!("{line}\n");
}

/// Print a label/value pair with the label highlighted.
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("{}: {}", style(label).cyan(), value);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

pub fn print_failure(message: &str) {
    println!("{} {}", style("✗").red().bold(), message);
}

/// One line per title followed by its enabled tracks.
pub fn print_titles(titles: &[Title]) {
    for title in titles {
        let duration = title
            .duration_seconds
            .map(format_duration)
            .unwrap_or_else(|| "--:--:--".to_string());
        let size = title
            .size_bytes
            .map(format_bytes)
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{} {}  {}  {}",
            style(format!("Title {:>2}", title.title_index)).bold(),
            duration,
            size,
            style(title.source_file.as_deref().unwrap_or("")).dim()
        );

        for track in &title.audio_tracks {
            let marker = if track.enabled { style("+").green() } else { style("-").dim() };
            let mut label = format!(
                "{} {} ({})",
                track.language_name, track.codec_name, track.language_code
            );
            if track.is_commentary {
                label.push_str(" [commentary]");
            }
            println!("    {marker} audio {:>2}  {label}", track.stream_index);
        }
        for track in &title.subtitle_tracks {
            let mut flags = Vec::new();
            if track.is_forced {
                flags.push("forced");
            }
            if track.is_sdh {
                flags.push("SDH");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            println!(
                "      subs  {:>2}  {} {}{}",
                track.stream_index, track.language_name, track.codec_format, flags
            );
        }
    }
}

/// Spinner shown while waiting for the reviewer.
pub fn review_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
