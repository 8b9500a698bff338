// ============================================================================
// discprep-core/src/scan/parser.rs
// ============================================================================
//
// SCAN OUTPUT PARSER: MakeMKV Robot-Mode Records
//
// Recognised records (anything else, e.g. MSG/PRGV/CINFO/TCOUNT/DRV, is
// skipped apart from angle announcements):
//
//   TINFO:<title>,<attr>,<code>,"<value>"
//   SINFO:<title>,<stream>,<attr>,<code>,"<value>"
//
// Records may be interleaved across titles and arrive in any order.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ScanSession;
use crate::classify;
use crate::error::{CoreError, CoreResult};
use crate::model::Title;

static TINFO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^TINFO:(\d+),(\d+),(\d+),"(.*)"$"#).expect("valid TINFO regex")
});

static SINFO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^SINFO:(\d+),(\d+),(\d+),(\d+),"(.*)"$"#).expect("valid SINFO regex")
});

static ANGLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)angle\s*#\s*\d+\s+was\s+added\s+for\s+title\s*#\s*\d+")
        .expect("valid angle regex")
});

/// Aggregates scan output into a [`ScanSession`] without interpreting values.
pub fn parse_session<I, S>(lines: I) -> ScanSession
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut session = ScanSession::default();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if ANGLE_RE.is_match(line) {
            log::debug!("Angle announcement: {}", line);
            session.angles_detected = true;
            continue;
        }

        if let Some(caps) = TINFO_RE.captures(line) {
            let (Ok(title), Ok(attr)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
                continue;
            };
            session
                .titles
                .entry(title)
                .or_default()
                .insert(attr, &caps[4]);
            continue;
        }

        if let Some(caps) = SINFO_RE.captures(line) {
            let (Ok(title), Ok(stream), Ok(attr)) = (
                caps[1].parse::<u32>(),
                caps[2].parse::<u32>(),
                caps[3].parse::<u32>(),
            ) else {
                continue;
            };
            session
                .streams
                .entry(title)
                .or_default()
                .entry(stream)
                .or_default()
                .insert(attr, &caps[5]);
        }
    }

    session
}

/// Parses, classifies and angle-deduplicates scan output.
///
/// # Returns
///
/// * `Ok(Vec<Title>)` - Titles in ascending index order
/// * `Err(CoreError::NoTitlesFound)` - If no `TINFO` record was present
pub fn parse<I, S>(lines: I) -> CoreResult<Vec<Title>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let session = parse_session(lines);
    if session.titles.is_empty() {
        return Err(CoreError::NoTitlesFound);
    }

    let titles: Vec<Title> = session.raw_titles().map(|raw| classify::classify(&raw)).collect();
    log::info!("Scan found {} title(s)", titles.len());

    Ok(classify::dedupe_angles(titles, session.angles_detected))
}
