//! Keyword lists behind the heuristic track flags.
//!
//! Matching is a lowercase substring search over the combined stream text
//! (name, extra info and codec short name). Extend these lists to teach the
//! classifier new spellings.

/// Marks commentary audio or subtitles.
pub const COMMENTARY_KEYWORDS: &[&str] = &["commentary", "comment"];

/// Marks forced subtitles.
pub const FORCED_KEYWORDS: &[&str] = &["forced"];

/// Marks subtitles for the deaf and hard of hearing.
pub const SDH_KEYWORDS: &[&str] = &["sdh", "hearing", "impaired"];

/// Marks object-based (Atmos) audio.
pub const ATMOS_KEYWORDS: &[&str] = &["atmos", "truehd atmos", "dd+ atmos", "dolby atmos"];

/// Returns true if the lowercased `text` contains any keyword.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        assert!(contains_any("Director's COMMENTARY", COMMENTARY_KEYWORDS));
        assert!(contains_any("English (SDH)", SDH_KEYWORDS));
        assert!(contains_any("TrueHD Atmos 7.1", ATMOS_KEYWORDS));
        assert!(!contains_any("English", FORCED_KEYWORDS));
    }
}
