//! Static lookup tables: ISO 639-2 language names and audio codec names.

/// ISO 639-2 (both B and T forms) to English language name.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("eng", "English"),
    ("spa", "Spanish"),
    ("fra", "French"),
    ("fre", "French"),
    ("deu", "German"),
    ("ger", "German"),
    ("ita", "Italian"),
    ("por", "Portuguese"),
    ("rus", "Russian"),
    ("jpn", "Japanese"),
    ("zho", "Chinese"),
    ("chi", "Chinese"),
    ("kor", "Korean"),
    ("ara", "Arabic"),
    ("hin", "Hindi"),
    ("tha", "Thai"),
    ("vie", "Vietnamese"),
    ("pol", "Polish"),
    ("nld", "Dutch"),
    ("dut", "Dutch"),
    ("swe", "Swedish"),
    ("nor", "Norwegian"),
    ("dan", "Danish"),
    ("fin", "Finnish"),
    ("ice", "Icelandic"),
    ("isl", "Icelandic"),
    ("ces", "Czech"),
    ("cze", "Czech"),
    ("hun", "Hungarian"),
    ("tur", "Turkish"),
    ("heb", "Hebrew"),
    ("gre", "Greek"),
    ("ell", "Greek"),
    ("ron", "Romanian"),
    ("rum", "Romanian"),
    ("bul", "Bulgarian"),
    ("hrv", "Croatian"),
    ("slv", "Slovenian"),
    ("srp", "Serbian"),
    ("ukr", "Ukrainian"),
    ("und", "Unknown"),
];

/// MakeMKV audio codec id to display name.
const AUDIO_CODEC_NAMES: &[(&str, &str)] = &[
    ("A_AC3", "Dolby Digital"),
    ("A_EAC3", "Dolby Digital Plus"),
    ("A_TRUEHD", "Dolby TrueHD"),
    ("A_DTS", "DTS"),
    ("A_DTS-HD", "DTS-HD"),
    ("A_DTS-HD.MA", "DTS-HD Master Audio"),
    ("A_DTS-HD.HRA", "DTS-HD High Resolution"),
    ("A_DTS:X", "DTS:X"),
    ("A_AAC", "AAC"),
    ("A_FLAC", "FLAC"),
    ("A_PCM", "PCM"),
    ("A_LPCM", "LPCM"),
    ("A_MP3", "MP3"),
    ("A_VORBIS", "Vorbis"),
    ("A_OPUS", "Opus"),
    ("A_MPEG/L2", "MP2"),
    ("A_MPEG/L3", "MP3"),
];

/// Looks up a language name by code, case-insensitively.
pub fn language_name(code: &str) -> Option<&'static str> {
    let lower = code.to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == lower)
        .map(|(_, name)| *name)
}

/// Looks up a codec display name: exact id first, then the longest table id
/// the codec id starts with (`A_AAC/MPEG4/LC` resolves to "AAC").
pub fn audio_codec_name(codec_id: &str) -> Option<&'static str> {
    let upper = codec_id.to_uppercase();
    if upper.is_empty() {
        return None;
    }
    if let Some((_, name)) = AUDIO_CODEC_NAMES.iter().find(|(id, _)| *id == upper) {
        return Some(name);
    }
    AUDIO_CODEC_NAMES
        .iter()
        .filter(|(id, _)| upper.starts_with(id))
        .max_by_key(|(id, _)| id.len())
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_lookup_accepts_both_forms() {
        assert_eq!(language_name("fre"), Some("French"));
        assert_eq!(language_name("FRA"), Some("French"));
        assert_eq!(language_name("xyz"), None);
    }

    #[test]
    fn codec_lookup_prefers_longest_prefix() {
        assert_eq!(audio_codec_name("A_DTS-HD.MA"), Some("DTS-HD Master Audio"));
        assert_eq!(audio_codec_name("a_truehd"), Some("Dolby TrueHD"));
        assert_eq!(audio_codec_name("A_DTS-HD.MA.EXT"), Some("DTS-HD Master Audio"));
        assert_eq!(audio_codec_name("A_AAC/MPEG4/LC"), Some("AAC"));
        assert_eq!(audio_codec_name("A_WAVPACK"), None);
        assert_eq!(audio_codec_name(""), None);
    }
}
