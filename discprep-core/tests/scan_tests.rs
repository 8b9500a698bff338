// discprep-core/tests/scan_tests.rs
//
// Scan output -> titles -> audio selection, through the public API only.

use discprep_core::error::CoreError;
use discprep_core::model::SubtitleFormat;
use discprep_core::scan::parse;
use discprep_core::selection::{AudioPolicy, AudioQuality, score, select_for_title};

fn title_lines(index: u32, duration: &str) -> Vec<String> {
    vec![
        format!(r#"TINFO:{index},2,0,"Heat""#),
        format!(r#"TINFO:{index},9,0,"{duration}""#),
        format!(r#"TINFO:{index},10,0,"25.3 GB""#),
        format!(r#"TINFO:{index},27,0,"title_t{index:02}.mkv""#),
    ]
}

/// An English AC3 5.1 track and an English PGS subtitle, with the language
/// written either in ids 2/3 or in ids 3/4.
fn dialect_lines(shifted: bool) -> Vec<String> {
    let (code_id, name_id) = if shifted { (3, 4) } else { (2, 3) };
    let mut lines = title_lines(0, "2:50:12");
    lines.extend([
        r#"SINFO:0,0,1,6201,"Video""#.to_string(),
        r#"SINFO:0,1,1,6202,"Audio""#.to_string(),
        format!(r#"SINFO:0,1,{code_id},0,"eng""#),
        format!(r#"SINFO:0,1,{name_id},0,"English""#),
        r#"SINFO:0,1,5,0,"A_AC3""#.to_string(),
        r#"SINFO:0,1,13,0,"5.1""#.to_string(),
        r#"SINFO:0,2,1,6203,"Subtitles""#.to_string(),
        format!(r#"SINFO:0,2,{code_id},0,"eng""#),
        format!(r#"SINFO:0,2,{name_id},0,"English""#),
        r#"SINFO:0,2,5,0,"S_HDMV/PGS""#.to_string(),
    ]);
    lines
}

#[test]
fn attribute_dialects_classify_identically() {
    let a = parse(dialect_lines(false)).unwrap();
    let b = parse(dialect_lines(true)).unwrap();
    assert_eq!(a, b);

    let title = &a[0];
    assert_eq!(title.audio_tracks.len(), 1);
    assert_eq!(title.subtitle_tracks.len(), 1);

    let audio = &title.audio_tracks[0];
    assert_eq!(audio.stream_index, 1);
    assert_eq!(audio.language_code, "eng");
    assert_eq!(audio.language_name, "English");
    assert_eq!(audio.channel_format, "5.1 Surround");
    assert!(audio.codec_name.starts_with("Dolby Digital"));

    let sub = &title.subtitle_tracks[0];
    assert_eq!(sub.stream_index, 2);
    assert_eq!(sub.codec_format, SubtitleFormat::Pgs);
}

#[test]
fn title_fields_are_parsed() {
    let titles = parse(title_lines(3, "1:45:00")).unwrap();
    let title = &titles[0];
    assert_eq!(title.title_index, 3);
    assert_eq!(title.name.as_deref(), Some("Heat"));
    assert_eq!(title.duration_seconds, Some(6300));
    assert_eq!(title.size_bytes, Some(25_300_000_000));
    assert_eq!(title.source_file.as_deref(), Some("title_t03.mkv"));
}

#[test]
fn malformed_duration_is_unknown_not_an_error() {
    let titles = parse([r#"TINFO:0,9,0,"about two hours""#]).unwrap();
    assert_eq!(titles[0].duration_seconds, None);
    assert_eq!(titles[0].length.as_deref(), Some("about two hours"));
}

#[test]
fn output_without_titles_is_an_error() {
    let lines = [r#"MSG:5010,0,0,"Failed to open disc""#, "TCOUNT:0"];
    assert!(matches!(parse(lines), Err(CoreError::NoTitlesFound)));
}

#[test]
fn announced_angles_collapse_equal_runtimes() {
    let mut lines = vec![r#"MSG:3025,0,1,"Angle #2 was added for title #1""#.to_string()];
    lines.extend(title_lines(0, "1:00:00"));
    lines.extend(title_lines(1, "1:00:00"));
    lines.extend(title_lines(2, "1:30:00"));

    let titles = parse(&lines).unwrap();
    let kept: Vec<u32> = titles.iter().map(|t| t.title_index).collect();
    assert_eq!(kept, vec![0, 2]);
}

#[test]
fn equal_runtimes_survive_without_angles() {
    let mut lines = title_lines(0, "1:00:00");
    lines.extend(title_lines(1, "1:00:00"));
    lines.extend(title_lines(2, "1:30:00"));
    assert_eq!(parse(&lines).unwrap().len(), 3);
}

fn audio_stream(stream: u32, codec: &str, channels: &str, name: &str) -> Vec<String> {
    vec![
        format!(r#"SINFO:0,{stream},1,6202,"Audio""#),
        format!(r#"SINFO:0,{stream},3,0,"eng""#),
        format!(r#"SINFO:0,{stream},4,0,"English""#),
        format!(r#"SINFO:0,{stream},5,0,"{codec}""#),
        format!(r#"SINFO:0,{stream},13,0,"{channels}""#),
        format!(r#"SINFO:0,{stream},30,0,"{name}""#),
    ]
}

fn three_track_title() -> Vec<String> {
    let mut lines = title_lines(0, "2:00:00");
    lines.extend(audio_stream(1, "A_AC3", "5.1", ""));
    lines.extend(audio_stream(2, "A_EAC3", "7.1", ""));
    lines.extend(audio_stream(3, "A_AAC", "Stereo", ""));
    lines.extend(audio_stream(4, "A_AC3", "Stereo", "Director's Commentary"));
    lines
}

#[test]
fn best_policy_enables_the_highest_scoring_track() {
    let mut title = parse(three_track_title()).unwrap().remove(0);
    let scores: Vec<u32> = title.audio_tracks.iter().take(3).map(score).collect();
    assert_eq!(scores, vec![300, 400, 200]);
    assert!(title.audio_tracks[3].is_commentary);

    select_for_title(&mut title, &AudioPolicy::default());

    let enabled: Vec<u32> = title
        .audio_tracks
        .iter()
        .filter(|t| t.enabled)
        .map(|t| t.stream_index)
        .collect();
    assert_eq!(enabled, vec![2]);
}

#[test]
fn commentary_is_added_when_requested() {
    let mut title = parse(three_track_title()).unwrap().remove(0);
    let policy = AudioPolicy {
        quality: AudioQuality::Best,
        include_commentary: true,
    };
    select_for_title(&mut title, &policy);

    let enabled: Vec<u32> = title
        .audio_tracks
        .iter()
        .filter(|t| t.enabled)
        .map(|t| t.stream_index)
        .collect();
    assert_eq!(enabled, vec![2, 4]);
}

#[test]
fn selection_is_deterministic() {
    let policy = AudioPolicy::default();
    let mut first = parse(three_track_title()).unwrap().remove(0);
    let mut second = first.clone();
    select_for_title(&mut first, &policy);
    select_for_title(&mut second, &policy);
    select_for_title(&mut second, &policy);
    assert_eq!(first, second);
}
