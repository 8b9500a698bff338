// discprep-core/tests/handoff_tests.rs

mod common;

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::{MockStore, StatusReply};
use discprep_core::error::CoreError;
use discprep_core::fingerprint::{DiscFingerprint, Resolution};
use discprep_core::handoff::MetadataHandoff;
use discprep_core::model::{AudioTrack, DiscType, MovieIdentity, Title};
use discprep_core::selection::AudioPolicy;
use discprep_core::store::PublishOutcome;
use tempfile::tempdir;

const POLL: Duration = Duration::from_millis(1);

fn fp() -> DiscFingerprint {
    DiscFingerprint::from("ab".repeat(32))
}

fn heat() -> MovieIdentity {
    MovieIdentity {
        title: "Heat".into(),
        year: "1995".into(),
        imdb_id: Some("tt0113277".into()),
    }
}

fn audio(stream_index: u32, channels: &str) -> AudioTrack {
    AudioTrack {
        stream_index,
        language_code: "eng".into(),
        language_name: "English".into(),
        codec_id: "A_AC3".into(),
        codec_name: format!("Dolby Digital {channels}"),
        channel_format: channels.into(),
        name: String::new(),
        is_atmos: false,
        is_commentary: false,
        is_default: false,
        enabled: true,
        dynamic_range: None,
    }
}

fn title(index: u32, audio_tracks: Vec<AudioTrack>) -> Title {
    Title {
        title_index: index,
        name: Some("Heat".into()),
        length: Some("2:50:12".into()),
        duration_seconds: Some(10212),
        size: None,
        size_bytes: None,
        source_file: Some(format!("{index:05}.mpls")),
        audio_tracks,
        subtitle_tracks: Vec::new(),
    }
}

#[test]
fn publishing_twice_reports_already_exists() {
    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);

    assert_eq!(handoff.publish(&fp(), &heat()).unwrap(), PublishOutcome::Created);
    assert_eq!(handoff.publish(&fp(), &heat()).unwrap(), PublishOutcome::AlreadyExists);
    assert_eq!(store.layouts.borrow().len(), 1);
}

#[test]
fn items_are_posted_once() {
    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);
    let titles = vec![title(0, vec![audio(1, "5.1")]), title(1, Vec::new())];

    let first = handoff.publish_items(&fp(), &titles);
    assert_eq!(first.created, 2);
    assert!(!first.skipped);

    let second = handoff.publish_items(&fp(), &titles);
    assert!(second.skipped);
    assert_eq!(store.items_for(fp().as_str()).len(), 2);
}

#[test]
fn existing_items_are_detected_before_scanning() {
    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);
    assert!(!handoff.items_exist(&fp()));

    handoff.publish_items(&fp(), &[title(0, Vec::new())]);
    assert!(handoff.items_exist(&fp()));
}

#[test]
fn new_disc_is_registered_and_returned() {
    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);

    let record = handoff
        .register_disc(&fp(), &Resolution::New, "HEAT", DiscType::BluRay, &heat())
        .unwrap()
        .unwrap();
    assert_eq!(record.id, Some(1));
    assert_eq!(record.title.as_deref(), Some("Heat"));
    assert_eq!(record.imdb_id.as_deref(), Some("tt0113277"));
}

#[test]
fn ready_poll_survives_transient_failures() {
    let store = MockStore::new();
    store.script_status(&[
        StatusReply::Pending,
        StatusReply::Unavailable,
        StatusReply::ServerError,
        StatusReply::Pending,
        StatusReply::Ready,
    ]);
    let handoff = MetadataHandoff::new(&store, POLL);
    let cancel = AtomicBool::new(false);

    let mut statuses = Vec::new();
    handoff
        .await_ready(&fp(), &cancel, |poll, status| {
            statuses.push((poll, status.map(str::to_string)))
        })
        .unwrap();

    assert_eq!(store.status_polls.get(), 5);
    assert_eq!(statuses.len(), 5);
    assert_eq!(statuses[1], (2, None));
    assert_eq!(statuses[4], (5, Some("ready".to_string())));
}

#[test]
fn ready_poll_waits_out_throttling_and_proxy_pages() {
    let store = MockStore::new();
    store.script_status(&[StatusReply::Throttled, StatusReply::Garbled, StatusReply::Ready]);
    let handoff = MetadataHandoff::new(&store, POLL);
    let cancel = AtomicBool::new(false);

    handoff.await_ready(&fp(), &cancel, |_, _| {}).unwrap();
    assert_eq!(store.status_polls.get(), 3);
}

#[test]
fn ready_poll_surfaces_rejected_credentials() {
    let store = MockStore::new();
    store.script_status(&[StatusReply::Pending, StatusReply::Unauthorized]);
    let handoff = MetadataHandoff::new(&store, POLL);
    let cancel = AtomicBool::new(false);

    let result = handoff.await_ready(&fp(), &cancel, |_, _| {});
    assert!(matches!(result, Err(CoreError::StoreResponse { status: 401, .. })));
    assert_eq!(store.status_polls.get(), 2);
}

#[test]
fn ready_poll_stops_when_cancelled() {
    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);
    let cancel = AtomicBool::new(false);

    let result = handoff.await_ready(&fp(), &cancel, |poll, _| {
        if poll == 3 {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    assert!(matches!(result, Err(CoreError::Cancelled)));
    assert_eq!(store.status_polls.get(), 3);
}

#[test]
fn cancel_before_first_poll_does_not_poll() {
    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);
    let cancel = AtomicBool::new(true);

    assert!(matches!(
        handoff.await_ready(&fp(), &cancel, |_, _| {}),
        Err(CoreError::Cancelled)
    ));
    assert_eq!(store.status_polls.get(), 0);
}

#[test]
fn enabled_items_are_returned_in_title_order() {
    let store = MockStore::new();
    let checksum = fp();
    store.push_item(checksum.as_str(), 4, true);
    store.push_item(checksum.as_str(), 1, false);
    store.push_item(checksum.as_str(), 2, true);
    let handoff = MetadataHandoff::new(&store, POLL);

    let indices: Vec<u32> = handoff
        .enabled_items(&checksum)
        .unwrap()
        .iter()
        .map(|i| i.title_index)
        .collect();
    assert_eq!(indices, vec![2, 4]);
}

#[test]
fn duplicate_items_are_removed() {
    let store = MockStore::new();
    let checksum = fp();
    store.push_item(checksum.as_str(), 0, true);
    store.push_item(checksum.as_str(), 0, true);
    store.push_item(checksum.as_str(), 1, true);
    let handoff = MetadataHandoff::new(&store, POLL);

    assert_eq!(handoff.remove_duplicate_items(&checksum).unwrap(), 1);
    assert_eq!(store.items_for(checksum.as_str()).len(), 2);
}

#[test]
fn loudness_marks_flat_tracks_as_commentary() {
    let work = tempdir().unwrap();
    fs::write(work.path().join("Heat_t00.mkv"), b"mkv").unwrap();

    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);
    handoff.publish_items(&fp(), &[title(0, vec![audio(1, "5.1 Surround"), audio(2, "Stereo")])]);

    let updated = handoff.refine_audio(&fp(), work.path(), &AudioPolicy::default(), |_, track| {
        match track.stream_index {
            1 => Some(31.44),
            _ => Some(12.0),
        }
    });
    assert_eq!(updated, 1);

    let tracks = store.items_for(fp().as_str()).remove(0).audio_tracks;
    assert!(!tracks[0].is_commentary);
    assert!(tracks[0].enabled);
    assert_eq!(tracks[0].dynamic_range, Some(31.4));
    assert!(tracks[1].is_commentary);
    assert!(!tracks[1].enabled);
}

#[test]
fn titles_without_ripped_files_are_left_alone() {
    let work = tempdir().unwrap();
    let store = MockStore::new();
    let handoff = MetadataHandoff::new(&store, POLL);
    handoff.publish_items(&fp(), &[title(5, vec![audio(1, "5.1 Surround")])]);

    let updated = handoff.refine_audio(&fp(), work.path(), &AudioPolicy::default(), |_, _| {
        panic!("nothing to analyze")
    });
    assert_eq!(updated, 0);
}
