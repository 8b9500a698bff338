// ============================================================================
// discprep-cli/src/commands/rip.rs
// ============================================================================
//
// RIP COMMAND: scan, rip, hand off for review, then transcode
//
// The pipeline resolves the disc fingerprint, publishes the scanned layout to
// the metadata store, rips every title, waits for the reviewer to mark the
// layout ready and finally transcodes the enabled titles into the library.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use discprep_core::discovery::{clean_work_dir, find_title_file, list_ripped_files};
use discprep_core::external::{
    LoudnessAnalyzer, MakemkvSpawner, SystemDrive, TranscodeJob, apply_track_metadata,
    eject_quietly, transcode,
};
use discprep_core::fingerprint::Resolution;
use discprep_core::model::{AudioTrack, SubtitleTrack};
use discprep_core::notifications::{
    NotificationSender, NotificationType, NtfyNotificationSender, NullNotificationSender,
};
use discprep_core::runner::{RunnerSettings, ScanRunner, rip_args};
use discprep_core::store::{DiscRecord, HttpMetadataStore, LayoutItem, MetadataStore};
use discprep_core::utils::{normalize_volume_title, sanitize_filename};
use discprep_core::{
    CoreError, DiscVolume, MetadataHandoff, MovieIdentity, RipConfig, find_disc,
    resolve_fingerprint,
};

use crate::cli::RipArgs;
use crate::config::rip_config;
use crate::error::{CliErrorContext, CliResult};
use crate::output::{print_heading, print_info, print_success, print_titles, print_warning, review_spinner};

/// Runs the full pipeline for the disc currently mounted.
pub fn run_rip(args: RipArgs) -> CliResult<()> {
    let config = rip_config(&args)?;
    let notifier = build_notifier(&config);
    let disc = find_disc(&config.volumes_root)?;

    let result = rip_disc(&args, &config, &disc, notifier.as_ref());
    if let Err(e) = &result {
        notify(
            notifier.as_ref(),
            &NotificationType::RipFailed {
                subject: disc.label.clone(),
                message: e.to_string(),
            },
        );
    }
    result
}

/// ntfy sender for the configured topic, or a no-op sender without one.
fn build_notifier(config: &RipConfig) -> Box<dyn NotificationSender> {
    let Some(topic) = config.ntfy_topic.as_deref() else {
        return Box::new(NullNotificationSender);
    };
    match NtfyNotificationSender::new(topic) {
        Ok(sender) => Box::new(sender),
        Err(e) => {
            print_warning(&format!("Notifications disabled: {e}"));
            Box::new(NullNotificationSender)
        }
    }
}

fn notify(sender: &dyn NotificationSender, notification: &NotificationType) {
    if let Err(e) = sender.send_notification(notification) {
        log::warn!("Failed to send notification: {}", e);
    }
}

/// Operator-supplied values win, then the stored record, then the label.
fn movie_identity(args: &RipArgs, record: Option<&DiscRecord>, label: &str) -> MovieIdentity {
    let stored_title = record.and_then(|r| r.title.clone()).filter(|t| !t.is_empty());
    let stored_year = record.and_then(|r| r.year.clone()).filter(|y| !y.is_empty());
    let stored_imdb = record.and_then(|r| r.imdb_id.clone()).filter(|i| !i.is_empty());

    MovieIdentity {
        title: args
            .title
            .clone()
            .or(stored_title)
            .unwrap_or_else(|| normalize_volume_title(label)),
        year: args.year.clone().or(stored_year).unwrap_or_default(),
        imdb_id: args.imdb_id.clone().or(stored_imdb),
    }
}

fn movie_name(identity: &MovieIdentity) -> String {
    if identity.year.is_empty() {
        identity.title.clone()
    } else {
        format!("{} ({})", identity.title, identity.year)
    }
}

/// Review page for a stored disc; the web UI lives next to the API root.
fn review_url(store_url: &str, record: Option<&DiscRecord>) -> Option<String> {
    let id = record?.id?;
    let base = store_url.trim_end_matches('/');
    let base = base.strip_suffix("/api").unwrap_or(base);
    Some(format!("{base}/metadata/{id}"))
}

/// Library path for one reviewed item.
///
/// The reviewer's filename wins. Otherwise the movie name is used, with the
/// title index appended when more than one title is kept.
fn output_path(movie_dir: &Path, movie: &str, item: &LayoutItem, several: bool) -> PathBuf {
    let file_name = match item.output_filename.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            let name = sanitize_filename(name);
            if name.to_lowercase().ends_with(".mkv") {
                name
            } else {
                format!("{name}.mkv")
            }
        }
        _ if several => format!("{} - t{:02}.mkv", sanitize_filename(movie), item.title_index),
        _ => format!("{}.mkv", sanitize_filename(movie)),
    };
    movie_dir.join(file_name)
}

/// Pairs every reviewed item with its ripped file.
///
/// Fails without touching anything when an enabled title has no ripped file,
/// so an incomplete layout is never transcoded as if it were whole.
fn match_ripped_files<'a, F>(
    items: &'a [LayoutItem],
    mut find: F,
) -> CliResult<Vec<(&'a LayoutItem, PathBuf)>>
where
    F: FnMut(u32) -> Option<PathBuf>,
{
    let mut matched = Vec::with_capacity(items.len());
    let mut missing = Vec::new();
    for item in items {
        match find(item.title_index) {
            Some(path) => matched.push((item, path)),
            None => missing.push(item.title_index.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(matched)
    } else {
        Err(CoreError::OperationFailed(format!(
            "No ripped file for enabled title(s) {}",
            missing.join(", ")
        )))
    }
}

fn enabled_tracks(item: &LayoutItem) -> (Vec<AudioTrack>, Vec<SubtitleTrack>) {
    (
        item.audio_tracks.iter().filter(|t| t.enabled).cloned().collect(),
        item.subtitle_tracks.iter().filter(|t| t.enabled).cloned().collect(),
    )
}

fn rip_disc(
    args: &RipArgs,
    config: &RipConfig,
    disc: &DiscVolume,
    notifier: &dyn NotificationSender,
) -> CliResult<()> {
    let started = Instant::now();
    let store = HttpMetadataStore::from_config(config)?;

    print_heading(&format!("{} ({})", disc.label, disc.disc_type));

    // ---- Fingerprint ----
    let resolved = resolve_fingerprint(&store, &disc.path, disc.disc_type, Some(&disc.label))
        .cli_context("Fingerprinting disc")?;
    let fingerprint = resolved.fingerprint;
    let known = match &resolved.resolution {
        Resolution::Existing(record) => Some(record.clone()),
        Resolution::Migrated { from, record } => {
            print_info("Migrated fingerprint", from);
            record.clone()
        }
        Resolution::New => None,
    };
    print_info("Fingerprint", &fingerprint);

    let identity = movie_identity(args, known.as_ref(), &disc.label);
    let movie = movie_name(&identity);
    print_info("Movie", &movie);

    // ---- Audio policy ----
    let policy = match store.user_settings() {
        Ok(Some(settings)) => settings.apply_to(config.audio_policy),
        Ok(None) => config.audio_policy,
        Err(e) => {
            log::warn!("Could not load user settings, using local policy: {}", e);
            config.audio_policy
        }
    };
    log::debug!("Audio policy: {:?}", policy);

    // ---- Publish ----
    let handoff = MetadataHandoff::new(&store, config.poll_interval());
    let record = match handoff.register_disc(
        &fingerprint,
        &resolved.resolution,
        &disc.label,
        disc.disc_type,
        &identity,
    ) {
        Ok(record) => record.or(known),
        Err(e) => {
            print_warning(&format!("Disc registration failed: {e}"));
            known
        }
    };
    handoff
        .publish(&fingerprint, &identity)
        .cli_context("Publishing metadata layout")?;

    // ---- Scan ----
    if handoff.items_exist(&fingerprint) {
        print_info("Scan", "skipped, the layout already lists this disc's titles");
    } else {
        let titles = super::scan_titles(config, disc, &policy)?;
        print_info("Titles", titles.len());
        print_titles(&titles);

        let report = handoff.publish_items(&fingerprint, &titles);
        if report.failed > 0 {
            print_warning(&format!("{} title(s) could not be published", report.failed));
        }
    }
    if let Err(e) = handoff.remove_duplicate_items(&fingerprint) {
        log::warn!("Duplicate cleanup failed: {}", e);
    }

    // ---- Rip ----
    let work_dir = config.disc_work_dir(fingerprint.short());
    std::fs::create_dir_all(&work_dir)?;
    print_info("Ripping to", work_dir.display());

    let spawner = MakemkvSpawner::new(&config.makemkv_path);
    let drive = SystemDrive;
    let runner = ScanRunner::new(&spawner, &drive, RunnerSettings::from_config(config));
    runner
        .run(
            &rip_args(config.disc_index, &work_dir),
            Some(&disc.path),
            None,
            |line| log::debug!("{}", line),
        )
        .cli_context("Ripping disc")?;
    let ripped = list_ripped_files(&work_dir)?;
    if ripped.is_empty() {
        return Err(CoreError::OperationFailed(format!(
            "makemkvcon produced no files in {}",
            work_dir.display()
        )));
    }
    print_success(&format!("Rip finished ({} file(s))", ripped.len()));

    if config.analyze_loudness {
        let analyzer = LoudnessAnalyzer::new(&config.ffmpeg_path);
        let updated = handoff.refine_audio(&fingerprint, &work_dir, &policy, |file, track| {
            analyzer.dynamic_range(file, track.stream_index)
        });
        log::info!("Audio analysis updated {} item(s)", updated);
    }

    if !args.no_eject {
        eject_quietly(&drive, &disc.path);
    }

    // ---- Review ----
    let review = review_url(&config.store_url, record.as_ref());
    if let Some(url) = &review {
        print_info("Review", url);
    }
    notify(
        notifier,
        &NotificationType::AwaitingReview {
            movie: movie.clone(),
            review_url: review,
        },
    );

    let cancel = AtomicBool::new(false);
    let spinner = review_spinner("Waiting for the layout to be marked ready");
    let waited = handoff.await_ready(&fingerprint, &cancel, |poll, status| {
        spinner.set_message(format!(
            "Waiting for the layout to be marked ready (poll {poll}, status: {})",
            status.unwrap_or("unreachable")
        ));
    });
    spinner.finish_and_clear();
    waited?;
    print_success("Layout ready");

    // ---- Transcode ----
    let items = handoff.enabled_items(&fingerprint)?;
    if items.is_empty() {
        return Err(CoreError::OperationFailed(
            "No titles are enabled in the reviewed layout".to_string(),
        ));
    }

    let sources = match_ripped_files(&items, |index| find_title_file(&work_dir, index))?;

    let movie_dir = config.movies_dir.join(sanitize_filename(&movie));
    let several = items.len() > 1;
    let mut transcoded = 0;
    for (item, input) in sources {
        let output = output_path(&movie_dir, &movie, item, several);
        let (audio, subtitles) = enabled_tracks(item);

        print_info("Transcoding", output.display());
        let job = TranscodeJob {
            input,
            output: output.clone(),
            preset: config.preset_for(disc.disc_type).to_string(),
            disc_type: disc.disc_type,
            audio_tracks: &item.audio_tracks,
            subtitle_tracks: &item.subtitle_tracks,
        };
        transcode(&config.handbrake_path, &job)
            .cli_with_context(|| format!("Transcoding title {}", item.title_index))?;

        if let Err(e) = apply_track_metadata(&output, &audio, &subtitles) {
            print_warning(&format!("Track metadata not applied: {e}"));
        }
        transcoded += 1;
    }

    if args.keep_files {
        print_info("Kept ripped files in", work_dir.display());
    } else {
        match clean_work_dir(&work_dir) {
            Ok(removed) => log::info!("Removed {} ripped file(s)", removed),
            Err(e) => print_warning(&format!("Could not clean {}: {e}", work_dir.display())),
        }
    }

    let duration = started.elapsed();
    notify(
        notifier,
        &NotificationType::RipComplete {
            movie: movie.clone(),
            output_dir: movie_dir.clone(),
            titles: transcoded,
            duration,
        },
    );

    print_heading("Done");
    print_info("Movie", &movie);
    print_info("Titles", transcoded);
    print_info("Output", movie_dir.display());
    print_info(
        "Elapsed",
        discprep_core::format_duration(duration.as_secs()),
    );
    Ok(())
}
