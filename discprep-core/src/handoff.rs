// ============================================================================
// discprep-core/src/handoff.rs
// ============================================================================
//
// METADATA HANDOFF: Publishing Layouts and Waiting for Review
//
// After a scan the layout is published to the metadata store, where a human
// reviewer enables/disables titles and tracks and finally marks the layout
// "ready". This module owns that rendezvous:
//
// 1. register_disc   - create (or link) the disc record
// 2. publish         - idempotently create the layout (409 is success)
// 3. publish_items   - post one item per title unless items already exist
// 4. refine_audio    - after ripping, fold loudness analysis and the audio
//                      policy into the stored items
// 5. await_ready     - poll until the reviewer marks the layout ready
// 6. enabled_items   - fetch the final selection for transcoding
//
// Network failures while publishing are fatal. Transient failures while
// polling for readiness are logged and retried indefinitely.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::discovery::find_title_file;
use crate::error::{CoreError, CoreResult};
use crate::fingerprint::{DiscFingerprint, Resolution};
use crate::model::{AudioTrack, DiscType, MovieIdentity, Title};
use crate::selection::{AudioPolicy, select};
use crate::store::{DiscRecord, LayoutItem, LayoutRequest, MetadataStore, NewDisc, PublishOutcome};

/// Slice used to keep the ready-poll sleep responsive to cancellation.
const CANCEL_CHECK_SLICE: Duration = Duration::from_millis(100);

/// Dynamic range (dB) below which a track is treated as likely commentary.
pub const COMMENTARY_DYNAMIC_RANGE_DB: f64 = 20.0;

/// Counts from [`MetadataHandoff::publish_items`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemsReport {
    /// Items already existed; nothing was posted.
    pub skipped: bool,
    pub created: usize,
    pub already_existed: usize,
    pub failed: usize,
}

/// Publishes layouts to a [`MetadataStore`] and waits for review.
pub struct MetadataHandoff<'a, S: MetadataStore + ?Sized> {
    store: &'a S,
    poll_interval: Duration,
}

impl<'a, S: MetadataStore + ?Sized> MetadataHandoff<'a, S> {
    pub fn new(store: &'a S, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }

    /// Creates the disc record for a new disc, or links an existing one to
    /// the user, and returns the record as the store now has it.
    pub fn register_disc(
        &self,
        fingerprint: &DiscFingerprint,
        resolution: &Resolution,
        volume_label: &str,
        disc_type: DiscType,
        identity: &MovieIdentity,
    ) -> CoreResult<Option<DiscRecord>> {
        match resolution {
            Resolution::New => {
                let disc = NewDisc {
                    disc_label: volume_label.to_string(),
                    disc_type: disc_type.as_str().to_string(),
                    checksum: fingerprint.as_str().to_string(),
                    imdb_id: identity.imdb_id.clone(),
                    title: identity.title.clone(),
                    year: identity.year.clone(),
                };
                match self.store.create_disc(&disc)? {
                    PublishOutcome::Created => log::info!("Disc registered"),
                    PublishOutcome::AlreadyExists => log::info!("Disc already registered"),
                }
            }
            Resolution::Existing(_) | Resolution::Migrated { .. } => {
                if let Err(e) = self.store.link_disc(fingerprint.as_str()) {
                    log::warn!("Failed to link disc to account: {}", e);
                }
            }
        }
        self.store.lookup_disc(fingerprint.as_str())
    }

    /// Creates the metadata layout. A conflict means it already exists and is
    /// reported as [`PublishOutcome::AlreadyExists`].
    pub fn publish(
        &self,
        fingerprint: &DiscFingerprint,
        identity: &MovieIdentity,
    ) -> CoreResult<PublishOutcome> {
        let outcome = self
            .store
            .create_layout(fingerprint.as_str(), &LayoutRequest::movie(identity))?;
        match outcome {
            PublishOutcome::Created => log::info!("Metadata layout created"),
            PublishOutcome::AlreadyExists => log::info!("Metadata layout already exists"),
        }
        Ok(outcome)
    }

    /// True if the layout already holds items. Lookup failures read as false.
    pub fn items_exist(&self, fingerprint: &DiscFingerprint) -> bool {
        match self.store.list_items(fingerprint.as_str()) {
            Ok(items) => !items.is_empty(),
            Err(e) => {
                log::debug!("Item lookup failed, assuming none: {}", e);
                false
            }
        }
    }

    /// Posts one item per title unless the layout already has items.
    ///
    /// Per-item failures are logged and counted, not returned.
    pub fn publish_items(
        &self,
        fingerprint: &DiscFingerprint,
        titles: &[Title],
    ) -> ItemsReport {
        let mut report = ItemsReport::default();
        if self.items_exist(fingerprint) {
            log::info!("Metadata items already exist; not posting scanned titles");
            report.skipped = true;
            return report;
        }

        for title in titles {
            match self.store.create_item(fingerprint.as_str(), title) {
                Ok(PublishOutcome::Created) => report.created += 1,
                Ok(PublishOutcome::AlreadyExists) => report.already_existed += 1,
                Err(e) => {
                    log::warn!("Posting title {} failed: {}", title.title_index, e);
                    report.failed += 1;
                }
            }
        }
        log::info!(
            "Published {} item(s) ({} existing, {} failed)",
            report.created,
            report.already_existed,
            report.failed
        );
        report
    }

    /// Deletes items that repeat an earlier item's `title_index`.
    pub fn remove_duplicate_items(&self, fingerprint: &DiscFingerprint) -> CoreResult<usize> {
        let items = self.store.list_items(fingerprint.as_str())?;
        let mut seen = std::collections::HashSet::new();
        let mut removed = 0;
        for item in items {
            if !seen.insert(item.title_index) {
                log::info!(
                    "Removing duplicate item {} for title {}",
                    item.id,
                    item.title_index
                );
                self.store.delete_item(item.id)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Folds post-rip loudness analysis and the audio policy into each stored
    /// item's audio tracks.
    ///
    /// `analyze` returns the dynamic range in dB of one audio stream of a
    /// ripped file, or `None` when it could not be measured. A low dynamic range
    /// marks a track as commentary; it never clears an existing mark. Failures
    /// here are logged and skipped.
    pub fn refine_audio<F>(
        &self,
        fingerprint: &DiscFingerprint,
        work_dir: &Path,
        policy: &AudioPolicy,
        mut analyze: F,
    ) -> usize
    where
        F: FnMut(&Path, &AudioTrack) -> Option<f64>,
    {
        let items = match self.store.list_items(fingerprint.as_str()) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Could not fetch metadata items for analysis: {}", e);
                return 0;
            }
        };

        let mut updated = 0;
        for item in items {
            if item.audio_tracks.is_empty() {
                continue;
            }
            let Some(mkv) = find_title_file(work_dir, item.title_index) else {
                log::debug!("No ripped file for title {}", item.title_index);
                continue;
            };

            let mut tracks = item.audio_tracks.clone();
            for track in tracks.iter_mut() {
                if let Some(range) = analyze(&mkv, track) {
                    track.dynamic_range = Some((range * 10.0).round() / 10.0);
                    if !track.is_commentary && range < COMMENTARY_DYNAMIC_RANGE_DB {
                        log::info!(
                            "Title {} track {}: likely commentary (dynamic range {:.1} dB)",
                            item.title_index,
                            track.stream_index,
                            range
                        );
                        track.is_commentary = true;
                    }
                }
            }
            select(&mut tracks, policy);

            match self.store.update_item_audio(item.id, &tracks) {
                Ok(()) => updated += 1,
                Err(e) => log::warn!("Failed to update item {}: {}", item.id, e),
            }
        }
        updated
    }

    /// Blocks until the layout is marked ready.
    ///
    /// # Arguments
    ///
    /// * `fingerprint` - Disc whose layout is awaited
    /// * `cancel` - Checked between polls; set it to stop waiting
    /// * `on_poll` - Called after each poll with the poll number and status
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The reviewer marked the layout ready
    /// * `Err(CoreError::Cancelled)` - `cancel` was set
    /// * `Err(_)` - A non-transient store error
    pub fn await_ready<F>(
        &self,
        fingerprint: &DiscFingerprint,
        cancel: &AtomicBool,
        mut on_poll: F,
    ) -> CoreResult<()>
    where
        F: FnMut(u32, Option<&str>),
    {
        let mut polls: u32 = 0;
        loop {
            if cancel.load(Ordering::SeqCst) {
                return Err(CoreError::Cancelled);
            }

            polls = polls.saturating_add(1);
            match self.store.layout_status(fingerprint.as_str()) {
                Ok(status) => {
                    on_poll(polls, status.status.as_deref());
                    if status.is_ready() {
                        log::info!("Metadata layout is ready");
                        return Ok(());
                    }
                    log::debug!("Layout status: {:?}", status.status);
                }
                Err(e) if e.is_transient() => {
                    on_poll(polls, None);
                    log::warn!("Ready poll failed, retrying: {}", e);
                }
                Err(e) => return Err(e),
            }

            if !sleep_unless_cancelled(self.poll_interval, cancel) {
                return Err(CoreError::Cancelled);
            }
        }
    }

    /// Items the reviewer left enabled, in title order.
    pub fn enabled_items(&self, fingerprint: &DiscFingerprint) -> CoreResult<Vec<LayoutItem>> {
        let mut items: Vec<LayoutItem> = self
            .store
            .list_items(fingerprint.as_str())?
            .into_iter()
            .filter(|item| item.enabled)
            .collect();
        items.sort_by_key(|item| item.title_index);
        Ok(items)
    }
}

/// Sleeps for `duration` in short slices; false if `cancel` was set meanwhile.
fn sleep_unless_cancelled(duration: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(CANCEL_CHECK_SLICE.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_returns_early_when_cancelled() {
        let cancel = AtomicBool::new(true);
        let start = Instant::now();
        assert!(!sleep_unless_cancelled(Duration::from_secs(10), &cancel));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_completes_without_cancel() {
        let cancel = AtomicBool::new(false);
        assert!(sleep_unless_cancelled(Duration::from_millis(5), &cancel));
    }
}
