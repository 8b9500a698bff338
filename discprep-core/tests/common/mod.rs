// discprep-core/tests/common/mod.rs
//
// Shared mocks for the integration tests: a scripted MakeMKV spawner, a drive
// that never really sleeps, and an in-memory metadata store.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use discprep_core::error::{CoreError, CoreResult};
use discprep_core::model::{AudioTrack, Title};
use discprep_core::runner::{DriveControl, ExitOutcome, ScanProcess, ScanSpawner};
use discprep_core::store::{
    DiscRecord, LayoutItem, LayoutRequest, LayoutStatus, MetadataStore, NewDisc, PublishOutcome,
    UserSettings,
};

// ---- Scan process ----

/// One scripted process run: its output lines and how it exits.
#[derive(Clone, Debug)]
pub struct MockRun {
    pub lines: Vec<String>,
    pub exit: ExitOutcome,
}

impl MockRun {
    pub fn new(lines: &[&str], exit: ExitOutcome) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            exit,
        }
    }
}

pub struct MockProcess {
    lines: VecDeque<String>,
    exit: ExitOutcome,
}

impl ScanProcess for MockProcess {
    fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    fn terminate(&mut self, _grace: Duration) {
        self.lines.clear();
        self.exit = ExitOutcome::Signaled;
    }

    fn wait(&mut self, _timeout: Option<Duration>) -> CoreResult<ExitOutcome> {
        Ok(self.exit)
    }
}

/// Hands out scripted runs in order; the last run repeats once the script ends.
#[derive(Default)]
pub struct MockSpawner {
    runs: RefCell<VecDeque<MockRun>>,
    last: RefCell<Option<MockRun>>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl MockSpawner {
    pub fn new(runs: Vec<MockRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
            ..Self::default()
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ScanSpawner for MockSpawner {
    type Process = MockProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<MockProcess> {
        self.calls.borrow_mut().push(args.to_vec());
        let run = match self.runs.borrow_mut().pop_front() {
            Some(run) => {
                *self.last.borrow_mut() = Some(run.clone());
                run
            }
            None => self
                .last
                .borrow()
                .clone()
                .ok_or_else(|| CoreError::OperationFailed("no scripted run".into()))?,
        };
        Ok(MockProcess {
            lines: run.lines.into(),
            exit: run.exit,
        })
    }
}

// ---- Drive ----

/// Drive whose volume reappears after `present_after` presence polls
/// following each eject. `None` means it never comes back.
pub struct MockDrive {
    present_after: Option<u32>,
    polls_since_eject: Cell<u32>,
    pub ejects: RefCell<Vec<PathBuf>>,
    pub slept: RefCell<Vec<Duration>>,
}

impl MockDrive {
    pub fn returning_after(polls: u32) -> Self {
        Self {
            present_after: Some(polls),
            polls_since_eject: Cell::new(0),
            ejects: RefCell::new(Vec::new()),
            slept: RefCell::new(Vec::new()),
        }
    }

    pub fn never_returning() -> Self {
        Self {
            present_after: None,
            ..Self::returning_after(0)
        }
    }

    pub fn total_sleep(&self) -> Duration {
        self.slept.borrow().iter().sum()
    }
}

impl DriveControl for MockDrive {
    fn eject(&self, volume: &Path) -> CoreResult<()> {
        self.ejects.borrow_mut().push(volume.to_path_buf());
        self.polls_since_eject.set(0);
        Ok(())
    }

    fn volume_present(&self, _volume: &Path) -> bool {
        let polls = self.polls_since_eject.get() + 1;
        self.polls_since_eject.set(polls);
        self.present_after.is_some_and(|n| polls >= n)
    }

    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

// ---- Metadata store ----

/// Scripted answer to a layout status poll.
#[derive(Clone, Debug)]
pub enum StatusReply {
    Pending,
    Ready,
    Unavailable,
    ServerError,
    Throttled,
    /// 200 with a body that is not JSON.
    Garbled,
    Unauthorized,
}

#[derive(Default)]
pub struct MockStore {
    pub discs: RefCell<BTreeMap<String, DiscRecord>>,
    pub layouts: RefCell<Vec<String>>,
    pub items: RefCell<Vec<(String, LayoutItem)>>,
    pub status_replies: RefCell<VecDeque<StatusReply>>,
    pub status_polls: Cell<u32>,
    pub rekeys: RefCell<Vec<(String, String)>>,
    pub fail_rekey: Cell<bool>,
    next_item_id: Cell<i64>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disc(self, checksum: &str, title: &str) -> Self {
        self.discs.borrow_mut().insert(
            checksum.to_string(),
            DiscRecord {
                id: Some(1),
                title: Some(title.to_string()),
                year: None,
                imdb_id: None,
                checksum: Some(checksum.to_string()),
            },
        );
        self
    }

    pub fn script_status(&self, replies: &[StatusReply]) {
        self.status_replies.borrow_mut().extend(replies.iter().cloned());
    }

    pub fn items_for(&self, checksum: &str) -> Vec<LayoutItem> {
        self.items
            .borrow()
            .iter()
            .filter(|(c, _)| c == checksum)
            .map(|(_, item)| item.clone())
            .collect()
    }

    pub fn push_item(&self, checksum: &str, title_index: u32, enabled: bool) -> i64 {
        let id = self.next_item_id.get() + 1;
        self.next_item_id.set(id);
        self.items.borrow_mut().push((
            checksum.to_string(),
            LayoutItem {
                id,
                title_index,
                enabled,
                output_filename: None,
                source_file: None,
                audio_tracks: Vec::new(),
                subtitle_tracks: Vec::new(),
            },
        ));
        id
    }
}

impl MetadataStore for MockStore {
    fn lookup_disc(&self, checksum: &str) -> CoreResult<Option<DiscRecord>> {
        Ok(self.discs.borrow().get(checksum).cloned())
    }

    fn create_disc(&self, disc: &NewDisc) -> CoreResult<PublishOutcome> {
        let mut discs = self.discs.borrow_mut();
        if discs.contains_key(&disc.checksum) {
            return Ok(PublishOutcome::AlreadyExists);
        }
        let next_id = discs.len() as i64 + 1;
        discs.insert(
            disc.checksum.clone(),
            DiscRecord {
                id: Some(next_id),
                title: Some(disc.title.clone()),
                year: Some(disc.year.clone()),
                imdb_id: disc.imdb_id.clone(),
                checksum: Some(disc.checksum.clone()),
            },
        );
        Ok(PublishOutcome::Created)
    }

    fn rekey_disc(&self, old_checksum: &str, new_checksum: &str) -> CoreResult<()> {
        self.rekeys
            .borrow_mut()
            .push((old_checksum.to_string(), new_checksum.to_string()));
        if self.fail_rekey.get() {
            return Err(CoreError::StoreResponse {
                status: 409,
                body: "checksum already in use".into(),
            });
        }
        let mut discs = self.discs.borrow_mut();
        if let Some(mut record) = discs.remove(old_checksum) {
            record.checksum = Some(new_checksum.to_string());
            discs.insert(new_checksum.to_string(), record);
        }
        Ok(())
    }

    fn link_disc(&self, _checksum: &str) -> CoreResult<()> {
        Ok(())
    }

    fn create_layout(&self, checksum: &str, _layout: &LayoutRequest) -> CoreResult<PublishOutcome> {
        let mut layouts = self.layouts.borrow_mut();
        if layouts.iter().any(|c| c == checksum) {
            return Ok(PublishOutcome::AlreadyExists);
        }
        layouts.push(checksum.to_string());
        Ok(PublishOutcome::Created)
    }

    fn layout_status(&self, _checksum: &str) -> CoreResult<LayoutStatus> {
        self.status_polls.set(self.status_polls.get() + 1);
        let reply = self
            .status_replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(StatusReply::Pending);
        match reply {
            StatusReply::Pending => Ok(LayoutStatus {
                status: Some("pending".into()),
            }),
            StatusReply::Ready => Ok(LayoutStatus {
                status: Some("ready".into()),
            }),
            StatusReply::Unavailable => Err(CoreError::StoreUnavailable("connection refused".into())),
            StatusReply::ServerError => Err(CoreError::StoreResponse {
                status: 502,
                body: "bad gateway".into(),
            }),
            StatusReply::Throttled => Err(CoreError::StoreResponse {
                status: 429,
                body: "slow down".into(),
            }),
            StatusReply::Garbled => {
                let err = serde_json::from_str::<LayoutStatus>("<html>maintenance</html>")
                    .unwrap_err();
                Err(err.into())
            }
            StatusReply::Unauthorized => Err(CoreError::StoreResponse {
                status: 401,
                body: "unauthorized".into(),
            }),
        }
    }

    fn list_items(&self, checksum: &str) -> CoreResult<Vec<LayoutItem>> {
        Ok(self.items_for(checksum))
    }

    fn create_item(&self, checksum: &str, title: &Title) -> CoreResult<PublishOutcome> {
        if self
            .items_for(checksum)
            .iter()
            .any(|i| i.title_index == title.title_index)
        {
            return Ok(PublishOutcome::AlreadyExists);
        }
        let id = self.push_item(checksum, title.title_index, true);
        if let Some((_, item)) = self.items.borrow_mut().iter_mut().find(|(_, i)| i.id == id) {
            item.audio_tracks = title.audio_tracks.clone();
            item.subtitle_tracks = title.subtitle_tracks.clone();
            item.source_file = title.source_file.clone();
        }
        Ok(PublishOutcome::Created)
    }

    fn update_item_audio(&self, item_id: i64, audio_tracks: &[AudioTrack]) -> CoreResult<()> {
        let mut items = self.items.borrow_mut();
        let (_, item) = items
            .iter_mut()
            .find(|(_, i)| i.id == item_id)
            .ok_or(CoreError::StoreResponse {
                status: 404,
                body: "no such item".into(),
            })?;
        item.audio_tracks = audio_tracks.to_vec();
        Ok(())
    }

    fn delete_item(&self, item_id: i64) -> CoreResult<()> {
        self.items.borrow_mut().retain(|(_, i)| i.id != item_id);
        Ok(())
    }

    fn user_settings(&self) -> CoreResult<Option<UserSettings>> {
        Ok(None)
    }

    fn health(&self) -> CoreResult<()> {
        Ok(())
    }
}
