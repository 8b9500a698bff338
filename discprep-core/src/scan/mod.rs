//! Raw aggregation of MakeMKV robot-mode scan output.
//!
//! A [`ScanSession`] holds every `TINFO`/`SINFO` value seen during a scan, keyed
//! by title and stream index. Attribute ids the crate knows are stored under
//! typed keys; all others are kept verbatim in an `unknown` bucket so nothing
//! the scanner reports is lost. Projection into [`crate::model::Title`] happens
//! in [`crate::classify`].

pub mod parser;

use std::collections::BTreeMap;

pub use parser::{parse, parse_session};

/// Attribute key types that map to and from MakeMKV numeric ids.
pub trait AttrKey: Copy + Ord {
    fn from_id(id: u32) -> Option<Self>;
    fn id(self) -> u32;
}

/// Title-level (`TINFO`) attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TitleAttr {
    Name,
    /// `H+:MM:SS`
    Duration,
    /// Human size like "4.3 GB"
    Size,
    SourceFile,
}

impl AttrKey for TitleAttr {
    fn from_id(id: u32) -> Option<Self> {
        match id {
            2 => Some(TitleAttr::Name),
            9 => Some(TitleAttr::Duration),
            10 => Some(TitleAttr::Size),
            27 => Some(TitleAttr::SourceFile),
            _ => None,
        }
    }

    fn id(self) -> u32 {
        match self {
            TitleAttr::Name => 2,
            TitleAttr::Duration => 9,
            TitleAttr::Size => 10,
            TitleAttr::SourceFile => 27,
        }
    }
}

/// Stream-level (`SINFO`) attributes.
///
/// The ids follow the Blu-ray layout. DVD scans have been observed with the
/// language code one slot earlier, so classification treats these keys as
/// hints and checks value shapes before trusting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamAttr {
    /// "Audio", "Video", "Subtitles"
    Type,
    TypeName,
    LangCode,
    LangName,
    CodecId,
    CodecShort,
    Bitrate,
    Channels,
    SampleRate,
    BitsPerSample,
    Name,
    Extra,
}

impl AttrKey for StreamAttr {
    fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(StreamAttr::Type),
            2 => Some(StreamAttr::TypeName),
            3 => Some(StreamAttr::LangCode),
            4 => Some(StreamAttr::LangName),
            5 => Some(StreamAttr::CodecId),
            6 => Some(StreamAttr::CodecShort),
            8 => Some(StreamAttr::Bitrate),
            13 => Some(StreamAttr::Channels),
            14 => Some(StreamAttr::SampleRate),
            17 => Some(StreamAttr::BitsPerSample),
            30 => Some(StreamAttr::Name),
            31 => Some(StreamAttr::Extra),
            _ => None,
        }
    }

    fn id(self) -> u32 {
        match self {
            StreamAttr::Type => 1,
            StreamAttr::TypeName => 2,
            StreamAttr::LangCode => 3,
            StreamAttr::LangName => 4,
            StreamAttr::CodecId => 5,
            StreamAttr::CodecShort => 6,
            StreamAttr::Bitrate => 8,
            StreamAttr::Channels => 13,
            StreamAttr::SampleRate => 14,
            StreamAttr::BitsPerSample => 17,
            StreamAttr::Name => 30,
            StreamAttr::Extra => 31,
        }
    }
}

/// Values of one title or stream: typed known keys plus unknown raw ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes<K: AttrKey> {
    known: BTreeMap<K, String>,
    unknown: BTreeMap<u32, String>,
}

impl<K: AttrKey> Default for Attributes<K> {
    fn default() -> Self {
        Self {
            known: BTreeMap::new(),
            unknown: BTreeMap::new(),
        }
    }
}

impl<K: AttrKey> Attributes<K> {
    /// Stores a value by numeric id. A repeated id overwrites the earlier value.
    pub fn insert(&mut self, id: u32, value: impl Into<String>) {
        match K::from_id(id) {
            Some(key) => {
                self.known.insert(key, value.into());
            }
            None => {
                self.unknown.insert(id, value.into());
            }
        }
    }

    /// Known value, with empty strings treated as absent.
    pub fn get(&self, key: K) -> Option<&str> {
        self.known
            .get(&key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Known value or the empty string.
    pub fn text(&self, key: K) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn unknown(&self, id: u32) -> Option<&str> {
        self.unknown.get(&id).map(String::as_str)
    }

    pub fn unknown_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.unknown.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.unknown.is_empty()
    }
}

pub type TitleAttributes = Attributes<TitleAttr>;
pub type StreamAttributes = Attributes<StreamAttr>;

/// Everything one scan reported, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSession {
    pub titles: BTreeMap<u32, TitleAttributes>,
    pub streams: BTreeMap<u32, BTreeMap<u32, StreamAttributes>>,
    /// Set when the scanner announced an additional camera angle.
    pub angles_detected: bool,
}

/// Borrowed view of one title and its streams, in stream-index order.
#[derive(Debug, Clone, Copy)]
pub struct RawTitle<'a> {
    pub index: u32,
    pub attributes: &'a TitleAttributes,
    pub streams: Option<&'a BTreeMap<u32, StreamAttributes>>,
}

impl ScanSession {
    /// Titles in ascending index order. Only titles with at least one `TINFO`
    /// record are reported; orphan `SINFO` records are ignored.
    pub fn raw_titles(&self) -> impl Iterator<Item = RawTitle<'_>> {
        self.titles.iter().map(|(index, attributes)| RawTitle {
            index: *index,
            attributes,
            streams: self.streams.get(index),
        })
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }
}
