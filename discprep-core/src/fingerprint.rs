// ============================================================================
// discprep-core/src/fingerprint.rs
// ============================================================================
//
// DISC FINGERPRINTING: Content-Addressed Disc Identifiers
//
// A disc is identified by the SHA-256 of a compact, key-sorted JSON document
// describing its file tree:
//
//   {"disc_type":"bluray","file_count":N,"files":[...],"total_size":B}
//
// `files` holds the sorted, '/'-separated relative paths, capped at the first
// MAX_FINGERPRINT_FILES. OS artifacts (.DS_Store, Thumbs.db, AppleDouble
// `._*` files, ...) are excluded from the list, the count and the size sum.
//
// Identifiers computed by earlier versions (no junk filtering, upper-case disc
// type, or a plain digest of the volume label) are only ever used to find and
// re-key existing store records; they are never minted for new discs.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::CoreResult;
use crate::model::DiscType;
use crate::store::{DiscRecord, MetadataStore};

/// Upper bound on the number of paths included in the digest document.
pub const MAX_FINGERPRINT_FILES: usize = 200;

/// OS artifacts matched case-insensitively against every path component.
const JUNK_NAMES: &[&str] = &[
    ".ds_store",
    "thumbs.db",
    "ehthumbs.db",
    "desktop.ini",
    ".spotlight-v100",
    ".trashes",
    ".fseventsd",
    ".temporaryitems",
    ".documentrevisions-v100",
    "system volume information",
    "$recycle.bin",
];

/// Prefixes of OS artifacts (AppleDouble resource forks, office lock files).
const JUNK_PREFIXES: &[&str] = &["._", ".~lock"];

/// Hex-encoded SHA-256 identifying a disc.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscFingerprint(String);

impl DiscFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 hex characters; names the per-disc working directory.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(16)]
    }
}

impl std::fmt::Display for DiscFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DiscFingerprint {
    fn from(value: String) -> Self {
        DiscFingerprint(value)
    }
}

/// A regular file found on the volume: '/'-separated relative path and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    pub path: String,
    pub size: u64,
}

impl VolumeEntry {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: normalize_separators(&path.into()),
            size,
        }
    }
}

#[derive(Serialize)]
struct FingerprintDocument<'a> {
    // Field order is the sorted key order of the hashed document.
    disc_type: &'a str,
    file_count: usize,
    files: &'a [String],
    total_size: u64,
}

/// Returns true if a single file or directory name is an OS artifact.
pub fn is_junk_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    JUNK_NAMES.contains(&lower.as_str())
        || JUNK_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// Returns true if any component of a relative path is an OS artifact.
pub fn is_junk_path(relative: &str) -> bool {
    relative.split('/').any(is_junk_name)
}

fn normalize_separators(path: &str) -> String {
    let unified = path.replace('\\', "/");
    unified.trim_start_matches("./").trim_start_matches('/').to_string()
}

/// Computes the canonical fingerprint of a mounted volume.
pub fn fingerprint(volume_root: &Path, disc_type: &str) -> CoreResult<DiscFingerprint> {
    let entries = collect_entries(volume_root, true)?;
    Ok(fingerprint_from_entries(&disc_type.to_lowercase(), &entries, true))
}

/// Reproduces the historical fingerprint: no junk filtering, and the disc type
/// kept in its original case when `preserve_case` is set. Only for migration
/// lookups.
pub fn fingerprint_legacy(
    volume_root: &Path,
    disc_type: &str,
    preserve_case: bool,
) -> CoreResult<DiscFingerprint> {
    let entries = collect_entries(volume_root, false)?;
    let disc_type = if preserve_case {
        disc_type.to_string()
    } else {
        disc_type.to_lowercase()
    };
    Ok(fingerprint_from_entries(&disc_type, &entries, false))
}

/// The pure core shared by every fingerprint variant.
///
/// `disc_type` is hashed exactly as given; callers decide on its case.
pub fn fingerprint_from_entries(
    disc_type: &str,
    entries: &[VolumeEntry],
    filter_junk: bool,
) -> DiscFingerprint {
    let mut files = Vec::with_capacity(entries.len());
    let mut total_size = 0u64;

    for entry in entries {
        let path = normalize_separators(&entry.path);
        if filter_junk && is_junk_path(&path) {
            continue;
        }
        total_size += entry.size;
        files.push(path);
    }
    files.sort();

    let capped = &files[..files.len().min(MAX_FINGERPRINT_FILES)];
    let document = FingerprintDocument {
        disc_type,
        file_count: files.len(),
        files: capped,
        total_size,
    };

    DiscFingerprint(sha256_hex(&ascii_json(&document)))
}

/// Digest of the raw volume label, the identifier used before content hashing.
pub fn label_fingerprint(volume_label: &str) -> DiscFingerprint {
    DiscFingerprint(sha256_hex(volume_label.as_bytes()))
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Walks the volume and returns every regular file with its size.
///
/// Unreadable entries are skipped. With `filter_junk`, junk directories are
/// pruned so nothing beneath them is visited.
pub fn collect_entries(volume_root: &Path, filter_junk: bool) -> CoreResult<Vec<VolumeEntry>> {
    if !volume_root.is_dir() {
        return Err(crate::error::CoreError::PathError(format!(
            "Volume root '{}' is not a directory",
            volume_root.display()
        )));
    }

    let walker = WalkDir::new(volume_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !filter_junk
                || !is_junk_name(&entry.file_name().to_string_lossy())
        });

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable volume entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::debug!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(volume_root) else {
            continue;
        };
        entries.push(VolumeEntry {
            path: relative_to_slash(relative),
            size,
        });
    }
    Ok(entries)
}

fn relative_to_slash(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Serializes compactly with every non-ASCII character written as a `\uXXXX`
/// escape, matching the byte layout of previously stored digests.
fn ascii_json<T: Serialize>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    // Serializing plain strings and integers into a Vec cannot fail.
    if value.serialize(&mut serializer).is_err() {
        out.clear();
    }
    out
}

struct AsciiFormatter;

impl serde_json::ser::Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// MIGRATION
// ============================================================================

/// How the canonical fingerprint relates to what the store already knows.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The store already has a record under the canonical fingerprint.
    Existing(DiscRecord),
    /// A record stored under a historical fingerprint was re-keyed.
    Migrated {
        from: DiscFingerprint,
        record: Option<DiscRecord>,
    },
    /// Nothing is known about this disc yet.
    New,
}

/// Canonical fingerprint plus its store resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintResolution {
    pub fingerprint: DiscFingerprint,
    pub resolution: Resolution,
}

/// Historical fingerprints to try, most recent algorithm first, excluding any
/// that coincide with the canonical one.
pub fn legacy_candidates(
    volume_root: &Path,
    disc_type: DiscType,
    volume_label: Option<&str>,
    canonical: &DiscFingerprint,
) -> CoreResult<Vec<DiscFingerprint>> {
    let raw_entries = collect_entries(volume_root, false)?;
    let upper = disc_type.as_str();

    let mut candidates = vec![
        fingerprint_from_entries(upper, &raw_entries, false),
        fingerprint_from_entries(&upper.to_lowercase(), &raw_entries, false),
    ];
    if let Some(label) = volume_label {
        candidates.push(label_fingerprint(label));
    }

    let mut unique: Vec<DiscFingerprint> = Vec::new();
    for candidate in candidates {
        if &candidate != canonical && !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    Ok(unique)
}

/// Computes the canonical fingerprint and reconciles it with the store,
/// re-keying a record found under a historical fingerprint.
///
/// Re-keying is idempotent: if the re-key request fails but the canonical
/// fingerprint now exists (another run migrated it first), that is success.
pub fn resolve_fingerprint<S: MetadataStore + ?Sized>(
    store: &S,
    volume_root: &Path,
    disc_type: DiscType,
    volume_label: Option<&str>,
) -> CoreResult<FingerprintResolution> {
    let canonical = fingerprint(volume_root, disc_type.as_str())?;
    log::info!("Fingerprint: {}", canonical);

    if let Some(record) = store.lookup_disc(canonical.as_str())? {
        return Ok(FingerprintResolution {
            fingerprint: canonical,
            resolution: Resolution::Existing(record),
        });
    }

    for legacy in legacy_candidates(volume_root, disc_type, volume_label, &canonical)? {
        let found = match store.lookup_disc(legacy.as_str()) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Legacy fingerprint lookup failed for {}: {}", legacy, e);
                None
            }
        };
        if found.is_none() {
            continue;
        }

        log::info!("Legacy fingerprint {} found, re-keying to {}", legacy, canonical);
        if let Err(e) = store.rekey_disc(legacy.as_str(), canonical.as_str()) {
            if store.lookup_disc(canonical.as_str())?.is_none() {
                return Err(e);
            }
            log::info!("Fingerprint already migrated");
        }

        let record = store.lookup_disc(canonical.as_str())?;
        return Ok(FingerprintResolution {
            fingerprint: canonical,
            resolution: Resolution::Migrated {
                from: legacy,
                record,
            },
        });
    }

    Ok(FingerprintResolution {
        fingerprint: canonical,
        resolution: Resolution::New,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(paths: &[(&str, u64)]) -> Vec<VolumeEntry> {
        paths.iter().map(|(p, s)| VolumeEntry::new(*p, *s)).collect()
    }

    #[test]
    fn separators_do_not_change_digest() {
        let unix = entries(&[("BDMV/index.bdmv", 10), ("BDMV/STREAM/00001.m2ts", 500)]);
        let windows = entries(&[("BDMV\\STREAM\\00001.m2ts", 500), ("BDMV\\index.bdmv", 10)]);
        assert_eq!(
            fingerprint_from_entries("bluray", &unix, true),
            fingerprint_from_entries("bluray", &windows, true)
        );
    }

    #[test]
    fn junk_entries_are_ignored_only_when_filtering() {
        let clean = entries(&[("VIDEO_TS/VTS_01_1.VOB", 1000)]);
        let dirty = entries(&[
            ("VIDEO_TS/VTS_01_1.VOB", 1000),
            (".DS_Store", 6148),
            ("VIDEO_TS/._VTS_01_1.VOB", 4096),
            ("$RECYCLE.BIN/desktop.ini", 129),
        ]);
        assert_eq!(
            fingerprint_from_entries("dvd", &clean, true),
            fingerprint_from_entries("dvd", &dirty, true)
        );
        assert_ne!(
            fingerprint_from_entries("dvd", &clean, false),
            fingerprint_from_entries("dvd", &dirty, false)
        );
    }

    #[test]
    fn file_list_is_capped_but_count_is_not() {
        let many: Vec<VolumeEntry> = (0..250)
            .map(|i| VolumeEntry::new(format!("BDMV/STREAM/{i:05}.m2ts"), 1))
            .collect();
        let mut extra = many.clone();
        extra.push(VolumeEntry::new("zzz/late.bin", 0));

        // The extra path sorts beyond the cap, but the count changes the digest.
        assert_ne!(
            fingerprint_from_entries("bluray", &many, true),
            fingerprint_from_entries("bluray", &extra, true)
        );
    }

    #[test]
    fn document_layout_is_sorted_and_compact() {
        let files = vec!["a".to_string(), "é".to_string()];
        let doc = FingerprintDocument {
            disc_type: "dvd",
            file_count: 2,
            files: &files,
            total_size: 3,
        };
        let json = String::from_utf8(ascii_json(&doc)).unwrap();
        assert_eq!(
            json,
            r#"{"disc_type":"dvd","file_count":2,"files":["a","\u00e9"],"total_size":3}"#
        );
    }

    #[test]
    fn digest_matches_historical_records() {
        let tree = entries(&[
            ("BDMV/index.bdmv", 10),
            ("BDMV/STREAM/00001.m2ts", 500),
            ("\u{dc}n\u{ef}/x.txt", 7),
        ]);
        assert_eq!(
            fingerprint_from_entries("BLURAY", &tree, false).as_str(),
            "79c25c56bac31ac0adf734553d7d5ad4dfadedaab2e859ecceede40df062da78"
        );
        assert_eq!(
            fingerprint_from_entries("bluray", &tree, true).as_str(),
            "84a6b92ee3d8965f4135969ad4ef99dd3f8099491a02694f79c53f61bb18ca0e"
        );
    }

    #[test]
    fn junk_names_match_case_insensitively() {
        assert!(is_junk_name(".ds_store"));
        assert!(is_junk_name("THUMBS.DB"));
        assert!(is_junk_name("._00001.m2ts"));
        assert!(is_junk_path("System Volume Information/IndexerVolumeGuid"));
        assert!(!is_junk_name("index.bdmv"));
        assert!(!is_junk_path("BDMV/STREAM/00001.m2ts"));
    }

    #[test]
    fn short_form_is_sixteen_chars() {
        let fp = label_fingerprint("MOVIE");
        assert_eq!(fp.as_str().len(), 64);
        assert_eq!(fp.short().len(), 16);
        assert!(fp.as_str().starts_with(fp.short()));
    }
}
