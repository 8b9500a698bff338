//! Disc and ripped-file discovery.
//!
//! Finds mounted optical volumes by their marker directory (`BDMV` for
//! Blu-ray, `VIDEO_TS` for DVD) and matches ripped MakeMKV output files back
//! to their title index.

use crate::error::{CoreError, CoreResult};
use crate::model::DiscType;

use std::path::{Path, PathBuf};

/// A mounted optical volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscVolume {
    /// Volume label, i.e. the mount point's directory name.
    pub label: String,
    pub path: PathBuf,
    pub disc_type: DiscType,
}

/// Detects the disc type of a volume from its top-level directories.
///
/// Blu-ray wins when both markers exist.
pub fn detect_disc_type(volume: &Path) -> Option<DiscType> {
    [DiscType::BluRay, DiscType::Dvd]
        .into_iter()
        .find(|disc_type| volume.join(disc_type.marker_dir()).is_dir())
}

/// Finds every volume directly under `volumes_root` that looks like a disc.
///
/// # Arguments
///
/// * `volumes_root` - Directory whose children are mount points (`/Volumes`)
///
/// # Returns
///
/// * `Ok(Vec<DiscVolume>)` - Discs sorted by label; unreadable entries are skipped
/// * `Err(CoreError::Io)` - If `volumes_root` cannot be listed
pub fn find_disc_volumes(volumes_root: &Path) -> CoreResult<Vec<DiscVolume>> {
    let mut volumes: Vec<DiscVolume> = std::fs::read_dir(volumes_root)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if !path.is_dir() {
                return None;
            }
            let disc_type = detect_disc_type(&path)?;
            Some(DiscVolume {
                label: entry.file_name().to_string_lossy().into_owned(),
                path,
                disc_type,
            })
        })
        .collect();

    volumes.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(volumes)
}

/// Returns the first disc under `volumes_root`.
///
/// # Returns
///
/// * `Ok(DiscVolume)` - The first disc by label
/// * `Err(CoreError::NoDiscFound)` - If no mounted volume carries a marker directory
pub fn find_disc(volumes_root: &Path) -> CoreResult<DiscVolume> {
    find_disc_volumes(volumes_root)?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::NoDiscFound(volumes_root.display().to_string()))
}

/// Finds the ripped file for `title_index` (MakeMKV names them `*_tNN.mkv`).
///
/// When several files match, the lexicographically first one is returned.
pub fn find_title_file(dir: &Path, title_index: u32) -> Option<PathBuf> {
    let suffix = format!("_t{title_index:02}.mkv");
    let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            (path.is_file() && name.ends_with(&suffix)).then(|| path.clone())
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Lists the `.mkv` files in a working directory, sorted.
pub fn list_ripped_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext| ext.eq_ignore_ascii_case("mkv"))
                .map(|_| path.clone())
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Removes regular files left in a disc's working directory by an earlier run.
///
/// Subdirectories and other discs' working directories are left alone.
pub fn clean_work_dir(dir: &Path) -> CoreResult<usize> {
    std::fs::create_dir_all(dir)?;
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_bluray_and_dvd_volumes() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("HEAT/BDMV")).unwrap();
        fs::create_dir_all(root.path().join("AMELIE/VIDEO_TS")).unwrap();
        fs::create_dir_all(root.path().join("Macintosh HD/System")).unwrap();

        let volumes = find_disc_volumes(root.path()).unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].label, "AMELIE");
        assert_eq!(volumes[0].disc_type, DiscType::Dvd);
        assert_eq!(volumes[1].disc_type, DiscType::BluRay);
    }

    #[test]
    fn no_disc_is_an_error() {
        let root = tempdir().unwrap();
        assert!(matches!(find_disc(root.path()), Err(CoreError::NoDiscFound(_))));
    }

    #[test]
    fn title_file_matches_two_digit_suffix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Heat_t00.mkv"), b"").unwrap();
        fs::write(dir.path().join("Heat_t10.mkv"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        assert_eq!(
            find_title_file(dir.path(), 0).unwrap().file_name().unwrap(),
            "Heat_t00.mkv"
        );
        assert!(find_title_file(dir.path(), 10).is_some());
        assert!(find_title_file(dir.path(), 1).is_none());
        assert_eq!(list_ripped_files(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn clean_work_dir_keeps_subdirectories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old_t00.mkv"), b"x").unwrap();
        fs::create_dir(dir.path().join("keep")).unwrap();

        assert_eq!(clean_work_dir(dir.path()).unwrap(), 1);
        assert!(dir.path().join("keep").is_dir());
    }
}
