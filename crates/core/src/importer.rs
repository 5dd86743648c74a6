//! Discovery of B-scan frames in a scan directory.
//!
//! A scan directory holds one image per frame, named by its 1-based index
//! (`1.png`, `2.png`, ...). Discovery only reads directory listings; the
//! repository layer decides which frames are new.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CoreError;
use crate::types::BScanIndex;

/// Frame file extension used when an import request does not name one.
pub const DEFAULT_EXTENSION: &str = "png";

/// One frame file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFrame {
    pub index: BScanIndex,
    /// Absolute, canonical path to the frame image.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Frames sorted by index, one per index.
    pub frames: Vec<DiscoveredFrame>,
    /// File names with the right extension whose stem is not a positive
    /// integer, or whose index was already taken by another file.
    pub skipped: Vec<String>,
}

/// Outcome of importing one scan directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub scan_id: String,
    pub scan_created: bool,
    pub discovered: usize,
    pub imported: usize,
    pub skipped_existing: usize,
    pub skipped_files: Vec<String>,
}

/// Parse a frame index from a file stem (`"12"` → 12). Zero, negative and
/// non-numeric stems are rejected.
pub fn parse_frame_index(stem: &str) -> Option<BScanIndex> {
    stem.parse::<u32>()
        .ok()
        .filter(|&i| i >= 1)
        .map(BScanIndex::from)
}

/// Validate a scan identifier: non-empty, no path separators, no
/// surrounding whitespace.
pub fn validate_scan_id(scan_id: &str) -> Result<(), CoreError> {
    if scan_id.is_empty() || scan_id.trim() != scan_id {
        return Err(CoreError::Validation(
            "Scan id must be non-empty without surrounding whitespace".into(),
        ));
    }
    if scan_id.contains(['/', '\\']) {
        return Err(CoreError::Validation(format!(
            "Scan id '{scan_id}' must not contain path separators"
        )));
    }
    Ok(())
}

/// Resolve `requested` (absolute, or relative to `root`) and make sure it
/// stays inside `root` after symlinks and `..` are resolved.
pub fn resolve_within_root(root: &Path, requested: &Path) -> Result<PathBuf, CoreError> {
    let root = fs::canonicalize(root).map_err(|e| {
        CoreError::Internal(format!("Scans root {} is unavailable: {e}", root.display()))
    })?;
    let candidate = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        root.join(requested)
    };
    let resolved = fs::canonicalize(&candidate).map_err(|_| CoreError::NotFound {
        entity: "Directory",
        id: requested.display().to_string(),
    })?;
    if !resolved.starts_with(&root) {
        return Err(CoreError::Validation(format!(
            "{} is outside the scans root",
            requested.display()
        )));
    }
    if !resolved.is_dir() {
        return Err(CoreError::Validation(format!(
            "{} is not a directory",
            requested.display()
        )));
    }
    Ok(resolved)
}

/// List frame files with `extension` (case-insensitive) directly inside `dir`.
pub fn discover_frames(dir: &Path, extension: &str) -> Result<Discovery, CoreError> {
    let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
    let entries = fs::read_dir(dir)
        .map_err(|e| CoreError::Internal(format!("Cannot list {}: {e}", dir.display())))?;

    let mut found: Vec<(BScanIndex, String, PathBuf)> = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::Internal(e.to_string()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches_extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase() == wanted)
            .unwrap_or(false);
        if !matches_extension {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match parse_frame_index(&stem) {
            Some(index) => found.push((index, name, path)),
            None => skipped.push(name),
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    let mut frames: Vec<DiscoveredFrame> = Vec::with_capacity(found.len());
    for (index, name, path) in found {
        if frames.last().is_some_and(|f| f.index == index) {
            skipped.push(name);
            continue;
        }
        let path = fs::canonicalize(&path).map_err(|e| CoreError::Internal(e.to_string()))?;
        frames.push(DiscoveredFrame { index, path });
    }
    skipped.sort();

    Ok(Discovery { frames, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn parses_positive_numeric_stems_only() {
        assert_eq!(parse_frame_index("1"), Some(1));
        assert_eq!(parse_frame_index("0042"), Some(42));
        assert_eq!(parse_frame_index("0"), None);
        assert_eq!(parse_frame_index("-3"), None);
        assert_eq!(parse_frame_index("frame_1"), None);
    }

    #[test]
    fn discovers_sorted_frames_and_skips_others() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.png", "2.png", "1.PNG", "notes.png", "3.bmp", "02.png"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("4.png")).unwrap();

        let discovery = discover_frames(dir.path(), "png").unwrap();
        let indices: Vec<_> = discovery.frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2, 10]);
        assert!(discovery.frames.iter().all(|f| f.path.is_absolute()));
        assert_eq!(discovery.skipped, vec!["2.png".to_string(), "notes.png".to_string()]);
    }

    #[test]
    fn extension_filter_accepts_leading_dot() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1.bmp");
        touch(dir.path(), "2.png");
        let discovery = discover_frames(dir.path(), ".BMP").unwrap();
        assert_eq!(discovery.frames.len(), 1);
        assert_eq!(discovery.frames[0].index, 1);
    }

    #[test]
    fn resolve_rejects_paths_outside_root() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("S1")).unwrap();
        let outside = tempfile::tempdir().unwrap();

        let inside = resolve_within_root(root.path(), Path::new("S1")).unwrap();
        assert!(inside.ends_with("S1"));
        assert_matches!(
            resolve_within_root(root.path(), Path::new("../")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            resolve_within_root(root.path(), outside.path()),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            resolve_within_root(root.path(), Path::new("missing")),
            Err(CoreError::NotFound { .. })
        );
    }

    #[test]
    fn scan_ids_are_validated() {
        assert!(validate_scan_id("SCAN_001").is_ok());
        assert_matches!(validate_scan_id(""), Err(CoreError::Validation(_)));
        assert_matches!(validate_scan_id(" S1"), Err(CoreError::Validation(_)));
        assert_matches!(validate_scan_id("a/b"), Err(CoreError::Validation(_)));
    }
}
