//! Loading catalogs from Million Playlist Dataset slice files.
//!
//! A slice is a JSON object `{"info": {...}, "playlists": [...]}`. A catalog
//! path may name a single slice or a directory; directories are searched
//! recursively for `*.json` files. Files named like `mpd.slice.<start>-<end>.json`
//! load in numeric order of `<start>`; any other file keeps sorted path order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::{Catalog, Playlist};
use crate::error::{RecError, Result};

static SLICE_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mpd\.slice\.(\d+)-\d+$")
        .expect("unreachable error: failed to compile slice name pattern")
});

/// First playlist id in a slice, read from an `mpd.slice.<start>-<end>` stem.
fn slice_start(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    SLICE_STEM.captures(stem)?.get(1)?.as_str().parse().ok()
}

/// Header block of a slice file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SliceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_on: Option<String>,
    /// Playlist id range, e.g. `"0-999"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// One parsed slice file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slice {
    #[serde(default)]
    pub info: SliceInfo,
    pub playlists: Vec<Playlist>,
}

/// Parse slice JSON. `context` names the source in error messages.
///
/// # Errors
///
/// Returns [`RecError::MalformedInput`] if the text is not a valid slice,
/// including when a playlist or track lacks a required field.
pub fn parse_slice(text: &str, context: &str) -> Result<Slice> {
    serde_json::from_str(text).map_err(|e| RecError::malformed(context, e.to_string()))
}

/// Read and parse one slice file.
///
/// # Errors
///
/// Returns [`RecError::Io`] if the file cannot be read and
/// [`RecError::MalformedInput`] if it cannot be parsed.
pub fn load_slice(path: impl AsRef<Path>) -> Result<Slice> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| RecError::Io { path: path.to_path_buf(), source })?;
    let slice = parse_slice(&text, &path.display().to_string())?;
    debug!(path = %path.display(), playlists = slice.playlists.len(), "loaded slice");
    Ok(slice)
}

/// List the `*.json` files under `root`.
///
/// Files without a numbered slice name come first, sorted by path. Numbered
/// slices follow in order of their start id, so `mpd.slice.2000-2999.json`
/// precedes `mpd.slice.10000-10999.json`.
pub fn discover_slice_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| RecError::Io {
            path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            source: e.into(),
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "json")
        {
            files.push(entry.into_path());
        }
    }
    files.sort_by_cached_key(|path| (slice_start(path), path.clone()));
    Ok(files)
}

/// Load a catalog from a slice file or a directory of slice files.
///
/// Playlists keep file order (see [`discover_slice_files`]), then in-file order.
///
/// # Errors
///
/// Returns [`RecError::Io`] if `path` does not exist or cannot be read, and
/// [`RecError::MalformedInput`] for the first slice that fails to parse.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let metadata =
        fs::metadata(path).map_err(|source| RecError::Io { path: path.to_path_buf(), source })?;

    let files =
        if metadata.is_dir() { discover_slice_files(path)? } else { vec![path.to_path_buf()] };
    if files.is_empty() {
        warn!(path = %path.display(), "no slice files found");
    }

    let mut playlists = Vec::new();
    for file in &files {
        playlists.extend(load_slice(file)?.playlists);
    }

    let catalog = Catalog::new(playlists);
    info!(
        path = %path.display(),
        files = files.len(),
        playlist_count = catalog.playlist_count(),
        track_count = catalog.track_count(),
        "catalog loaded"
    );
    Ok(catalog)
}
