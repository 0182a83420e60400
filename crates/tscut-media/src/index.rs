//! PTS map persistence.
//!
//! The index is a pretty-printed JSON object keyed by timestamp. It is the
//! only contract between `analyze` and `split`, which may run as separate
//! processes.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use tscut_models::PtsMap;

use crate::error::{MediaError, MediaResult};

/// Directory next to the recording that holds its index.
pub const METADATA_DIR: &str = "_metadata";

/// Extension of index files.
pub const INDEX_EXTENSION: &str = "ptsmap";

/// `<input dir>/_metadata/<input stem>.ptsmap`
pub fn default_index_path(input: &Path) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".");
    name.push(INDEX_EXTENSION);
    dir.join(METADATA_DIR).join(name)
}

/// Write `map` to `path`, creating parent directories.
pub async fn save_pts_map(map: &PtsMap, path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = map
        .to_json_pretty()
        .map_err(|e| MediaError::invalid_index(path, e))?;
    tokio::fs::write(path, json).await?;
    info!(path = %path.display(), entries = map.len(), "Saved PTS map");
    Ok(())
}

/// Read and validate the index at `path`.
pub async fn load_pts_map(path: &Path) -> MediaResult<PtsMap> {
    if !path.is_file() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let json = tokio::fs::read_to_string(path).await?;
    let map = PtsMap::from_json_str(&json).map_err(|e| MediaError::invalid_index(path, e))?;
    map.validate().map_err(|e| MediaError::invalid_index(path, e))?;
    debug!(path = %path.display(), entries = map.len(), "Loaded PTS map");
    Ok(map)
}
