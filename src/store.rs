//! JSON dataset on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CrawlerError;
use crate::types::Level;

/// Writes the whole collection, replacing any previous file.
///
/// The document goes to a sibling temp file first and is renamed into place,
/// so readers never see a half-written dataset.
pub fn save_levels(path: &Path, levels: &[Level]) -> Result<(), CrawlerError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let json = serde_json::to_string_pretty(levels)?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    info!("Saved {} levels to {}", levels.len(), path.display());
    Ok(())
}

pub fn load_levels(path: &Path) -> Result<Vec<Level>, CrawlerError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
