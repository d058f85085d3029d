//! Zip extraction into a flat directory

use crate::error::Result;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extract every file entry of `archive` into `dest_dir`
///
/// Entries are written under their base name only, overwriting files of the
/// same name. Returns the written paths in archive order.
pub fn extract_archive(archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let mut extracted = Vec::with_capacity(zip.len());

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;

        if entry.is_dir() {
            continue;
        }

        let Some(file_name) = entry
            .enclosed_name()
            .and_then(|path| path.file_name().map(|n| n.to_os_string()))
        else {
            warn!(archive = %archive.display(), entry = entry.name(), "Skipping unsafe zip entry");
            continue;
        };

        let target = dest_dir.join(file_name);
        let mut out = File::create(&target)?;
        let written = std::io::copy(&mut entry, &mut out)?;

        debug!(file = %target.display(), bytes = written, "Extracted");
        extracted.push(target);
    }

    Ok(extracted)
}
