//! Change detection for remote archives
//!
//! Only sizes are compared. An archive that changed but kept exactly the same
//! byte length is not detected and will not be re-fetched.

use crate::error::{IngestError, Result};
use crate::remote::{RemoteArtifact, RemoteSource};
use std::path::Path;
use tracing::{debug, info, warn};

/// Why an archive must or must not be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// No local copy
    Missing,
    /// Remote size unknown; fetch again rather than trust the local copy
    SizeUnknown,
    /// Local copy has a different size and was removed
    SizeMismatch { local: u64, remote: u64 },
    UpToDate,
}

impl FetchDecision {
    pub fn must_fetch(self) -> bool {
        !matches!(self, FetchDecision::UpToDate)
    }
}

/// Pure decision over the local and remote sizes
pub fn decide(local_size: Option<u64>, remote_size: Option<u64>) -> FetchDecision {
    match (local_size, remote_size) {
        (None, _) => FetchDecision::Missing,
        (Some(_), None) => FetchDecision::SizeUnknown,
        (Some(local), Some(remote)) if local == remote => FetchDecision::UpToDate,
        (Some(local), Some(remote)) => FetchDecision::SizeMismatch { local, remote },
    }
}

/// Outcome of checking one artifact
#[derive(Debug)]
pub struct ChangeCheck {
    pub decision: FetchDecision,
    /// Set when the probe itself failed
    pub probe_error: Option<IngestError>,
}

/// Compare `local_path` with the remote artifact, deleting a stale local copy
///
/// The remote is only probed when a local copy exists. A failed probe is
/// reported in [`ChangeCheck::probe_error`] and treated as "size unknown".
pub async fn check_for_changes(
    remote: &dyn RemoteSource,
    artifact: &RemoteArtifact,
    local_path: &Path,
) -> Result<ChangeCheck> {
    let local_size = match std::fs::metadata(local_path) {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        Ok(_) => None,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };

    if local_size.is_none() {
        return Ok(ChangeCheck { decision: FetchDecision::Missing, probe_error: None });
    }

    let (remote_size, probe_error) = match remote.probe_size(artifact).await {
        Ok(size) => (size, None),
        Err(err) => {
            warn!(archive = %artifact.name, error = %err, "Size probe failed, forcing re-fetch");
            (None, Some(err))
        },
    };

    let decision = decide(local_size, remote_size);

    if let FetchDecision::SizeMismatch { local, remote } = decision {
        info!(archive = %artifact.name, local, remote, "Local archive is stale, removing it");
        std::fs::remove_file(local_path)?;
    } else {
        debug!(archive = %artifact.name, ?decision, "Checked archive");
    }

    Ok(ChangeCheck { decision, probe_error })
}
