//! Archive staging: change detection, download and extraction

pub mod change;
pub mod extract;
pub mod stager;

pub use change::{check_for_changes, decide, ChangeCheck, FetchDecision};
pub use extract::extract_archive;
pub use stager::{ArchiveStager, StageReport};
