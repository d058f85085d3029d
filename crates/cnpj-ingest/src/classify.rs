//! File classification
//!
//! Extracted file names look like `K3241.K03200Y0.D50125.EMPRECSV`. The
//! category is recognised from fixed markers in the name. Rules are checked
//! in order and the first match wins; a name matching nothing is ignored.

use crate::error::Result;
use crate::schema::DatasetCategory;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A classification rule: every marker must occur in the upper-cased name
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub category: DatasetCategory,
    pub markers: &'static [&'static str],
}

/// Rules in priority order
pub const RULES: [ClassificationRule; 10] = [
    ClassificationRule { category: DatasetCategory::Company, markers: &["EMPRECSV"] },
    ClassificationRule { category: DatasetCategory::Establishment, markers: &["ESTABELE"] },
    ClassificationRule { category: DatasetCategory::Partner, markers: &["SOCIOCSV"] },
    ClassificationRule { category: DatasetCategory::SimplifiedTaxRegime, markers: &["SIMP", "CSV"] },
    ClassificationRule { category: DatasetCategory::ActivityCode, markers: &["CNAECSV"] },
    ClassificationRule { category: DatasetCategory::StatusReason, markers: &["MOTICSV"] },
    ClassificationRule { category: DatasetCategory::Municipality, markers: &["MUNICCSV"] },
    ClassificationRule { category: DatasetCategory::LegalNature, markers: &["NATJUCSV"] },
    ClassificationRule { category: DatasetCategory::Country, markers: &["PAISCSV"] },
    ClassificationRule { category: DatasetCategory::Qualification, markers: &["QUALSCSV"] },
];

/// Classify a single file name (case-insensitive)
pub fn classify_name(name: &str) -> Option<DatasetCategory> {
    let upper = name.to_uppercase();
    RULES
        .iter()
        .find(|rule| rule.markers.iter().all(|marker| upper.contains(marker)))
        .map(|rule| rule.category)
}

/// Files grouped by category, each group in listing order
#[derive(Debug, Default, Clone)]
pub struct ClassifiedFiles {
    files: BTreeMap<DatasetCategory, Vec<PathBuf>>,
    ignored: usize,
}

impl ClassifiedFiles {
    /// Classify paths by their file name
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut classified = ClassifiedFiles::default();

        for path in paths {
            let category = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(classify_name);

            match category {
                Some(category) => {
                    debug!(file = %path.display(), category = %category, "Classified file");
                    classified.files.entry(category).or_default().push(path);
                },
                None => {
                    debug!(file = %path.display(), "Ignoring unclassified file");
                    classified.ignored += 1;
                },
            }
        }

        classified
    }

    /// Files for a category; empty when none matched
    pub fn files(&self, category: DatasetCategory) -> &[PathBuf] {
        self.files.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn classified_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn ignored_count(&self) -> usize {
        self.ignored
    }
}

/// List the regular files of a flat directory, sorted by path
pub fn list_extracted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }

    paths.sort();
    Ok(paths)
}
