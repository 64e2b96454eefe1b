//! Class distribution over a folder of label files.
//!
//! Purely diagnostic. A file that cannot be read or parsed is logged and
//! skipped; it never stops a partition run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde::Serialize;

use crate::error::PrepError;
use crate::ir::io_yolo::{list_label_files, read_label_file};

/// Box counts per class id.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClassDistribution {
    pub boxes_per_class: BTreeMap<usize, usize>,
    pub files_read: usize,
    /// Files skipped, with the reason.
    pub unreadable: Vec<(PathBuf, String)>,
}

impl ClassDistribution {
    pub fn total_boxes(&self) -> usize {
        self.boxes_per_class.values().sum()
    }

    /// Largest class id seen in any readable file.
    pub fn max_class_id(&self) -> Option<usize> {
        self.boxes_per_class.keys().next_back().copied()
    }
}

/// Count boxes per class over every `*.txt` directly inside `labels_dir`.
///
/// Only a failure to list the folder itself is an error.
pub fn inspect_class_distribution(labels_dir: &Path) -> Result<ClassDistribution, PrepError> {
    let mut distribution = ClassDistribution::default();

    let listing = list_label_files(labels_dir)?;
    for (label_path, reason) in listing.skipped {
        warn!("Skipping unreadable label file {}: {}", label_path.display(), reason);
        distribution.unreadable.push((label_path, reason));
    }

    for label_path in listing.files {
        match read_label_file(&label_path) {
            Ok(rows) => {
                distribution.files_read += 1;
                for row in rows {
                    *distribution.boxes_per_class.entry(row.class_id).or_insert(0) += 1;
                }
            }
            Err(err) => {
                warn!("Skipping unreadable label file {}: {}", label_path.display(), err);
                distribution.unreadable.push((label_path, err.to_string()));
            }
        }
    }

    Ok(distribution)
}
