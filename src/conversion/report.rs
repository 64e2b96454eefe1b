//! Report for a COCO to label-file conversion run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::report::{count_severity, write_issue_sections, RunIssue, Severity};

/// What a conversion read, what it wrote, and what it skipped.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// The manifest that was selected.
    pub manifest: PathBuf,
    /// Output root holding `images/`, `labels/` and `data.yaml`.
    pub output: PathBuf,
    pub input: ManifestCounts,
    pub written: WrittenCounts,
    /// Class names by dense id.
    pub classes: Vec<String>,
    pub issues: Vec<RunIssue>,
}

impl ConversionReport {
    pub fn new(manifest: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: RunIssue) {
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        count_severity(&self.issues, Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        count_severity(&self.issues, Severity::Info)
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Converted {}", self.manifest.display())?;
        writeln!(
            f,
            "  manifest: {} images, {} categories, {} annotations",
            self.input.images, self.input.categories, self.input.annotations
        )?;
        writeln!(
            f,
            "  output:   {} images copied ({} missing), {} label files, {} boxes, {} classes",
            self.written.images_copied,
            self.written.images_missing,
            self.written.label_files,
            self.written.boxes,
            self.classes.len()
        )?;
        writeln!(f, "  written to {}", self.output.display())?;

        write_issue_sections(f, &self.issues)
    }
}

/// Sizes of the three manifest collections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ManifestCounts {
    pub images: usize,
    pub categories: usize,
    pub annotations: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WrittenCounts {
    pub images_copied: usize,
    pub images_missing: usize,
    pub label_files: usize,
    pub boxes: usize,
}
