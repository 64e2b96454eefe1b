//! Report for a partition run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::plan::Split;
use crate::report::{count_severity, write_issue_sections, RunIssue, Severity};

/// Where class names came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassNameSource {
    /// Passed in by the caller.
    Explicit,
    /// `names` of the source `data.yaml`.
    DataYaml,
    /// Source `classes.txt`.
    ClassesTxt,
    /// `class_<id>` placeholders up to the largest id in the labels.
    #[default]
    Inferred,
}

impl fmt::Display for ClassNameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassNameSource::Explicit => "explicit list",
            ClassNameSource::DataYaml => "data.yaml",
            ClassNameSource::ClassesTxt => "classes.txt",
            ClassNameSource::Inferred => "inferred from labels",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub split: Split,
    pub images: usize,
    pub labels_copied: usize,
    pub labels_missing: usize,
}

/// Outcome of a partition run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PartitionReport {
    pub source: PathBuf,
    pub output: PathBuf,
    /// The `data.yaml` written for the trainer.
    pub config: PathBuf,
    pub seed: u64,
    pub total_images: usize,
    pub splits: Vec<SplitSummary>,
    pub classes: Vec<String>,
    pub class_source: ClassNameSource,
    /// Box counts per class id over the source labels.
    pub class_distribution: BTreeMap<usize, usize>,
    pub issues: Vec<RunIssue>,
}

impl PartitionReport {
    pub fn add(&mut self, issue: RunIssue) {
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        count_severity(&self.issues, Severity::Warning)
    }

    pub fn summary(&self, split: Split) -> Option<&SplitSummary> {
        self.splits.iter().find(|s| s.split == split)
    }
}

impl fmt::Display for PartitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Partitioned {} image(s) from {} (seed {})",
            self.total_images,
            self.source.display(),
            self.seed
        )?;
        for summary in &self.splits {
            writeln!(
                f,
                "  {:<5} {:>6} images, {:>6} labels ({} missing)",
                summary.split.dir_name(),
                summary.images,
                summary.labels_copied,
                summary.labels_missing
            )?;
        }

        writeln!(
            f,
            "  {} class(es) from {}",
            self.classes.len(),
            self.class_source
        )?;
        for (id, name) in self.classes.iter().enumerate() {
            let boxes = self.class_distribution.get(&id).copied().unwrap_or(0);
            writeln!(f, "    {id}: {name} ({boxes} boxes)")?;
        }
        writeln!(f, "  config written to {}", self.config.display())?;

        write_issue_sections(f, &self.issues)
    }
}
