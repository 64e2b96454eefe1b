//! Issue types shared by the conversion and partition reports.

use serde::Serialize;
use std::fmt;

/// One thing worth telling the operator about a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

impl RunIssue {
    /// An item was skipped; the run still completed.
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// A policy note; nothing was skipped.
    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

/// Stable issue codes. These appear in JSON output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A manifest image was not found in the source image folder.
    MissingSourceImage,
    /// Several manifest images share a file stem and therefore one label file.
    SharedLabelFile,
    /// Box coordinates are written in pixel units.
    UnnormalizedBoxes,
    /// An image slated for a split has no label file.
    MissingLabelFile,
    /// A label file could not be read or parsed during inspection.
    UnreadableLabelFile,
    /// The corpus was too small to split and went entirely to train.
    SmallCorpusAllTrain,
    /// Class names were inferred from class ids.
    InferredClassNames,
}

/// Renders warnings, then notes, as indented sections.
pub(crate) fn write_issue_sections(f: &mut fmt::Formatter<'_>, issues: &[RunIssue]) -> fmt::Result {
    for (severity, title) in [(Severity::Warning, "Warnings"), (Severity::Info, "Notes")] {
        let matching: Vec<&RunIssue> = issues.iter().filter(|i| i.severity == severity).collect();
        if matching.is_empty() {
            continue;
        }
        writeln!(f)?;
        writeln!(f, "{} ({}):", title, matching.len())?;
        for issue in matching {
            writeln!(f, "  - {}", issue.message)?;
        }
    }
    Ok(())
}

pub(crate) fn count_severity(issues: &[RunIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_serializes_with_snake_case_codes() {
        let issue = RunIssue::warning(IssueCode::MissingSourceImage, "image a.jpg not found");
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(json.contains("\"code\":\"missing_source_image\""));
    }

    #[test]
    fn count_severity_splits_warnings_and_notes() {
        let issues = vec![
            RunIssue::warning(IssueCode::MissingLabelFile, "a"),
            RunIssue::info(IssueCode::UnnormalizedBoxes, "b"),
            RunIssue::warning(IssueCode::MissingLabelFile, "c"),
        ];
        assert_eq!(count_severity(&issues, Severity::Warning), 2);
        assert_eq!(count_severity(&issues, Severity::Info), 1);
    }
}
