//! Train/valid/test partitioning of a flat `images/` + `labels/` folder.
//!
//! Output layout:
//!
//! ```text
//! <output>/
//!   data.yaml
//!   train/images/  train/labels/
//!   valid/images/  valid/labels/
//!   test/images/   test/labels/
//! ```
//!
//! All three split folders are always created, even when empty.

mod inspect;
mod plan;
mod report;

pub use inspect::{inspect_class_distribution, ClassDistribution};
pub use plan::{plan_split, Split, SplitPlan, SplitRatios, DEFAULT_SPLIT_SEED, MIN_SPLITTABLE};
pub use report::{ClassNameSource, PartitionReport, SplitSummary};

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::PrepError;
use crate::ir::io_yolo::{
    discover_layout, list_images, read_classes_txt, read_data_yaml_names, write_dataset_config,
    DatasetConfig, YoloLayout, CLASSES_TXT, DATA_YAML,
};
use crate::ir::ClassMap;
use crate::metrics::MetricsSink;
use crate::report::{IssueCode, RunIssue};

/// Inputs of a partition run.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    /// Folder holding `images/` and `labels/`.
    pub data_folder: PathBuf,
    pub output_folder: PathBuf,
    pub ratios: SplitRatios,
    pub seed: u64,
    /// Class names by dense id. When empty they are read from the source.
    pub names: Vec<String>,
}

impl SplitOptions {
    pub fn new(data_folder: impl Into<PathBuf>, output_folder: impl Into<PathBuf>) -> Self {
        Self {
            data_folder: data_folder.into(),
            output_folder: output_folder.into(),
            ratios: SplitRatios::default(),
            seed: DEFAULT_SPLIT_SEED,
            names: Vec::new(),
        }
    }
}

/// One split's images and their label paths, position for position.
///
/// A label path may not exist: an image without boxes has no label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSplit {
    pub split: Split,
    pub images: Vec<PathBuf>,
    pub labels: Vec<PathBuf>,
}

impl DatasetSplit {
    fn from_images(split: Split, layout: &YoloLayout, images: &[PathBuf]) -> Self {
        Self {
            split,
            images: images.to_vec(),
            labels: images
                .iter()
                .map(|image| layout.label_path_for(image))
                .collect(),
        }
    }
}

/// Run the partition.
pub fn partition_dataset(
    opts: &SplitOptions,
    sink: &mut dyn MetricsSink,
) -> Result<PartitionReport, PrepError> {
    let source = discover_layout(&opts.data_folder)?;
    check_output_is_separate(&source.root, &opts.output_folder)?;

    let images = list_images(&source.images_dir)?;
    info!(
        "Found {} image(s) in {}",
        images.len(),
        source.images_dir.display()
    );

    let distribution = inspect_class_distribution(&source.labels_dir)?;
    let (classes, class_source) = resolve_class_names(opts, &source.root, &distribution)?;

    let mut report = PartitionReport {
        source: source.root.clone(),
        output: opts.output_folder.clone(),
        config: opts.output_folder.join(DATA_YAML),
        seed: opts.seed,
        total_images: images.len(),
        classes,
        class_source,
        class_distribution: distribution.boxes_per_class.clone(),
        ..Default::default()
    };

    for (path, reason) in &distribution.unreadable {
        report.add(RunIssue::warning(
            IssueCode::UnreadableLabelFile,
            format!("skipped unreadable label file {}: {}", path.display(), reason),
        ));
    }
    if class_source == ClassNameSource::Inferred && !report.classes.is_empty() {
        report.add(RunIssue::info(
            IssueCode::InferredClassNames,
            "class names inferred from label ids; pass --names or add data.yaml to name them",
        ));
    }

    let plan = plan_split(&images, opts.ratios, opts.seed);
    if images.len() < MIN_SPLITTABLE {
        report.add(RunIssue::info(
            IssueCode::SmallCorpusAllTrain,
            format!(
                "{} image(s) is too few to split; all assigned to train",
                images.len()
            ),
        ));
    }
    info!(
        "Planned split: {} train, {} valid, {} test",
        plan.train.len(),
        plan.valid.len(),
        plan.test.len()
    );

    fs::create_dir_all(&opts.output_folder)?;
    for split in Split::ALL {
        let dataset_split = DatasetSplit::from_images(split, &source, plan.get(split));
        let summary = copy_split(&dataset_split, &opts.output_folder, &mut report)?;
        info!(
            "Wrote {} split: {} image(s), {} label file(s)",
            split, summary.images, summary.labels_copied
        );
        report.splits.push(summary);
    }

    let config = dataset_config(&opts.output_folder, &report.classes)?;
    write_dataset_config(&report.config, &config)?;
    info!("Wrote dataset config {}", report.config.display());

    record_metrics(&report, &distribution, sink);
    Ok(report)
}

fn check_output_is_separate(source_root: &Path, output: &Path) -> Result<(), PrepError> {
    let Ok(output) = output.canonicalize() else {
        // Output does not exist yet, so it cannot be the source.
        return Ok(());
    };
    let source = source_root.canonicalize()?;

    let clashes = output == source
        || Split::ALL
            .iter()
            .any(|split| source.starts_with(output.join(split.dir_name())));
    if clashes {
        return Err(PrepError::OutputOverlapsSource { path: output });
    }
    Ok(())
}

fn resolve_class_names(
    opts: &SplitOptions,
    source_root: &Path,
    distribution: &ClassDistribution,
) -> Result<(Vec<String>, ClassNameSource), PrepError> {
    if !opts.names.is_empty() {
        // Duplicates keep their first position.
        let names = ClassMap::from_names(&opts.names).names().to_vec();
        return Ok((names, ClassNameSource::Explicit));
    }

    let data_yaml = source_root.join(DATA_YAML);
    if data_yaml.is_file() {
        return Ok((read_data_yaml_names(&data_yaml)?, ClassNameSource::DataYaml));
    }

    let classes_txt = source_root.join(CLASSES_TXT);
    if classes_txt.is_file() {
        return Ok((read_classes_txt(&classes_txt)?, ClassNameSource::ClassesTxt));
    }

    // Label ids are capped at MAX_CLASS_ID when parsed, which bounds this list.
    let names = match distribution.max_class_id() {
        Some(max_id) => (0..=max_id).map(|id| format!("class_{id}")).collect(),
        None => Vec::new(),
    };
    Ok((names, ClassNameSource::Inferred))
}

/// Copy one split's images and labels into `<output>/<split>/`.
///
/// The split folder is recreated from scratch first.
fn copy_split(
    dataset_split: &DatasetSplit,
    output_root: &Path,
    report: &mut PartitionReport,
) -> Result<SplitSummary, PrepError> {
    let split_root = output_root.join(dataset_split.split.dir_name());
    if split_root.exists() {
        warn!(
            "Directory {} already exists. Deleting and recreating it.",
            split_root.display()
        );
        fs::remove_dir_all(&split_root)?;
    }
    let target = YoloLayout::at(&split_root);
    target.create()?;

    let mut summary = SplitSummary {
        split: dataset_split.split,
        images: 0,
        labels_copied: 0,
        labels_missing: 0,
    };

    for (image, label) in dataset_split.images.iter().zip(&dataset_split.labels) {
        let Some(image_name) = image.file_name() else {
            continue;
        };
        fs::copy(image, target.images_dir.join(image_name))?;
        summary.images += 1;

        if label.is_file() {
            let Some(label_name) = label.file_name() else {
                continue;
            };
            fs::copy(label, target.labels_dir.join(label_name))?;
            summary.labels_copied += 1;
        } else {
            warn!("No label file for {}", image.display());
            report.add(RunIssue::warning(
                IssueCode::MissingLabelFile,
                format!(
                    "no label file {} for image {}",
                    label.display(),
                    image.display()
                ),
            ));
            summary.labels_missing += 1;
        }
    }

    Ok(summary)
}

fn dataset_config(output_root: &Path, classes: &[String]) -> Result<DatasetConfig, PrepError> {
    let root = output_root.canonicalize()?;
    let images_rel = |split: Split| format!("{}/images", split.dir_name());

    Ok(DatasetConfig {
        path: root.to_string_lossy().into_owned(),
        train: images_rel(Split::Train),
        val: images_rel(Split::Valid),
        test: images_rel(Split::Test),
        nc: classes.len(),
        names: classes.iter().cloned().enumerate().collect(),
    })
}

fn record_metrics(
    report: &PartitionReport,
    distribution: &ClassDistribution,
    sink: &mut dyn MetricsSink,
) {
    sink.record("split/total", report.total_images as f64);
    for summary in &report.splits {
        sink.record(&format!("split/{}", summary.split), summary.images as f64);
    }
    let labels_missing: usize = report.splits.iter().map(|s| s.labels_missing).sum();
    sink.record("split/labels_missing", labels_missing as f64);
    sink.record("split/labels_unreadable", distribution.unreadable.len() as f64);
    sink.record("split/boxes", distribution.total_boxes() as f64);
    for (class_id, boxes) in &distribution.boxes_per_class {
        sink.record(&format!("split/class/{class_id}"), *boxes as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MemorySink;

    fn make_source(root: &Path, stems: &[&str], unlabeled: &[&str]) {
        fs::create_dir_all(root.join("images")).expect("create images");
        fs::create_dir_all(root.join("labels")).expect("create labels");
        for stem in stems {
            fs::write(root.join(format!("images/{stem}.jpg")), stem.as_bytes())
                .expect("write image");
            if !unlabeled.contains(stem) {
                fs::write(root.join(format!("labels/{stem}.txt")), "0 1 1 2 2\n")
                    .expect("write label");
            }
        }
    }

    #[test]
    fn missing_labels_folder_aborts_before_output() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("images")).expect("create images");
        let out = temp.path().join("out");

        let err = partition_dataset(&SplitOptions::new(&src, &out), &mut MemorySink::new())
            .unwrap_err();
        assert!(matches!(err, PrepError::LayoutInvalid { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn output_equal_to_source_is_rejected() {
        let temp = tempfile::tempdir().expect("create temp dir");
        make_source(temp.path(), &["a", "b", "c"], &[]);

        let err = partition_dataset(
            &SplitOptions::new(temp.path(), temp.path()),
            &mut MemorySink::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PrepError::OutputOverlapsSource { .. }));
    }

    #[test]
    fn unlabeled_images_are_copied_with_a_warning() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        make_source(&src, &["a", "b"], &["b"]);

        let mut sink = MemorySink::new();
        let report = partition_dataset(&SplitOptions::new(&src, &out), &mut sink)
            .expect("partition");

        assert!(out.join("train/images/b.jpg").is_file());
        assert!(!out.join("train/labels/b.txt").exists());
        assert!(out.join("train/labels/a.txt").is_file());
        assert_eq!(report.warning_count(), 1);
        assert_eq!(sink.get("split/labels_missing"), Some(1.0));
        assert_eq!(sink.get("split/class/0"), Some(1.0));
    }

    #[test]
    fn oversized_class_id_is_skipped_with_a_warning() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        make_source(&src, &["a", "b", "c", "d"], &[]);
        fs::write(src.join("labels/a.txt"), "18446744073709551615 1 1 2 2\n")
            .expect("overwrite label");

        let mut sink = MemorySink::new();
        let report = partition_dataset(&SplitOptions::new(&src, &out), &mut sink)
            .expect("partition");

        assert_eq!(report.classes, ["class_0"]);
        assert!(report
            .issues
            .iter()
            .any(|issue| issue.code == IssueCode::UnreadableLabelFile
                && issue.message.contains("a.txt")));
        assert_eq!(sink.get("split/labels_unreadable"), Some(1.0));
        assert_eq!(sink.get("split/boxes"), Some(3.0));
        assert_eq!(report.total_images, 4);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_label_symlink_does_not_abort() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        make_source(&src, &["a", "b", "c", "d"], &[]);
        std::os::unix::fs::symlink(src.join("labels/nowhere.txt"), src.join("labels/e.txt"))
            .expect("symlink");

        let report = partition_dataset(&SplitOptions::new(&src, &out), &mut MemorySink::new())
            .expect("partition");

        assert_eq!(report.total_images, 4);
        assert_eq!(report.warning_count(), 1);
        assert!(report.issues[0].message.contains("e.txt"));
    }

    #[test]
    fn stale_split_contents_are_replaced() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        make_source(&src, &["a", "b", "c", "d"], &[]);
        fs::create_dir_all(out.join("test/images")).expect("create stale dir");
        fs::write(out.join("test/images/stale.jpg"), b"old").expect("write stale");

        partition_dataset(&SplitOptions::new(&src, &out), &mut MemorySink::new())
            .expect("partition");
        assert!(!out.join("test/images/stale.jpg").exists());
    }

    #[test]
    fn class_names_prefer_explicit_then_data_yaml() {
        let temp = tempfile::tempdir().expect("create temp dir");
        make_source(temp.path(), &["a"], &[]);
        fs::write(temp.path().join(CLASSES_TXT), "from_txt\n").expect("write classes");
        let dist = ClassDistribution::default();

        let mut opts = SplitOptions::new(temp.path(), temp.path().join("out"));
        let (names, source) = resolve_class_names(&opts, temp.path(), &dist).unwrap();
        assert_eq!((names, source), (vec!["from_txt".to_string()], ClassNameSource::ClassesTxt));

        fs::write(temp.path().join(DATA_YAML), "names: [from_yaml]\n").expect("write yaml");
        let (names, source) = resolve_class_names(&opts, temp.path(), &dist).unwrap();
        assert_eq!((names, source), (vec!["from_yaml".to_string()], ClassNameSource::DataYaml));

        opts.names = vec!["explicit".to_string(), "explicit".to_string()];
        let (names, source) = resolve_class_names(&opts, temp.path(), &dist).unwrap();
        assert_eq!((names, source), (vec!["explicit".to_string()], ClassNameSource::Explicit));
    }

    #[test]
    fn inferred_names_cover_largest_class_id() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let dist = ClassDistribution {
            boxes_per_class: [(0, 1), (2, 5)].into_iter().collect(),
            ..Default::default()
        };
        let opts = SplitOptions::new(temp.path(), temp.path().join("out"));

        let (names, source) = resolve_class_names(&opts, temp.path(), &dist).unwrap();
        assert_eq!(names, ["class_0", "class_1", "class_2"]);
        assert_eq!(source, ClassNameSource::Inferred);
    }
}
