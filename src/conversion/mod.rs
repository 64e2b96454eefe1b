//! COCO manifest to per-image label files.
//!
//! The converter picks the newest manifest under a search root, copies every
//! listed image it can find into `<output>/images/`, and writes one label
//! file per image stem into `<output>/labels/`. An existing `labels/` is
//! cleared first so it always matches the manifest.
//!
//! All annotation references are resolved before anything is written, so a
//! manifest with a dangling image or category id leaves no output behind.

pub mod report;

pub use report::{ConversionReport, ManifestCounts, WrittenCounts};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::PrepError;
use crate::ir::io_coco_json::{find_latest_manifest, read_manifest};
use crate::ir::io_yolo::{write_label_file, write_names_yaml, YoloLayout};
use crate::ir::{BoxRecord, ClassMap, ImageRecord, Manifest};
use crate::metrics::MetricsSink;
use crate::report::{IssueCode, RunIssue};

/// Inputs of a conversion run.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Searched recursively for the newest `*.json` manifest.
    pub manifest_root: PathBuf,
    /// Flat folder holding the source images, looked up by basename.
    pub image_folder: PathBuf,
    pub output_folder: PathBuf,
    /// Divide boxes by image size. Off by default: the label files then
    /// carry pixel-unit centres and extents.
    pub normalize: bool,
}

/// Boxes destined for one label file, in manifest order.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelFile {
    pub file_name: String,
    pub records: Vec<BoxRecord>,
}

/// Run the conversion.
pub fn convert_coco_to_yolo(
    opts: &ConvertOptions,
    sink: &mut dyn MetricsSink,
) -> Result<ConversionReport, PrepError> {
    let manifest_path = find_latest_manifest(&opts.manifest_root)?;
    info!("Using manifest {}", manifest_path.display());

    let manifest = read_manifest(&manifest_path)?;
    info!(
        "Parsed manifest: {} images, {} categories, {} annotations",
        manifest.images.len(),
        manifest.categories.len(),
        manifest.annotations.len()
    );

    let class_map = ClassMap::from_categories(&manifest.categories);
    let label_files = build_label_files(&manifest, &class_map, opts.normalize)?;

    let mut report = ConversionReport::new(&manifest_path, &opts.output_folder);
    report.input = ManifestCounts {
        images: manifest.images.len(),
        categories: manifest.categories.len(),
        annotations: manifest.annotations.len(),
    };
    report.classes = class_map.names().to_vec();

    let layout = YoloLayout::at(&opts.output_folder);
    check_image_folder_is_separate(&opts.image_folder, &layout)?;
    if layout.labels_dir.exists() {
        warn!(
            "Directory {} already exists. Deleting and recreating it.",
            layout.labels_dir.display()
        );
        fs::remove_dir_all(&layout.labels_dir)?;
    }
    layout.create()?;

    copy_images(&manifest, opts, &layout, &mut report)?;
    info!(
        "Copied {} image(s), {} missing",
        report.written.images_copied, report.written.images_missing
    );

    for label_file in &label_files {
        write_label_file(&layout.labels_dir.join(&label_file.file_name), &label_file.records)?;
        report.written.boxes += label_file.records.len();
    }
    report.written.label_files = label_files.len();
    info!(
        "Wrote {} label file(s) with {} box(es)",
        report.written.label_files, report.written.boxes
    );

    write_names_yaml(&layout.root, &class_map)?;

    note_shared_label_files(&manifest, &mut report);
    if !opts.normalize {
        report.add(RunIssue::info(
            IssueCode::UnnormalizedBoxes,
            "box centres and extents are in pixel units (pass --normalize for [0, 1] values)",
        ));
    }

    sink.record("convert/images", report.input.images as f64);
    sink.record("convert/categories", report.input.categories as f64);
    sink.record("convert/annotations", report.input.annotations as f64);
    sink.record("convert/images_copied", report.written.images_copied as f64);
    sink.record("convert/images_missing", report.written.images_missing as f64);
    sink.record("convert/label_files", report.written.label_files as f64);

    Ok(report)
}

/// Resolve every annotation and group its box under the image's label file.
///
/// Label files appear in the order their first box is met; boxes inside a
/// file keep manifest order. Nothing is sorted.
///
/// # Errors
/// [`PrepError::DanglingImageRef`] or [`PrepError::DanglingCategoryRef`] on
/// the first annotation that does not resolve, and
/// [`PrepError::InvalidImageSize`] when normalising against a zero dimension.
pub fn build_label_files(
    manifest: &Manifest,
    class_map: &ClassMap,
    normalize: bool,
) -> Result<Vec<LabelFile>, PrepError> {
    let images = manifest.image_index();
    let mut files: Vec<LabelFile> = Vec::new();
    let mut slot_by_name: HashMap<String, usize> = HashMap::new();

    for ann in &manifest.annotations {
        let image = images
            .get(&ann.image_id)
            .ok_or_else(|| PrepError::DanglingImageRef {
                annotation: ann.describe(),
                image_id: ann.image_id.as_u64(),
            })?;
        let class_id =
            class_map
                .class_for(ann.category_id)
                .ok_or_else(|| PrepError::DanglingCategoryRef {
                    annotation: ann.describe(),
                    category_id: ann.category_id.as_u64(),
                })?;

        let mut record = BoxRecord::from_coco(class_id, &ann.bbox);
        if normalize {
            record = normalize_for(image, &record)?;
        }

        let file_name = image.label_file_name();
        let slot = match slot_by_name.get(&file_name) {
            Some(slot) => *slot,
            None => {
                slot_by_name.insert(file_name.clone(), files.len());
                files.push(LabelFile {
                    file_name,
                    records: Vec::new(),
                });
                files.len() - 1
            }
        };
        files[slot].records.push(record);
    }

    Ok(files)
}

/// Refuse an image folder that is the output `images/` folder, or lies in
/// `labels/`, which is cleared before writing.
fn check_image_folder_is_separate(
    image_folder: &Path,
    layout: &YoloLayout,
) -> Result<(), PrepError> {
    let Ok(images) = image_folder.canonicalize() else {
        return Ok(());
    };

    let is_output_images = layout
        .images_dir
        .canonicalize()
        .is_ok_and(|out| out == images);
    let is_in_labels = layout
        .labels_dir
        .canonicalize()
        .is_ok_and(|labels| images.starts_with(labels));
    if is_output_images || is_in_labels {
        return Err(PrepError::ImageFolderIsOutput { path: images });
    }
    Ok(())
}

fn normalize_for(image: &ImageRecord, record: &BoxRecord) -> Result<BoxRecord, PrepError> {
    if image.width == 0 || image.height == 0 {
        return Err(PrepError::InvalidImageSize {
            file_name: image.file_name.clone(),
            width: image.width,
            height: image.height,
        });
    }
    Ok(record.normalized(image.width as f64, image.height as f64))
}

fn copy_images(
    manifest: &Manifest,
    opts: &ConvertOptions,
    layout: &YoloLayout,
    report: &mut ConversionReport,
) -> Result<(), PrepError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for image in &manifest.images {
        let basename = image.basename();
        if !seen.insert(basename) {
            continue;
        }

        let src = opts.image_folder.join(basename);
        if !src.is_file() {
            warn!("Source image not found: {}", src.display());
            report.add(RunIssue::warning(
                IssueCode::MissingSourceImage,
                format!("source image not found: {}", src.display()),
            ));
            report.written.images_missing += 1;
            continue;
        }

        fs::copy(&src, layout.images_dir.join(basename))?;
        report.written.images_copied += 1;
    }

    Ok(())
}

fn note_shared_label_files(manifest: &Manifest, report: &mut ConversionReport) {
    let mut basenames_by_label: HashMap<String, HashSet<&str>> = HashMap::new();
    for image in &manifest.images {
        basenames_by_label
            .entry(image.label_file_name())
            .or_default()
            .insert(image.basename());
    }

    let mut shared: Vec<(String, usize)> = basenames_by_label
        .into_iter()
        .filter(|(_, basenames)| basenames.len() > 1)
        .map(|(label, basenames)| (label, basenames.len()))
        .collect();
    shared.sort();

    for (label, count) in shared {
        report.add(RunIssue::info(
            IssueCode::SharedLabelFile,
            format!("{count} images share label file {label}"),
        ));
    }
}
