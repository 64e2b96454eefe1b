//! Per-image label files and the flat `images/` + `labels/` layout.
//!
//! A label file holds one line per box, `class_id cx cy w h`, with the four
//! box fields printed to six decimals. The file shares its stem with the
//! image it describes. `data.yaml` carries the class names next to the two
//! folders, in the shape Ultralytics trainers read.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::class_map::ClassMap;
use super::model::BoxRecord;
use crate::error::PrepError;

/// Extensions recognised as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 10] = [
    "bmp", "dng", "jpeg", "jpg", "mpo", "png", "tif", "tiff", "webp", "pfm",
];
pub const LABEL_EXTENSION: &str = "txt";
pub const DATA_YAML: &str = "data.yaml";
pub const CLASSES_TXT: &str = "classes.txt";

/// Largest class id accepted from a label file or a `data.yaml` mapping.
pub const MAX_CLASS_ID: usize = 65_535;

/// A flat dataset folder: `root/images/*` with `root/labels/*.txt`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YoloLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl YoloLayout {
    /// Layout rooted at `root` without checking the filesystem.
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            images_dir: root.join("images"),
            labels_dir: root.join("labels"),
        }
    }

    /// Create both folders.
    pub fn create(&self) -> Result<(), PrepError> {
        fs::create_dir_all(&self.images_dir)?;
        fs::create_dir_all(&self.labels_dir)?;
        Ok(())
    }

    /// Where the label file for `image_path` lives.
    pub fn label_path_for(&self, image_path: &Path) -> PathBuf {
        // Push the extension instead of `with_extension`, which would eat a
        // dotted stem like `img.001`.
        let mut name = image_path
            .file_stem()
            .unwrap_or(image_path.as_os_str())
            .to_os_string();
        name.push(".");
        name.push(LABEL_EXTENSION);
        self.labels_dir.join(name)
    }
}

/// Check that `root` holds both `images/` and `labels/`.
pub fn discover_layout(root: &Path) -> Result<YoloLayout, PrepError> {
    if !root.is_dir() {
        return Err(PrepError::LayoutInvalid {
            path: root.to_path_buf(),
            message: "data folder must be a directory".to_string(),
        });
    }

    let layout = YoloLayout::at(root);
    if !layout.images_dir.is_dir() {
        return Err(PrepError::LayoutInvalid {
            path: layout.images_dir,
            message: "missing images/ directory".to_string(),
        });
    }
    if !layout.labels_dir.is_dir() {
        return Err(PrepError::LayoutInvalid {
            path: layout.labels_dir,
            message: "missing labels/ directory".to_string(),
        });
    }

    Ok(layout)
}

/// Files found by a flat directory listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub files: Vec<PathBuf>,
    /// Entries that could not be inspected (a dangling symlink, say), with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Image files directly inside `images_dir`, sorted by file name.
///
/// An image entry that cannot be inspected is fatal.
pub fn list_images(images_dir: &Path) -> Result<Vec<PathBuf>, PrepError> {
    let listing = list_files_with_extensions(images_dir, &IMAGE_EXTENSIONS)?;
    if let Some((path, reason)) = listing.skipped.into_iter().next() {
        return Err(PrepError::LayoutInvalid {
            path,
            message: format!("cannot inspect image entry: {reason}"),
        });
    }
    Ok(listing.files)
}

/// Label files directly inside `labels_dir`, sorted by file name.
///
/// Entries that cannot be inspected are returned in [`Listing::skipped`];
/// only failing to read `labels_dir` itself is an error.
pub fn list_label_files(labels_dir: &Path) -> Result<Listing, PrepError> {
    list_files_with_extensions(labels_dir, &[LABEL_EXTENSION])
}

fn list_files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<Listing, PrepError> {
    let mut listing = Listing::default();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                if has_extension(&path, extensions) {
                    listing.skipped.push((path, err.to_string()));
                }
                continue;
            }
            Err(err) => {
                return Err(PrepError::LayoutInvalid {
                    path: dir.to_path_buf(),
                    message: format!("failed while listing directory: {err}"),
                })
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            listing.files.push(entry.into_path());
        }
    }

    Ok(listing)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

// ============================================================================
// Label files
// ============================================================================

/// Write `records` as a label file, one line each, replacing any old file.
pub fn write_label_file(path: &Path, records: &[BoxRecord]) -> Result<(), PrepError> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for record in records {
        writeln!(writer, "{record}")?;
    }
    writer.flush()?;
    Ok(())
}

/// One parsed label line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRow {
    pub class_id: usize,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// Parse every non-blank line of a label file.
pub fn read_label_file(path: &Path) -> Result<Vec<LabelRow>, PrepError> {
    let content = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(row) = parse_label_line(line, path, line_idx + 1)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelRow>, PrepError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // At most 6 tokens, so one huge line cannot allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() != 5 {
        return Err(PrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: if tokens.len() < 5 {
                format!("expected 5 fields, found {}", tokens.len())
            } else {
                "expected 5 fields, found more".to_string()
            },
        });
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| PrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid class_id '{}'", tokens[0]),
        })?;
    if class_id > MAX_CLASS_ID {
        return Err(PrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("class_id {class_id} exceeds {MAX_CLASS_ID}"),
        });
    }

    let mut values = [0.0f64; 4];
    for (slot, (raw, field)) in values
        .iter_mut()
        .zip(tokens[1..].iter().zip(["x_center", "y_center", "width", "height"]))
    {
        *slot = raw.parse::<f64>().map_err(|_| PrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field} '{raw}'"),
        })?;
    }
    let [cx, cy, w, h] = values;

    Ok(Some(LabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
    }))
}

/// Fuzz-only entrypoint for single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), PrepError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

// ============================================================================
// data.yaml / classes.txt
// ============================================================================

/// Training config consumed by the external trainer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Absolute dataset root; the split paths below are relative to it.
    pub path: String,
    pub train: String,
    pub val: String,
    pub test: String,
    pub nc: usize,
    pub names: BTreeMap<usize, String>,
}

/// Class list written next to converter output.
#[derive(Debug, Serialize)]
struct NamesOnly<'a> {
    nc: usize,
    names: BTreeMap<usize, &'a str>,
}

/// Write `data.yaml` with the dataset's class list into `root`.
pub fn write_names_yaml(root: &Path, class_map: &ClassMap) -> Result<PathBuf, PrepError> {
    let doc = NamesOnly {
        nc: class_map.len(),
        names: class_map
            .names()
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx, name.as_str()))
            .collect(),
    };
    let path = root.join(DATA_YAML);
    write_yaml(&path, &doc)?;
    Ok(path)
}

/// Write a full training config to `path`.
pub fn write_dataset_config(path: &Path, config: &DatasetConfig) -> Result<(), PrepError> {
    write_yaml(path, config)
}

/// Read a training config back.
pub fn read_dataset_config(path: &Path) -> Result<DatasetConfig, PrepError> {
    let data = fs::read_to_string(path)?;
    serde_yaml::from_str(&data).map_err(|source| PrepError::DataYamlParse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), PrepError> {
    let yaml = serde_yaml::to_string(value).map_err(|source| PrepError::DataYamlWrite {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, yaml)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Class names from the `names` key of a `data.yaml`.
///
/// Both the list form and the `id: name` mapping form are accepted. Gaps in
/// a mapping are filled with `class_<id>`.
pub fn read_data_yaml_names(path: &Path) -> Result<Vec<String>, PrepError> {
    let data = fs::read_to_string(path)?;
    let parsed: DataYaml =
        serde_yaml::from_str(&data).map_err(|source| PrepError::DataYamlParse {
            path: path.to_path_buf(),
            source,
        })?;

    let names = match parsed.names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            let Some(max_index) = mapping.keys().max().copied() else {
                return Ok(Vec::new());
            };
            if max_index > MAX_CLASS_ID {
                return Err(PrepError::DataYamlInvalid {
                    path: path.to_path_buf(),
                    message: format!("class id {max_index} in names exceeds {MAX_CLASS_ID}"),
                });
            }
            (0..=max_index)
                .map(|idx| match mapping.get(&idx) {
                    Some(name) if !name.trim().is_empty() => name.clone(),
                    _ => format!("class_{idx}"),
                })
                .collect()
        }
    };

    Ok(names)
}

/// Class names from a `classes.txt`, one per line.
pub fn read_classes_txt(path: &Path) -> Result<Vec<String>, PrepError> {
    let data = fs::read_to_string(path)?;
    let mut names = Vec::new();

    for (line_idx, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(PrepError::ClassesTxtInvalid {
                path: path.to_path_buf(),
                message: format!("line {} is empty", line_idx + 1),
            });
        }
        names.push(trimmed.to_string());
    }

    Ok(names)
}
