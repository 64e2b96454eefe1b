//! COCO JSON manifest discovery and reading.
//!
//! COCO bounding boxes use `[x, y, width, height]` where `(x, y)` is the
//! top-left corner in absolute pixels. Only the three collections the
//! converter needs are read; `info`, `licenses`, segmentation data and any
//! other keys are accepted and ignored.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;
use walkdir::WalkDir;

use super::model::{AnnotationRecord, CategoryRecord, CocoBox, ImageRecord, Manifest};
use super::AnnotationId;
use crate::error::PrepError;

const MANIFEST_EXTENSION: &str = "json";

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CocoManifest {
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    #[serde(default)]
    id: Option<u64>,
    image_id: u64,
    category_id: u64,
    /// `[x, y, width, height]`, top-left corner
    bbox: [f64; 4],
}

// ============================================================================
// Public API
// ============================================================================

/// Find the most recently modified `*.json` file under `root`, recursively.
///
/// Ties on modification time go to the lexicographically greatest path so
/// the choice does not depend on directory iteration order.
///
/// # Errors
/// [`PrepError::ManifestNotFound`] when `root` holds no JSON file or does
/// not exist.
pub fn find_latest_manifest(root: &Path) -> Result<PathBuf, PrepError> {
    if !root.exists() {
        return Err(PrepError::ManifestNotFound {
            root: root.to_path_buf(),
        });
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|err| PrepError::Io(err.into()))?;
        if !entry.file_type().is_file() || !is_manifest_file(entry.path()) {
            continue;
        }

        let modified = entry
            .metadata()
            .map_err(|err| PrepError::Io(err.into()))?
            .modified()?;
        let path = entry.into_path();

        let newer = match &latest {
            None => true,
            Some((best_time, best_path)) => {
                modified > *best_time || (modified == *best_time && path > *best_path)
            }
        };
        if newer {
            latest = Some((modified, path));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| PrepError::ManifestNotFound {
            root: root.to_path_buf(),
        })
}

/// Read a manifest from a COCO JSON file.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use yoloprep::ir::io_coco_json::read_manifest;
///
/// let manifest = read_manifest(Path::new("annotations.json"))?;
/// # Ok::<(), yoloprep::PrepError>(())
/// ```
pub fn read_manifest(path: &Path) -> Result<Manifest, PrepError> {
    let file = File::open(path).map_err(PrepError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoManifest =
        serde_json::from_reader(reader).map_err(|source| PrepError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_manifest(coco))
}

/// Read a manifest from a COCO JSON string.
pub fn from_manifest_str(json: &str) -> Result<Manifest, serde_json::Error> {
    let coco: CocoManifest = serde_json::from_str(json)?;
    Ok(coco_to_manifest(coco))
}

/// Read a manifest from raw bytes.
pub fn from_manifest_slice(bytes: &[u8]) -> Result<Manifest, serde_json::Error> {
    let coco: CocoManifest = serde_json::from_slice(bytes)?;
    Ok(coco_to_manifest(coco))
}

fn coco_to_manifest(coco: CocoManifest) -> Manifest {
    let images = coco
        .images
        .into_iter()
        .map(|img| ImageRecord::new(img.id, img.file_name, img.width, img.height))
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| CategoryRecord::new(cat.id, cat.name))
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .enumerate()
        .map(|(position, ann)| {
            let [x, y, w, h] = ann.bbox;
            let mut record =
                AnnotationRecord::new(position, ann.image_id, ann.category_id, CocoBox::new(x, y, w, h));
            record.id = ann.id.map(AnnotationId::new);
            record
        })
        .collect();

    Manifest {
        images,
        categories,
        annotations,
    }
}

fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION))
        .unwrap_or(false)
}
