use std::path::PathBuf;
use thiserror::Error;

/// The main error type for yoloprep operations.
///
/// Every variant is fatal: the pipelines abort on the first one they hit.
/// Recoverable conditions (a missing image, a missing label file) are
/// reported through the run reports instead.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No COCO JSON manifest found under {root}")]
    ManifestNotFound { root: PathBuf },

    #[error("Failed to parse COCO JSON manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Annotation {annotation} references image id {image_id}, which is not in the manifest")]
    DanglingImageRef { annotation: String, image_id: u64 },

    #[error(
        "Annotation {annotation} references category id {category_id}, which is not in the manifest"
    )]
    DanglingCategoryRef {
        annotation: String,
        category_id: u64,
    },

    #[error("Image '{file_name}' has size {width}x{height}; cannot normalize boxes")]
    InvalidImageSize {
        file_name: String,
        width: u32,
        height: u32,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Output folder {path} overlaps the source folder")]
    OutputOverlapsSource { path: PathBuf },

    #[error("Image folder {path} overlaps the output images/ or labels/ folder")]
    ImageFolderIsOutput { path: PathBuf },

    #[error("Invalid split ratios: {message}")]
    InvalidSplitRatios { message: String },

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to parse data.yaml at {path}: {source}")]
    DataYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write data.yaml at {path}: {source}")]
    DataYamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid data.yaml at {path}: {message}")]
    DataYamlInvalid { path: PathBuf, message: String },

    #[error("Invalid classes.txt at {path}: {message}")]
    ClassesTxtInvalid { path: PathBuf, message: String },

    #[error("Failed to render report as JSON: {0}")]
    ReportJson(#[source] serde_json::Error),
}
