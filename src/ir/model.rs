//! Typed records read from a COCO manifest, and the box record written out.
//!
//! Records are immutable once parsed. Lookups go through typed ids, and the
//! only derived state (the dense class mapping) lives in [`ClassMap`](super::ClassMap).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::ids::{AnnotationId, CategoryId, ClassId, ImageId};

/// An image entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: ImageId,
    /// File name as stored in the manifest; may carry directory components.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl ImageRecord {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }

    /// The last path component of `file_name`.
    pub fn basename(&self) -> &str {
        Path::new(&self.file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file_name)
    }

    /// The basename without its extension; label files are named after it.
    pub fn stem(&self) -> &str {
        Path::new(self.basename())
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_else(|| self.basename())
    }

    /// Name of the label file that holds this image's boxes.
    pub fn label_file_name(&self) -> String {
        format!("{}.txt", self.stem())
    }
}

/// A category entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
}

impl CategoryRecord {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// COCO box: top-left corner plus extent, in absolute pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CocoBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CocoBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An annotation entry.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRecord {
    /// COCO annotation id, when the manifest carries one.
    pub id: Option<AnnotationId>,
    /// Zero-based position in the manifest's annotation list.
    pub position: usize,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub bbox: CocoBox,
}

impl AnnotationRecord {
    pub fn new(
        position: usize,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: CocoBox,
    ) -> Self {
        Self {
            id: None,
            position,
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
        }
    }

    /// Human-readable handle used in diagnostics.
    pub fn describe(&self) -> String {
        match self.id {
            Some(id) => format!("id {} (#{})", id, self.position),
            None => format!("#{}", self.position),
        }
    }
}

/// A parsed manifest. All three collections keep manifest order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifest {
    pub images: Vec<ImageRecord>,
    pub categories: Vec<CategoryRecord>,
    pub annotations: Vec<AnnotationRecord>,
}

impl Manifest {
    /// Index images by id. On duplicate ids the first entry wins.
    pub fn image_index(&self) -> HashMap<ImageId, &ImageRecord> {
        let mut index = HashMap::with_capacity(self.images.len());
        for image in &self.images {
            index.entry(image.id).or_insert(image);
        }
        index
    }
}

/// One output line of a label file: `class_id cx cy w h`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoxRecord {
    pub class_id: ClassId,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxRecord {
    /// Corner-plus-extent to centre-plus-extent, staying in pixel units.
    ///
    /// Extents are passed through unchanged and nothing is divided by the
    /// image size. Use [`BoxRecord::normalized`] for `[0, 1]` output.
    pub fn from_coco(class_id: ClassId, bbox: &CocoBox) -> Self {
        Self {
            class_id,
            x_center: bbox.x + bbox.width / 2.0,
            y_center: bbox.y + bbox.height / 2.0,
            width: bbox.width,
            height: bbox.height,
        }
    }

    /// Divide every coordinate by the image size.
    pub fn normalized(&self, image_width: f64, image_height: f64) -> Self {
        Self {
            class_id: self.class_id,
            x_center: self.x_center / image_width,
            y_center: self.y_center / image_height,
            width: self.width / image_width,
            height: self.height / image_height,
        }
    }
}

impl fmt::Display for BoxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}
