//! Typed records and on-disk formats.
//!
//! Manifest entries are parsed into explicit value structs rather than loose
//! JSON maps, so that "every annotation points at a real image and a real
//! category" can be checked with typed lookups.
//!
//! # Example
//!
//! ```
//! use yoloprep::ir::{BoxRecord, CategoryRecord, ClassMap, CocoBox};
//!
//! let classes = ClassMap::from_categories(&[
//!     CategoryRecord::new(5u64, "helmet"),
//!     CategoryRecord::new(9u64, "no-helmet"),
//! ]);
//! let class_id = classes.class_for(9u64.into()).unwrap();
//! let line = BoxRecord::from_coco(class_id, &CocoBox::new(10.0, 20.0, 30.0, 40.0));
//! assert_eq!(line.to_string(), "1 25.000000 40.000000 30.000000 40.000000");
//! ```

mod class_map;
mod ids;
pub mod io_coco_json;
pub mod io_yolo;
mod model;

pub use class_map::ClassMap;
pub use ids::{AnnotationId, CategoryId, ClassId, ImageId};
pub use model::{AnnotationRecord, BoxRecord, CategoryRecord, CocoBox, ImageRecord, Manifest};
