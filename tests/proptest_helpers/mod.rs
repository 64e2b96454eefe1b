#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use yoloprep::ir::{AnnotationRecord, CategoryRecord, CocoBox, ImageRecord, Manifest};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Validation and test fractions whose sum stays below one.
pub fn arb_ratios() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..0.6, 0.0f64..0.35)
}

/// Distinct, sortable image names.
pub fn arb_image_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,6}_[0-9]{1,3}\\.jpg", 0..=max)
        .prop_map(|names| names.into_iter().collect())
}

fn arb_bbox() -> impl Strategy<Value = CocoBox> {
    (0.0f64..500.0, 0.0f64..500.0, 0.5f64..200.0, 0.5f64..200.0)
        .prop_map(|(x, y, w, h)| CocoBox::new(x, y, w, h))
}

/// A manifest whose annotations all resolve.
///
/// Category names are drawn from a small pool so repeated names under
/// different ids show up often.
pub fn arb_manifest(
    max_images: usize,
    max_categories: usize,
    max_annotations: usize,
) -> impl Strategy<Value = Manifest> {
    let images = prop::collection::vec((1u32..2000, 1u32..2000), 1..=max_images);
    let categories = prop::collection::vec(
        prop::sample::select(vec!["helmet", "vest", "person", "no-helmet"]),
        1..=max_categories,
    );

    (images, categories).prop_flat_map(move |(sizes, names)| {
        let image_count = sizes.len();
        let category_count = names.len();
        let annotations = prop::collection::vec(
            (0..image_count, 0..category_count, arb_bbox()),
            0..=max_annotations,
        );

        annotations.prop_map(move |anns| {
            let images = sizes
                .iter()
                .enumerate()
                .map(|(i, (w, h))| {
                    ImageRecord::new(i as u64 + 1, format!("frame_{i:03}.jpg"), *w, *h)
                })
                .collect();
            let categories = names
                .iter()
                .enumerate()
                .map(|(i, name)| CategoryRecord::new(i as u64 * 3 + 2, *name))
                .collect();
            let annotations = anns
                .into_iter()
                .enumerate()
                .map(|(pos, (img, cat, bbox))| {
                    AnnotationRecord::new(pos, img as u64 + 1, cat as u64 * 3 + 2, bbox)
                })
                .collect();

            Manifest {
                images,
                categories,
                annotations,
            }
        })
    })
}
