#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const SAMPLE_MANIFEST: &str = "tests/fixtures/sample.coco.json";

/// Bytes of a tiny valid 24-bit BMP.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 24]);

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bytes).expect("write file");
}

/// Lay out the sample manifest plus the images it lists, except `frame_004.jpg`.
pub fn sample_convert_inputs(root: &Path) {
    let manifest = fs::read(SAMPLE_MANIFEST).expect("read sample manifest");
    write_file(&root.join("json/export/annotations.json"), &manifest);
    for name in ["frame_001.jpg", "frame_002.jpg", "frame_003.jpg"] {
        write_file(&root.join("img").join(name), &bmp_bytes(4, 4));
    }
}

/// A flat images/ + labels/ folder. Every image gets a distinct payload so
/// copies can be traced back; stems listed in `unlabeled` get no label file.
pub fn flat_dataset(root: &Path, count: usize, unlabeled: &[usize]) -> Vec<String> {
    let mut names = Vec::with_capacity(count);
    for i in 0..count {
        let name = format!("img_{i:03}.jpg");
        write_file(&root.join("images").join(&name), name.as_bytes());
        if !unlabeled.contains(&i) {
            let line = format!("{} 1.000000 1.000000 2.000000 2.000000\n", i % 2);
            write_file(
                &root.join("labels").join(format!("img_{i:03}.txt")),
                line.as_bytes(),
            );
        }
        names.push(name);
    }
    fs::create_dir_all(root.join("labels")).expect("create labels dir");
    names
}

/// File names directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
