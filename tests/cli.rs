use assert_cmd::Command;
use predicates::prelude::*;

mod common;
use common::{flat_dataset, sample_convert_inputs};

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("-V");
    cmd.assert()
        .success()
        .stdout(format!("yoloprep {}\n", env!("CARGO_PKG_VERSION")));
}

// Convert subcommand tests

#[test]
fn convert_writes_labels_and_reports_missing_image() {
    let temp = tempfile::tempdir().unwrap();
    sample_convert_inputs(temp.path());
    let out = temp.path().join("out");

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("convert")
        .arg("--coco-json-folder")
        .arg(temp.path().join("json"))
        .arg("--image-folder")
        .arg(temp.path().join("img"))
        .arg("--output-folder")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("3 images copied (1 missing)"))
        .stdout(predicates::str::contains("Warnings (1):"))
        .stdout(predicates::str::contains("frame_004.jpg"));

    assert!(out.join("labels/frame_001.txt").is_file());
    assert!(out.join("data.yaml").is_file());
}

#[test]
fn convert_json_output_format() {
    let temp = tempfile::tempdir().unwrap();
    sample_convert_inputs(temp.path());

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("convert")
        .arg("--coco-json-folder")
        .arg(temp.path().join("json"))
        .arg("--image-folder")
        .arg(temp.path().join("img"))
        .arg("--output-folder")
        .arg(temp.path().join("out"))
        .args(["--normalize", "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"images_missing\": 1"))
        .stdout(predicates::str::contains("\"code\": \"missing_source_image\""))
        .stdout(predicates::str::contains("unnormalized_boxes").not());
}

#[test]
fn convert_without_manifest_fails() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("convert")
        .arg("--coco-json-folder")
        .arg(temp.path())
        .arg("--image-folder")
        .arg(temp.path())
        .arg("--output-folder")
        .arg(temp.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("No COCO JSON manifest"));
}

// Split subcommand tests

#[test]
fn split_partitions_dataset() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    let out = temp.path().join("out");
    flat_dataset(&src, 10, &[]);

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("split")
        .arg("--data-folder")
        .arg(&src)
        .arg("--output-folder")
        .arg(&out)
        .args(["--names", "helmet,no-helmet"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Partitioned 10 image(s)"))
        .stdout(predicates::str::contains("(seed 42)"))
        .stdout(predicates::str::contains("0: helmet (5 boxes)"));

    for split in ["train", "valid", "test"] {
        assert!(out.join(split).join("images").is_dir());
    }
    assert!(out.join("data.yaml").is_file());
}

#[test]
fn split_json_output_format() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    flat_dataset(&src, 4, &[]);

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("split")
        .arg("--data-folder")
        .arg(&src)
        .arg("--output-folder")
        .arg(temp.path().join("out"))
        .args(["--seed", "7", "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"seed\": 7"))
        .stdout(predicates::str::contains("\"class_source\": \"inferred\""));
}

#[test]
fn split_without_labels_folder_fails() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    std::fs::create_dir_all(src.join("images")).unwrap();

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("split")
        .arg("--data-folder")
        .arg(&src)
        .arg("--output-folder")
        .arg(temp.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Invalid dataset layout"));
}

#[test]
fn split_rejects_out_of_range_ratio() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("split")
        .arg("--data-folder")
        .arg(temp.path())
        .arg("--output-folder")
        .arg(temp.path().join("out"))
        .args(["--val-ratio", "1.5"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("RATIO must be in [0.0, 1.0)"));
}

#[test]
fn split_rejects_ratios_summing_to_one() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    flat_dataset(&src, 4, &[]);

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("split")
        .arg("--data-folder")
        .arg(&src)
        .arg("--output-folder")
        .arg(temp.path().join("out"))
        .args(["--val-ratio", "0.5", "--test-ratio", "0.5"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Invalid split ratios"));
}
