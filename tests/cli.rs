use std::fs;

use assert_cmd::Command;

mod common;

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("yoloprep 0.3.0\n");
}

// Clean subcommand tests

#[test]
fn clean_reports_scan_counts() {
    let temp = tempfile::tempdir().unwrap();
    common::write_flat_png(&temp.path().join("dark.png"), 32, 32, [0, 0, 0]);

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.args(["clean", temp.path().to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Images scanned: 1"))
        .stdout(predicates::str::contains("blurry:      1"))
        .stdout(predicates::str::contains("poorly_lit:  1"));
}

#[test]
fn clean_json_output_is_structured() {
    let temp = tempfile::tempdir().unwrap();
    common::write_sharp_png(&temp.path().join("a.png"), 32, 32);

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.args(["clean", temp.path().to_str().unwrap(), "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"images_scanned\": 1"));
}

#[test]
fn clean_with_manifest_reports_outliers_and_classes() {
    let temp = tempfile::tempdir().unwrap();
    common::write_sharp_png(&temp.path().join("images/a.png"), 32, 32);

    let manifest_path = temp.path().join("annotations.json");
    fs::write(
        &manifest_path,
        r#"{
            "images": [{"id": 1, "width": 1000, "height": 1000}],
            "annotations": [
                {"id": 1, "image_id": 1, "bbox": [0, 0, 5, 5], "category_id": 3}
            ]
        }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.args([
        "clean",
        temp.path().join("images").to_str().unwrap(),
        "--annotations",
        manifest_path.to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("size_outlier_small"))
        .stdout(predicates::str::contains("category 3: 1"));
}

#[test]
fn clean_rejects_unknown_output_format() {
    let temp = tempfile::tempdir().unwrap();
    common::write_flat_png(&temp.path().join("a.png"), 8, 8, [0, 0, 0]);

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.args([
        "clean",
        temp.path().to_str().unwrap(),
        "--output",
        "not-a-format",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Unsupported output format"));
}

#[test]
fn clean_invalid_manifest_fails() {
    let temp = tempfile::tempdir().unwrap();
    common::write_flat_png(&temp.path().join("a.png"), 8, 8, [0, 0, 0]);
    let manifest_path = temp.path().join("bad.json");
    fs::write(&manifest_path, "{\"images\": []}").unwrap();

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.args([
        "clean",
        temp.path().to_str().unwrap(),
        "--annotations",
        manifest_path.to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("annotation manifest"));
}

// Augment subcommand tests

#[test]
fn augment_writes_aligned_pairs() {
    let temp = tempfile::tempdir().unwrap();
    common::write_sharp_png(&temp.path().join("in/images/a.png"), 32, 32);
    fs::create_dir_all(temp.path().join("in/labels")).unwrap();
    fs::write(
        temp.path().join("in/labels/a.txt"),
        "0 0.500000 0.500000 0.250000 0.250000\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.args([
        "augment",
        temp.path().join("in").to_str().unwrap(),
        temp.path().join("out").to_str().unwrap(),
        "--count",
        "2",
        "--seed",
        "5",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("2 pair(s) written"));

    assert!(temp.path().join("out/images/a_aug_0.png").is_file());
    assert!(temp.path().join("out/images/a_aug_1.png").is_file());
    assert!(temp.path().join("out/labels/a_aug_0.txt").is_file());
    assert!(temp.path().join("out/labels/a_aug_1.txt").is_file());
}

#[test]
fn augment_missing_layout_fails() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("yoloprep").unwrap();
    cmd.args([
        "augment",
        temp.path().to_str().unwrap(),
        temp.path().join("out").to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Invalid dataset layout"));
}
