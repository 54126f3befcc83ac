use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const BOARDS: &str = "%YAML:1.0
---
number_camera: 1
number_board: 2
number_x_square: 5
number_y_square: 4
length_square: 0.04
length_marker: 0.03
resolution_x: 500
resolution_y: 400
";

fn cli() -> Command {
    Command::cargo_bin("create-charuco-boards").expect("binary")
}

fn write_config(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, BOARDS).expect("write config");
    path
}

#[cfg(unix)]
const FAILURE_CODE: i32 = 255;
#[cfg(not(unix))]
const FAILURE_CODE: i32 = -1;

#[test]
fn missing_argument_fails() {
    let dir = tempdir().expect("tempdir");
    cli()
        .current_dir(dir.path())
        .assert()
        .code(FAILURE_CODE)
        .stderr(predicate::str::contains("missing config path"));
    assert!(!dir.path().join("charuco_boards").exists());
}

#[test]
fn unreachable_or_misnamed_config_fails() {
    let dir = tempdir().expect("tempdir");
    cli()
        .current_dir(dir.path())
        .arg("absent.yml")
        .assert()
        .code(FAILURE_CODE)
        .stderr(predicate::str::contains("doesn't exist"));

    write_config(dir.path(), "boards.yaml");
    cli()
        .current_dir(dir.path())
        .arg("boards.yaml")
        .assert()
        .code(FAILURE_CODE)
        .stderr(predicate::str::contains(".yml"));
    assert!(!dir.path().join("charuco_boards").exists());
}

#[test]
fn writes_one_margined_png_per_board() {
    let dir = tempdir().expect("tempdir");
    write_config(dir.path(), "calib_param.yml");
    cli()
        .current_dir(dir.path())
        .args(["calib_param.yml", "-q"])
        .assert()
        .success();

    let out = dir.path().join("charuco_boards");
    for idx in 0..2 {
        let path = out.join(format!("charuco_board_{idx:03}.png"));
        let img = image::open(&path).expect("decode board").to_rgb8();
        assert_eq!(img.dimensions(), (550, 440));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert!(!out.join(format!("charuco_board_{idx:03}.bmp")).exists());
    }
    assert!(!out.join("charuco_board_002.png").exists());
}

#[test]
fn legacy_bmp_and_report_options() {
    let dir = tempdir().expect("tempdir");
    write_config(dir.path(), "calib_param.yml");
    cli()
        .current_dir(dir.path())
        .args([
            "calib_param.yml",
            "--legacy-bmp",
            "--output-dir",
            "prints",
            "--margin-ratio",
            "0",
            "--report",
            "report.json",
        ])
        .assert()
        .success();

    let out = dir.path().join("prints");
    let bmp = image::open(out.join("charuco_board_001.bmp")).expect("bmp");
    assert_eq!((bmp.width(), bmp.height()), (500, 400));
    assert!(out.join("charuco_board_001.png").is_file());

    let raw = fs::read_to_string(dir.path().join("report.json")).expect("report");
    let report: serde_json::Value = serde_json::from_str(&raw).expect("json");
    let boards = report["boards"].as_array().expect("boards");
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0]["status"], "written");
    assert_eq!(boards[1]["marker_ids"], serde_json::json!([10, 20]));
}

#[test]
fn out_of_range_margin_ratio_is_fatal() {
    let dir = tempdir().expect("tempdir");
    write_config(dir.path(), "calib_param.yml");
    cli()
        .current_dir(dir.path())
        .args(["calib_param.yml", "--margin-ratio", "3e9"])
        .assert()
        .code(FAILURE_CODE)
        .stderr(predicate::str::contains("margin_ratio"));
    assert!(!dir.path().join("charuco_boards").exists());
}
