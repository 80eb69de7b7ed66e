use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use fvr_cli::discover;
use fvr_history::TrackedFile;

fn touch(p: &Path) {
    fs::write(p, "x").unwrap();
}

fn cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 5, 1).unwrap()
}

fn layout() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    let m = root.path().join("M");
    let n = root.path().join("N");
    let hidden = root.path().join("zz.hidden");
    for d in [&m, &n, &hidden] {
        fs::create_dir_all(d).unwrap();
    }
    touch(&m.join("2020-04-27-M.csv"));
    touch(&m.join("2020-05-04-M.csv"));
    touch(&m.join("2020-05-11-M.csv"));
    touch(&m.join("metadata-M.txt"));
    touch(&m.join("2020-05-18-M.txt"));
    touch(&n.join("2020-05-04-N.csv"));
    touch(&hidden.join("2020-05-04-zz.hidden.csv"));
    touch(&root.path().join("README.md"));
    root
}

#[test]
fn scenario_discovery_skips_dotted_dirs_non_csv_and_early_files() {
    let root = layout();
    let files = discover(root.path(), &[], cutoff()).unwrap();
    assert_eq!(
        files,
        vec![
            TrackedFile::new("M", "2020-05-04"),
            TrackedFile::new("M", "2020-05-11"),
            TrackedFile::new("N", "2020-05-04"),
        ]
    );
}

#[test]
fn scenario_discovery_restricted_to_named_datasets() {
    let root = layout();
    let files = discover(root.path(), &["N".to_string()], cutoff()).unwrap();
    assert_eq!(files, vec![TrackedFile::new("N", "2020-05-04")]);
}

#[test]
fn scenario_missing_data_dir_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let err = discover(&root.path().join("absent"), &[], cutoff()).unwrap_err();
    assert!(err.to_string().contains("read data dir failed"));
}
