use std::fs;

use filterbank::logging;
use tempfile::tempdir;

#[test]
fn init_with_directory_creates_log_file() {
    let dir = tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    logging::init(Some(&log_dir)).unwrap();
    tracing::info!("first line");
    // Later calls keep the installed subscriber.
    logging::init(None).unwrap();

    let names: Vec<String> = fs::read_dir(&log_dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1, "{names:?}");
    assert!(names[0].starts_with("filterbank_"), "{}", names[0]);
    assert!(names[0].ends_with(".log"), "{}", names[0]);
}
