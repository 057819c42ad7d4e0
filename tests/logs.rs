use routemap_core::logs;
use std::fs::File;
use std::io::Read;
use std::sync::mpsc;
use std::time::Duration;
use tempdir::TempDir;

// The logger is process-wide, so this is the only test in the binary.
#[test]
fn init_and_export() {
    let temp_dir = TempDir::new("logs-init_and_export").unwrap();
    let cache_dir = temp_dir.path().to_str().unwrap();
    logs::init(cache_dir).unwrap();
    // a second logger can't be installed
    assert!(logs::init(cache_dir).is_err());

    let (tx, rx) = mpsc::channel();
    logs::set_log_sink(Box::new(move |line| {
        let _ = tx.send(line);
    }));

    log::info!("route request #1: People's Square -> West Lake");
    log::debug!("filtered out");
    log::logger().flush();

    let line = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(line.starts_with("INFO:"));
    assert!(line.ends_with("People's Square -> West Lake"));

    let target = temp_dir.path().join("logs.zip");
    logs::export(cache_dir, target.to_str().unwrap()).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&target).unwrap()).unwrap();
    let mut content = String::new();
    archive
        .by_name("logs/main.log")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert!(content.contains("People's Square -> West Lake"));
    assert!(!content.contains("filtered out"));
}
