//! Version index fixtures and monitor wiring

use std::path::Path;
use std::time::Duration;

use version_monitor::version::retry::RetryPolicy;
use version_monitor::version::sources::HttpVersionSource;
use version_monitor::version::store::FileVersionStore;
use version_monitor::monitor::VersionMonitor;

/// A version index document listing `versions`, newest first
pub fn index_body(versions: &[&str]) -> String {
    let records: Vec<serde_json::Value> = versions
        .iter()
        .map(|v| {
            serde_json::json!({
                "version": v,
                "files": [format!("hagicode-{}.AppImage", v)],
                "assets": [{
                    "name": format!("hagicode-{}.AppImage", v),
                    "path": format!("{}/hagicode-{}.AppImage", v, v),
                    "size": 157_286_400,
                    "lastModified": 1_735_689_600
                }]
            })
        })
        .collect();

    serde_json::json!({
        "updatedAt": 1_735_689_600,
        "versions": records
    })
    .to_string()
}

/// Monitor over a real HTTP source and file store, retrying fast
pub fn monitor_for(
    url: &str,
    index_path: &Path,
    max_attempts: u32,
) -> VersionMonitor<HttpVersionSource, FileVersionStore> {
    let source = HttpVersionSource::new(
        url,
        Duration::from_secs(5),
        RetryPolicy::new(max_attempts, Duration::from_millis(1)),
    )
    .unwrap();
    VersionMonitor::new(source, FileVersionStore::new(index_path))
}

/// Raw bytes of the snapshot, `None` when it was never written
pub fn read_snapshot(path: &Path) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}
