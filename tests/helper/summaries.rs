//! Summary file fixtures

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// Write `<os>-<os_version>-node-v<node>-summary-<timestamp>.json` into `dir`
pub fn write_summary(
    dir: &Path,
    (os, os_version): (&str, &str),
    node: &str,
    timestamp: &str,
    packages: Value,
) -> PathBuf {
    let path = dir.join(format!(
        "{os}-{os_version}-node-v{node}-summary-{timestamp}.json"
    ));
    let summary = json!({
        "meta": {
            "summaryVersion": 1,
            "package": "appoptics-apm",
            "version": "6.0.0",
            "commit": "abc123",
            "branch": "master",
            "node": node,
            "linux": { "id": os, "version_id": os_version },
            "timestamp": timestamp,
            "startTime": 0,
            "endTime": 90_000,
            "versions": format!("node {node}")
        },
        "packages": packages
    });
    std::fs::write(&path, summary.to_string()).unwrap();
    path
}
