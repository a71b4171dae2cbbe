use std::path::Path;

use anyhow::Context;

use crm_rollups::Snapshot;

pub fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid snapshot", path.display()))?;
    Ok(snapshot)
}
