//! Consumer-group offset checkpoints.
//!
//! A single `offsets.json` sidecar at the data-dir root maps group names
//! to committed global offsets. Every save rewrites the whole map through
//! a temp file and an atomic rename, so the sidecar is never observed
//! half-written. Groups that have never acknowledged resolve to offset 0.

use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const OFFSETS_FILE: &str = "offsets.json";

/// Durable per-consumer-group offset checkpoints.
///
/// One mutex guards both the in-memory map and the sidecar file; saves are
/// synchronous and return only after the file has been replaced.
#[derive(Debug)]
pub struct OffsetManager {
    path: PathBuf,
    offsets: Mutex<HashMap<String, u64>>,
}

impl OffsetManager {
    /// Open the offset store, loading any existing sidecar.
    ///
    /// An absent or unparsable sidecar starts the store empty; parse
    /// failures are logged, never fatal.
    pub fn open(data_dir: &Path) -> Self {
        let path = data_dir.join(OFFSETS_FILE);
        let offsets = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, u64>>(&bytes) {
                Ok(map) => {
                    debug!(groups = map.len(), "loaded consumer-group offsets");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), "ignoring unparsable offsets file: {}", e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            offsets: Mutex::new(offsets),
        }
    }

    /// Record `offset` as the checkpoint of `group` and persist the map.
    pub fn save_offset(&self, group: &str, offset: u64) -> Result<()> {
        let mut offsets = self.offsets.lock();
        offsets.insert(group.to_string(), offset);
        self.persist(&offsets)
    }

    /// The last checkpoint of `group`; 0 if it has never acknowledged.
    pub fn get_offset(&self, group: &str) -> u64 {
        self.offsets.lock().get(group).copied().unwrap_or(0)
    }

    fn persist(&self, offsets: &HashMap<String, u64>) -> Result<()> {
        let bytes = serde_json::to_vec(offsets)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
