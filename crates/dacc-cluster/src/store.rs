//! Destinations for daily artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use dacc_core::CcResult;
use parking_lot::Mutex;

/// Write side of aggregation. Returns the location the payload landed at.
pub trait ArtifactStore: Send + Sync {
    fn put(&self, path: &str, payload: &[u8]) -> CcResult<String>;
}

/// Writes artifacts under a root directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ArtifactStore for FileSystemStore {
    fn put(&self, path: &str, payload: &[u8]) -> CcResult<String> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating artifact directory '{}'", parent.display()))?;
        }
        fs::write(&target, payload)
            .with_context(|| format!("writing artifact '{}'", target.display()))?;
        Ok(target.display().to_string())
    }
}

/// Keeps artifacts in memory; used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&self, path: &str, payload: &[u8]) -> CcResult<String> {
        self.objects
            .lock()
            .insert(path.to_string(), payload.to_vec());
        Ok(path.to_string())
    }
}
