//! Filesystem cache for raw oracle responses.
//!
//! Responses are stored one file per request key under an explicit cache
//! root, so reruns over the same fragments never repeat a completion call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_DIR: &str = ".mimic_cache";

pub struct ResponseCache {
    root: PathBuf,
}

impl ResponseCache {
    /// Create a cache rooted at an explicit directory. The root is threaded
    /// in from configuration, never derived from the process working
    /// directory here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fetch a cached response, or `None` on a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.root.join(key)).ok()
    }

    /// Store a response under a key, creating the cache root on demand.
    pub fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.root.join(key), value)
    }
}
