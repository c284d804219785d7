//! Payload persistence.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::scanner::Payload;

/// Writes accepted payloads into a destination directory, one file per
/// payload, raw bytes only.
pub struct PayloadSink {
    out_dir: PathBuf,
    extension: String,
}

impl PayloadSink {
    /// Creates the destination directory if it does not exist yet.
    pub fn new<P: AsRef<Path>>(out_dir: P, extension: &str) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            extension: extension.to_string(),
        })
    }

    /// File name for a payload. The `(pid, source address, in-region offset)`
    /// triple is unique per payload, so names never collide within or across
    /// scans of the same process.
    pub fn path_for(&self, payload: &Payload) -> PathBuf {
        self.out_dir.join(format!(
            "{}-{:x}-{:x}.{}",
            payload.pid, payload.source_address, payload.region_offset, self.extension
        ))
    }

    pub fn store(&self, payload: &Payload) -> Result<PathBuf> {
        let path = self.path_for(payload);
        fs::write(&path, &payload.bytes)?;
        Ok(path)
    }
}
