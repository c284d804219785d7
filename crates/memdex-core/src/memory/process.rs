use std::fs::File;
use std::os::unix::fs::FileExt;

use crate::error::{Error, Result};

use super::ReadMemory;

/// Random-access reader over `/proc/<pid>/mem`, opened once per scan.
///
/// Positioned reads carry the absolute virtual address, so there is no shared
/// seek cursor and per-region reads stay independent of each other. Reads are
/// not synchronized with the target's execution; a captured window may be torn
/// if the target mutates it mid-read.
pub struct ProcessMemory {
    mem: File,
}

impl ProcessMemory {
    pub fn open(pid: u32) -> Result<Self> {
        let mem = File::open(format!("/proc/{pid}/mem"))?;
        Ok(Self { mem })
    }
}

impl ReadMemory for ProcessMemory {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.mem
            .read_exact_at(&mut buf, addr)
            .map_err(|e| Error::MemoryReadFailed {
                address: addr,
                message: e.to_string(),
            })?;
        Ok(buf)
    }
}
