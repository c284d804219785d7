//! In-memory fake of a target address space for tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::ReadMemory;

/// Byte regions keyed by base address. Reads that land fully inside one
/// placed region succeed; everything else fails the way a raced-away mapping
/// would. Every read is recorded for assertions.
#[derive(Default)]
pub struct MockMemory {
    regions: BTreeMap<u64, Vec<u8>>,
    reads: RefCell<Vec<(u64, usize)>>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, base: u64, bytes: Vec<u8>) {
        self.regions.insert(base, bytes);
    }

    /// Every `(addr, len)` read issued so far, in order.
    pub fn reads(&self) -> Vec<(u64, usize)> {
        self.reads.borrow().clone()
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>> {
        self.reads.borrow_mut().push((addr, len));
        for (&base, bytes) in &self.regions {
            let end = base + bytes.len() as u64;
            if addr >= base && addr + len as u64 <= end {
                let start = (addr - base) as usize;
                return Ok(bytes[start..start + len].to_vec());
            }
        }
        Err(Error::MemoryReadFailed {
            address: addr,
            message: "unmapped".to_string(),
        })
    }
}
