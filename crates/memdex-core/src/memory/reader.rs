use crate::error::Result;

/// Byte-level access to a target address space.
///
/// Reads arbitrary `[addr, addr + len)` windows and may fail at any
/// address with no prior notice; callers treat a failed read as "this range
/// is not available right now", not as a scan-ending condition.
pub trait ReadMemory {
    /// Read exactly `len` bytes starting at absolute address `addr`.
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>>;
}
