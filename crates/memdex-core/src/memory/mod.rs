//! Process memory access.
//!
//! `ReadMemory` is the seam between the scan pipeline and the target address
//! space; `ProcessMemory` is the live implementation over `/proc/<pid>/mem`.

mod process;
mod reader;

#[cfg(test)]
pub mod mock;

pub use process::ProcessMemory;
pub use reader::ReadMemory;

#[cfg(test)]
pub use mock::MockMemory;
