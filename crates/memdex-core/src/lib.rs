//! # memdex-core
//!
//! Core library for memdex, an extractor of in-memory DEX containers from
//! running Linux processes.
//!
//! This crate provides:
//! - `/proc/<pid>/maps` region-table parsing
//! - Process memory reading over `/proc/<pid>/mem`
//! - Signature scanning with header-driven exact-length extraction
//! - Payload persistence and scan orchestration
//!
//! The pipeline is deliberately lenient: once a scan starts, read failures,
//! rejected candidates and write failures only reduce the number of payloads
//! recovered. Only an unreadable region table stops a scan.

pub mod error;
pub mod extract;
pub mod maps;
pub mod memory;
pub mod scan;
pub mod scanner;
pub mod signature;
pub mod sink;

pub use error::{Error, Result};
pub use extract::{ExtractedRange, Extraction, extract_at};
pub use maps::{Perms, Region, parse_regions};
pub use memory::{ProcessMemory, ReadMemory};
pub use scan::{DEFAULT_CHUNK_SIZE, ScanConfig, ScanReport, run_scan, scan_regions};
pub use scanner::{MemoryWindow, OverrunCandidate, Payload, ScanOutcome, SignatureScanner};
pub use signature::{
    Endian, FormatSignature, SignatureSet, builtin_signatures, load_signatures, save_signatures,
};
pub use sink::PayloadSink;
