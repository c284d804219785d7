//! One full extraction pass over a target process.
//!
//! Regions come from the region table, bytes come from the process memory
//! stream, and each readable region is scanned sequentially. Everything past
//! the region-table open is best-effort: a region that cannot be read, a
//! candidate that fails validation, or a payload that cannot be written only
//! reduces the number of recovered payloads.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::maps::{Region, parse_regions};
use crate::memory::{ProcessMemory, ReadMemory};
use crate::scanner::{MemoryWindow, Payload, SignatureScanner};
use crate::signature::FormatSignature;
use crate::sink::PayloadSink;

/// Upper bound on a single read from the target. Larger regions are captured
/// in overlapping chunks instead of one unbounded allocation.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub signature: FormatSignature,
    pub out_dir: PathBuf,
    pub chunk_size: usize,
}

impl ScanConfig {
    pub fn new(signature: FormatSignature, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            signature,
            out_dir: out_dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Counters for the end-of-run summary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub regions_total: usize,
    pub regions_readable: usize,
    pub regions_skipped: usize,
    pub payloads_stored: usize,
    pub store_failures: usize,
}

/// Run one scan against a live process.
///
/// Fails only if the region table cannot be opened or the memory stream
/// cannot be opened at all; every later failure is per-region or per-payload
/// and recorded in the report instead.
pub fn run_scan(pid: u32, config: &ScanConfig) -> Result<ScanReport> {
    let regions = parse_regions(pid)?;
    let memory = ProcessMemory::open(pid)?;
    let scanner = SignatureScanner::new(config.signature.clone())?;
    let sink = PayloadSink::new(&config.out_dir, &config.signature.name)?;
    scan_regions(pid, &regions, &memory, &scanner, &sink, config.chunk_size)
}

/// Scan already-enumerated regions against any memory source.
pub fn scan_regions<R: ReadMemory>(
    pid: u32,
    regions: &[Region],
    memory: &R,
    scanner: &SignatureScanner,
    sink: &PayloadSink,
    chunk_size: usize,
) -> Result<ScanReport> {
    let mut report = ScanReport {
        regions_total: regions.len(),
        ..Default::default()
    };

    for region in regions {
        if !region.perms.read {
            continue;
        }
        report.regions_readable += 1;

        debug!(
            "Scanning region {:#x}-{:#x} {}",
            region.start,
            region.end,
            region.pathname.as_deref().unwrap_or("<anonymous>")
        );

        if let Err(e) = scan_region(pid, region, memory, scanner, sink, chunk_size, &mut report) {
            // The target mutates its own address space while we read it;
            // a region that raced away is expected, not an error.
            debug!(
                "Skipping region {:#x}-{:#x}: {e}",
                region.start, region.end
            );
            report.regions_skipped += 1;
        }
    }

    Ok(report)
}

fn scan_region<R: ReadMemory>(
    pid: u32,
    region: &Region,
    memory: &R,
    scanner: &SignatureScanner,
    sink: &PayloadSink,
    chunk_size: usize,
    report: &mut ScanReport,
) -> Result<()> {
    let overlap = scanner.required_overlap() as u64;
    let chunk = (chunk_size as u64).max(overlap + 1);
    let step = chunk - overlap;
    let region_len = region.len();

    // First address not already consumed by an accepted payload. Keeps the
    // overlap zone between chunks from re-emitting a payload, and keeps the
    // accept-advance policy intact across chunk boundaries.
    let mut consumed_until = region.start;
    let mut offset = 0u64;

    loop {
        let len = chunk.min(region_len - offset);
        let base = region.start + offset;
        let bytes = memory.read_bytes(base, len as usize)?;
        let window = MemoryWindow::new(base, bytes);
        let outcome = scanner.scan(&window, pid, region.start);

        for payload in &outcome.payloads {
            if payload.source_address < consumed_until {
                continue;
            }
            consumed_until = payload.source_address + payload.bytes.len() as u64;
            store_payload(sink, payload, report);
        }

        // A candidate whose declared length runs past this chunk may still be
        // a whole payload within the region; capture it at full length.
        for overrun in &outcome.overruns {
            let addr = window.base + overrun.offset as u64;
            if addr < consumed_until {
                continue;
            }
            let Some(end) = addr.checked_add(overrun.declared_len) else {
                continue;
            };
            if end > region.end {
                continue;
            }

            match memory.read_bytes(addr, overrun.declared_len as usize) {
                Ok(full) => {
                    let full_window = MemoryWindow::new(addr, full);
                    for payload in &scanner.scan(&full_window, pid, region.start).payloads {
                        if payload.source_address < consumed_until {
                            continue;
                        }
                        consumed_until = payload.source_address + payload.bytes.len() as u64;
                        store_payload(sink, payload, report);
                    }
                }
                Err(e) => warn!("Full-length re-read at {addr:#x} failed: {e}"),
            }
        }

        if offset + len >= region_len {
            break;
        }
        offset += step;
    }

    Ok(())
}

fn store_payload(sink: &PayloadSink, payload: &Payload, report: &mut ScanReport) {
    match sink.store(payload) {
        Ok(path) => {
            report.payloads_stored += 1;
            info!(
                "Stored {} bytes from {:#x} to {}",
                payload.bytes.len(),
                payload.source_address,
                path.display()
            );
        }
        Err(e) => {
            report.store_failures += 1;
            warn!(
                "Failed to store payload from {:#x}: {e}",
                payload.source_address
            );
        }
    }
}
