//! Signature scanning over captured memory windows.

use memchr::memmem;
use tracing::trace;

use crate::error::{Error, Result};
use crate::extract::{Extraction, extract_at};
use crate::signature::FormatSignature;

/// Bytes captured from one region, tagged with the absolute virtual address
/// they were read from.
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    pub base: u64,
    pub bytes: Vec<u8>,
}

impl MemoryWindow {
    pub fn new(base: u64, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }
}

/// One validated, exact-length payload.
///
/// `bytes.len()` equals the value the format header declared, and the full
/// range was inside the window it was recovered from.
#[derive(Debug, Clone)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub pid: u32,
    pub source_address: u64,
    pub region_offset: u64,
}

/// Candidate whose header was readable but whose declared length extended
/// past the scanned window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrunCandidate {
    pub offset: usize,
    pub declared_len: u64,
}

/// Result of scanning one window: the accepted payloads plus the candidates
/// a larger capture might still recover.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub payloads: Vec<Payload>,
    pub overruns: Vec<OverrunCandidate>,
}

pub struct SignatureScanner {
    sig: FormatSignature,
    pattern: Vec<u8>,
}

impl SignatureScanner {
    pub fn new(sig: FormatSignature) -> Result<Self> {
        let pattern = sig.pattern_bytes()?;
        if sig.size_field_width == 0 || sig.size_field_width > 8 {
            return Err(Error::InvalidSignature(format!(
                "Unsupported size field width: {}",
                sig.size_field_width
            )));
        }
        Ok(Self { sig, pattern })
    }

    pub fn signature(&self) -> &FormatSignature {
        &self.sig
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    /// Overlap required between consecutive chunks of one region so a
    /// signature or its size field straddling the boundary is never missed.
    pub fn required_overlap(&self) -> usize {
        self.pattern.len() + self.sig.header_span()
    }

    /// Find every accepted payload in `window`.
    ///
    /// All candidate positions are visited: an accepted match consumes its
    /// full declared length before scanning resumes, while a rejected match
    /// is treated as a false positive and scanning resumes one byte past it.
    /// Adjacent payloads are therefore emitted separately, and no byte that
    /// belongs to an accepted payload is ever counted twice.
    pub fn scan(&self, window: &MemoryWindow, pid: u32, region_start: u64) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let finder = memmem::Finder::new(&self.pattern);
        let mut pos = 0usize;

        while pos + self.pattern.len() <= window.bytes.len() {
            let Some(found) = finder.find(&window.bytes[pos..]) else {
                break;
            };
            let offset = pos + found;

            match extract_at(&window.bytes, offset, &self.sig) {
                Extraction::Accepted(range) => {
                    let source_address = window.base + offset as u64;
                    outcome.payloads.push(Payload {
                        bytes: window.bytes[offset..offset + range.len].to_vec(),
                        pid,
                        source_address,
                        region_offset: source_address - region_start,
                    });
                    pos = offset + range.len;
                }
                Extraction::Overrun { declared_len } => {
                    outcome.overruns.push(OverrunCandidate {
                        offset,
                        declared_len,
                    });
                    pos = offset + 1;
                }
                rejected => {
                    trace!(
                        "Rejected candidate at {:#x}: {:?}",
                        window.base + offset as u64,
                        rejected
                    );
                    pos = offset + 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::builtin_signatures;

    fn scanner() -> SignatureScanner {
        SignatureScanner::new(builtin_signatures().entry("dex").unwrap().clone()).unwrap()
    }

    /// Writes a well-formed container of `len` bytes at `offset`, with a
    /// recognizable filler so payload boundaries can be checked.
    fn put_container(buf: &mut [u8], offset: usize, len: u32, filler: u8) {
        buf[offset..offset + len as usize].fill(filler);
        buf[offset..offset + 4].copy_from_slice(b"dex\n");
        buf[offset + 0x20..offset + 0x24].copy_from_slice(&len.to_le_bytes());
    }

    #[test]
    fn test_two_adjacent_payloads_are_both_found() {
        let mut buf = vec![0u8; 0x300];
        put_container(&mut buf, 0x10, 0x80, 0xA1);
        put_container(&mut buf, 0x90, 0x60, 0xB2);

        let window = MemoryWindow::new(0x5000, buf);
        let outcome = scanner().scan(&window, 42, 0x5000);

        assert_eq!(outcome.payloads.len(), 2);
        let first = &outcome.payloads[0];
        let second = &outcome.payloads[1];
        assert_eq!(first.source_address, 0x5010);
        assert_eq!(first.bytes.len(), 0x80);
        assert_eq!(second.source_address, 0x5090);
        assert_eq!(second.bytes.len(), 0x60);
        // Disjoint: the first payload ends exactly where the second begins
        assert_eq!(
            first.source_address + first.bytes.len() as u64,
            second.source_address
        );
    }

    #[test]
    fn test_false_positive_does_not_mask_later_payload() {
        let mut buf = vec![0u8; 0x200];
        // A bare magic with a zero size field: coincidental bytes, rejected
        buf[0x08..0x0C].copy_from_slice(b"dex\n");
        put_container(&mut buf, 0x40, 0x50, 0xC3);

        let window = MemoryWindow::new(0x0, buf);
        let outcome = scanner().scan(&window, 1, 0x0);

        assert_eq!(outcome.payloads.len(), 1);
        assert_eq!(outcome.payloads[0].source_address, 0x40);
    }

    #[test]
    fn test_signature_at_window_tail_is_rejected_cleanly() {
        let mut buf = vec![0u8; 0x40];
        // Fewer than size_field_offset + 4 bytes remain after the magic
        buf[0x30..0x34].copy_from_slice(b"dex\n");

        let window = MemoryWindow::new(0x0, buf);
        let outcome = scanner().scan(&window, 1, 0x0);
        assert!(outcome.payloads.is_empty());
        assert!(outcome.overruns.is_empty());
    }

    #[test]
    fn test_overrun_candidate_is_reported_not_accepted() {
        let mut buf = vec![0u8; 0x100];
        buf[0..4].copy_from_slice(b"dex\n");
        buf[0x20..0x24].copy_from_slice(&0x4000u32.to_le_bytes());

        let window = MemoryWindow::new(0x7000, buf);
        let outcome = scanner().scan(&window, 1, 0x7000);

        assert!(outcome.payloads.is_empty());
        assert_eq!(
            outcome.overruns,
            vec![OverrunCandidate {
                offset: 0,
                declared_len: 0x4000
            }]
        );
    }

    #[test]
    fn test_round_trip_fidelity() {
        let mut buf = vec![0u8; 0x200];
        put_container(&mut buf, 0x33, 0x90, 0xEE);
        let expected = buf[0x33..0x33 + 0x90].to_vec();

        let window = MemoryWindow::new(0x1000, buf);
        let outcome = scanner().scan(&window, 7, 0x1000);
        assert_eq!(outcome.payloads.len(), 1);
        assert_eq!(outcome.payloads[0].bytes, expected);
    }

    #[test]
    fn test_region_offset_accounts_for_chunked_windows() {
        let mut buf = vec![0u8; 0x100];
        put_container(&mut buf, 0x20, 0x40, 0x11);

        // Window captured mid-region: base 0x3400 inside a region at 0x3000
        let window = MemoryWindow::new(0x3400, buf);
        let outcome = scanner().scan(&window, 9, 0x3000);
        assert_eq!(outcome.payloads.len(), 1);
        assert_eq!(outcome.payloads[0].source_address, 0x3420);
        assert_eq!(outcome.payloads[0].region_offset, 0x420);
    }

    #[test]
    fn test_rejects_unsupported_size_field_width() {
        let mut sig = builtin_signatures().entry("dex").unwrap().clone();
        sig.size_field_width = 16;
        assert!(SignatureScanner::new(sig).is_err());
    }
}
