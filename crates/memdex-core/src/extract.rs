//! Header-driven payload recovery.
//!
//! The contract is "recover exactly as many bytes as the header claims, or
//! reject" — no checksums, no validation of the claimed bytes beyond their
//! declared length.

use crate::signature::{Endian, FormatSignature};

/// Byte range of one accepted payload within its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedRange {
    pub offset: usize,
    pub len: usize,
}

/// Outcome of probing one candidate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Accepted(ExtractedRange),
    /// The size field does not fit inside the window.
    TruncatedHeader,
    /// The header declares a zero-byte payload.
    ZeroLength,
    /// The size field is readable but the declared end lies past the window.
    /// The caller may retry the candidate against a larger capture.
    Overrun { declared_len: u64 },
}

/// Read the declared total size at `offset` and validate it against the
/// window bounds.
pub fn extract_at(window: &[u8], offset: usize, sig: &FormatSignature) -> Extraction {
    // Offsets come from configuration; an overflowing sum can only mean the
    // field lies far past any real window.
    let field_end = offset
        .checked_add(sig.size_field_offset)
        .and_then(|start| start.checked_add(sig.size_field_width));
    let Some(field_end) = field_end else {
        return Extraction::TruncatedHeader;
    };
    if field_end > window.len() {
        return Extraction::TruncatedHeader;
    }
    let field_start = field_end - sig.size_field_width;

    let declared = read_size_field(&window[field_start..field_end], sig.endian);
    if declared == 0 {
        return Extraction::ZeroLength;
    }
    if offset as u64 + declared > window.len() as u64 {
        return Extraction::Overrun {
            declared_len: declared,
        };
    }

    Extraction::Accepted(ExtractedRange {
        offset,
        len: declared as usize,
    })
}

fn read_size_field(bytes: &[u8], endian: Endian) -> u64 {
    let mut value: u64 = 0;
    match endian {
        Endian::Little => {
            for &b in bytes.iter().rev() {
                value = value << 8 | b as u64;
            }
        }
        Endian::Big => {
            for &b in bytes {
                value = value << 8 | b as u64;
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::builtin_signatures;

    fn dex_sig() -> FormatSignature {
        builtin_signatures().entry("dex").unwrap().clone()
    }

    /// Builds a minimal window: magic at `offset`, size field filled in, rest
    /// zeroed out to `total`.
    fn window_with(offset: usize, declared: u32, total: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; total];
        bytes[offset..offset + 4].copy_from_slice(b"dex\n");
        bytes[offset + 0x20..offset + 0x24].copy_from_slice(&declared.to_le_bytes());
        bytes
    }

    #[test]
    fn test_accepts_exact_range() {
        let window = window_with(8, 0x70, 0x100);
        let range = match extract_at(&window, 8, &dex_sig()) {
            Extraction::Accepted(range) => range,
            other => panic!("expected accept, got {:?}", other),
        };
        assert_eq!(range, ExtractedRange { offset: 8, len: 0x70 });
    }

    #[test]
    fn test_rejects_truncated_header() {
        // Magic fits, size field does not
        let mut window = vec![0u8; 0x20];
        window[0..4].copy_from_slice(b"dex\n");
        assert_eq!(
            extract_at(&window, 0, &dex_sig()),
            Extraction::TruncatedHeader
        );
    }

    #[test]
    fn test_rejects_zero_length() {
        let window = window_with(0, 0, 0x100);
        assert_eq!(extract_at(&window, 0, &dex_sig()), Extraction::ZeroLength);
    }

    #[test]
    fn test_reports_overrun_with_declared_length() {
        let mut window = vec![0u8; 0x40];
        window[0..4].copy_from_slice(b"dex\n");
        window[0x20..0x24].copy_from_slice(&0x1000u32.to_le_bytes());
        assert_eq!(
            extract_at(&window, 0, &dex_sig()),
            Extraction::Overrun { declared_len: 0x1000 }
        );
    }

    #[test]
    fn test_pathological_field_offset_does_not_overflow() {
        let sig = FormatSignature {
            name: "huge".to_string(),
            pattern: "64 65 78 0A".to_string(),
            size_field_offset: usize::MAX - 2,
            size_field_width: 4,
            endian: Endian::Little,
        };
        let window = window_with(0, 0x70, 0x100);
        assert_eq!(extract_at(&window, 8, &sig), Extraction::TruncatedHeader);
    }

    #[test]
    fn test_big_endian_size_field() {
        let sig = FormatSignature {
            name: "be".to_string(),
            pattern: "AA BB".to_string(),
            size_field_offset: 2,
            size_field_width: 4,
            endian: Endian::Big,
        };
        let mut window = vec![0u8; 0x40];
        window[0] = 0xAA;
        window[1] = 0xBB;
        window[2..6].copy_from_slice(&0x30u32.to_be_bytes());
        let range = match extract_at(&window, 0, &sig) {
            Extraction::Accepted(range) => range,
            other => panic!("expected accept, got {:?}", other),
        };
        assert_eq!(range.len, 0x30);
    }
}
