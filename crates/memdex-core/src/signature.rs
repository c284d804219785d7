use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Byte order of the embedded size field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    Little,
    Big,
}

/// Description of one recognizable container format: the magic bytes and
/// where the header stores the container's total size, relative to the start
/// of the magic. New format revisions are added as configuration, not code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatSignature {
    pub name: String,
    pub pattern: String,
    pub size_field_offset: usize,
    #[serde(default = "default_size_field_width")]
    pub size_field_width: usize,
    #[serde(default = "default_endian")]
    pub endian: Endian,
}

fn default_size_field_width() -> usize {
    4
}

fn default_endian() -> Endian {
    Endian::Little
}

impl FormatSignature {
    pub fn pattern_bytes(&self) -> Result<Vec<u8>> {
        parse_pattern(&self.pattern)
    }

    /// Bytes needed past a candidate position before the size field is fully
    /// readable.
    pub fn header_span(&self) -> usize {
        self.size_field_offset + self.size_field_width
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSet {
    pub version: String,
    pub entries: Vec<FormatSignature>,
}

impl SignatureSet {
    pub fn entry(&self, name: &str) -> Option<&FormatSignature> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}

/// Built-in signature set.
///
/// Both entries cover the DEX family: the header stores the container's exact
/// total size as a little-endian u32 at offset 0x20 from the magic. The short
/// `dex\n` prefix matches every classic version string (035, 037, 038, ...);
/// compact DEX uses the `cdex` prefix with the same header layout.
pub fn builtin_signatures() -> SignatureSet {
    SignatureSet {
        version: "builtin-1".to_string(),
        entries: vec![
            FormatSignature {
                name: "dex".to_string(),
                pattern: "64 65 78 0A".to_string(),
                size_field_offset: 0x20,
                size_field_width: 4,
                endian: Endian::Little,
            },
            FormatSignature {
                name: "cdex".to_string(),
                pattern: "63 64 65 78".to_string(),
                size_field_offset: 0x20,
                size_field_width: 4,
                endian: Endian::Little,
            },
        ],
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidSignature(format!("Invalid pattern token '{}': {}", token, e))
        })?;
        bytes.push(value);
    }

    if bytes.is_empty() {
        return Err(Error::InvalidSignature(
            "Signature pattern is empty".to_string(),
        ));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
