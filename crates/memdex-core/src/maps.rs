//! Region-table parsing for `/proc/<pid>/maps`.
//!
//! One line per mapping: `start-end perms offset major:minor inode [pathname]`.
//! Addresses, offset and device numbers are hexadecimal, the inode is decimal,
//! and the pathname is absent for anonymous mappings.

use std::fs::File;
use std::io::{BufRead, BufReader};

use tracing::debug;

use crate::error::{Error, Result};

/// Permission flags of one mapping, from the `rwxp` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perms {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    pub shared: bool,
}

impl Perms {
    fn parse(s: &str) -> Option<Perms> {
        let b = s.as_bytes();
        if b.len() < 4 {
            return None;
        }
        Some(Perms {
            read: b[0] == b'r',
            write: b[1] == b'w',
            execute: b[2] == b'x',
            shared: b[3] == b's',
        })
    }
}

/// One contiguous virtual-memory mapping of the target process.
///
/// Immutable once parsed; lives for a single scan pass.
#[derive(Debug, Clone)]
pub struct Region {
    pub start: u64,
    pub end: u64,
    pub perms: Perms,
    pub offset: u64,
    pub dev: (u32, u32),
    pub inode: u64,
    pub pathname: Option<String>,
}

impl Region {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse the full region table of `pid`.
///
/// Failing to open the table is fatal: the caller must not mistake an
/// unreadable table for an empty address space. Individual lines that do not
/// match the grammar are skipped so a partially readable table still yields
/// a usable region list.
pub fn parse_regions(pid: u32) -> Result<Vec<Region>> {
    let path = format!("/proc/{pid}/maps");
    let file = File::open(&path).map_err(|source| Error::MapsUnavailable { pid, source })?;

    let mut regions = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        match parse_line(&line) {
            Some(region) => regions.push(region),
            None => debug!("Skipping malformed maps line: {line:?}"),
        }
    }
    Ok(regions)
}

/// Parse one maps line. Returns `None` for anything that does not match the
/// field grammar, including address ranges where `start >= end`.
pub fn parse_line(line: &str) -> Option<Region> {
    let mut fields = line.split_whitespace();

    let (start, end) = fields.next()?.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if start >= end {
        return None;
    }

    let perms = Perms::parse(fields.next()?)?;
    let offset = u64::from_str_radix(fields.next()?, 16).ok()?;

    let (major, minor) = fields.next()?.split_once(':')?;
    let dev = (
        u32::from_str_radix(major, 16).ok()?,
        u32::from_str_radix(minor, 16).ok()?,
    );

    let inode = fields.next()?.parse().ok()?;

    // The pathname is everything after the inode; it may itself contain spaces.
    let rest = fields.collect::<Vec<_>>().join(" ");
    let pathname = if rest.is_empty() { None } else { Some(rest) };

    Some(Region {
        start,
        end,
        perms,
        offset,
        dev,
        inode,
        pathname,
    })
}
