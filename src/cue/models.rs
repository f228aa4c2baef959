// src/cue/models
use crate::cd::SECTOR_SIZE;
use std::collections::BTreeMap;

pub const DEFAULT_TRACK_MODE: &str = "MODE1/2352";

/// A BIN file referenced by a `FILE` line, resolved to a readable handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef<H> {
    pub handle: H,
    pub length: u64,
}

impl<H> SourceRef<H> {
    pub fn new(handle: H, length: u64) -> Self {
        Self { handle, length }
    }

    /// Whole sectors contained in the file, any trailing partial sector is dropped.
    pub fn sectors(&self) -> u64 {
        self.length / SECTOR_SIZE as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    pub number: u8,
    /// Informational only, every sector is treated as 2352 raw bytes.
    pub mode: String,
    /// Index number to absolute sector on the whole disc.
    pub indices: BTreeMap<u8, u64>,
}

impl TrackEntry {
    pub fn new(number: u8, mode: impl Into<String>) -> Self {
        Self {
            number,
            mode: mode.into(),
            indices: BTreeMap::new(),
        }
    }

    /// Index 1 if present, otherwise index 0, otherwise the disc start.
    pub fn start_sector(&self) -> u64 {
        self.indices
            .get(&1)
            .or_else(|| self.indices.get(&0))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct CueImage<H> {
    /// Sources in the order of their `FILE` lines.
    pub sources: Vec<SourceRef<H>>,
    /// Tracks keyed by number, iteration is in ascending track order.
    pub tracks: BTreeMap<u8, TrackEntry>,
}

impl<H> CueImage<H> {
    pub fn total_bytes(&self) -> u64 {
        self.sources.iter().map(|source| source.length).sum()
    }

    pub fn total_sectors(&self) -> u64 {
        self.total_bytes() / SECTOR_SIZE as u64
    }
}
