// src/cd/mod.rs
use std::fmt::Display;

pub const SECTOR_SIZE: usize = 2352;
pub const FRAMES_PER_SECOND: u32 = 75;
pub const SECONDS_PER_MINUTE: u32 = 60;
pub const FRAMES_PER_MINUTE: u32 = FRAMES_PER_SECOND * SECONDS_PER_MINUTE;

/// First sector that no longer fits into two BCD minute digits (100:00:00).
pub const MAX_ADDRESSABLE_SECTORS: u32 = 100 * FRAMES_PER_MINUTE;

/// Encodes a value in the range 0..=99 as packed binary-coded decimal.
pub fn to_bcd(value: u8) -> u8 {
    debug_assert!(value < 100, "BCD value out of range: {value}");
    ((value / 10) << 4) | (value % 10)
}

/// Minute:Second:Frame disc address, 75 frames per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Msf {
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl Msf {
    pub const fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        Self {
            minutes,
            seconds,
            frames,
        }
    }

    /// Converts an absolute sector count into an MSF address.
    ///
    /// Returns `None` when the minutes would not fit into two BCD digits.
    pub fn from_sectors(sectors: u32) -> Option<Self> {
        if sectors >= MAX_ADDRESSABLE_SECTORS {
            return None;
        }

        let frames = sectors % FRAMES_PER_SECOND;
        let sectors = sectors / FRAMES_PER_SECOND;
        let seconds = sectors % SECONDS_PER_MINUTE;
        let minutes = sectors / SECONDS_PER_MINUTE;

        Some(Self::new(minutes as u8, seconds as u8, frames as u8))
    }

    pub fn to_sectors(&self) -> u32 {
        self.minutes as u32 * FRAMES_PER_MINUTE
            + self.seconds as u32 * FRAMES_PER_SECOND
            + self.frames as u32
    }

    /// Adds whole seconds, carrying into the minutes.
    pub fn checked_add_seconds(&self, seconds: u8) -> Option<Self> {
        Self::from_sectors(self.to_sectors() + seconds as u32 * FRAMES_PER_SECOND)
    }

    pub fn to_bcd(&self) -> [u8; 3] {
        [
            to_bcd(self.minutes),
            to_bcd(self.seconds),
            to_bcd(self.frames),
        ]
    }
}

impl Display for Msf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.frames
        )
    }
}
