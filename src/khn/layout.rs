use crate::cue::models::CueImage;
use crate::khn::error::{KhnError, KhnResult};
use crate::khn::toc::generate_toc;
use crate::util::align_up;
use binrw::{BinRead, BinWrite};
use std::io::Cursor;

/// The TOC must end before the header.
pub const HEADER_OFFSET: u64 = 0x400;
pub const HEADER_SIZE: u64 = 0x10;
/// Disc data always starts at 1 MiB.
pub const PAYLOAD_OFFSET: u64 = 0x100000;
/// The padded payload size is a multiple of this.
pub const PAYLOAD_ALIGNMENT: u64 = 0x9300;

/// The 16 byte header at offset 0x400, all fields are little-endian.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[brw(magic = b"kHn ")]
pub struct KhnHeader {
    pub reserved: u32,
    pub total_sectors: u32,
    pub total_sectors_copy: u32,
}

impl KhnHeader {
    pub fn new(total_sectors: u32) -> Self {
        Self {
            reserved: 0,
            total_sectors,
            total_sectors_copy: total_sectors,
        }
    }

    pub fn to_bytes(&self) -> KhnResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE as usize));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Everything about the output file that is known before the first byte is written.
#[derive(Debug, Clone)]
pub struct ContainerLayout {
    pub total_bytes: u64,
    pub total_sectors: u32,
    /// `total_bytes` rounded up to [`PAYLOAD_ALIGNMENT`].
    pub padded_size: u64,
    pub toc: Vec<u8>,
    pub header: KhnHeader,
}

impl ContainerLayout {
    pub fn compute<H>(image: &CueImage<H>) -> KhnResult<Self> {
        let total_bytes = image.total_bytes();
        let total_sectors = image.total_sectors();

        let toc = generate_toc(&image.tracks, total_sectors)?;
        if toc.len() as u64 > HEADER_OFFSET {
            return Err(KhnError::TocTooLarge(toc.len()));
        }

        // generate_toc already rejects anything past 99:59:74
        let total_sectors = u32::try_from(total_sectors)
            .map_err(|_| KhnError::AddressOutOfRange(total_sectors))?;

        Ok(Self {
            total_bytes,
            total_sectors,
            padded_size: align_up(total_bytes, PAYLOAD_ALIGNMENT),
            toc,
            header: KhnHeader::new(total_sectors),
        })
    }

    /// Size of the finished file on disk.
    pub fn output_size(&self) -> u64 {
        PAYLOAD_OFFSET + self.padded_size
    }
}
