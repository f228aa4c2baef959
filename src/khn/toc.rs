use crate::cd::{Msf, to_bcd};
use crate::cue::models::TrackEntry;
use crate::khn::error::{KhnError, KhnResult};
use std::collections::BTreeMap;

pub const TOC_ENTRY_SIZE: usize = 10;

/// Lead-in descriptors A0 (first track), A1 (last track) and A2 (lead-out).
/// Each entry is `[control, tno, point, min, sec, frame, zero, pmin, psec, pframe]`.
#[rustfmt::skip]
pub const TOC_TEMPLATE: [u8; 30] = [
    0x41, 0x00, 0xA0, 0x00, 0x00, 0x00, 0x00, 0x01, 0x20, 0x00,
    0x41, 0x00, 0xA1, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x41, 0x00, 0xA2, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const TRACK_COUNT_OFFSET: usize = 17;
const LEAD_OUT_OFFSET: usize = 27;

const FIRST_TRACK_CONTROL: u8 = 0x41;
const TRACK_CONTROL: u8 = 0x01;

/// Seconds added to every track after the first, the Red Book two second pregap.
const PREGAP_SECONDS: u8 = 2;

fn sectors_to_msf(sectors: u64) -> KhnResult<Msf> {
    u32::try_from(sectors)
        .ok()
        .and_then(Msf::from_sectors)
        .ok_or(KhnError::AddressOutOfRange(sectors))
}

fn track_entry(track: &TrackEntry) -> KhnResult<[u8; TOC_ENTRY_SIZE]> {
    if track.number > 99 {
        return Err(KhnError::TrackNumberOutOfRange(track.number));
    }

    let mut entry = [0u8; TOC_ENTRY_SIZE];
    entry[2] = to_bcd(track.number);

    // Track 1 never restates its start, the loader assumes the canonical disc start.
    if track.number == 1 {
        entry[0] = FIRST_TRACK_CONTROL;
        return Ok(entry);
    }

    let start = track.start_sector();
    let msf = sectors_to_msf(start)?
        .checked_add_seconds(PREGAP_SECONDS)
        .ok_or(KhnError::AddressOutOfRange(start))?
        .to_bcd();

    entry[0] = TRACK_CONTROL;
    entry[3..6].copy_from_slice(&msf);
    entry[7..10].copy_from_slice(&msf);

    Ok(entry)
}

/// Builds the table of contents: the lead-in template followed by one entry per track
/// in ascending track order.
pub fn generate_toc(tracks: &BTreeMap<u8, TrackEntry>, total_sectors: u64) -> KhnResult<Vec<u8>> {
    let size = TOC_TEMPLATE.len() + tracks.len() * TOC_ENTRY_SIZE;
    if tracks.len() > 99 {
        return Err(KhnError::TocTooLarge(size));
    }

    let mut toc = Vec::with_capacity(size);
    toc.extend_from_slice(&TOC_TEMPLATE);

    toc[TRACK_COUNT_OFFSET] = to_bcd(tracks.len() as u8);
    toc[LEAD_OUT_OFFSET..LEAD_OUT_OFFSET + 3]
        .copy_from_slice(&sectors_to_msf(total_sectors)?.to_bcd());

    for track in tracks.values() {
        toc.extend_from_slice(&track_entry(track)?);
    }

    Ok(toc)
}
