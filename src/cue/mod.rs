use crate::cd::{FRAMES_PER_MINUTE, FRAMES_PER_SECOND, SECTOR_SIZE};
use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{CueImage, DEFAULT_TRACK_MODE, TrackEntry};
use crate::cue::resolver::{DirectoryResolver, SourceResolver};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod error;
pub mod models;
pub mod resolver;

lazy_static! {
    static ref QUOTED_NAME: Regex = Regex::new(r#""([^"]*)""#).unwrap();
}

pub struct CueParser<'a, R> {
    resolver: &'a R,
}

impl<'a, R: SourceResolver> CueParser<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    pub fn parse(&self, text: &str) -> CueResult<CueImage<R::Handle>> {
        let mut sources = Vec::new();
        let mut tracks: BTreeMap<u8, TrackEntry> = BTreeMap::new();

        let mut global_sector_offset: u64 = 0;
        let mut previous_file_length: Option<u64> = None;
        let mut current_track: Option<u8> = None;

        for line in text.lines() {
            let line = line.trim();

            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some(keyword) = parts.first() else {
                continue;
            };

            if keyword.eq_ignore_ascii_case("FILE") {
                if let Some(length) = previous_file_length {
                    global_sector_offset += length / SECTOR_SIZE as u64;
                }

                let filename = self.extract_file_name(line, &parts)?;
                let source = self
                    .resolver
                    .resolve(&filename)
                    .ok_or_else(|| CueError::SourceMissingError(filename.clone()))?;

                debug!(
                    "FILE {:?}: {} bytes, starts at sector {}",
                    filename, source.length, global_sector_offset
                );

                previous_file_length = Some(source.length);
                sources.push(source);
            } else if keyword.eq_ignore_ascii_case("TRACK") {
                let number = parts
                    .get(1)
                    .and_then(|n| n.parse::<u8>().ok())
                    .ok_or_else(|| CueError::FormatError(format!("Invalid TRACK line: {line}")))?;
                let mode = parts.get(2).copied().unwrap_or(DEFAULT_TRACK_MODE);

                tracks.insert(number, TrackEntry::new(number, mode));
                current_track = Some(number);
            } else if keyword.eq_ignore_ascii_case("INDEX") {
                let Some(track) = current_track.and_then(|n| tracks.get_mut(&n)) else {
                    continue;
                };

                let (number, position) = match (parts.get(1), parts.get(2)) {
                    (Some(number), Some(position)) => (number, position),
                    _ => {
                        return Err(CueError::FormatError(format!("Invalid INDEX line: {line}")));
                    }
                };

                let number = number
                    .parse::<u8>()
                    .map_err(|_| CueError::FormatError(format!("Invalid INDEX line: {line}")))?;
                let local_sector = self.parse_msf_sectors(position)?;
                let sector = global_sector_offset
                    .checked_add(local_sector)
                    .ok_or_else(|| CueError::FormatError(format!("Invalid INDEX line: {line}")))?;

                track.indices.insert(number, sector);
            }
        }

        if sources.is_empty() {
            return Err(CueError::FormatError(
                "No FILE entries found in the CUE sheet".to_string(),
            ));
        }

        Ok(CueImage { sources, tracks })
    }

    /// Quoted name if present, otherwise every token between the keyword and the file type.
    /// Directory components are dropped, BINs always live next to the CUE sheet.
    fn extract_file_name(&self, line: &str, parts: &[&str]) -> CueResult<String> {
        let raw = match QUOTED_NAME.captures(line) {
            Some(captures) => captures[1].to_string(),
            None => {
                let name_parts = match parts.len() {
                    0 | 1 => &[][..],
                    2 => &parts[1..],
                    n => &parts[1..n - 1],
                };
                name_parts.join(" ").trim_matches('"').to_string()
            }
        };

        let normalized = raw.replace('\\', "/");
        let base_name = normalized.rsplit('/').next().unwrap_or_default().trim();

        if base_name.is_empty() {
            return Err(CueError::FormatError(format!("Invalid FILE line: {line}")));
        }

        Ok(base_name.to_string())
    }

    fn parse_msf_sectors(&self, msf_str: &str) -> CueResult<u64> {
        let invalid = || CueError::FormatError(format!("Invalid MSF timestamp: {msf_str}"));

        let parts = msf_str
            .split(':')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<CueResult<Vec<u32>>>()?;

        let [minutes, seconds, frames] = parts[..] else {
            return Err(invalid());
        };

        (minutes as u64)
            .checked_mul(FRAMES_PER_MINUTE as u64)
            .and_then(|sectors| sectors.checked_add(seconds as u64 * FRAMES_PER_SECOND as u64))
            .and_then(|sectors| sectors.checked_add(frames as u64))
            .ok_or_else(invalid)
    }
}

/// CUE sheets are plain ASCII or Latin-1, every byte maps to the code point of the same value.
pub fn decode_cue_text(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Reads a CUE sheet from disk and resolves its BIN files next to it.
pub async fn parse_cue_file(cue_path: &Path) -> CueResult<CueImage<PathBuf>> {
    debug!("Parsing CUE file: {:?}", cue_path);

    let data = tokio::fs::read(cue_path).await?;
    let text = decode_cue_text(&data);
    let resolver = DirectoryResolver::for_cue(cue_path).await?;

    CueParser::new(&resolver).parse(&text)
}
