use crate::cue::models::CueImage;
use crate::khn::error::{KhnError, KhnResult};
use crate::khn::layout::{ContainerLayout, HEADER_OFFSET, HEADER_SIZE, PAYLOAD_OFFSET};
use crate::util::{pad_to, write_zeros};
use log::debug;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_CHUNK_SIZE: usize = 1024 * 1024; // 1 MB
const PROGRESS_INTERVAL: u64 = 2 * 1024 * 1024;

/// Opens the byte stream behind a source handle.
pub trait SourceReader<H> {
    type Reader: AsyncRead + Unpin;

    fn open(&self, handle: &H) -> impl Future<Output = std::io::Result<Self::Reader>>;
}

/// Reads sources straight from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSourceReader;

impl SourceReader<PathBuf> for FileSourceReader {
    type Reader = File;

    async fn open(&self, handle: &PathBuf) -> std::io::Result<File> {
        File::open(handle).await
    }
}

struct ProgressTracker<F> {
    on_progress: F,
    padded_size: u64,
    last_reported: u64,
}

impl<F: FnMut(u8, &str)> ProgressTracker<F> {
    fn percent(&self, written: u64) -> u8 {
        if self.padded_size == 0 {
            return 0;
        }

        (written.saturating_mul(100) / self.padded_size).min(100) as u8
    }

    fn report(&mut self, written: u64, message: &str) {
        self.last_reported = written;
        let percent = self.percent(written);
        (self.on_progress)(percent, message);
    }

    fn maybe_report(&mut self, written: u64, message: &str) {
        if written - self.last_reported >= PROGRESS_INTERVAL {
            self.report(written, message);
        }
    }

    fn finish(&mut self) {
        (self.on_progress)(100, "Done");
    }
}

fn check_cancelled(cancel: &AtomicBool) -> KhnResult<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(KhnError::Cancelled);
    }

    Ok(())
}

/// Writes a complete kHn image for `image` into `sink`.
///
/// Progress is reported as `(percent, message)` roughly every 2 MiB of disc data, the
/// percentage is relative to the padded payload size. `cancel` is checked between chunks.
/// On error the sink is left with whatever was written so far.
pub async fn write_container<H, R, W, F>(
    image: &CueImage<H>,
    sources: &R,
    sink: &mut W,
    on_progress: F,
    cancel: &AtomicBool,
) -> KhnResult<ContainerLayout>
where
    R: SourceReader<H>,
    W: AsyncWrite + Unpin,
    F: FnMut(u8, &str),
{
    let layout = ContainerLayout::compute(image)?;

    debug!(
        "Total size: {} bytes, {} sectors, padded to {} bytes",
        layout.total_bytes, layout.total_sectors, layout.padded_size
    );

    let mut progress = ProgressTracker {
        on_progress,
        padded_size: layout.padded_size,
        last_reported: 0,
    };
    progress.report(0, "Writing header");

    sink.write_all(&layout.toc).await?;
    pad_to(sink, layout.toc.len() as u64, HEADER_OFFSET).await?;
    sink.write_all(&layout.header.to_bytes()?).await?;
    pad_to(sink, HEADER_OFFSET + HEADER_SIZE, PAYLOAD_OFFSET).await?;

    let mut written: u64 = 0;
    let mut buffer = vec![0u8; READ_CHUNK_SIZE];

    for (idx, source) in image.sources.iter().enumerate() {
        debug!(
            "Writing source {}/{} ({} bytes)",
            idx + 1,
            image.sources.len(),
            source.length
        );

        let mut reader = sources.open(&source.handle).await?;
        loop {
            check_cancelled(cancel)?;

            let read = reader.read(&mut buffer).await?;
            if read == 0 {
                break;
            }

            sink.write_all(&buffer[..read]).await?;
            written += read as u64;
            progress.maybe_report(written, "Writing disc data");
        }
    }

    if layout.padded_size > written {
        check_cancelled(cancel)?;
        debug!("Padding {} bytes", layout.padded_size - written);
        write_zeros(sink, layout.padded_size - written).await?;
    }

    sink.flush().await?;
    progress.finish();

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cd::SECTOR_SIZE;
    use crate::cue::models::{SourceRef, TrackEntry};
    use byteorder::{ByteOrder, LittleEndian};
    use std::collections::BTreeMap;
    use std::io::Cursor;

    struct MemorySources;

    impl SourceReader<Vec<u8>> for MemorySources {
        type Reader = Cursor<Vec<u8>>;

        async fn open(&self, handle: &Vec<u8>) -> std::io::Result<Cursor<Vec<u8>>> {
            Ok(Cursor::new(handle.clone()))
        }
    }

    fn image(sources: Vec<Vec<u8>>, tracks: &[(u8, u64)]) -> CueImage<Vec<u8>> {
        CueImage {
            sources: sources
                .into_iter()
                .map(|data| {
                    let length = data.len() as u64;
                    SourceRef::new(data, length)
                })
                .collect(),
            tracks: tracks
                .iter()
                .map(|&(number, start)| {
                    let mut track = TrackEntry::new(number, "MODE2/2352");
                    track.indices.insert(1, start);
                    (number, track)
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    async fn build(image: &CueImage<Vec<u8>>) -> (Vec<u8>, Vec<u8>) {
        let mut sink = Vec::new();
        let mut percents = Vec::new();
        let cancel = AtomicBool::new(false);

        write_container(
            image,
            &MemorySources,
            &mut sink,
            |percent, _| percents.push(percent),
            &cancel,
        )
        .await
        .unwrap();

        (sink, percents)
    }

    #[tokio::test]
    async fn single_track_image_layout() {
        let data: Vec<u8> = (0..SECTOR_SIZE * 10).map(|i| (i % 251) as u8 + 1).collect();
        let image = image(vec![data.clone()], &[(1, 0)]);

        let (out, _) = build(&image).await;

        assert_eq!(out.len(), 0x100000 + 0x9300);
        assert_eq!(out.len() - 0x100000, 37632);
        assert_eq!(out[17], 0x01);
        assert_eq!(&out[27..30], &[0x00, 0x00, 0x10]);
        assert!(out[40..0x400].iter().all(|&b| b == 0));
        assert_eq!(&out[0x400..0x404], &[0x6B, 0x48, 0x6E, 0x20]);
        assert_eq!(LittleEndian::read_u32(&out[0x404..0x408]), 0);
        assert_eq!(LittleEndian::read_u32(&out[0x408..0x40C]), 10);
        assert_eq!(LittleEndian::read_u32(&out[0x40C..0x410]), 10);
        assert!(out[0x410..0x100000].iter().all(|&b| b == 0));
        assert_eq!(&out[0x100000..0x100000 + data.len()], data.as_slice());
        assert!(out[0x100000 + data.len()..].iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn sources_are_concatenated_in_declared_order() {
        let first = vec![0xAA; SECTOR_SIZE * 100];
        let second = vec![0xBB; SECTOR_SIZE * 20];
        let image = image(vec![first.clone(), second.clone()], &[(1, 0), (2, 100)]);

        let (out, _) = build(&image).await;

        let payload = &out[0x100000..];
        assert_eq!(&payload[..first.len()], first.as_slice());
        assert_eq!(
            &payload[first.len()..first.len() + second.len()],
            second.as_slice()
        );
        assert_eq!(LittleEndian::read_u32(&out[0x408..0x40C]), 120);
        // track 2 at sector 100 (00:01:25) plus two seconds
        assert_eq!(&out[40..50], &[0x01, 0x00, 0x02, 0x00, 0x03, 0x25, 0x00, 0x00, 0x03, 0x25]);
        assert_eq!(payload.len() % 0x9300, 0);
        assert!(payload.len() - (first.len() + second.len()) < 0x9300);
    }

    #[tokio::test]
    async fn progress_is_bounded_and_non_decreasing() {
        let data = vec![0x11; 9 * 1024 * 1024];
        let image = image(vec![data], &[(1, 0)]);

        let (_, percents) = build(&image).await;

        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert!(percents.iter().all(|&p| p <= 100));
        // header, four 2 MiB steps, done
        assert_eq!(percents.len(), 6);
    }

    #[tokio::test]
    async fn empty_payload_reports_zero_before_done() {
        let image = image(vec![Vec::new()], &[(1, 0)]);

        let (out, percents) = build(&image).await;

        assert_eq!(percents, vec![0, 100]);
        assert_eq!(out.len() as u64, PAYLOAD_OFFSET);
        assert_eq!(LittleEndian::read_u32(&out[0x408..0x40C]), 0);
    }

    #[tokio::test]
    async fn cancellation_stops_between_chunks() {
        let image = image(vec![vec![0u8; SECTOR_SIZE * 4]], &[(1, 0)]);
        let mut sink = Vec::new();
        let cancel = AtomicBool::new(true);

        let result = write_container(&image, &MemorySources, &mut sink, |_, _| {}, &cancel).await;

        assert!(matches!(result, Err(KhnError::Cancelled)));
        assert_eq!(sink.len() as u64, PAYLOAD_OFFSET);
    }

    #[tokio::test]
    async fn writes_from_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.bin");
        std::fs::write(&path, vec![0x5A; SECTOR_SIZE * 2]).unwrap();

        let mut track = TrackEntry::new(1, "MODE2/2352");
        track.indices.insert(1, 0);
        let image = CueImage {
            sources: vec![SourceRef::new(path, (SECTOR_SIZE * 2) as u64)],
            tracks: BTreeMap::from([(1, track)]),
        };

        let mut sink = Vec::new();
        write_container(
            &image,
            &FileSourceReader,
            &mut sink,
            |_, _| {},
            &AtomicBool::new(false),
        )
        .await
        .unwrap();

        assert_eq!(sink.len() as u64, PAYLOAD_OFFSET + 0x9300);
        assert!(sink[0x100000..0x100000 + SECTOR_SIZE * 2].iter().all(|&b| b == 0x5A));
    }
}
