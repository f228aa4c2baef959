use crate::cd::Msf;
use crate::cue::parse_cue_file;
use crate::khn::error::{KhnError, KhnResult};
use crate::khn::layout::ContainerLayout;
use crate::khn::writer::{FileSourceReader, write_container};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tokio::fs::{self, File};
use tokio::io::BufWriter;

pub mod error;
pub mod layout;
pub mod toc;
pub mod writer;

pub const KHN_EXTENSION: &str = "khn";

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024 * 1024; // 8 MB

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
}

/// `<stem>.khn` next to the CUE sheet, prefixed with the game ID when one is known.
pub fn default_output_path(cue_path: &Path, game_id: Option<&str>) -> PathBuf {
    let stem = cue_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "disc".to_string());

    let file_name = match game_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{id} - {stem}.{KHN_EXTENSION}"),
        None => format!("{stem}.{KHN_EXTENSION}"),
    };

    cue_path.with_file_name(file_name)
}

fn progress_bar(multi: &MultiProgress, name: &str) -> KhnResult<ProgressBar> {
    let pb = multi.add(ProgressBar::new(100));
    pb.set_style(
        ProgressStyle::with_template("{prefix} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("=> "),
    );
    pb.set_prefix(name.to_string());
    Ok(pb)
}

pub async fn convert_to_khn(
    multi: MultiProgress,
    cue_path: &Path,
    output_path: &Path,
    force: bool,
    cancel: &AtomicBool,
) -> KhnResult<ContainerLayout> {
    if fs::try_exists(output_path).await? && !force {
        return Err(KhnError::OutputAlreadyExists(output_path.to_path_buf()));
    }

    let image = parse_cue_file(cue_path).await?;
    debug!(
        "Parsed {} source file(s) and {} track(s)",
        image.sources.len(),
        image.tracks.len()
    );

    debug!("Creating kHn file: {:?}", output_path);
    let file = File::create(output_path).await?;
    let mut writer = BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, file);

    let name = cue_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pb = progress_bar(&multi, &name)?;

    let result = write_container(
        &image,
        &FileSourceReader,
        &mut writer,
        |percent, message| {
            pb.set_position(percent as u64);
            pb.set_message(message.to_string());
        },
        cancel,
    )
    .await;

    let layout = match result {
        Ok(layout) => layout,
        Err(err) => {
            pb.abandon_with_message("failed");
            return Err(err);
        }
    };

    writer.into_inner().sync_all().await?;
    pb.finish_and_clear();
    multi.remove(&pb);

    info!(
        "Converted {:?} -> {:?} ({} sectors, {} bytes)",
        cue_path,
        output_path,
        layout.total_sectors,
        layout.output_size()
    );

    Ok(layout)
}

/// Every `.cue` file directly inside `dir_path`, sorted by path.
pub async fn find_cue_files(dir_path: &Path) -> KhnResult<Vec<PathBuf>> {
    let mut dir = fs::read_dir(dir_path).await?;
    let mut files = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        let is_cue = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("cue"));

        if is_cue && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();

    Ok(files)
}

/// Converts every CUE sheet in a directory. Failed images are logged and counted,
/// cancellation aborts the whole batch.
pub async fn batch_convert_to_khn(
    multi: MultiProgress,
    input_dir: &Path,
    output_dir: Option<&Path>,
    force: bool,
    cancel: &AtomicBool,
) -> KhnResult<BatchSummary> {
    let cue_files = find_cue_files(input_dir).await?;
    if cue_files.is_empty() {
        return Err(KhnError::NoCueFilesFound(input_dir.to_path_buf()));
    }

    if let Some(output_dir) = output_dir {
        fs::create_dir_all(output_dir).await?;
    }

    let mut summary = BatchSummary::default();

    for (idx, cue_path) in cue_files.iter().enumerate() {
        let mut output_path = default_output_path(cue_path, None);
        if let (Some(dir), Some(name)) = (output_dir, output_path.file_name()) {
            output_path = dir.join(name);
        }

        info!("[{}/{}] {:?}", idx + 1, cue_files.len(), cue_path);

        match convert_to_khn(multi.clone(), cue_path, &output_path, force, cancel).await {
            Ok(_) => summary.converted += 1,
            Err(KhnError::Cancelled) => return Err(KhnError::Cancelled),
            Err(err) => {
                warn!("Skipping {:?}: {}", cue_path, err);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Logs the parsed track table and the layout that a conversion would produce.
pub async fn describe_cue(cue_path: &Path) -> KhnResult<()> {
    let image = parse_cue_file(cue_path).await?;
    let layout = ContainerLayout::compute(&image)?;

    info!("CUE sheet: {:?}", cue_path);
    for (idx, source) in image.sources.iter().enumerate() {
        info!(
            "  FILE {}: {:?} ({} bytes, {} sectors)",
            idx + 1,
            source.handle,
            source.length,
            source.sectors()
        );
    }

    for track in image.tracks.values() {
        let indices = track
            .indices
            .iter()
            .map(|(number, sector)| format!("{number:02}@{sector}"))
            .collect::<Vec<_>>()
            .join(" ");
        let start = u32::try_from(track.start_sector())
            .ok()
            .and_then(Msf::from_sectors)
            .map(|msf| msf.to_string())
            .unwrap_or_else(|| "out of range".to_string());
        info!(
            "  TRACK {:02} {:<12} start {} [{}]",
            track.number, track.mode, start, indices
        );
    }

    info!("Total sectors: {}", layout.total_sectors);
    info!(
        "Payload: {} bytes, padded to {} bytes, output {} bytes",
        layout.total_bytes,
        layout.padded_size,
        layout.output_size()
    );

    let toc_hex = layout
        .toc
        .chunks(toc::TOC_ENTRY_SIZE)
        .map(|entry| {
            entry
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>();
    info!("TOC ({} bytes):", layout.toc.len());
    for line in toc_hex {
        info!("  {line}");
    }

    Ok(())
}
