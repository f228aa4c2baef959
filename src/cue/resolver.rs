use crate::cue::error::CueResult;
use crate::cue::models::SourceRef;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Maps a file name written in a CUE sheet to a readable source.
pub trait SourceResolver {
    type Handle;

    fn resolve(&self, file_name: &str) -> Option<SourceRef<Self::Handle>>;
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    name: String,
    path: PathBuf,
    length: u64,
}

/// Resolves names against a single listing of the CUE sheet's directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    entries: Vec<DirectoryEntry>,
}

impl DirectoryResolver {
    pub async fn scan(dir_path: &Path) -> CueResult<Self> {
        let mut dir = fs::read_dir(dir_path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            entries.push(DirectoryEntry {
                name,
                path: entry.path(),
                length: metadata.len(),
            });
        }

        debug!("Found {} files in {:?}", entries.len(), dir_path);

        Ok(Self { entries })
    }

    /// Scans the directory the CUE sheet lives in.
    pub async fn for_cue(cue_path: &Path) -> CueResult<Self> {
        let dir = match cue_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        Self::scan(dir).await
    }
}

impl SourceResolver for DirectoryResolver {
    type Handle = PathBuf;

    fn resolve(&self, file_name: &str) -> Option<SourceRef<PathBuf>> {
        let wanted = file_name.to_lowercase();

        self.entries
            .iter()
            .find(|entry| entry.name == file_name)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|entry| entry.name.to_lowercase() == wanted)
            })
            .map(|entry| SourceRef::new(entry.path.clone(), entry.length))
    }
}
