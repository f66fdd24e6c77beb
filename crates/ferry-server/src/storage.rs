//! Blob store — two flat folders of shared files.
//!
//! `inbound/` holds files sent from phones, `outbound/` files staged on
//! the PC. Names are sanitized before touching the filesystem; inbound
//! uploads additionally get a timestamp suffix so repeated uploads of the
//! same name never collide.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use ferry_core::format::format_size;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tracing::warn;

/// Timestamp format used in listings and search filters.
const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage error kinds.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File does not exist in either folder.
    #[error("file not found: {0}")]
    NotFound(String),
    /// Name was empty or entirely stripped by sanitization.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    /// Extension is not on the allow-list.
    #[error("file type not allowed: {0}")]
    ExtensionNotAllowed(String),
    /// Underlying filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Which folder a file lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Folder {
    /// Files received from phones.
    Inbound,
    /// Files staged on the PC for phones to fetch.
    Outbound,
}

impl Folder {
    /// Wire label for the file's origin.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Self::Inbound => "phone",
            Self::Outbound => "pc",
        }
    }
}

/// One listed file.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// File name within its folder.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Human-readable size.
    pub size: String,
    /// Modification time, local, `YYYY-MM-DD HH:MM:SS`.
    pub modified: String,
    /// Lowercased extension, `"unknown"` when absent.
    pub extension: String,
    /// `"phone"` or `"pc"`.
    pub source: String,
}

/// Result of a successful save.
#[derive(Clone, Debug)]
pub struct SavedFile {
    /// Final stored name (may differ from the submitted name).
    pub name: String,
    /// Stored size in bytes.
    pub size_bytes: u64,
}

/// Plain file storage over the two shared folders.
pub struct BlobStore {
    inbound: PathBuf,
    outbound: PathBuf,
    allowed_extensions: Vec<String>,
}

impl BlobStore {
    /// Create a store rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path, allowed_extensions: Vec<String>) -> Self {
        Self {
            inbound: data_dir.join("inbound"),
            outbound: data_dir.join("outbound"),
            allowed_extensions,
        }
    }

    /// Create both folders if missing.
    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.inbound).await?;
        fs::create_dir_all(&self.outbound).await?;
        Ok(())
    }

    /// Filesystem path of a folder.
    #[must_use]
    pub fn dir(&self, folder: Folder) -> &Path {
        match folder {
            Folder::Inbound => &self.inbound,
            Folder::Outbound => &self.outbound,
        }
    }

    /// Store `bytes` under a sanitized version of `name`.
    ///
    /// Inbound files get a `_YYYYMMDD_HHMMSS` suffix before the extension;
    /// outbound files keep their name and overwrite silently, matching how
    /// a PC user expects re-staging a file to behave.
    pub async fn save(
        &self,
        folder: Folder,
        name: &str,
        bytes: &[u8],
    ) -> Result<SavedFile, StorageError> {
        let clean = sanitize_file_name(name).ok_or_else(|| StorageError::InvalidName(name.to_owned()))?;
        if !self.is_allowed(&clean) {
            return Err(StorageError::ExtensionNotAllowed(clean));
        }

        let stored_name = match folder {
            Folder::Inbound => timestamped_name(&clean, Local::now()),
            Folder::Outbound => clean,
        };

        let path = self.dir(folder).join(&stored_name);
        fs::write(&path, bytes).await?;
        Ok(SavedFile {
            name: stored_name,
            size_bytes: bytes.len() as u64,
        })
    }

    /// List one folder. Unreadable entries are skipped with a warning.
    pub async fn list(&self, folder: Folder) -> Result<Vec<FileEntry>, StorageError> {
        let dir = self.dir(folder);
        let mut entries = Vec::new();
        let mut read_dir = match fs::read_dir(dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = read_dir.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let modified: DateTime<Local> = meta.modified()?.into();
            entries.push(FileEntry {
                extension: extension_of(&name),
                size: format_size(meta.len()),
                size_bytes: meta.len(),
                modified: modified.format(MODIFIED_FORMAT).to_string(),
                source: folder.source().to_owned(),
                name,
            });
        }
        Ok(entries)
    }

    /// Merged listing of both folders.
    pub async fn list_all(&self) -> Result<Vec<FileEntry>, StorageError> {
        let mut all = self.list(Folder::Inbound).await?;
        all.extend(self.list(Folder::Outbound).await?);
        Ok(all)
    }

    /// Find which folder holds `name`, outbound first (matching download
    /// precedence), and return its full path.
    pub async fn resolve(&self, name: &str) -> Option<(Folder, PathBuf)> {
        let clean = sanitize_file_name(name)?;
        for folder in [Folder::Outbound, Folder::Inbound] {
            let path = self.dir(folder).join(&clean);
            if fs::try_exists(&path).await.unwrap_or(false) {
                return Some((folder, path));
            }
        }
        None
    }

    /// Delete `name` from whichever folder holds it.
    pub async fn delete(&self, name: &str) -> Result<Folder, StorageError> {
        let (folder, path) = self
            .resolve(name)
            .await
            .ok_or_else(|| StorageError::NotFound(name.to_owned()))?;
        fs::remove_file(&path).await?;
        Ok(folder)
    }

    /// Delete files in both folders older than `hours`, returning how many
    /// were removed.
    pub async fn cleanup_older_than(&self, hours: u64) -> Result<usize, StorageError> {
        let cutoff = std::time::SystemTime::now()
            .checked_sub(std::time::Duration::from_secs(hours * 3600))
            .unwrap_or(std::time::UNIX_EPOCH);
        let mut deleted = 0;
        for folder in [Folder::Inbound, Folder::Outbound] {
            let mut read_dir = match fs::read_dir(self.dir(folder)).await {
                Ok(rd) => rd,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = read_dir.next_entry().await? {
                let meta = entry.metadata().await?;
                if meta.is_file() && meta.modified()? < cutoff {
                    fs::remove_file(entry.path()).await?;
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    /// Whether `name`'s extension is on the allow-list.
    #[must_use]
    pub fn is_allowed(&self, name: &str) -> bool {
        let ext = extension_of(name);
        ext != "unknown" && self.allowed_extensions.iter().any(|a| a == &ext)
    }
}

/// Strip a submitted file name down to something safe to join onto a
/// folder path: path separators and parent components are dropped, control
/// characters removed, and leading dots trimmed. Returns `None` when
/// nothing usable remains.
#[must_use]
pub fn sanitize_file_name(name: &str) -> Option<String> {
    // Keep only the final path component, whichever separator was used.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '\0')
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Lowercased extension, `"unknown"` when the name has none.
#[must_use]
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map_or_else(|| "unknown".to_owned(), |(_, ext)| ext.to_lowercase())
}

/// Insert a timestamp between stem and extension: `a.txt` becomes
/// `a_20260807_153000.txt`.
fn timestamped_name(name: &str, now: DateTime<Local>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{stamp}.{ext}"),
        None => format!("{name}_{stamp}"),
    }
}
