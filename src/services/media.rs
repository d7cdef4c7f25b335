//! Storage for uploaded and generated media files.
//!
//! Every filename that reaches the disk goes through [`sanitize_filename`] and
//! [`MediaStorage::resolve`], so a stored file always lives directly inside the
//! media root.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Manifest file kept alongside the media, never listed as media.
pub const MANIFEST_FILENAME: &str = "media.json";

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg"];
pub const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Path traversal detected: {0:?}")]
    PathTraversal(String),

    #[error("Media IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Html,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Html => "html",
        }
    }

    /// Classifies a filename by its extension (case-insensitive).
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        let ext = ext.as_str();

        if IMAGE_EXTENSIONS.contains(&ext) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(Self::Video)
        } else if HTML_EXTENSIONS.contains(&ext) {
            Some(Self::Html)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub name: String,
    pub url: String,
    pub kind: MediaKind,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Reduces `input` to a safe bare filename.
///
/// Directory components are dropped, `""`, `"."`, `".."` and names with NUL
/// are rejected, and every stem character outside `[A-Za-z0-9_-]` becomes `_`.
/// The extension is kept as-is.
#[must_use]
pub fn sanitize_filename(input: &str) -> Option<String> {
    let trimmed = input.trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return None;
    }

    let (stem, ext) = split_extension(base);
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    Some(format!("{stem}{ext}"))
}

/// Splits `name` at its last dot; a leading dot does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// `<sanitized stem>-<uuid><ext>` for uploads, so client names never collide.
#[must_use]
pub fn unique_filename(original: &str) -> String {
    let safe = sanitize_filename(original).unwrap_or_else(|| "upload".to_string());
    let (stem, ext) = split_extension(&safe);
    format!("{stem}-{}{ext}", uuid::Uuid::new_v4().simple())
}

#[must_use]
pub fn file_url(filename: &str) -> String {
    format!("/media/{filename}")
}

/// Last path segment of a stored `/media/<name>` URL.
#[must_use]
pub fn filename_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|name| !name.is_empty())
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_dir(&self) -> Result<(), MediaError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Sanitizes `name` and joins it to the media root, refusing any result
    /// that is not a direct child of the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, MediaError> {
        let sanitized =
            sanitize_filename(name).ok_or_else(|| MediaError::InvalidFilename(name.to_string()))?;
        let path = self.root.join(&sanitized);

        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| MediaError::PathTraversal(name.to_string()))?;
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(path),
            _ => Err(MediaError::PathTraversal(name.to_string())),
        }
    }

    pub async fn write(&self, name: &str, content: &str) -> Result<PathBuf, MediaError> {
        self.write_bytes(name, content.as_bytes()).await
    }

    pub async fn write_bytes(&self, name: &str, content: &[u8]) -> Result<PathBuf, MediaError> {
        self.ensure_dir().await?;
        let path = self.resolve(name)?;
        fs::write(&path, content).await?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote media file");
        Ok(path)
    }

    /// Creates (or truncates) `name` for streaming writes.
    pub async fn create(&self, name: &str) -> Result<(fs::File, PathBuf), MediaError> {
        self.ensure_dir().await?;
        let path = self.resolve(name)?;
        let file = fs::File::create(&path).await?;
        Ok((file, path))
    }

    pub async fn read_to_string(&self, name: &str) -> Result<String, MediaError> {
        let path = self.resolve(name)?;
        Ok(fs::read_to_string(path).await?)
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.resolve(name) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn copy(&self, src: &str, dest: &str) -> Result<(), MediaError> {
        let src = self.resolve(src)?;
        let dest = self.resolve(dest)?;
        fs::copy(src, dest).await?;
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<(), MediaError> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).await?;
        debug!(path = %path.display(), "Deleted media file");
        Ok(())
    }

    /// Media files in the root, sorted case-insensitively by name.
    pub async fn list(&self) -> Result<Vec<MediaFile>, MediaError> {
        self.ensure_dir().await?;

        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name == MANIFEST_FILENAME {
                continue;
            }
            let Some(kind) = MediaKind::from_filename(&name) else {
                continue;
            };
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            files.push(MediaFile {
                url: file_url(&name),
                content_type: mime_guess::from_path(&name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string(),
                size_bytes: metadata.len(),
                kind,
                name,
            });
        }

        files.sort_by_key(|f| f.name.to_lowercase());
        Ok(files)
    }
}
