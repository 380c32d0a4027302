//! Image storage
//!
//! Reading, listing and writing rasters goes through [`ImageStore`] so the
//! batch pipeline can run against the filesystem or fully in memory.

use glob::Pattern;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::util::ensure_dir_writable;

/// Extension used when the source file has none
pub const DEFAULT_EXTENSION: &str = "png";

/// Storage error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Where rasters come from and where they go
pub trait ImageStore: Sync {
    /// Files directly under `dir` whose name matches `pattern`, sorted
    fn list(&self, dir: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>>;

    /// Decode one raster
    fn read(&self, path: &Path) -> Result<DynamicImage>;

    /// Encode one raster; the format follows the path's extension
    fn write(&self, path: &Path, image: &DynamicImage) -> Result<()>;

    /// Make sure `dir` exists and accepts writes
    fn prepare_output_dir(&self, dir: &Path) -> Result<()>;
}

/// Output path for `source` inside `output_dir`: `<stem><suffix>.<ext>`
pub fn derived_path(output_dir: &Path, source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    output_dir.join(format!("{}{}.{}", stem, suffix, extension))
}

fn name_matches(path: &Path, pattern: &Pattern) -> bool {
    path.file_name()
        .map(|name| pattern.matches(&name.to_string_lossy()))
        .unwrap_or(false)
}

// ============================================================
// Filesystem
// ============================================================

/// Store backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageStore;

impl ImageStore for FsImageStore {
    fn list(&self, dir: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(StoreError::NotFound(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && name_matches(&path, pattern) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<DynamicImage> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        image::open(path).map_err(|e| StoreError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn write(&self, path: &Path, image: &DynamicImage) -> Result<()> {
        image.save(path).map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn prepare_output_dir(&self, dir: &Path) -> Result<()> {
        ensure_dir_writable(dir).map_err(|message| StoreError::Write {
            path: dir.to_path_buf(),
            message,
        })
    }
}

// ============================================================
// In-memory
// ============================================================

/// Store that keeps decoded rasters in a map, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<BTreeMap<PathBuf, DynamicImage>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an image
    pub fn insert(&self, path: impl Into<PathBuf>, image: DynamicImage) {
        self.lock().insert(path.into(), image);
    }

    /// Copy of the image stored at `path`
    pub fn get(&self, path: &Path) -> Option<DynamicImage> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, DynamicImage>> {
        self.images.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ImageStore for MemoryImageStore {
    fn list(&self, dir: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>> {
        let images = self.lock();
        let files: Vec<PathBuf> = images
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter(|path| name_matches(path, pattern))
            .cloned()
            .collect();
        if files.is_empty() && !images.keys().any(|p| p.starts_with(dir)) {
            return Err(StoreError::NotFound(dir.to_path_buf()));
        }
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<DynamicImage> {
        self.get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, image: &DynamicImage) -> Result<()> {
        self.insert(path, image.clone());
        Ok(())
    }

    fn prepare_output_dir(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}
