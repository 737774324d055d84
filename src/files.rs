//! File collections and the stem-keyed indexes built from them.
//!
//! The archive has two file collections, PDFs and cover images. Each is read
//! through the [`FileCollection`] trait and turned into a lookup table from
//! file stem (see [`crate::naming`]) to a reference payload the catalog can
//! point at.
//!
//! ## File ids
//!
//! Every file gets an opaque id: the first 16 hex digits of the SHA-256 of its
//! contents. Ids are stable across renames and machines, which makes them
//! usable in hosted URL templates (`https://host/file/d/{id}/view`).
//!
//! ## Stem collisions
//!
//! Two files can map to the same stem (`issue-1.jpg` and `issue-1.png`).
//! Enumeration order is not something a folder listing promises, so the
//! winner is decided by [`DuplicatePolicy`] instead:
//!
//! - `Newest`: latest modification time wins, then the greatest file name.
//! - `Reject`: the index build fails with [`StorageError::DuplicateStem`].

use crate::config::{self, DuplicatePolicy, UrlsConfig};
use crate::naming;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Collection folder not found: {0}")]
    MissingFolder(PathBuf),
    #[error("Duplicate stem '{stem}': {first} and {second}")]
    DuplicateStem {
        stem: String,
        first: String,
        second: String,
    },
}

/// One file as listed by a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// File name including extension.
    pub name: String,
    /// Opaque content-derived identifier.
    pub id: String,
    pub modified: SystemTime,
}

/// A read-only, enumerable set of files.
pub trait FileCollection {
    /// List every file. Order is unspecified.
    fn files(&self) -> Result<Vec<StoredFile>, StorageError>;
}

/// A flat folder on the local filesystem.
///
/// Only direct children are listed; hidden files and subdirectories are
/// skipped.
#[derive(Debug, Clone)]
pub struct FolderCollection {
    root: PathBuf,
}

impl FolderCollection {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileCollection for FolderCollection {
    fn files(&self) -> Result<Vec<StoredFile>, StorageError> {
        if !self.root.is_dir() {
            return Err(StorageError::MissingFolder(self.root.clone()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !entry.file_type().is_file() {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            entries.push((name, entry.into_path(), modified));
        }

        entries
            .into_par_iter()
            .map(|(name, path, modified)| -> Result<StoredFile, StorageError> {
                Ok(StoredFile {
                    id: file_id(&path)?,
                    name,
                    modified,
                })
            })
            .collect()
    }
}

/// Content-derived file id: 16 hex digits of SHA-256.
pub fn file_id(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    let mut hex = format!("{:x}", digest);
    hex.truncate(16);
    Ok(hex)
}

/// Where a catalog entry points for its PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfRef {
    pub id: String,
    /// Shareable view URL.
    pub url: String,
    /// Embeddable preview URL.
    pub embed_url: String,
}

/// Where a catalog entry points for its cover image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: String,
    pub url: String,
}

/// Both stem-keyed lookup tables.
#[derive(Debug, Clone, Default)]
pub struct FileIndexes {
    pub pdfs: HashMap<String, PdfRef>,
    pub images: HashMap<String, ImageRef>,
}

/// Read both collections and build their indexes.
pub fn build_indexes(
    pdfs: &dyn FileCollection,
    images: &dyn FileCollection,
    urls: &UrlsConfig,
    policy: DuplicatePolicy,
) -> Result<FileIndexes, StorageError> {
    Ok(FileIndexes {
        pdfs: pdf_index(pdfs.files()?, urls, policy)?,
        images: image_index(images.files()?, urls, policy)?,
    })
}

/// Index PDFs by [`naming::pdf_stem`].
pub fn pdf_index(
    files: Vec<StoredFile>,
    urls: &UrlsConfig,
    policy: DuplicatePolicy,
) -> Result<HashMap<String, PdfRef>, StorageError> {
    let by_stem = index_by_stem(files, naming::pdf_stem, policy)?;
    Ok(by_stem
        .into_iter()
        .map(|(stem, file)| {
            let pdf = PdfRef {
                url: config::expand_url(&urls.pdf_view, &file.id, &file.name),
                embed_url: pdf_embed_url(&urls.pdf_embed, &file.id, &file.name),
                id: file.id,
            };
            (stem, pdf)
        })
        .collect())
}

/// Index cover images by [`naming::image_stem`].
pub fn image_index(
    files: Vec<StoredFile>,
    urls: &UrlsConfig,
    policy: DuplicatePolicy,
) -> Result<HashMap<String, ImageRef>, StorageError> {
    let by_stem = index_by_stem(files, naming::image_stem, policy)?;
    Ok(by_stem
        .into_iter()
        .map(|(stem, file)| {
            let image = ImageRef {
                url: config::expand_url(&urls.image, &file.id, &file.name),
                id: file.id,
            };
            (stem, image)
        })
        .collect())
}

/// Previewable URL for a PDF file id.
pub fn pdf_embed_url(template: &str, id: &str, name: &str) -> String {
    config::expand_url(template, id, name)
}

fn index_by_stem(
    files: Vec<StoredFile>,
    stem_of: fn(&str) -> &str,
    policy: DuplicatePolicy,
) -> Result<HashMap<String, StoredFile>, StorageError> {
    let mut index: HashMap<String, StoredFile> = HashMap::with_capacity(files.len());
    for file in files {
        let stem = stem_of(&file.name).to_string();
        match index.entry(stem) {
            Entry::Vacant(slot) => {
                slot.insert(file);
            }
            Entry::Occupied(mut slot) => match policy {
                DuplicatePolicy::Reject => {
                    let (first, second) = ordered_names(&slot.get().name, &file.name);
                    return Err(StorageError::DuplicateStem {
                        stem: slot.key().clone(),
                        first,
                        second,
                    });
                }
                DuplicatePolicy::Newest => {
                    let current = slot.get();
                    if (file.modified, &file.name) > (current.modified, &current.name) {
                        tracing::debug!(
                            stem = slot.key().as_str(),
                            kept = file.name.as_str(),
                            dropped = current.name.as_str(),
                            "duplicate stem"
                        );
                        slot.insert(file);
                    } else {
                        tracing::debug!(
                            stem = slot.key().as_str(),
                            kept = current.name.as_str(),
                            dropped = file.name.as_str(),
                            "duplicate stem"
                        );
                    }
                }
            },
        }
    }
    Ok(index)
}

/// Sort a collision pair so error messages do not depend on listing order.
fn ordered_names(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
