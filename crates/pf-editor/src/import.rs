//! Image import contract.
//!
//! The host's file picker and decoder live outside the editor. They hand
//! over decoded bitmaps through [`ImageSource`]; per-file failures travel
//! alongside successes and are skipped by the editor.

use pf_core::{Bitmap, BitmapError};
use std::collections::VecDeque;

/// One decoded image, named after its file.
#[derive(Debug, Clone)]
pub struct ImportedImage {
    pub name: String,
    pub bitmap: Bitmap,
}

impl ImportedImage {
    pub fn new(name: impl Into<String>, bitmap: Bitmap) -> Self {
        Self {
            name: name.into(),
            bitmap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("{name}: unsupported image format")]
    Unsupported { name: String },
    #[error("{name}: could not be read: {reason}")]
    Unreadable { name: String, reason: String },
    #[error("{name}: {source}")]
    Bitmap {
        name: String,
        #[source]
        source: BitmapError,
    },
}

/// Produces images in response to a user file-selection action.
pub trait ImageSource {
    /// Zero or more results, one per selected file.
    fn pick(&mut self) -> Vec<Result<ImportedImage, ImportError>>;
}

/// An in-memory source: each `pick` hands over one queued batch.
#[derive(Debug, Default)]
pub struct MemorySource {
    batches: VecDeque<Vec<Result<ImportedImage, ImportError>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch of already-decoded RGBA8 buffers. Buffers that do not
    /// match their dimensions become `ImportError::Bitmap` entries.
    pub fn push_rgba8(&mut self, files: Vec<(String, u32, u32, Vec<u8>)>) {
        let batch = files
            .into_iter()
            .map(|(name, width, height, pixels)| match Bitmap::from_rgba8(width, height, pixels) {
                Ok(bitmap) => Ok(ImportedImage::new(name, bitmap)),
                Err(source) => Err(ImportError::Bitmap { name, source }),
            })
            .collect();
        self.batches.push_back(batch);
    }

    pub fn push(&mut self, batch: Vec<Result<ImportedImage, ImportError>>) {
        self.batches.push_back(batch);
    }
}

impl ImageSource for MemorySource {
    fn pick(&mut self) -> Vec<Result<ImportedImage, ImportError>> {
        self.batches.pop_front().unwrap_or_default()
    }
}
