// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! The pool of on-disk files that attachment references are matched against.
//!
//! Candidates are stored in an indexed arena in insertion order. Every lookup
//! is a linear scan in that order, so results are reproducible for the same
//! directory contents. A candidate that has been consumed is never returned
//! again by any lookup.
//!
//! # Example
//!
//! ```
//! use txt2tex::pool::{CandidatePool, ListingEntry};
//!
//! let mut pool = CandidatePool::new();
//! pool.populate([
//!     ListingEntry::file("scan.pdf", 1024),
//!     ListingEntry::file("photo.jpg", 1024),
//! ]);
//!
//! let id = pool.find_unconsumed_by_size(1024, true).unwrap();
//! assert_eq!(pool[id].name(), "photo.jpg");
//! ```

use crate::parser::{MAX_NAME_LEN, truncate_field};
use snafu::prelude::*;
use std::ops::Index;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions recognized as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

/// Error type for building a pool from the filesystem.
#[derive(Debug, Snafu)]
pub enum PoolError {
    /// The attachment directory could not be read at all.
    #[snafu(display("could not open attachments directory {}: {source}", path.display()))]
    DirectoryUnavailable {
        /// The directory that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The attachment path exists but is not a directory.
    #[snafu(display("attachments path {} is not a directory", path.display()))]
    NotADirectory {
        /// The path that was requested.
        path: PathBuf,
    },
}

/// Order in which directory entries are added to the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanOrder {
    /// Sorted by file name, identical on every platform.
    #[default]
    FileName,
    /// Whatever order the operating system enumerates the directory in.
    Filesystem,
}

/// One entry of a directory listing, as reported by the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Base name of the entry, lossily decoded for matching.
    pub name: String,
    /// Base name exactly as the filesystem reports it.
    pub raw_name: Vec<u8>,
    /// Size in bytes.
    pub size: u64,
    /// Whether the entry is a regular file. Everything else is skipped.
    pub is_file: bool,
}

impl ListingEntry {
    /// Shorthand for a regular file entry.
    #[must_use]
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            raw_name: name.clone().into_bytes(),
            name,
            size,
            is_file: true,
        }
    }
}

/// Stable handle to a candidate within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateId(usize);

/// A real file available for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    name: String,
    raw_name: Vec<u8>,
    size: u64,
    consumed: bool,
}

impl Candidate {
    /// The file's base name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file's base name as raw bytes, for writing paths that must
    /// point at the real file even when the name is not valid UTF-8.
    #[must_use]
    pub fn raw_name(&self) -> &[u8] {
        &self.raw_name
    }

    /// The file's exact length in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Whether a previous reference already matched this file.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Whether the file name carries one of [`IMAGE_EXTENSIONS`].
    #[must_use]
    pub fn has_image_extension(&self) -> bool {
        has_image_extension(&self.name)
    }
}

/// An in-memory collection of attachment candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Builds a pool from the regular files directly inside `dir`.
    ///
    /// Subdirectories are not descended into. Symbolic links are followed, so a
    /// link to a regular file is a candidate. Entries whose metadata cannot be
    /// read are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::DirectoryUnavailable`] if `dir` cannot be accessed
    /// and [`PoolError::NotADirectory`] if it is not a directory.
    pub fn from_dir(dir: &Path, order: ScanOrder) -> Result<Self, PoolError> {
        let meta = std::fs::metadata(dir).context(DirectoryUnavailableSnafu { path: dir })?;
        ensure!(meta.is_dir(), NotADirectorySnafu { path: dir });
        // walkdir would silently skip an unreadable root.
        std::fs::read_dir(dir).context(DirectoryUnavailableSnafu { path: dir })?;

        let mut walker = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true);
        if order == ScanOrder::FileName {
            walker = walker.sort_by_file_name();
        }

        let listing = walker.into_iter().filter_map(Result::ok).filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            Some(ListingEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                raw_name: entry.file_name().as_encoded_bytes().to_vec(),
                size: meta.len(),
                is_file: meta.is_file(),
            })
        });

        let mut pool = Self::new();
        pool.populate(listing);
        Ok(pool)
    }

    /// Appends one candidate per regular file in `listing`, in order.
    pub fn populate<I>(&mut self, listing: I)
    where
        I: IntoIterator<Item = ListingEntry>,
    {
        self.candidates.extend(
            listing
                .into_iter()
                .filter(|entry| entry.is_file)
                .map(|mut entry| {
                    entry.raw_name.truncate(MAX_NAME_LEN);
                    Candidate {
                        name: truncate_field(&entry.name, MAX_NAME_LEN).to_owned(),
                        raw_name: entry.raw_name,
                        size: entry.size,
                        consumed: false,
                    }
                }),
        );
    }

    /// Returns the first unconsumed candidate whose name equals `name` byte for byte.
    #[must_use]
    pub fn find_unconsumed_by_name(&self, name: &str) -> Option<CandidateId> {
        self.position(|c| c.name == name)
    }

    /// Returns the first unconsumed candidate of exactly `size` bytes.
    ///
    /// With `prefer_image`, a candidate carrying an image extension wins over an
    /// earlier one without; otherwise the first size match is returned.
    #[must_use]
    pub fn find_unconsumed_by_size(&self, size: u64, prefer_image: bool) -> Option<CandidateId> {
        if prefer_image
            && let Some(id) = self.position(|c| c.size == size && c.has_image_extension())
        {
            return Some(id);
        }
        self.position(|c| c.size == size)
    }

    /// Marks a candidate as consumed so no later lookup returns it.
    ///
    /// Callers must only pass ids returned by a lookup on this pool, and must
    /// not consume the same candidate twice.
    pub fn mark_consumed(&mut self, id: CandidateId) {
        debug_assert!(!self.candidates[id.0].consumed, "candidate consumed twice");
        self.candidates[id.0].consumed = true;
    }

    /// Returns the candidate for `id`, if it belongs to this pool.
    #[must_use]
    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(id.0)
    }

    /// Iterates over all candidates in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Iterates over the candidates no reference has matched yet.
    pub fn unconsumed(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| !c.consumed)
    }

    /// Number of candidates already consumed.
    #[must_use]
    pub fn consumed_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.consumed).count()
    }

    /// Total number of candidates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` if the pool holds no candidates.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn position(&self, pred: impl Fn(&Candidate) -> bool) -> Option<CandidateId> {
        self.candidates
            .iter()
            .position(|c| !c.consumed && pred(c))
            .map(CandidateId)
    }
}

impl Index<CandidateId> for CandidatePool {
    type Output = Candidate;

    fn index(&self, id: CandidateId) -> &Candidate {
        &self.candidates[id.0]
    }
}

/// Returns `true` if `name` ends in one of [`IMAGE_EXTENSIONS`].
///
/// A leading dot alone does not start an extension, so `.png` is not an image.
#[must_use]
pub fn has_image_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        _ => false,
    }
}
