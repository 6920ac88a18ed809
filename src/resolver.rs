// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Matching attachment references to files in a [`CandidatePool`].
//!
//! Resolution tries the declared name first, then the declared size. Within a
//! size match, an image MIME type prefers files with an image extension, which
//! keeps same-sized images from being paired with an unrelated document or
//! video. Whatever matches is consumed, so a file is never used twice.

use crate::parser::AttachmentReference;
use crate::pool::{CandidateId, CandidatePool};

/// Which signal produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The declared file name matched exactly.
    Name,
    /// The declared byte size matched.
    Size,
}

impl MatchKind {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Size => "size",
        }
    }
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A candidate was found and is now consumed.
    Matched {
        /// The consumed candidate.
        id: CandidateId,
        /// How it was found.
        by: MatchKind,
    },
    /// No unconsumed candidate fits the reference.
    Unmatched,
}

impl Resolution {
    /// The matched candidate, if any.
    #[must_use]
    pub const fn candidate(self) -> Option<CandidateId> {
        match self {
            Self::Matched { id, .. } => Some(id),
            Self::Unmatched => None,
        }
    }
}

/// Resolves `reference` against `pool`, consuming the matched candidate.
///
/// # Example
///
/// ```
/// use txt2tex::parser::parse_attachment;
/// use txt2tex::pool::{CandidatePool, ListingEntry};
/// use txt2tex::resolver::{resolve, MatchKind, Resolution};
///
/// let mut pool = CandidatePool::new();
/// pool.populate([ListingEntry::file("x.png", 1024)]);
///
/// let reference = parse_attachment("Attachment: no filename (image/png, 1024 bytes)").unwrap();
/// let Resolution::Matched { id, by } = resolve(&reference, &mut pool) else {
///     panic!("expected a match");
/// };
/// assert_eq!(pool[id].name(), "x.png");
/// assert_eq!(by, MatchKind::Size);
///
/// // The same file is never handed out twice.
/// assert_eq!(resolve(&reference, &mut pool), Resolution::Unmatched);
/// ```
pub fn resolve(reference: &AttachmentReference, pool: &mut CandidatePool) -> Resolution {
    if !reference.is_resolvable() {
        return Resolution::Unmatched;
    }

    let by_name = reference
        .declared_name
        .as_deref()
        .and_then(|name| pool.find_unconsumed_by_name(name))
        .map(|id| (id, MatchKind::Name));

    let found = by_name.or_else(|| {
        reference
            .declared_size
            .and_then(|size| pool.find_unconsumed_by_size(size, reference.is_image_mime()))
            .map(|id| (id, MatchKind::Size))
    });

    match found {
        Some((id, by)) => {
            pool.mark_consumed(id);
            Resolution::Matched { id, by }
        }
        None => Resolution::Unmatched,
    }
}
