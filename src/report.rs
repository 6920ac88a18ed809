// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON report of how every attachment line was resolved.
//!
//! The document already carries a placeholder for each unmatched attachment.
//! The report adds the other direction: which files in the attachment
//! directory were never referenced, and which signal paired each reference
//! with its file.

use crate::pool::CandidatePool;
use crate::renderer::AttachmentOutcome;
use crate::resolver::Resolution;
use chrono::{DateTime, Utc};
use serde::Serialize;
use snafu::prelude::*;

/// Error type for report serialization.
#[derive(Debug, Snafu)]
pub enum ReportError {
    /// Failed to serialize the report.
    #[snafu(display("failed to serialize report: {source}"))]
    Json {
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Summary of one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// The input export, as given on the command line.
    pub input: String,
    /// The attachment directory that was scanned.
    pub attachments_dir: String,
    /// Number of attachment lines matched to a file.
    pub matched: usize,
    /// Number of attachment lines left unmatched.
    pub unmatched: usize,
    /// One entry per attachment line, in input order.
    pub attachments: Vec<ReportEntry>,
    /// Files in the attachment directory that no line referenced.
    pub unused_candidates: Vec<String>,
}

/// The resolution of a single attachment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// 1-based line number in the input.
    pub line: usize,
    /// The declared file name, if any.
    pub declared_name: Option<String>,
    /// The declared MIME type, if any.
    pub mime_type: Option<String>,
    /// The declared size in bytes, if any.
    pub declared_size: Option<u64>,
    /// Name of the file the line was matched to.
    pub matched_file: Option<String>,
    /// `"name"` or `"size"`, for matched lines.
    pub matched_by: Option<&'static str>,
}

impl Report {
    /// Builds a report from the outcomes of a run and the final pool state.
    #[must_use]
    pub fn new(
        input: &str,
        attachments_dir: &str,
        outcomes: &[AttachmentOutcome],
        pool: &CandidatePool,
    ) -> Self {
        let attachments: Vec<_> = outcomes
            .iter()
            .map(|outcome| {
                let matched = outcome
                    .resolution
                    .candidate()
                    .and_then(|id| pool.get(id))
                    .map(|c| c.name().to_owned());
                let matched_by = match outcome.resolution {
                    Resolution::Matched { by, .. } => Some(by.as_str()),
                    Resolution::Unmatched => None,
                };
                ReportEntry {
                    line: outcome.line_number,
                    declared_name: outcome.reference.declared_name.clone(),
                    mime_type: outcome.reference.mime_type.clone(),
                    declared_size: outcome.reference.declared_size,
                    matched_file: matched,
                    matched_by,
                }
            })
            .collect();

        let matched = attachments.iter().filter(|a| a.matched_file.is_some()).count();

        Self {
            generated_at: Utc::now(),
            input: input.to_owned(),
            attachments_dir: attachments_dir.to_owned(),
            matched,
            unmatched: attachments.len() - matched,
            attachments,
            unused_candidates: pool.unconsumed().map(|c| c.name().to_owned()).collect(),
        }
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ReportError> {
        serde_json::to_string_pretty(self).context(JsonSnafu)
    }
}
