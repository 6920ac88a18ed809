// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert Signal plain-text chat exports to LaTeX.
//!
//! This crate turns the text export of a Signal conversation into a LaTeX
//! document for `lualatex`, pulling in the attachment files that were
//! exported alongside it.
//!
//! # Overview
//!
//! The export only describes attachments (`Attachment: name (mime, N bytes)`),
//! and often records no file name at all. This crate:
//!
//! 1. Loads the files of an attachment directory into a [`pool::CandidatePool`]
//! 2. Classifies each export line and escapes message text for LaTeX
//! 3. Resolves every attachment line to one unused file, by name or by size
//! 4. Emits images inline and other files as labelled references
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use txt2tex::pool::{CandidatePool, ScanOrder};
//! use txt2tex::renderer::{self, RenderOptions};
//!
//! let mut pool = CandidatePool::from_dir(Path::new("attachments"), ScanOrder::FileName).unwrap();
//! let input = std::fs::read("messages.txt").unwrap();
//!
//! let rendered = renderer::render_document(&input, &mut pool, &RenderOptions::default());
//! std::fs::write("messages.tex", &rendered.document).unwrap();
//! eprintln!("{} unmatched attachments", rendered.unmatched_count());
//! ```
//!
//! # Modules
//!
//! - [`pool`]: The on-disk attachment candidates and their consumed state
//! - [`parser`]: Parsing of `Attachment:` reference lines
//! - [`resolver`]: Name-then-size matching of references to candidates
//! - [`classifier`]: Line classification and sender redaction
//! - [`renderer`]: LaTeX escaping and document generation
//! - [`report`]: JSON resolution reports

#![deny(missing_docs)]

pub mod classifier;
pub mod parser;
pub mod pool;
pub mod renderer;
pub mod report;
pub mod resolver;
