// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Line classification for Signal text exports.
//!
//! Each input line is exactly one of: metadata to drop, a sender line (with
//! its trailing phone number removed), an attachment reference, a blank
//! line, or ordinary text. Lines are handled as bytes because exports are
//! not guaranteed to be valid UTF-8.

use crate::parser::ATTACHMENT_PREFIX;

/// Metadata prefixes whose lines are dropped. Case-insensitive.
pub const SUPPRESSED_PREFIXES: &[&str] = &["Type:", "Received:"];

/// Prefix of the sender line. Case-insensitive.
pub const SENDER_PREFIX: &str = "From:";

/// What a single line of the export represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Metadata that produces no output.
    Suppressed,
    /// A sender line, already redacted.
    Sender(&'a [u8]),
    /// An attachment reference, to be parsed and resolved.
    Attachment(&'a [u8]),
    /// An empty line.
    Blank,
    /// Any other message text.
    Text(&'a [u8]),
}

/// Strips trailing whitespace, including the line terminator.
///
/// Whitespace is the C locale set: ASCII whitespace plus vertical tab.
#[must_use]
pub fn trim_line(raw: &[u8]) -> &[u8] {
    let end = raw
        .iter()
        .rposition(|&b| !is_space(b))
        .map_or(0, |last| last + 1);
    &raw[..end]
}

const fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0B
}

/// Classifies a line that has already been passed through [`trim_line`].
///
/// # Example
///
/// ```
/// use txt2tex::classifier::{classify, LineKind};
///
/// assert_eq!(classify(b"type: outgoing"), LineKind::Suppressed);
/// assert_eq!(classify(b"From: Bob (555-0100)"), LineKind::Sender(b"From: Bob"));
/// assert_eq!(classify(b""), LineKind::Blank);
/// ```
#[must_use]
pub fn classify(line: &[u8]) -> LineKind<'_> {
    if SUPPRESSED_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_case(line, prefix))
    {
        return LineKind::Suppressed;
    }
    if starts_with_ignore_case(line, SENDER_PREFIX) {
        return LineKind::Sender(redact_sender(line));
    }
    if line.starts_with(ATTACHMENT_PREFIX.as_bytes()) {
        return LineKind::Attachment(line);
    }
    if line.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Text(line)
    }
}

/// Removes the parenthetical after the sender's name.
///
/// Everything from the first `(` after the first `:` is dropped and trailing
/// whitespace trimmed, so `From: Jane Doe (+15551234567)` becomes
/// `From: Jane Doe`.
#[must_use]
pub fn redact_sender(line: &[u8]) -> &[u8] {
    let Some(colon) = line.iter().position(|&b| b == b':') else {
        return line;
    };
    match line[colon..].iter().position(|&b| b == b'(') {
        Some(paren) => trim_line(&line[..colon + paren]),
        None => line,
    }
}

fn starts_with_ignore_case(line: &[u8], prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}
