// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Parsing of attachment reference lines from Signal text exports.
//!
//! An attachment line declares what the exported message carried:
//!
//! ```text
//! Attachment: myImage.png (image/png, 311164 bytes)
//! Attachment: no filename (image/jpeg, 439593 bytes)
//! ```
//!
//! Export text is untrusted, so parsing never fails once the prefix matches.
//! Anything that cannot be recognized is left as an absent field and the
//! resolver decides what it can do with the rest.
//!
//! # Example
//!
//! ```
//! use txt2tex::parser::parse_attachment;
//!
//! let reference = parse_attachment("Attachment: no filename (image/jpeg, 439593 bytes)").unwrap();
//! assert_eq!(reference.declared_name, None);
//! assert_eq!(reference.mime_type.as_deref(), Some("image/jpeg"));
//! assert_eq!(reference.declared_size, Some(439_593));
//! ```

/// Prefix that marks an attachment reference line. Case-sensitive.
pub const ATTACHMENT_PREFIX: &str = "Attachment:";

/// Name parts the exporter writes when it recorded no filename.
///
/// Compared case-sensitively against the trimmed name part.
pub const NAMELESS_SENTINELS: &[&str] = &["no filename"];

/// Longest file name kept, in bytes. Longer names are truncated.
pub const MAX_NAME_LEN: usize = 4095;

/// Longest MIME type kept, in bytes. Longer values are truncated.
pub const MAX_MIME_LEN: usize = 127;

/// The parsed intent of one attachment line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentReference {
    /// The file name recorded at export time, if there was one.
    pub declared_name: Option<String>,

    /// The declared MIME type (e.g. `image/png`).
    pub mime_type: Option<String>,

    /// The declared size in bytes.
    pub declared_size: Option<u64>,
}

impl AttachmentReference {
    /// Returns `true` if the declared MIME type is an image type.
    #[must_use]
    pub fn is_image_mime(&self) -> bool {
        is_image_mime(self.mime_type.as_deref())
    }

    /// Returns `true` if there is anything to match on at all.
    #[must_use]
    pub const fn is_resolvable(&self) -> bool {
        self.declared_name.is_some() || self.declared_size.is_some()
    }
}

/// Returns `true` if `mime` starts with `image/`. Case-sensitive.
#[must_use]
pub fn is_image_mime(mime: Option<&str>) -> bool {
    mime.is_some_and(|m| m.starts_with("image/"))
}

/// Parses one line into an [`AttachmentReference`].
///
/// Returns `None` if the line does not start with [`ATTACHMENT_PREFIX`].
/// Otherwise a reference is always returned, with fields left as `None`
/// where the line is truncated or malformed:
///
/// - no `(`: every field is absent
/// - no `)` after it, or no `,` between the parentheses: only the name is kept
///
/// # Example
///
/// ```
/// use txt2tex::parser::parse_attachment;
///
/// let reference = parse_attachment("Attachment: report.pdf (application/pdf").unwrap();
/// assert_eq!(reference.declared_name.as_deref(), Some("report.pdf"));
/// assert_eq!(reference.declared_size, None);
///
/// assert!(parse_attachment("attachment: lowercase (image/png, 1 bytes)").is_none());
/// ```
#[must_use]
pub fn parse_attachment(line: &str) -> Option<AttachmentReference> {
    let rest = line.strip_prefix(ATTACHMENT_PREFIX)?.trim_start();
    let mut reference = AttachmentReference::default();

    let Some((name_part, after_paren)) = rest.split_once('(') else {
        return Some(reference);
    };

    let name_part = name_part.trim_end();
    if !name_part.is_empty() && !NAMELESS_SENTINELS.contains(&name_part) {
        reference.declared_name = Some(truncate_field(name_part, MAX_NAME_LEN).to_owned());
    }

    let Some((inner, _)) = after_paren.split_once(')') else {
        return Some(reference);
    };
    let Some((mime, size)) = inner.split_once(',') else {
        return Some(reference);
    };

    let mime = mime.trim();
    if !mime.is_empty() {
        reference.mime_type = Some(truncate_field(mime, MAX_MIME_LEN).to_owned());
    }
    reference.declared_size = leading_integer(size.trim());

    Some(reference)
}

/// Parses the unsigned integer at the start of `s`, ignoring what follows.
///
/// Accepts an optional `+`. Negative, missing, or overflowing values yield `None`.
fn leading_integer(s: &str) -> Option<u64> {
    let digits = s.strip_prefix('+').unwrap_or(s);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Truncates `s` to at most `max` bytes without splitting a character.
///
/// This is a best-effort bound on pathological input, not a correctness
/// guarantee: a truncated name will usually no longer match any file.
#[must_use]
pub fn truncate_field(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let end = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    &s[..end]
}
