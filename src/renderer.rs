// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! LaTeX rendering for Signal text exports.
//!
//! This module turns the lines of an export into a complete LaTeX document
//! meant for `lualatex`. Attachment lines are resolved against a
//! [`CandidatePool`] as they are encountered, so the order of the input
//! decides which reference gets which file.
//!
//! # Output Format
//!
//! The rendered document includes:
//! - A fixed preamble (A4, `fontspec`, an `\emoji` command backed by an emoji font)
//! - One forced line break per text line, a paragraph break per blank line
//! - `\includegraphics` for image attachments
//! - A quoted `Attachment:` block for other attachments
//! - A quoted placeholder carrying the original line for unmatched attachments
//!
//! # Example
//!
//! ```
//! use txt2tex::pool::{CandidatePool, ListingEntry};
//! use txt2tex::renderer::{render_document, RenderOptions};
//!
//! let mut pool = CandidatePool::new();
//! pool.populate([ListingEntry::file("x.png", 1024)]);
//!
//! let input = b"From: Bob (555-0100)\nAttachment: no filename (image/png, 1024 bytes)\n\nHello\n";
//! let rendered = render_document(input, &mut pool, &RenderOptions::default());
//! let tex = String::from_utf8(rendered.document).unwrap();
//!
//! assert!(tex.starts_with("\\documentclass"));
//! assert!(tex.contains("From: Bob\\\\\n"));
//! assert!(tex.contains("{\\detokenize{attachments/x.png}}"));
//! assert!(tex.ends_with("\\end{document}\n"));
//! ```

use crate::classifier::{LineKind, classify, trim_line};
use crate::parser::{AttachmentReference, parse_attachment};
use crate::pool::CandidatePool;
use crate::resolver::{Resolution, resolve};
use std::path::Path;

/// Longest relative attachment path written to the document, in bytes.
pub const MAX_PATH_LEN: usize = 4095;

const PARAGRAPH_BREAK: &[u8] = b"\n\n";
const LINE_BREAK: &[u8] = b"\\\\\n";
const DOCUMENT_END: &[u8] = b"\n\\end{document}\n";

/// Configuration options for LaTeX rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Main text font passed to `\setmainfont`.
    pub main_font: String,

    /// Font family used by the `\emoji` command for non-ASCII text.
    ///
    /// `Segoe UI Emoji` is available on Windows; on Linux `Noto Color Emoji`
    /// is the usual choice.
    pub emoji_font: String,

    /// Directory prefix for attachment paths in the document, relative to
    /// where the document is compiled. Empty means no prefix.
    pub attachment_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            main_font: "Latin Modern Roman".into(),
            emoji_font: "Segoe UI Emoji".into(),
            attachment_prefix: "attachments".into(),
        }
    }
}

impl RenderOptions {
    /// Returns the path the document uses to refer to an attachment file.
    ///
    /// `name` is the file's raw base name and is copied byte for byte, so the
    /// path names the real file even when it is not valid UTF-8. Paths are
    /// written inside `\detokenize{...}` without escaping: a `%`, `#`, or an
    /// unbalanced brace in a file name still breaks compilation of the document.
    #[must_use]
    pub fn relative_path(&self, name: &[u8]) -> Vec<u8> {
        let mut path = Vec::with_capacity(self.attachment_prefix.len() + 1 + name.len());
        if !self.attachment_prefix.is_empty() {
            path.extend_from_slice(self.attachment_prefix.as_bytes());
            path.push(b'/');
        }
        path.extend_from_slice(name);
        path.truncate(MAX_PATH_LEN);
        path
    }
}

/// Derives [`RenderOptions::attachment_prefix`] from the attachment directory.
///
/// Leading `./` components and trailing slashes are dropped, so
/// `./attachments/` becomes `attachments`.
#[must_use]
pub fn attachment_prefix(dir: &Path) -> String {
    let lossy = dir.to_string_lossy();
    let mut prefix: &str = &lossy;
    while let Some(rest) = prefix.strip_prefix("./") {
        prefix = rest;
    }
    let prefix = prefix.trim_end_matches('/');
    if prefix == "." {
        String::new()
    } else {
        prefix.to_owned()
    }
}

/// What happened to one attachment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentOutcome {
    /// 1-based line number in the input.
    pub line_number: usize,
    /// The trimmed line, lossily decoded.
    pub line: String,
    /// The parsed reference.
    pub reference: AttachmentReference,
    /// The resolver's decision.
    pub resolution: Resolution,
}

impl AttachmentOutcome {
    /// Returns `true` if the attachment was matched to a file.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self.resolution, Resolution::Matched { .. })
    }
}

/// A rendered document together with the attachment outcomes behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The complete LaTeX source.
    pub document: Vec<u8>,
    /// One entry per attachment line, in input order.
    pub attachments: Vec<AttachmentOutcome>,
}

impl Rendered {
    /// Number of attachment lines that were matched to a file.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.attachments.iter().filter(|a| a.is_matched()).count()
    }

    /// Number of attachment lines left unmatched.
    #[must_use]
    pub fn unmatched_count(&self) -> usize {
        self.attachments.len() - self.matched_count()
    }
}

/// Renders a complete export as a LaTeX document.
///
/// Lines are split on `\n`; trailing whitespace including `\r` is ignored.
/// Matched candidates are consumed in `pool`.
#[must_use]
pub fn render_document(input: &[u8], pool: &mut CandidatePool, opts: &RenderOptions) -> Rendered {
    let mut document = preamble(opts).into_bytes();
    let mut attachments = Vec::new();

    for (i, raw) in input.split_inclusive(|&b| b == b'\n').enumerate() {
        if let Some(outcome) = render_line(i + 1, raw, pool, opts, &mut document) {
            attachments.push(outcome);
        }
    }

    document.extend_from_slice(DOCUMENT_END);
    Rendered {
        document,
        attachments,
    }
}

/// Returns the fixed document preamble, up to and including `\begin{document}`.
#[must_use]
pub fn preamble(opts: &RenderOptions) -> String {
    format!(
        "\\documentclass[a4paper,11pt]{{article}}\n\
         \\usepackage[margin=25mm]{{geometry}}\n\
         \\usepackage{{graphicx}}\n\
         \\usepackage{{fontspec}}\n\
         \\setmainfont{{{main}}}\n\
         \\newfontfamily\\emojifont{{{emoji}}}\n\
         \\DeclareTextFontCommand{{\\emoji}}{{\\emojifont}}\n\
         \\setlength{{\\emergencystretch}}{{3em}}\n\
         \\begin{{document}}\n\n",
        main = opts.main_font,
        emoji = opts.emoji_font,
    )
}

fn render_line(
    line_number: usize,
    raw: &[u8],
    pool: &mut CandidatePool,
    opts: &RenderOptions,
    out: &mut Vec<u8>,
) -> Option<AttachmentOutcome> {
    match classify(trim_line(raw)) {
        LineKind::Suppressed => None,
        LineKind::Blank => {
            out.extend_from_slice(PARAGRAPH_BREAK);
            None
        }
        LineKind::Sender(text) | LineKind::Text(text) => {
            escape_latex(text, out);
            out.extend_from_slice(LINE_BREAK);
            None
        }
        LineKind::Attachment(line) => Some(render_attachment(line_number, line, pool, opts, out)),
    }
}

fn render_attachment(
    line_number: usize,
    line: &[u8],
    pool: &mut CandidatePool,
    opts: &RenderOptions,
    out: &mut Vec<u8>,
) -> AttachmentOutcome {
    let text = String::from_utf8_lossy(line);
    let reference = parse_attachment(&text).unwrap_or_default();
    let resolution = resolve(&reference, pool);

    match resolution {
        Resolution::Matched { id, .. } => {
            let candidate = &pool[id];
            let path = opts.relative_path(candidate.raw_name());
            if reference.is_image_mime() || candidate.has_image_extension() {
                write_image(out, &path);
            } else {
                write_file_reference(out, &path);
            }
        }
        Resolution::Unmatched => write_unmatched(out, line),
    }

    AttachmentOutcome {
        line_number,
        line: text.into_owned(),
        reference,
        resolution,
    }
}

fn write_image(out: &mut Vec<u8>, path: &[u8]) {
    out.extend_from_slice(b"\n\\par\\noindent\n");
    out.extend_from_slice(
        b"\\includegraphics[width=\\linewidth,height=0.9\\textheight,keepaspectratio]{\\detokenize{",
    );
    out.extend_from_slice(path);
    out.extend_from_slice(b"}}\n\\par\\medskip\n\n");
}

fn write_file_reference(out: &mut Vec<u8>, path: &[u8]) {
    out.extend_from_slice(b"\n\\begin{quote}\n\\textbf{Attachment:} \\detokenize{");
    out.extend_from_slice(path);
    out.extend_from_slice(b"}\n\\end{quote}\n\n");
}

fn write_unmatched(out: &mut Vec<u8>, line: &[u8]) {
    out.extend_from_slice(b"\n\\begin{quote}\n\\textbf{Unmatched attachment placeholder:} ");
    escape_latex(line, out);
    out.extend_from_slice(b"\\end{quote}\n\n");
}

/// Escapes text for LaTeX, appending the result to `out`.
///
/// The ten LaTeX special characters are replaced by their standard escapes.
/// Every non-ASCII UTF-8 sequence is wrapped whole in `\emoji{...}` so the
/// emoji font can render it. Sequences are delimited by their leading byte
/// only and copied byte for byte; a byte that cannot lead a sequence is
/// wrapped on its own.
///
/// # Example
///
/// ```
/// use txt2tex::renderer::escape_latex;
///
/// let mut out = Vec::new();
/// escape_latex("50% off 🎉".as_bytes(), &mut out);
/// assert_eq!(out, "50\\% off \\emoji{🎉}".as_bytes());
/// ```
pub fn escape_latex(text: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < text.len() {
        let b = text[i];
        if b.is_ascii() {
            match b {
                b'\\' => out.extend_from_slice(b"\\textbackslash{}"),
                b'{' => out.extend_from_slice(b"\\{"),
                b'}' => out.extend_from_slice(b"\\}"),
                b'#' => out.extend_from_slice(b"\\#"),
                b'$' => out.extend_from_slice(b"\\$"),
                b'%' => out.extend_from_slice(b"\\%"),
                b'&' => out.extend_from_slice(b"\\&"),
                b'_' => out.extend_from_slice(b"\\_"),
                b'^' => out.extend_from_slice(b"\\textasciicircum{}"),
                b'~' => out.extend_from_slice(b"\\textasciitilde{}"),
                _ => out.push(b),
            }
            i += 1;
        } else {
            let end = (i + utf8_sequence_len(b)).min(text.len());
            out.extend_from_slice(b"\\emoji{");
            out.extend_from_slice(&text[i..end]);
            out.push(b'}');
            i = end;
        }
    }
}

/// Length of the UTF-8 sequence introduced by `lead`, judged by its high bits.
const fn utf8_sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F | 0x80..=0xBF | 0xF8..=0xFF => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ListingEntry;

    fn pool_of(files: &[(&str, u64)]) -> CandidatePool {
        let mut pool = CandidatePool::new();
        pool.populate(files.iter().map(|(name, size)| ListingEntry::file(*name, *size)));
        pool
    }

    fn escaped(text: &str) -> String {
        let mut out = Vec::new();
        escape_latex(text.as_bytes(), &mut out);
        String::from_utf8(out).unwrap()
    }

    fn body(input: &str, pool: &mut CandidatePool) -> String {
        let opts = RenderOptions::default();
        let rendered = render_document(input.as_bytes(), pool, &opts);
        let doc = String::from_utf8(rendered.document).unwrap();
        let start = preamble(&opts).len();
        let end = doc.len() - DOCUMENT_END.len();
        doc[start..end].to_owned()
    }

    const IMAGE_X_PNG: &str = "\n\\par\\noindent\n\\includegraphics[width=\\linewidth,height=0.9\\textheight,keepaspectratio]{\\detokenize{attachments/x.png}}\n\\par\\medskip\n\n";

    #[test]
    fn escapes_latex_specials() {
        assert_eq!(escaped("\\"), "\\textbackslash{}");
        assert_eq!(escaped("{}"), "\\{\\}");
        assert_eq!(escaped("#$%&_"), "\\#\\$\\%\\&\\_");
        assert_eq!(escaped("^"), "\\textasciicircum{}");
        assert_eq!(escaped("~"), "\\textasciitilde{}");
        assert_eq!(escaped("plain text, 100!"), "plain text, 100!");
    }

    #[test]
    fn wraps_multibyte_sequences_whole() {
        assert_eq!(escaped("é"), "\\emoji{é}");
        assert_eq!(escaped("€"), "\\emoji{€}");
        assert_eq!(escaped("😀"), "\\emoji{😀}");
        assert_eq!(escaped("aé😀b"), "a\\emoji{é}\\emoji{😀}b");
    }

    #[test]
    fn wraps_each_code_point_of_a_cluster_separately() {
        // Thumbs up + skin tone modifier: two 4-byte sequences.
        assert_eq!(escaped("👍🏽"), "\\emoji{👍}\\emoji{🏽}");
    }

    #[test]
    fn wraps_stray_bytes_individually() {
        let mut out = Vec::new();
        escape_latex(b"a\x80b\xffc", &mut out);
        assert_eq!(out, b"a\\emoji{\x80}b\\emoji{\xff}c");
    }

    #[test]
    fn truncated_sequence_at_end_is_not_overrun() {
        let mut out = Vec::new();
        escape_latex(b"ok\xf0\x9f", &mut out);
        assert_eq!(out, b"ok\\emoji{\xf0\x9f}");
    }

    #[test]
    fn renders_conversation_scenario() {
        let mut pool = pool_of(&[("x.png", 1024)]);
        let input = "From: Bob (555-0100)\nAttachment: no filename (image/png, 1024 bytes)\n\nHello\n";

        let output = body(input, &mut pool);

        assert_eq!(
            output,
            format!("From: Bob\\\\\n{IMAGE_X_PNG}\n\nHello\\\\\n")
        );
        assert_eq!(pool.consumed_count(), 1);
    }

    #[test]
    fn suppressed_lines_emit_nothing() {
        let mut pool = CandidatePool::new();

        assert_eq!(body("Type: incoming\nRECEIVED: yesterday\n", &mut pool), "");
    }

    #[test]
    fn renders_non_image_attachment_as_quote() {
        let mut pool = pool_of(&[("doc.pdf", 300)]);

        let output = body("Attachment: doc.pdf (application/pdf, 300 bytes)\n", &mut pool);

        assert_eq!(
            output,
            "\n\\begin{quote}\n\\textbf{Attachment:} \\detokenize{attachments/doc.pdf}\n\\end{quote}\n\n"
        );
    }

    #[test]
    fn image_extension_alone_makes_an_image() {
        let mut pool = pool_of(&[("x.png", 9)]);

        let output = body("Attachment: x.png (application/octet-stream, 9 bytes)", &mut pool);

        assert_eq!(output, IMAGE_X_PNG);
    }

    #[test]
    fn image_mime_alone_makes_an_image() {
        let mut pool = pool_of(&[("blob", 9)]);

        let output = body("Attachment: no filename (image/webp, 9 bytes)", &mut pool);

        assert!(output.contains("\\includegraphics"));
        assert!(output.contains("{\\detokenize{attachments/blob}}"));
    }

    #[test]
    fn unmatched_attachment_keeps_escaped_line() {
        let mut pool = CandidatePool::new();

        let output = body("Attachment: my_file.txt (text/plain, 5 bytes)", &mut pool);

        assert_eq!(
            output,
            "\n\\begin{quote}\n\\textbf{Unmatched attachment placeholder:} Attachment: my\\_file.txt (text/plain, 5 bytes)\\end{quote}\n\n"
        );
    }

    #[test]
    fn degenerate_attachment_line_is_unmatched() {
        let mut pool = pool_of(&[("a.png", 1)]);
        let rendered = render_document(b"Attachment:\n", &mut pool, &RenderOptions::default());

        assert_eq!(rendered.unmatched_count(), 1);
        assert_eq!(pool.consumed_count(), 0);
    }

    #[test]
    fn records_outcomes_in_input_order() {
        let mut pool = pool_of(&[("a.jpg", 10)]);
        let input = b"Hi\nAttachment: a.jpg (image/jpeg, 10 bytes)\nAttachment: a.jpg (image/jpeg, 10 bytes)\n";

        let rendered = render_document(input, &mut pool, &RenderOptions::default());

        assert_eq!(rendered.attachments.len(), 2);
        assert_eq!(rendered.attachments[0].line_number, 2);
        assert!(rendered.attachments[0].is_matched());
        assert_eq!(rendered.attachments[1].line_number, 3);
        assert!(!rendered.attachments[1].is_matched());
        assert_eq!(rendered.matched_count(), 1);
        assert_eq!(rendered.unmatched_count(), 1);
    }

    #[test]
    fn handles_crlf_and_missing_final_newline() {
        let mut pool = CandidatePool::new();

        assert_eq!(body("one\r\n\r\ntwo", &mut pool), "one\\\\\n\n\ntwo\\\\\n");
    }

    #[test]
    fn escapes_sender_line() {
        let mut pool = CandidatePool::new();

        assert_eq!(body("From: A_B (1)", &mut pool), "From: A\\_B\\\\\n");
    }

    #[test]
    fn empty_input_renders_empty_body() {
        let mut pool = CandidatePool::new();
        let opts = RenderOptions::default();

        let rendered = render_document(b"", &mut pool, &opts);

        let expected = format!("{}\n\\end{{document}}\n", preamble(&opts));
        assert_eq!(rendered.document, expected.into_bytes());
    }

    #[test]
    fn preamble_uses_configured_fonts() {
        let opts = RenderOptions {
            emoji_font: "Noto Color Emoji".into(),
            ..Default::default()
        };
        let pre = preamble(&opts);

        assert!(pre.starts_with("\\documentclass[a4paper,11pt]{article}\n"));
        assert!(pre.contains("\\setmainfont{Latin Modern Roman}\n"));
        assert!(pre.contains("\\newfontfamily\\emojifont{Noto Color Emoji}\n"));
        assert!(pre.ends_with("\\begin{document}\n\n"));
    }

    #[test]
    fn derives_prefix_from_directory() {
        assert_eq!(attachment_prefix(Path::new("./attachments")), "attachments");
        assert_eq!(attachment_prefix(Path::new("attachments/")), "attachments");
        assert_eq!(attachment_prefix(Path::new("../shared/files")), "../shared/files");
        assert_eq!(attachment_prefix(Path::new(".")), "");
        assert_eq!(attachment_prefix(Path::new("./")), "");
    }

    #[test]
    fn relative_path_without_prefix_is_bare_name() {
        let opts = RenderOptions {
            attachment_prefix: String::new(),
            ..Default::default()
        };

        assert_eq!(opts.relative_path(b"a.png"), b"a.png");
        assert_eq!(RenderOptions::default().relative_path(b"a.png"), b"attachments/a.png");
    }

    #[test]
    fn non_utf8_file_name_is_written_verbatim() {
        let mut pool = CandidatePool::new();
        pool.populate([ListingEntry {
            name: "caf\u{FFFD}.png".into(),
            raw_name: b"caf\xe9.png".to_vec(),
            size: 3,
            is_file: true,
        }]);

        let rendered = render_document(
            b"Attachment: no filename (image/png, 3 bytes)\n",
            &mut pool,
            &RenderOptions::default(),
        );

        let contains = |needle: &[u8]| rendered.document.windows(needle.len()).any(|w| w == needle);
        assert!(contains(b"{\\detokenize{attachments/caf\xe9.png}}"));
        assert!(!contains("caf\u{FFFD}".as_bytes()));
    }

    #[test]
    fn file_names_are_not_escaped_inside_detokenize() {
        let mut pool = pool_of(&[("50%_off.pdf", 4)]);

        let output = body("Attachment: 50%_off.pdf (application/pdf, 4 bytes)", &mut pool);

        assert!(output.contains("\\detokenize{attachments/50%_off.pdf}"));
    }
}
