// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for txt2tex.
//!
//! This binary provides the `txt2tex` command for converting a Signal text
//! export, plus its directory of exported attachments, into a LaTeX document.

use lexopt::prelude::*;
use snafu::{OptionExt, prelude::*};
use std::io::Write;
use std::path::{Path, PathBuf};
use txt2tex::pool::{CandidatePool, PoolError, ScanOrder};
use txt2tex::renderer::{self, RenderOptions, Rendered};
use txt2tex::report::{Report, ReportError};

/// Where to write the rendered document.
#[derive(Clone)]
enum OutputTarget {
    /// Write to the specified file.
    File(PathBuf),
    /// Write to stdout.
    Stdout,
}

struct Cli {
    input: Option<PathBuf>,
    output: Option<OutputTarget>,
    attachments: PathBuf,
    scan_order: ScanOrder,
    main_font: Option<String>,
    emoji_font: Option<String>,
    report: Option<PathBuf>,
    quiet: bool,
    dry_run: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("an input file is required (see --help)"))]
    NoInputFile,

    #[snafu(display("{source}"))]
    LoadAttachments { source: PoolError },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to write to stdout: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("{source}"))]
    SerializeReport { source: ReportError },

    #[snafu(display("failed to write report {}: {source}", path.display()))]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert Signal plain-text chat exports to LaTeX

Usage: {name} [OPTIONS] <INPUT>

Arguments:
  <INPUT>  Text export of the conversation

Options:
  -o, --output <OUTPUT>      Output file, or - for stdout (default: INPUT with .tex extension)
  -a, --attachments <DIR>    Directory of exported attachments (default: ./attachments)
      --fs-order             Match files in directory order instead of by sorted name
      --main-font <NAME>     Main document font (default: Latin Modern Roman)
      --emoji-font <NAME>    Font for emoji and other non-ASCII text (default: Segoe UI Emoji)
      --report <PATH>        Write a JSON report of attachment resolution

Other options:
  -q, --quiet                Suppress progress messages
  -n, --dry-run              Resolve attachments without writing the document
  -h, --help                 Print help
  -V, --version              Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args<I>(args: I) -> Result<Cli, lexopt::Error>
where
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString>,
{
    let mut cli = Cli {
        input: None,
        output: None,
        attachments: PathBuf::from("./attachments"),
        scan_order: ScanOrder::FileName,
        main_font: None,
        emoji_font: None,
        report: None,
        quiet: false,
        dry_run: false,
    };

    let mut parser = lexopt::Parser::from_args(args);
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => {
                let val: PathBuf = parser.value()?.parse()?;
                cli.output = Some(if val == Path::new("-") {
                    OutputTarget::Stdout
                } else {
                    OutputTarget::File(val)
                });
            }
            Short('a') | Long("attachments") => cli.attachments = parser.value()?.parse()?,
            Long("fs-order") => cli.scan_order = ScanOrder::Filesystem,
            Long("main-font") => cli.main_font = Some(parser.value()?.string()?),
            Long("emoji-font") => cli.emoji_font = Some(parser.value()?.string()?),
            Long("report") => cli.report = Some(parser.value()?.parse()?),
            Short('q') | Long("quiet") => cli.quiet = true,
            Short('n') | Long("dry-run") => cli.dry_run = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if cli.input.is_none() => cli.input = Some(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(cli)
}

fn main() -> Result<(), Error> {
    let cli = parse_args(std::env::args_os().skip(1)).context(ParseArgsSnafu)?;
    let input = require_input(&cli)?;

    // The attachment directory is loaded before the input is opened.
    let mut pool =
        CandidatePool::from_dir(&cli.attachments, cli.scan_order).context(LoadAttachmentsSnafu)?;
    let text = std::fs::read(&input).context(ReadFileSnafu { path: &input })?;

    let opts = make_render_options(&cli);
    let rendered = renderer::render_document(&text, &mut pool, &opts);

    if !cli.quiet {
        for outcome in rendered.attachments.iter().filter(|a| !a.is_matched()) {
            eprintln!(
                "Unmatched attachment on line {}: {}",
                outcome.line_number, outcome.line
            );
        }
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| OutputTarget::File(output_path(&input)));
    write_document(&output, &rendered, &cli)?;

    if let Some(path) = &cli.report {
        write_report(path, &input, &rendered, &pool, &cli)?;
    }

    Ok(())
}

fn require_input(cli: &Cli) -> Result<PathBuf, Error> {
    cli.input.clone().context(NoInputFileSnafu)
}

/// Default output path: the input with its extension replaced by `.tex`.
///
/// A leading dot does not start an extension, so `.chat` becomes `.chat.tex`.
fn output_path(input: &Path) -> PathBuf {
    input.with_extension("tex")
}

/// Creates render options from CLI arguments.
fn make_render_options(cli: &Cli) -> RenderOptions {
    let defaults = RenderOptions::default();
    RenderOptions {
        main_font: cli.main_font.clone().unwrap_or(defaults.main_font),
        emoji_font: cli.emoji_font.clone().unwrap_or(defaults.emoji_font),
        attachment_prefix: renderer::attachment_prefix(&cli.attachments),
    }
}

/// Writes the rendered document to its target, honoring dry-run mode.
fn write_document(output: &OutputTarget, rendered: &Rendered, cli: &Cli) -> Result<(), Error> {
    let summary = format!(
        "{} attachments matched, {} unmatched",
        rendered.matched_count(),
        rendered.unmatched_count()
    );

    match output {
        OutputTarget::Stdout => {
            if cli.dry_run {
                eprintln!("Would output to stdout ({summary})");
            } else {
                std::io::stdout()
                    .lock()
                    .write_all(&rendered.document)
                    .context(WriteStdoutSnafu)?;
            }
        }
        OutputTarget::File(path) => {
            if cli.dry_run {
                eprintln!("Would write {} ({summary})", path.display());
            } else {
                std::fs::write(path, &rendered.document).context(WriteFileSnafu { path })?;
                if !cli.quiet {
                    eprintln!("Wrote {} ({summary})", path.display());
                }
            }
        }
    }

    Ok(())
}

/// Writes the JSON resolution report.
fn write_report(
    path: &Path,
    input: &Path,
    rendered: &Rendered,
    pool: &CandidatePool,
    cli: &Cli,
) -> Result<(), Error> {
    let report = Report::new(
        &input.display().to_string(),
        &cli.attachments.display().to_string(),
        &rendered.attachments,
        pool,
    );
    let mut json = report.to_json().context(SerializeReportSnafu)?;
    json.push('\n');

    if cli.dry_run {
        eprintln!("Would write report {}", path.display());
        return Ok(());
    }

    std::fs::write(path, json).context(WriteReportSnafu { path })?;
    if !cli.quiet {
        eprintln!("Wrote report {}", path.display());
    }
    Ok(())
}
