#![forbid(unsafe_code)]

//! Line-oriented marker format (v2).
//!
//! ```text
//! // ===== PACKED FILES v2.0.0 =====
//! // Timestamp: 2024-01-01T00:00:00.000Z
//! // Total files: 2
//!
//! // ===== FILE: a.txt =====
//! hello
//!
//! // ===== END_FILE: a.txt =====
//!
//! // ===== FILE: img.bin =====
//! [BASE64_BINARY]
//! AAEC
//! // ===== END_FILE: img.bin =====
//!
//! ```
//!
//! Text bodies are always followed by one separator newline, so the parser
//! recovers the content by joining the body lines with `\n`.

use std::iter::Enumerate;
use std::str::Split;

use crate::pack::error::{FormatWarning, PackError, PackResult};
use crate::pack::format::{
    end_marker, file_marker, header_line, parse_end_marker, parse_file_marker,
    parse_header_version, Container, Entry, BINARY_MARKER, COUNT_PREFIX, TIMESTAMP_PREFIX,
    VERSION_MARKER,
};
use crate::pack::path::check_text_path;

/// How the parser treats structurally broken input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Truncated or interleaved entries are errors.
    #[default]
    Strict,
    /// Unclosed entries are kept as-is and reported as warnings.
    Lenient,
}

/// Result of parsing a whole container.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub container: Container,
    pub warnings: Vec<FormatWarning>,
}

pub fn render(container: &Container) -> PackResult<String> {
    let mut out = String::new();
    out.push_str(&header_line());
    out.push('\n');
    out.push_str(&format!("{TIMESTAMP_PREFIX}{}\n", container.generated_at));
    out.push_str(&format!("{COUNT_PREFIX}{}\n\n", container.entries.len()));

    for e in &container.entries {
        check_text_path(&e.path)?;
        out.push_str(&file_marker(&e.path));
        out.push('\n');
        if e.is_binary {
            out.push_str(BINARY_MARKER);
            out.push('\n');
        }
        out.push_str(&e.content);
        out.push('\n');
        out.push_str(&end_marker(&e.path));
        out.push_str("\n\n");
    }

    Ok(out)
}

pub fn parse(input: &str, mode: ParseMode) -> PackResult<Parsed> {
    let mut scanner = Scanner::new(input, mode);
    let mut entries = Vec::new();
    for e in scanner.by_ref() {
        entries.push(e?);
    }

    let container = Container {
        format_version: scanner.version.to_string(),
        generated_at: scanner.timestamp.unwrap_or_default().to_string(),
        entries,
    };
    Ok(Parsed {
        container,
        warnings: scanner.warnings,
    })
}

/// Find a single entry, stopping at the first match.
pub fn find_entry(input: &str, path: &str) -> PackResult<Entry> {
    for e in Scanner::new(input, ParseMode::Strict) {
        let e = e?;
        if e.path == path {
            return Ok(e);
        }
    }
    Err(PackError::NotFound(path.to_string()))
}

struct OpenEntry<'a> {
    path: &'a str,
    is_binary: bool,
    body: Vec<&'a str>,
}

impl<'a> OpenEntry<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            is_binary: false,
            body: Vec::new(),
        }
    }

    fn push(&mut self, line: &'a str) {
        if self.body.is_empty() && !self.is_binary && line == BINARY_MARKER {
            self.is_binary = true;
        } else {
            self.body.push(line);
        }
    }

    fn close(self) -> Entry {
        let content = if self.is_binary {
            self.body.iter().map(|l| l.trim()).collect()
        } else {
            self.body.join("\n")
        };
        Entry {
            path: self.path.to_string(),
            content,
            is_binary: self.is_binary,
        }
    }
}

/// Lazy single-pass reader yielding entries as their end markers are seen.
pub struct Scanner<'a> {
    lines: Enumerate<Split<'a, char>>,
    mode: ParseMode,
    version: &'a str,
    timestamp: Option<&'a str>,
    declared: Option<usize>,
    yielded: usize,
    open: Option<OpenEntry<'a>>,
    warnings: Vec<FormatWarning>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str, mode: ParseMode) -> Self {
        let mut scanner = Self {
            lines: input.split('\n').enumerate(),
            mode,
            version: "",
            timestamp: None,
            declared: None,
            yielded: 0,
            open: None,
            warnings: Vec::new(),
            finished: false,
        };

        let first = scanner.lines.next().map(|(_, l)| l).unwrap_or_default();
        if let Some(v) = parse_header_version(first) {
            scanner.version = v;
        }
        if !first.contains(VERSION_MARKER) {
            scanner.warn(FormatWarning::VersionMismatch {
                found: first.to_string(),
            });
        }
        if let Some(path) = parse_file_marker(first) {
            scanner.open = Some(OpenEntry::new(path));
        }
        scanner
    }

    fn warn(&mut self, w: FormatWarning) {
        tracing::warn!("{w}");
        self.warnings.push(w);
    }

    fn emit(&mut self, open: OpenEntry<'a>) -> Option<PackResult<Entry>> {
        self.yielded += 1;
        let e = open.close();
        tracing::debug!(path = %e.path, kind = e.kind(), "parsed entry");
        Some(Ok(e))
    }

    fn fail(&mut self, err: PackError) -> Option<PackResult<Entry>> {
        self.finished = true;
        Some(Err(err))
    }

    fn finish(&mut self) -> Option<PackResult<Entry>> {
        self.finished = true;
        if let Some(open) = self.open.take() {
            return match self.mode {
                ParseMode::Strict => Some(Err(PackError::Truncated(open.path.to_string()))),
                ParseMode::Lenient => {
                    self.warn(FormatWarning::Truncated {
                        path: open.path.to_string(),
                    });
                    self.emit(open)
                }
            };
        }
        if let Some(declared) = self.declared {
            if declared != self.yielded {
                if self.mode == ParseMode::Strict {
                    return Some(Err(PackError::Malformed(format!(
                        "header declares {declared} files but {} were found",
                        self.yielded
                    ))));
                }
                self.warn(FormatWarning::CountMismatch {
                    declared,
                    parsed: self.yielded,
                });
            }
        }
        None
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = PackResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let Some((idx, line)) = self.lines.next() else {
                return self.finish();
            };

            let Some(mut open) = self.open.take() else {
                if let Some(path) = parse_file_marker(line) {
                    self.open = Some(OpenEntry::new(path));
                } else if let Some(ts) = line.strip_prefix(TIMESTAMP_PREFIX) {
                    self.timestamp = Some(ts.trim());
                } else if let Some(n) = line.strip_prefix(COUNT_PREFIX) {
                    self.declared = n.trim().parse().ok();
                } else if !line.trim().is_empty() {
                    self.warn(FormatWarning::StrayLine { line: idx + 1 });
                }
                continue;
            };

            if parse_end_marker(line) == Some(open.path) {
                return self.emit(open);
            }

            if let Some(next) = parse_file_marker(line) {
                match self.mode {
                    ParseMode::Strict => {
                        return self.fail(PackError::Malformed(format!(
                            "entry {next} starts before {} ends (line {})",
                            open.path,
                            idx + 1
                        )));
                    }
                    ParseMode::Lenient => {
                        self.warn(FormatWarning::UnterminatedEntry {
                            path: open.path.to_string(),
                        });
                        self.open = Some(OpenEntry::new(next));
                        return self.emit(open);
                    }
                }
            }

            open.push(line);
            self.open = Some(open);
        }
    }
}
