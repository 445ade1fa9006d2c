#![forbid(unsafe_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::pack::error::{PackError, PackResult};

/// Format version written by this crate.
pub const FORMAT_VERSION: &str = "2.0.0";

/// Substring every v2 text header carries.
pub const VERSION_MARKER: &str = "PACKED FILES v2.0.0";

pub const HEADER_PREFIX: &str = "// ===== PACKED FILES v";
pub const TIMESTAMP_PREFIX: &str = "// Timestamp: ";
pub const COUNT_PREFIX: &str = "// Total files: ";
pub const FILE_PREFIX: &str = "// ===== FILE: ";
pub const END_PREFIX: &str = "// ===== END_FILE: ";
pub const MARKER_SUFFIX: &str = " =====";
pub const BINARY_MARKER: &str = "[BASE64_BINARY]";

/// Framed container header magic.
pub const FRAMED_MAGIC: [u8; 8] = *b"DIRPACK\x02";

/// Framed container index magic.
pub const INDEX_MAGIC: [u8; 8] = *b"DPINDEX\x00";

/// Framed container footer magic.
pub const FOOTER_MAGIC: [u8; 8] = *b"DPAKEND\x00";

/// Layouts the packer can write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// Line-oriented marker format (human readable).
    #[default]
    Text,
    /// Length-prefixed binary framing with an index and blake3 hashes.
    Framed,
}

/// Container encodings recognized on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Text,
    Framed,
    /// v1 JSON document written by the first generation of the tool.
    LegacyJson,
}

/// One file inside a container.
///
/// `content` is the UTF-8 text when `is_binary` is false, otherwise the
/// standard, unwrapped base64 encoding of the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub path: String,
    pub content: String,
    pub is_binary: bool,
}

impl Entry {
    pub fn text(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            is_binary: false,
        }
    }

    pub fn binary(path: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            path: path.into(),
            content: STANDARD.encode(raw),
            is_binary: true,
        }
    }

    /// Choose the encoding for raw file bytes.
    ///
    /// Bytes stay text only if the detector calls them text, they are valid
    /// UTF-8, and no line could be mistaken for container syntax.
    pub fn encode(path: impl Into<String>, raw: Vec<u8>, detected_binary: bool) -> Self {
        let path = path.into();
        if detected_binary {
            return Self::binary(path, &raw);
        }
        match String::from_utf8(raw) {
            Ok(text) if !collides_with_markers(&text) => Self::text(path, text),
            Ok(text) => Self::binary(path, text.as_bytes()),
            Err(e) => Self::binary(path, e.as_bytes()),
        }
    }

    /// Original file bytes.
    pub fn decode(&self) -> PackResult<Vec<u8>> {
        if self.is_binary {
            STANDARD
                .decode(self.content.as_bytes())
                .map_err(|source| PackError::Base64 {
                    path: self.path.clone(),
                    source,
                })
        } else {
            Ok(self.content.as_bytes().to_vec())
        }
    }

    pub fn kind(&self) -> &'static str {
        if self.is_binary {
            "binary"
        } else {
            "text"
        }
    }
}

/// A whole packed directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub format_version: String,
    /// ISO-8601 timestamp of the pack run.
    pub generated_at: String,
    /// Entries in walk order.
    pub entries: Vec<Entry>,
}

impl Container {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            generated_at: timestamp_now(),
            entries,
        }
    }

    pub fn find(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

/// Content of a single extracted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(s) => s.as_bytes(),
            Content::Binary(b) => b,
        }
    }
}

/// Public view of a container entry (for listing and inspection).
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub path: String,
    /// "text" or "binary"
    pub kind: &'static str,
    /// Decoded size in bytes.
    pub size: u64,
    /// Blake3 hash (hex) of the decoded bytes.
    pub hash_hex: String,
}

pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn header_line() -> String {
    format!("{HEADER_PREFIX}{FORMAT_VERSION}{MARKER_SUFFIX}")
}

pub fn file_marker(path: &str) -> String {
    format!("{FILE_PREFIX}{path}{MARKER_SUFFIX}")
}

pub fn end_marker(path: &str) -> String {
    format!("{END_PREFIX}{path}{MARKER_SUFFIX}")
}

pub fn parse_file_marker(line: &str) -> Option<&str> {
    line.strip_prefix(FILE_PREFIX)?.strip_suffix(MARKER_SUFFIX)
}

pub fn parse_end_marker(line: &str) -> Option<&str> {
    line.strip_prefix(END_PREFIX)?.strip_suffix(MARKER_SUFFIX)
}

/// Version named by a header line, if it looks like one.
pub fn parse_header_version(line: &str) -> Option<&str> {
    line.strip_prefix(HEADER_PREFIX)?.strip_suffix(MARKER_SUFFIX)
}

/// True if `text` written verbatim would be misread by the text parser.
pub fn collides_with_markers(text: &str) -> bool {
    let mut lines = text.split('\n');
    if lines.next().is_some_and(|first| {
        first == BINARY_MARKER || parse_file_marker(first).is_some() || parse_end_marker(first).is_some()
    }) {
        return true;
    }
    lines.any(|l| parse_file_marker(l).is_some() || parse_end_marker(l).is_some())
}
