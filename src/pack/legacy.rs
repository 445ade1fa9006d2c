#![forbid(unsafe_code)]

//! Read-only support for v1 containers, which were a single JSON document:
//! `{ "version": "1.0.0", "timestamp": "...", "files": [{ "path", "content", "isBinary" }] }`.

use serde::Deserialize;

use crate::pack::error::{FormatWarning, PackError, PackResult};
use crate::pack::format::{Container, Entry};
use crate::pack::text::Parsed;

pub const LEGACY_VERSION: &str = "1.0.0";

#[derive(Debug, Deserialize)]
struct LegacyContainer {
    version: String,
    #[serde(default)]
    timestamp: String,
    files: Vec<Entry>,
}

pub fn parse(input: &str) -> PackResult<Parsed> {
    let doc: LegacyContainer = serde_json::from_str(input)
        .map_err(|e| PackError::Malformed(format!("legacy json: {e}")))?;

    let mut warnings = Vec::new();
    if doc.version != LEGACY_VERSION {
        let w = FormatWarning::VersionMismatch {
            found: doc.version.clone(),
        };
        tracing::warn!("{w}");
        warnings.push(w);
    }

    Ok(Parsed {
        container: Container {
            format_version: doc.version,
            generated_at: doc.timestamp,
            entries: doc.files,
        },
        warnings,
    })
}
