#![forbid(unsafe_code)]

mod detect;
mod error;
mod format;
mod framed;
mod io;
mod legacy;
mod ops;
mod path;
mod text;
mod walk;

pub use detect::{is_binary, is_binary_file, SNIFF_LEN};

pub use error::{FormatWarning, PackError, PackResult};
pub use format::{Container, ContainerKind, Content, Entry, EntryInfo, Layout, FORMAT_VERSION};
pub use text::{ParseMode, Parsed, Scanner};
pub use walk::{walk, WalkedFile};

pub use ops::{
    entries, extract, list, pack, read_container, unpack, verify, Extracted, PackOptions,
    UnpackOptions, UnpackReport,
};

/// Render a container in the v2 text layout.
pub fn render_text(container: &Container) -> PackResult<String> {
    text::render(container)
}

/// Parse a v2 text container held in memory.
pub fn parse_text(input: &str, mode: ParseMode) -> PackResult<Parsed> {
    text::parse(input, mode)
}
