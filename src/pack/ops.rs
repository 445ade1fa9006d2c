#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::pack::detect::is_binary_file;
use crate::pack::error::{FormatWarning, PackError, PackResult};
use crate::pack::format::{Container, ContainerKind, Content, Entry, EntryInfo, Layout, FRAMED_MAGIC};
use crate::pack::io::{hex32, write_atomic};
use crate::pack::path::{confined_join, reject_symlinks_below};
use crate::pack::text::{ParseMode, Parsed};
use crate::pack::walk::walk;
use crate::pack::{framed, legacy, text};

#[derive(Debug, Clone, Copy, Default)]
pub struct PackOptions {
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnpackOptions {
    pub mode: ParseMode,
}

#[derive(Debug, Clone)]
pub struct UnpackReport {
    pub files: usize,
    pub warnings: Vec<FormatWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub path: String,
    pub content: Content,
}

/// Pack every regular file under `source` into one container at `output`.
/// Returns the number of files packed.
pub fn pack(source: &Path, output: &Path, opts: &PackOptions) -> PackResult<usize> {
    let not_a_dir = || PackError::NotADirectory(source.display().to_string());
    match fs::symlink_metadata(source) {
        Ok(m) if m.file_type().is_symlink() => {
            return Err(PackError::Symlink(source.display().to_string()));
        }
        Ok(m) if m.is_dir() => {}
        Ok(_) => return Err(not_a_dir()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_a_dir()),
        Err(e) => return Err(e.into()),
    }

    info!(source = %source.display(), layout = ?opts.layout, "packing directory");

    let files = walk(source)?;
    let mut entries: Vec<Entry> = Vec::with_capacity(files.len());
    for f in files {
        let detected = is_binary_file(&f.abs);
        let raw = fs::read(&f.abs)?;
        let e = Entry::encode(f.rel, raw, detected);
        debug!(path = %e.path, kind = e.kind(), "packed entry");
        entries.push(e);
    }

    let container = Container::new(entries);
    let count = container.entries.len();

    match opts.layout {
        Layout::Text => {
            let body = text::render(&container)?;
            write_atomic(output, |f| {
                f.write_all(body.as_bytes())?;
                Ok(())
            })?;
        }
        Layout::Framed => write_atomic(output, |f| framed::write(&container, f))?,
    }

    info!(files = count, output = %output.display(), "packed");
    Ok(count)
}

/// Recreate the directory tree stored in `input` under `output_dir`.
pub fn unpack(input: &Path, output_dir: &Path, opts: &UnpackOptions) -> PackResult<UnpackReport> {
    info!(input = %input.display(), "unpacking container");

    let Parsed { container, warnings } = read_container(input, opts.mode)?;

    let mut seen: HashSet<&str> = HashSet::with_capacity(container.entries.len());
    let mut targets: Vec<PathBuf> = Vec::with_capacity(container.entries.len());
    for e in &container.entries {
        if !seen.insert(e.path.as_str()) {
            return Err(PackError::DuplicatePath(e.path.clone()));
        }
        let target = confined_join(output_dir, &e.path)?;
        reject_symlinks_below(output_dir, &target)?;
        targets.push(target);
    }

    fs::create_dir_all(output_dir)?;
    for (e, target) in container.entries.iter().zip(&targets) {
        let raw = e.decode()?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, &raw)?;
        debug!(path = %e.path, bytes = raw.len(), "wrote entry");
    }

    info!(
        files = container.entries.len(),
        output = %output_dir.display(),
        "unpacked"
    );
    Ok(UnpackReport {
        files: container.entries.len(),
        warnings,
    })
}

/// Pull a single entry out of `input`. Writes it to `output` when given.
pub fn extract(input: &Path, path: &str, output: Option<&Path>) -> PackResult<Extracted> {
    info!(input = %input.display(), path, "extracting entry");

    let mut f = File::open(input)?;
    let not_found = || PackError::NotFound(path.to_string());

    let entry = match sniff(&mut f)? {
        ContainerKind::Framed => {
            let index = framed::read_index(&mut f)?;
            let ie = index.iter().find(|e| e.path == path).ok_or_else(not_found)?;
            let raw = framed::read_payload(&mut f, ie)?;
            framed::to_entry(ie, raw)?
        }
        ContainerKind::Text => text::find_entry(&read_text(&mut f)?, path)?,
        ContainerKind::LegacyJson => legacy::parse(&read_text(&mut f)?)?
            .container
            .find(path)
            .cloned()
            .ok_or_else(not_found)?,
    };

    let content = if entry.is_binary {
        Content::Binary(entry.decode()?)
    } else {
        Content::Text(entry.content)
    };

    if let Some(out) = output {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(out, content.as_bytes())?;
        info!(output = %out.display(), "extracted");
    }

    Ok(Extracted {
        path: entry.path,
        content,
    })
}

/// Parse any supported container (text, framed, legacy JSON).
pub fn read_container(input: &Path, mode: ParseMode) -> PackResult<Parsed> {
    let mut f = File::open(input)?;
    match sniff(&mut f)? {
        ContainerKind::Framed => framed::read(&mut f),
        ContainerKind::Text => text::parse(&read_text(&mut f)?, mode),
        ContainerKind::LegacyJson => legacy::parse(&read_text(&mut f)?),
    }
}

/// Identify the container encoding from its leading bytes.
pub fn sniff(f: &mut File) -> PackResult<ContainerKind> {
    f.seek(SeekFrom::Start(0))?;
    let mut head = Vec::with_capacity(FRAMED_MAGIC.len());
    Read::by_ref(f)
        .take(FRAMED_MAGIC.len() as u64)
        .read_to_end(&mut head)?;
    f.seek(SeekFrom::Start(0))?;

    if head == FRAMED_MAGIC {
        return Ok(ContainerKind::Framed);
    }
    match head.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(ContainerKind::LegacyJson),
        _ => Ok(ContainerKind::Text),
    }
}

fn read_text(f: &mut File) -> PackResult<String> {
    f.seek(SeekFrom::Start(0))?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    Ok(s)
}

/// Read container entries (path, kind, size, hash).
pub fn entries(input: &Path) -> PackResult<Vec<EntryInfo>> {
    let mut f = File::open(input)?;

    if sniff(&mut f)? == ContainerKind::Framed {
        let index = framed::read_index(&mut f)?;
        return Ok(index
            .into_iter()
            .map(|e| EntryInfo {
                kind: if e.is_binary { "binary" } else { "text" },
                size: e.payload_len,
                hash_hex: hex32(&e.hash),
                path: e.path,
            })
            .collect());
    }

    drop(f);
    let parsed = read_container(input, ParseMode::Lenient)?;
    parsed
        .container
        .entries
        .into_iter()
        .map(|e| -> PackResult<EntryInfo> {
            let raw = e.decode()?;
            Ok(EntryInfo {
                kind: e.kind(),
                size: raw.len() as u64,
                hash_hex: blake3::hash(&raw).to_hex().to_string(),
                path: e.path,
            })
        })
        .collect()
}

pub fn list(input: &Path, verbose: bool) -> PackResult<()> {
    for e in entries(input)? {
        if verbose {
            println!("{}  kind={} size={} hash={}", e.path, e.kind, e.size, e.hash_hex);
        } else {
            println!("{}", e.path);
        }
    }
    Ok(())
}

/// Strictly parse and decode every entry. Any format warning fails.
pub fn verify(input: &Path) -> PackResult<usize> {
    let Parsed { container, warnings } = read_container(input, ParseMode::Strict)?;

    if let Some(w) = warnings.first() {
        return Err(PackError::Malformed(w.to_string()));
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(container.entries.len());
    for e in &container.entries {
        if !seen.insert(e.path.as_str()) {
            return Err(PackError::DuplicatePath(e.path.clone()));
        }
        e.decode()?;
    }

    println!("ok: {} entries", container.entries.len());
    Ok(container.entries.len())
}
