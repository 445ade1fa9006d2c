#![forbid(unsafe_code)]

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::pack::error::{PackError, PackResult};

/// Relative path of `file_path` under `root`, with `/` separators.
pub fn normalize_rel_path(root: &Path, file_path: &Path) -> PackResult<String> {
    let rel = file_path
        .strip_prefix(root)
        .map_err(|_| PackError::Outside(file_path.to_string_lossy().into_owned()))?;

    let mut out = String::new();
    for (i, comp) in rel.components().enumerate() {
        if i != 0 {
            out.push('/');
        }
        let part = comp
            .as_os_str()
            .to_str()
            .ok_or_else(|| PackError::InvalidPath(file_path.to_string_lossy().into_owned()))?;
        out.push_str(part);
    }

    if out.is_empty() {
        return Err(PackError::InvalidPath(file_path.to_string_lossy().into_owned()));
    }

    Ok(out)
}

/// Text containers are line based; a path must fit on its marker line.
pub fn check_text_path(path: &str) -> PackResult<()> {
    if path.contains(['\n', '\r']) {
        return Err(PackError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Join a container path onto `root`, refusing anything that could land
/// outside of it.
pub fn confined_join(root: &Path, entry_path: &str) -> PackResult<PathBuf> {
    let outside = || PackError::Outside(entry_path.to_string());

    if entry_path.is_empty() || entry_path.contains('\\') || entry_path.contains('\0') {
        return Err(outside());
    }

    let mut out = root.to_path_buf();
    for seg in entry_path.split('/') {
        if seg.is_empty() || seg == "." || seg == ".." {
            return Err(outside());
        }
        let mut comps = Path::new(seg).components();
        match (comps.next(), comps.next()) {
            (Some(Component::Normal(_)), None) => out.push(seg),
            _ => return Err(outside()),
        }
    }
    Ok(out)
}

/// Fail if any existing component of `target` below `root` is a symlink.
/// Writing through one could land outside `root`.
pub fn reject_symlinks_below(root: &Path, target: &Path) -> PackResult<()> {
    let rel = target
        .strip_prefix(root)
        .map_err(|_| PackError::Outside(target.display().to_string()))?;

    let mut cur = root.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        match fs::symlink_metadata(&cur) {
            Ok(m) if m.file_type().is_symlink() => {
                return Err(PackError::Symlink(cur.display().to_string()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
