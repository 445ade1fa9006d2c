#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::pack::error::{PackError, PackResult};
use crate::pack::path::normalize_rel_path;

/// A regular file found under the walk root.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    /// `/`-separated path relative to the root.
    pub rel: String,
    pub abs: PathBuf,
}

/// Depth-first listing of every regular file under `root`.
///
/// Order is the file system's listing order, not sorted. Symlinks are an
/// error rather than followed or skipped, so cycles cannot occur.
pub fn walk(root: &Path) -> PackResult<Vec<WalkedFile>> {
    let mut files = Vec::new();

    for ent in WalkDir::new(root).follow_links(false) {
        let ent = ent.map_err(|e| {
            let msg = e.to_string();
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other(msg));
            PackError::Io(io)
        })?;

        let ft = ent.file_type();
        if ft.is_symlink() {
            return Err(PackError::Symlink(ent.path().display().to_string()));
        }
        if ft.is_dir() {
            continue;
        }
        if !ft.is_file() {
            tracing::debug!(path = %ent.path().display(), "skipping special file");
            continue;
        }

        let rel = normalize_rel_path(root, ent.path())?;
        files.push(WalkedFile {
            rel,
            abs: ent.path().to_path_buf(),
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_nested_files_and_skips_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("top.txt"), "t").unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), "d").unwrap();

        let mut rels: Vec<String> = walk(dir.path()).unwrap().into_iter().map(|f| f.rel).collect();
        rels.sort();
        assert_eq!(rels, vec!["a/b/deep.txt".to_string(), "top.txt".to_string()]);
    }

    #[test]
    fn directory_contents_follow_their_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("d")).unwrap();
        fs::write(dir.path().join("d/one"), "1").unwrap();
        fs::write(dir.path().join("d/two"), "2").unwrap();
        fs::write(dir.path().join("z"), "z").unwrap();

        let rels: Vec<String> = walk(dir.path()).unwrap().into_iter().map(|f| f.rel).collect();
        let first = rels.iter().position(|r| r.starts_with("d/")).unwrap();
        assert!(rels[first + 1].starts_with("d/"));
    }

    #[test]
    fn walk_order_is_stable() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["c", "a", "b"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let once: Vec<String> = walk(dir.path()).unwrap().into_iter().map(|f| f.rel).collect();
        let twice: Vec<String> = walk(dir.path()).unwrap().into_iter().map(|f| f.rel).collect();
        assert_eq!(once, twice);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_fails_closed() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("real"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();
        assert!(matches!(walk(dir.path()), Err(PackError::Symlink(_))));
    }
}
