#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected for NUL.
pub const SNIFF_LEN: usize = 512;

/// Binary iff the first [`SNIFF_LEN`] bytes contain a zero byte.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(SNIFF_LEN)].contains(&0)
}

/// File variant of [`is_binary`]. Read errors classify as text so the caller
/// hits the real error on its own full read.
pub fn is_binary_file(path: &Path) -> bool {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    match File::open(path).and_then(|f| f.take(SNIFF_LEN as u64).read_to_end(&mut head)) {
        Ok(_) => is_binary(&head),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "binary sniff failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_text() {
        assert!(!is_binary(&[]));
    }

    #[test]
    fn nul_in_prefix_is_binary() {
        assert!(is_binary(&[0x00, 0x01, 0x02]));
        assert!(is_binary(b"abc\0def"));
    }

    #[test]
    fn boundary_at_512() {
        let mut last_in_prefix = vec![b'a'; SNIFF_LEN];
        last_in_prefix[SNIFF_LEN - 1] = 0;
        assert!(is_binary(&last_in_prefix));

        let mut first_past_prefix = vec![b'a'; SNIFF_LEN + 1];
        first_past_prefix[SNIFF_LEN] = 0;
        assert!(!is_binary(&first_past_prefix));
    }

    #[test]
    fn file_variant_reads_prefix_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let late = dir.path().join("late.txt");
        let mut data = vec![b'x'; 600];
        data[599] = 0;
        std::fs::write(&late, &data).unwrap();
        assert!(!is_binary_file(&late));

        let early = dir.path().join("early.bin");
        std::fs::write(&early, [0u8, 1, 2]).unwrap();
        assert!(is_binary_file(&early));
    }

    #[test]
    fn unreadable_file_is_text() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(!is_binary_file(&dir.path().join("missing")));
    }
}
