#![forbid(unsafe_code)]

use blake3::Hasher;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::pack::error::{FormatWarning, PackError, PackResult};
use crate::pack::format::{Container, Entry, FOOTER_MAGIC, FORMAT_VERSION, FRAMED_MAGIC, INDEX_MAGIC};
use crate::pack::io::{
    read_exact, read_str16, read_u16, read_u32, read_u64, read_u8, write_str16, write_u32,
    write_u64,
};
use crate::pack::text::Parsed;

const FOOTER_LEN: u64 = 8 + 8 + 8 + 4 + 4;

/// Framed layout:
/// - [FRAMED_MAGIC 8]
/// - [u16 len][format version] [u16 len][timestamp]
/// - payload blobs (decoded file bytes, back to back)
/// - index:
///   - [INDEX_MAGIC 8]
///   - [u32 entry_count]
///   - entries...
///     - [u16 path_len][path bytes UTF-8]
///     - [u8 kind] 0 = text, 1 = binary
///     - [u64 payload_offset]
///     - [u64 payload_len]
///     - [u8 hash[32]] blake3 of the payload
/// - footer:
///   - [FOOTER_MAGIC 8]
///   - [u64 index_offset]
///   - [u64 index_len]
///   - [u32 index_hash (blake3 truncated to u32)]
///   - [u32 reserved]
///
/// Entries keep walk order. No escaping is needed anywhere.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub path: String,
    pub is_binary: bool,
    pub payload_offset: u64,
    pub payload_len: u64,
    pub hash: [u8; 32],
}

pub fn write<W: Write + Seek>(container: &Container, out: &mut W) -> PackResult<()> {
    out.write_all(&FRAMED_MAGIC)?;
    write_str16(out, &container.format_version)?;
    write_str16(out, &container.generated_at)?;

    let mut index: Vec<IndexEntry> = Vec::with_capacity(container.entries.len());
    for e in &container.entries {
        let raw = e.decode()?;
        let payload_offset = out.stream_position()?;
        out.write_all(&raw)?;
        index.push(IndexEntry {
            path: e.path.clone(),
            is_binary: e.is_binary,
            payload_offset,
            payload_len: raw.len() as u64,
            hash: blake3::hash(&raw).into(),
        });
    }

    let index_offset = out.stream_position()?;

    let mut index_buf: Vec<u8> = Vec::new();
    index_buf.extend_from_slice(&INDEX_MAGIC);
    index_buf.extend_from_slice(&(index.len() as u32).to_le_bytes());
    for e in &index {
        write_str16(&mut index_buf, &e.path)?;
        index_buf.push(u8::from(e.is_binary));
        index_buf.extend_from_slice(&e.payload_offset.to_le_bytes());
        index_buf.extend_from_slice(&e.payload_len.to_le_bytes());
        index_buf.extend_from_slice(&e.hash);
    }

    out.write_all(&index_buf)?;

    out.write_all(&FOOTER_MAGIC)?;
    write_u64(out, index_offset)?;
    write_u64(out, index_buf.len() as u64)?;
    write_u32(out, truncated_hash(&index_buf))?;
    write_u32(out, 0)?;

    out.flush()?;
    Ok(())
}

fn truncated_hash(bytes: &[u8]) -> u32 {
    let full: [u8; 32] = blake3::hash(bytes).into();
    u32::from_le_bytes([full[0], full[1], full[2], full[3]])
}

/// Reads `(format_version, timestamp)` right after the magic.
pub fn read_header<R: Read + Seek>(r: &mut R) -> PackResult<(String, String)> {
    r.seek(SeekFrom::Start(0))?;
    let magic = read_exact::<8>(r)?;
    if magic != FRAMED_MAGIC {
        return Err(PackError::Malformed("bad framed magic".into()));
    }
    let version = read_str16(r)?;
    let timestamp = read_str16(r)?;
    Ok((version, timestamp))
}

fn read_footer<R: Read + Seek>(r: &mut R) -> PackResult<(u64, u64, u32)> {
    let size = r.seek(SeekFrom::End(0))?;
    if size < 8 + FOOTER_LEN {
        return Err(PackError::Malformed("framed container too small".into()));
    }
    r.seek(SeekFrom::End(-(FOOTER_LEN as i64)))?;

    let magic = read_exact::<8>(r)?;
    if magic != FOOTER_MAGIC {
        return Err(PackError::Malformed("bad footer magic".into()));
    }

    let index_offset = read_u64(r)?;
    let index_len = read_u64(r)?;
    let index_hash = read_u32(r)?;
    let _reserved = read_u32(r)?;

    Ok((index_offset, index_len, index_hash))
}

pub fn read_index<R: Read + Seek>(r: &mut R) -> PackResult<Vec<IndexEntry>> {
    let (index_offset, index_len, index_hash) = read_footer(r)?;
    let index_end = r.seek(SeekFrom::End(0))? - FOOTER_LEN;

    if index_offset.checked_add(index_len) != Some(index_end) {
        return Err(PackError::Malformed("index outside file".into()));
    }

    r.seek(SeekFrom::Start(index_offset))?;
    let mut index_buf = vec![0u8; index_len as usize];
    r.read_exact(&mut index_buf)?;

    if truncated_hash(&index_buf) != index_hash {
        return Err(PackError::Malformed("index hash mismatch".into()));
    }

    let mut cur = Cursor::new(index_buf);
    let magic = read_exact::<8>(&mut cur)?;
    if magic != INDEX_MAGIC {
        return Err(PackError::Malformed("bad index magic".into()));
    }

    let count = read_u32(&mut cur)? as usize;
    let mut out: Vec<IndexEntry> = Vec::with_capacity(count.min(index_len as usize));

    for _ in 0..count {
        let path_len = read_u16(&mut cur)? as usize;
        let mut path_bytes = vec![0u8; path_len];
        cur.read_exact(&mut path_bytes)?;
        let path = String::from_utf8(path_bytes)
            .map_err(|_| PackError::Malformed("path is not utf8".into()))?;

        let is_binary = match read_u8(&mut cur)? {
            0 => false,
            1 => true,
            other => return Err(PackError::Malformed(format!("unknown entry kind {other}"))),
        };
        let payload_offset = read_u64(&mut cur)?;
        let payload_len = read_u64(&mut cur)?;
        let hash = read_exact::<32>(&mut cur)?;

        let in_bounds = matches!(payload_offset.checked_add(payload_len), Some(end) if end <= index_offset);
        if !in_bounds {
            return Err(PackError::Malformed(format!("payload outside file: {path}")));
        }

        out.push(IndexEntry {
            path,
            is_binary,
            payload_offset,
            payload_len,
            hash,
        });
    }

    Ok(out)
}

/// Payload bytes of one entry, hash-checked.
pub fn read_payload<R: Read + Seek>(r: &mut R, e: &IndexEntry) -> PackResult<Vec<u8>> {
    r.seek(SeekFrom::Start(e.payload_offset))?;
    let mut raw = vec![0u8; e.payload_len as usize];
    r.read_exact(&mut raw)?;

    let mut hasher = Hasher::new();
    hasher.update(&raw);
    let got: [u8; 32] = hasher.finalize().into();
    if got != e.hash {
        return Err(PackError::Malformed(format!("hash mismatch for {}", e.path)));
    }
    Ok(raw)
}

pub fn to_entry(e: &IndexEntry, raw: Vec<u8>) -> PackResult<Entry> {
    if e.is_binary {
        return Ok(Entry::binary(e.path.clone(), &raw));
    }
    let content = String::from_utf8(raw)
        .map_err(|_| PackError::Malformed(format!("text entry is not utf8: {}", e.path)))?;
    Ok(Entry::text(e.path.clone(), content))
}

pub fn read<R: Read + Seek>(r: &mut R) -> PackResult<Parsed> {
    let (format_version, generated_at) = read_header(r)?;
    let mut warnings = Vec::new();
    if format_version != FORMAT_VERSION {
        let w = FormatWarning::VersionMismatch {
            found: format_version.clone(),
        };
        tracing::warn!("{w}");
        warnings.push(w);
    }

    let index = read_index(r)?;
    let mut entries = Vec::with_capacity(index.len());
    for e in &index {
        let raw = read_payload(r, e)?;
        entries.push(to_entry(e, raw)?);
    }

    Ok(Parsed {
        container: Container {
            format_version,
            generated_at,
            entries,
        },
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Container {
        Container {
            format_version: FORMAT_VERSION.into(),
            generated_at: "2024-01-01T00:00:00.000Z".into(),
            entries: vec![
                Entry::text("a.txt", "hello\n"),
                Entry::binary("img.bin", &[0x00, 0x01, 0x02]),
                Entry::text("empty", ""),
            ],
        }
    }

    fn framed(c: &Container) -> Vec<u8> {
        let mut cur = Cursor::new(Vec::new());
        write(c, &mut cur).unwrap();
        cur.into_inner()
    }

    #[test]
    fn write_then_read_restores_container() {
        let c = sample();
        let parsed = read(&mut Cursor::new(framed(&c))).unwrap();
        assert_eq!(parsed.container, c);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn index_keeps_walk_order_and_sizes() {
        let idx = read_index(&mut Cursor::new(framed(&sample()))).unwrap();
        let paths: Vec<&str> = idx.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["a.txt", "img.bin", "empty"]);
        assert_eq!(idx[1].payload_len, 3);
        assert!(idx[1].is_binary);
    }

    #[test]
    fn corrupted_payload_fails_hash_check() {
        let mut bytes = framed(&sample());
        let idx = read_index(&mut Cursor::new(bytes.clone())).unwrap();
        bytes[idx[0].payload_offset as usize] ^= 0xFF;
        let mut cur = Cursor::new(bytes);
        assert!(matches!(read_payload(&mut cur, &idx[0]), Err(PackError::Malformed(_))));
    }

    #[test]
    fn corrupted_index_is_rejected() {
        let mut bytes = framed(&sample());
        let idx = read_index(&mut Cursor::new(bytes.clone())).unwrap();
        let first_index_byte = (idx[2].payload_offset + idx[2].payload_len) as usize + 9;
        bytes[first_index_byte] ^= 0xFF;
        assert!(read_index(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn truncated_file_is_rejected() {
        let bytes = framed(&sample());
        let cut = bytes[..bytes.len() - 5].to_vec();
        assert!(read(&mut Cursor::new(cut)).is_err());
    }
}
