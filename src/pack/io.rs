#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::pack::error::{PackError, PackResult};

pub fn write_u16(w: &mut dyn Write, v: u16) -> PackResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_u32(w: &mut dyn Write, v: u32) -> PackResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_u64(w: &mut dyn Write, v: u64) -> PackResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// `[u16 len][bytes]`
pub fn write_str16(w: &mut dyn Write, s: &str) -> PackResult<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| PackError::InvalidPath(format!("string too long: {s}")))?;
    write_u16(w, len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

pub fn read_exact<const N: usize>(r: &mut dyn Read) -> PackResult<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn read_u8(r: &mut dyn Read) -> PackResult<u8> {
    Ok(read_exact::<1>(r)?[0])
}

pub fn read_u16(r: &mut dyn Read) -> PackResult<u16> {
    Ok(u16::from_le_bytes(read_exact::<2>(r)?))
}

pub fn read_u32(r: &mut dyn Read) -> PackResult<u32> {
    Ok(u32::from_le_bytes(read_exact::<4>(r)?))
}

pub fn read_u64(r: &mut dyn Read) -> PackResult<u64> {
    Ok(u64::from_le_bytes(read_exact::<8>(r)?))
}

pub fn read_str16(r: &mut dyn Read) -> PackResult<String> {
    let len = read_u16(r)? as usize;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| PackError::Malformed("string is not utf8".into()))
}

pub fn hex32(v: &[u8; 32]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(64);
    for b in v.iter().copied() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
    out
}

/// Write `output` through a temp file in the same directory, then rename it
/// into place. Readers never observe a half-written container.
pub fn write_atomic<F>(output: &Path, fill: F) -> PackResult<()>
where
    F: FnOnce(&mut File) -> PackResult<()>,
{
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    fill(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| PackError::Io(e.error))?;
    Ok(())
}
