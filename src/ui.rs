#![forbid(unsafe_code)]

use dirpack::pack::{self, Layout, PackError, PackOptions, PackResult, ParseMode, UnpackOptions};
use inquire::{Confirm, Select, Text};
use std::path::{Path, PathBuf};

const PACK: &str = "Pack a directory";
const UNPACK: &str = "Unpack a container";
const EXTRACT: &str = "Extract one file";

fn validate_dir(p: &str) -> Result<(), String> {
    let pb = PathBuf::from(p);
    if !pb.exists() {
        return Err("Path does not exist".to_string());
    }
    if !pb.is_dir() {
        return Err("Path is not a directory".to_string());
    }
    Ok(())
}

fn validate_file(p: &str) -> Result<(), String> {
    if p.trim().is_empty() {
        return Err("Path is empty".to_string());
    }
    if !Path::new(p).is_file() {
        return Err("File does not exist".to_string());
    }
    Ok(())
}

/// `src/` -> `src.packed.txt`
fn default_container_name(dir: &str) -> String {
    let trimmed = dir.trim().trim_end_matches(['/', '\\']);
    let stem = Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| *n != "." && *n != "..")
        .unwrap_or("packed");
    format!("{stem}.packed.txt")
}

/// `src.packed.txt` -> `src-restored`
fn default_restore_dir(container: &str) -> String {
    let name = Path::new(container.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("packed");
    let stem = name.split('.').next().filter(|s| !s.is_empty()).unwrap_or("packed");
    format!("{stem}-restored")
}

fn prompt_err(e: inquire::InquireError) -> PackError {
    PackError::Io(std::io::Error::other(e))
}

fn validated(
    check: fn(&str) -> Result<(), String>,
) -> impl Fn(&str) -> Result<inquire::validator::Validation, inquire::CustomUserError> + Clone {
    move |s: &str| {
        Ok(match check(s) {
            Ok(()) => inquire::validator::Validation::Valid,
            Err(msg) => inquire::validator::Validation::Invalid(msg.into()),
        })
    }
}

pub fn run() -> PackResult<()> {
    println!("dirpack wizard\n");

    let action = Select::new("What do you want to do?", vec![PACK, UNPACK, EXTRACT])
        .prompt()
        .map_err(prompt_err)?;

    match action {
        PACK => run_pack(),
        UNPACK => run_unpack(),
        _ => run_extract(),
    }
}

fn run_pack() -> PackResult<()> {
    let input = Text::new("Source directory")
        .with_default("./src")
        .with_validator(validated(validate_dir))
        .prompt()
        .map_err(prompt_err)?;

    let output = Text::new("Output container")
        .with_default(&default_container_name(&input))
        .prompt()
        .map_err(prompt_err)?;

    let framed = Confirm::new("Use the framed (non-text) layout?")
        .with_default(false)
        .prompt()
        .map_err(prompt_err)?;

    println!("\nPack summary:");
    println!("  source : {input}");
    println!("  output : {output}");
    println!("  layout : {}", if framed { "framed" } else { "text" });

    if !confirm()? {
        return Ok(());
    }

    let layout = if framed { Layout::Framed } else { Layout::Text };
    let n = pack::pack(Path::new(&input), Path::new(&output), &PackOptions { layout })?;
    println!("Packed {n} files into {output}");
    Ok(())
}

fn run_unpack() -> PackResult<()> {
    let input = Text::new("Container file")
        .with_validator(validated(validate_file))
        .prompt()
        .map_err(prompt_err)?;

    let output = Text::new("Output directory")
        .with_default(&default_restore_dir(&input))
        .prompt()
        .map_err(prompt_err)?;

    let lenient = Confirm::new("Recover entries from a truncated container?")
        .with_default(false)
        .prompt()
        .map_err(prompt_err)?;

    if !confirm()? {
        return Ok(());
    }

    let mode = if lenient { ParseMode::Lenient } else { ParseMode::Strict };
    let report = pack::unpack(Path::new(&input), Path::new(&output), &UnpackOptions { mode })?;
    println!("Unpacked {} files to {output}", report.files);
    for w in &report.warnings {
        println!("  warning: {w}");
    }
    Ok(())
}

fn run_extract() -> PackResult<()> {
    let input = Text::new("Container file")
        .with_validator(validated(validate_file))
        .prompt()
        .map_err(prompt_err)?;

    let entries = pack::entries(Path::new(&input))?;
    if entries.is_empty() {
        println!("Container is empty.");
        return Ok(());
    }
    let paths: Vec<String> = entries.into_iter().map(|e| e.path).collect();
    let path = Select::new("Entry", paths).prompt().map_err(prompt_err)?;

    let default_out = path.rsplit('/').next().unwrap_or(&path).to_string();
    let output = Text::new("Write to")
        .with_default(&default_out)
        .prompt()
        .map_err(prompt_err)?;

    pack::extract(Path::new(&input), &path, Some(Path::new(&output)))?;
    println!("Extracted {path} to {output}");
    Ok(())
}

fn confirm() -> PackResult<bool> {
    Confirm::new("Proceed?").with_default(true).prompt().map_err(prompt_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_name_follows_directory() {
        assert_eq!(default_container_name("src/"), "src.packed.txt");
        assert_eq!(default_container_name("./assets"), "assets.packed.txt");
        assert_eq!(default_container_name("."), "packed.packed.txt");
    }

    #[test]
    fn restore_dir_follows_container() {
        assert_eq!(default_restore_dir("out/src.packed.txt"), "src-restored");
        assert_eq!(default_restore_dir(""), "packed-restored");
    }

    #[test]
    fn validators_reject_missing_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "x").unwrap();

        assert!(validate_dir(dir.path().to_str().unwrap()).is_ok());
        assert!(validate_dir(file.to_str().unwrap()).is_err());
        assert!(validate_file(file.to_str().unwrap()).is_ok());
        assert!(validate_file(dir.path().to_str().unwrap()).is_err());
        assert!(validate_file("  ").is_err());
    }
}
