#![forbid(unsafe_code)]

mod ui;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use dirpack::pack::{self, Content, Layout, PackOptions, ParseMode, UnpackOptions};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dirpack", version, about = "File packer/unpacker (container format v2.0.0)")]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pack a directory into a single container file.
    Pack {
        source_dir: PathBuf,
        output_file: PathBuf,
        /// Write the length-prefixed framed layout instead of text.
        #[arg(long, default_value_t = false)]
        framed: bool,
    },

    /// Unpack a container back into a directory tree.
    Unpack {
        input_file: PathBuf,
        output_dir: PathBuf,
        /// Keep unterminated entries instead of failing.
        #[arg(long, default_value_t = false)]
        lenient: bool,
    },

    /// Extract one file (printed to stdout if no output file is given).
    Extract {
        input_file: PathBuf,
        path: String,
        output_file: Option<PathBuf>,
    },

    /// List entries in a container.
    List {
        input_file: PathBuf,
        /// Print kind, size and hash too.
        #[arg(long = "long", short = 'l', default_value_t = false)]
        long: bool,
    },

    /// Check that every entry in a container decodes cleanly.
    Verify { input_file: PathBuf },

    /// Interactive wizard (terminal).
    Wizard,
}

fn run(cmd: Command) -> pack::PackResult<()> {
    match cmd {
        Command::Pack {
            source_dir,
            output_file,
            framed,
        } => {
            let layout = if framed { Layout::Framed } else { Layout::Text };
            let n = pack::pack(&source_dir, &output_file, &PackOptions { layout })?;
            eprintln!("packed {n} files into {}", output_file.display());
            Ok(())
        }
        Command::Unpack {
            input_file,
            output_dir,
            lenient,
        } => {
            let mode = if lenient { ParseMode::Lenient } else { ParseMode::Strict };
            let report = pack::unpack(&input_file, &output_dir, &UnpackOptions { mode })?;
            eprintln!("unpacked {} files to {}", report.files, output_dir.display());
            Ok(())
        }
        Command::Extract {
            input_file,
            path,
            output_file,
        } => {
            let got = pack::extract(&input_file, &path, output_file.as_deref())?;
            if output_file.is_none() {
                print_content(&got.content)?;
            }
            Ok(())
        }
        Command::List { input_file, long } => pack::list(&input_file, long),
        Command::Verify { input_file } => pack::verify(&input_file).map(|_| ()),
        Command::Wizard => ui::run(),
    }
}

/// Text goes out verbatim; binary as its base64 payload, never raw bytes.
fn print_content(content: &Content) -> pack::PackResult<()> {
    let mut out = std::io::stdout().lock();
    match content {
        Content::Text(s) => out.write_all(s.as_bytes())?,
        Content::Binary(b) => writeln!(out, "{}", STANDARD.encode(b))?,
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dirpack::logging::init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    if let Err(e) = run(cli.cmd) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
