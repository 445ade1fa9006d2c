//! Integration tests for the dirpack binary, run through `assert_cmd`.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn dirpack() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dirpack"));
    cmd.stdin(Stdio::null());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn sample_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
    fs::write(dir.path().join("img.bin"), [0x00, 0x01, 0x02]).unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/note.md"), "# note").unwrap();
    dir
}

#[test]
fn pack_unpack_round_trip() {
    let src = sample_tree();
    let work = TempDir::new().unwrap();
    let container = work.path().join("src.packed.txt");
    let restored = work.path().join("src-restored");

    dirpack()
        .arg("pack")
        .arg(src.path())
        .arg(&container)
        .assert()
        .success()
        .stderr(predicate::str::contains("packed 3 files"));

    let body = fs::read_to_string(&container).unwrap();
    assert!(body.starts_with("// ===== PACKED FILES v2.0.0 ====="));
    assert!(body.contains("[BASE64_BINARY]\nAAEC\n"));

    dirpack()
        .arg("unpack")
        .arg(&container)
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(fs::read(restored.join("a.txt")).unwrap(), b"hello\n");
    assert_eq!(fs::read(restored.join("img.bin")).unwrap(), vec![0, 1, 2]);
    assert_eq!(fs::read(restored.join("sub/note.md")).unwrap(), b"# note");
}

#[test]
fn extract_prints_to_stdout() {
    let src = sample_tree();
    let work = TempDir::new().unwrap();
    let container = work.path().join("c.txt");
    dirpack().arg("pack").arg(src.path()).arg(&container).assert().success();

    dirpack()
        .arg("extract")
        .arg(&container)
        .arg("sub/note.md")
        .assert()
        .success()
        .stdout("# note");

    dirpack()
        .arg("extract")
        .arg(&container)
        .arg("img.bin")
        .assert()
        .success()
        .stdout("AAEC\n");
}

#[test]
fn extract_to_file() {
    let src = sample_tree();
    let work = TempDir::new().unwrap();
    let container = work.path().join("c.txt");
    let out = work.path().join("got.bin");
    dirpack().arg("pack").arg(src.path()).arg(&container).assert().success();

    dirpack()
        .arg("extract")
        .arg(&container)
        .arg("img.bin")
        .arg(&out)
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read(&out).unwrap(), vec![0, 1, 2]);
}

#[test]
fn missing_entry_exits_one() {
    let src = sample_tree();
    let work = TempDir::new().unwrap();
    let container = work.path().join("c.txt");
    dirpack().arg("pack").arg(src.path()).arg(&container).assert().success();

    dirpack()
        .arg("extract")
        .arg(&container)
        .arg("nope.txt")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: file nope.txt not found"));
}

#[test]
fn pack_of_non_directory_exits_one() {
    let work = TempDir::new().unwrap();
    let file = work.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    dirpack()
        .arg("pack")
        .arg(&file)
        .arg(work.path().join("out.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn lenient_flag_recovers_truncated_container() {
    let work = TempDir::new().unwrap();
    let container = work.path().join("cut.txt");
    fs::write(
        &container,
        "// ===== PACKED FILES v2.0.0 =====\n// ===== FILE: a.txt =====\nkept\n// ===== END_FILE: a.txt =====\n\n// ===== FILE: b.txt =====\npart",
    )
    .unwrap();

    dirpack()
        .arg("unpack")
        .arg(&container)
        .arg(work.path().join("strict"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("container ends inside entry: b.txt"));

    dirpack()
        .args(["unpack", "--lenient"])
        .arg(&container)
        .arg(work.path().join("lenient"))
        .assert()
        .success();
    assert_eq!(fs::read(work.path().join("lenient/a.txt")).unwrap(), b"kept");
    assert_eq!(fs::read(work.path().join("lenient/b.txt")).unwrap(), b"part");
}

#[test]
fn framed_layout_lists_and_verifies() {
    let src = sample_tree();
    let work = TempDir::new().unwrap();
    let container = work.path().join("c.dpk");

    dirpack()
        .args(["pack", "--framed"])
        .arg(src.path())
        .arg(&container)
        .assert()
        .success();

    dirpack()
        .arg("list")
        .arg(&container)
        .assert()
        .success()
        .stdout(predicate::str::contains("sub/note.md"));

    dirpack()
        .args(["list", "--long"])
        .arg(&container)
        .assert()
        .success()
        .stdout(predicate::str::contains("img.bin  kind=binary size=3"));

    dirpack()
        .arg("verify")
        .arg(&container)
        .assert()
        .success()
        .stdout("ok: 3 entries\n");
}

#[test]
fn unknown_command_is_usage_error() {
    dirpack().arg("explode").assert().failure();
}
