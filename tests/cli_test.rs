use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

fn round_trip(data: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("input.bin");
    let comp_path = temp_dir.path().join("input.bin.comp");
    let out_path = temp_dir.path().join("output.bin");
    std::fs::write(&in_path, data)?;

    Command::cargo_bin("huffcompress")?
        .arg(&in_path)
        .arg("-o")
        .arg(&comp_path)
        .assert()
        .success();

    Command::cargo_bin("huffcompress")?
        .arg("-d")
        .arg(&comp_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&out_path)?, data);
    Ok(())
}

#[test]
fn compress_then_decompress_round_trips() -> STDRESULT {
    round_trip(b"the quick brown fox jumps over the lazy dog".repeat(200).as_slice())
}

#[test]
fn round_trips_single_repeated_byte() -> STDRESULT {
    round_trip(&vec![0x42u8; 50_000])
}

#[test]
fn default_outfile_names_are_derived() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("notes.txt");
    std::fs::write(&in_path, b"hello world, hello world")?;

    Command::cargo_bin("huffcompress")?
        .current_dir(temp_dir.path())
        .arg("notes.txt")
        .assert()
        .success();
    assert!(temp_dir.path().join("notes.txt.comp").exists());

    Command::cargo_bin("huffcompress")?
        .current_dir(temp_dir.path())
        .arg("-d")
        .arg("notes.txt.comp")
        .assert()
        .success();
    assert_eq!(
        std::fs::read(temp_dir.path().join("notes.txt"))?,
        b"hello world, hello world"
    );
    Ok(())
}

#[test]
fn missing_input_file_reports_error() -> STDRESULT {
    Command::cargo_bin("huffcompress")?
        .arg("this-file-does-not-exist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
    Ok(())
}

#[test]
fn empty_input_file_is_rejected() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("empty.bin");
    std::fs::write(&in_path, b"")?;

    Command::cargo_bin("huffcompress")?
        .arg(&in_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
    Ok(())
}
