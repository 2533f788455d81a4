use assert_cmd::prelude::*;
use predicates::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Half random, half repetitive, so the codec has something to do either way.
fn payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|i| if (i / 4096) % 2 == 0 { rng.gen() } else { (i % 97) as u8 })
        .collect()
}

#[test]
fn test_cli_file_round_trip_bz2() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let src = dir.path().join("a.bin");
    let archive = dir.path().join("a.bin.bz2");
    let restored = dir.path().join("a.bin.out");
    let data = payload(5 * 1024 * 1024 + 321, 7);
    fs::write(&src, &data)?;

    // 1. Compress
    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&src).arg(&archive);
    cmd.assert().success().stdout(predicate::str::contains("Done."));
    assert!(fs::read(&archive)?.starts_with(b"BZh9"));

    // 2. Decompress
    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&archive).arg(&restored);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!("Decompressed to {}", restored.display())));

    assert_eq!(fs::read(&restored)?, data);
    Ok(())
}

#[test]
fn test_cli_directory_round_trip_bz2() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let proj = dir.path().join("proj");
    fs::create_dir_all(proj.join("sub"))?;
    fs::write(proj.join("b.txt"), b"bee")?;
    fs::write(proj.join("sub/a.txt"), b"ay")?;
    let archive = dir.path().join("proj.bz2");
    let restored = dir.path().join("restored");

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&proj).arg(&archive);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Source is a directory; creating tar archive..."));

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&archive).arg(&restored);
    cmd.assert().success().stdout(
        predicate::str::contains("Detected tar archive inside, extracting...")
            .and(predicate::str::contains("Extraction complete.")),
    );

    assert_eq!(fs::read(restored.join("proj/b.txt"))?, b"bee");
    assert_eq!(fs::read(restored.join("proj/sub/a.txt"))?, b"ay");
    Ok(())
}

#[test]
fn test_cli_missing_source_exit_code() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let dst = dir.path().join("nothing.bz2");

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(dir.path().join("nothing")).arg(&dst);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::starts_with("Error:").and(predicate::str::contains("not found")));
    assert!(!dst.exists());
    Ok(())
}

#[test]
fn test_cli_existing_destination_is_left_alone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("a.txt.bz2");
    fs::write(&src, b"fresh")?;
    fs::write(&dst, b"precious")?;

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&src).arg(&dst);
    cmd.assert().code(3).stderr(predicate::str::contains("Error:"));
    assert_eq!(fs::read(&dst)?, b"precious");

    // With --force the destination is replaced.
    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg("--force").arg(&src).arg(&dst);
    cmd.assert().success();
    assert!(fs::read(&dst)?.starts_with(b"BZh"));
    Ok(())
}

#[test]
fn test_cli_indeterminate_mode_exit_code() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("b.txt");
    fs::write(&src, b"x")?;

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&src).arg(&dst);
    cmd.assert().code(4).stderr(predicate::str::contains("Error:"));
    assert!(!dst.exists());
    Ok(())
}

#[test]
fn test_cli_decompress_into_existing_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let src = dir.path().join("report.txt");
    let archive = dir.path().join("report.txt.BZ2");
    let out = dir.path().join("out");
    fs::create_dir(&out)?;
    fs::write(&src, b"quarterly numbers")?;

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&src).arg(&archive);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&archive).arg(&out);
    cmd.assert().success();
    assert_eq!(fs::read(out.join("report.txt"))?, b"quarterly numbers");

    // Same again: the inner file now exists, so the run fails and the payload
    // is salvaged next to it instead.
    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg(&archive).arg(&out);
    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("(post-error move)"));
    assert_eq!(fs::read(out.join("report.txt.BZ2.out"))?, b"quarterly numbers");
    Ok(())
}

#[test]
fn test_cli_level_out_of_range() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("a.txt.bz2");
    fs::write(&src, b"x")?;

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg("--level").arg("12").arg(&src).arg(&dst);
    cmd.assert().code(1).stderr(predicate::str::contains("level"));
    assert!(!dst.exists());

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg("-l").arg("1").arg(&src).arg(&dst);
    cmd.assert().success();
    assert!(fs::read(&dst)?.starts_with(b"BZh1"));
    Ok(())
}

#[test]
fn test_cli_benchmark_reports_elapsed_even_on_failure() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg("--benchmark").arg(dir.path().join("missing")).arg(dir.path().join("x.bz2"));
    cmd.assert()
        .code(2)
        .stdout(predicate::str::is_match(r"Elapsed: \d+\.\d{3} s")?);
    Ok(())
}

#[test]
fn test_cli_progress_flag_draws_status_line() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let src = dir.path().join("a.bin");
    let dst = dir.path().join("a.bin.bz2");
    fs::write(&src, payload(2 * 1024 * 1024, 3))?;

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg("--progress").arg(&src).arg(&dst);
    cmd.assert().success().stderr(predicate::str::contains("Compressed"));
    Ok(())
}

#[test]
fn test_cli_force_never_overwrites_the_source() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("a.bz2");
    fs::write(&archive, b"irreplaceable")?;

    let mut cmd = Command::cargo_bin("bzst")?;
    cmd.arg("-f").arg(&archive).arg(&archive);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("same file"));
    assert_eq!(fs::read(&archive)?, b"irreplaceable");
    Ok(())
}
