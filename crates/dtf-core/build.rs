//! Generates the builtin fixture table by hashing the data directory.
//!
//! The data directory is `$DICOM_TEST_FILES_DATA` if set, else `data/` at the
//! workspace root. A missing directory yields an empty table.

use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DICOM_TEST_FILES_DATA";

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-env-changed={DATA_DIR_ENV}");
    let data_dir = match env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
            manifest_dir.join("..").join("..").join("data")
        }
    };

    let mut entries = Vec::new();
    if data_dir.is_dir() {
        let mut prefix = Vec::new();
        collect(&data_dir, &mut prefix, &mut entries)?;
    } else {
        println!("cargo:rerun-if-changed={}", data_dir.display());
    }
    entries.sort();

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap_or_default());
    let mut dest = fs::File::create(out_dir.join("builtin_fixtures.rs"))?;
    writeln!(dest, "const BUILTIN_FIXTURES: &[(&str, &str)] = &[")?;
    for (name, digest) in &entries {
        writeln!(dest, "    ({name:?}, {digest:?}),")?;
    }
    writeln!(dest, "];")?;
    dest.flush()
}

fn collect(dir: &Path, prefix: &mut Vec<String>, out: &mut Vec<(String, String)>) -> io::Result<()> {
    println!("cargo:rerun-if-changed={}", dir.display());
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        prefix.push(name);
        if path.is_dir() {
            collect(&path, prefix, out)?;
        } else if path.is_file() {
            let mut file = fs::File::open(&path)?;
            let mut hasher = Sha256::new();
            io::copy(&mut file, &mut hasher)?;
            out.push((prefix.join("/"), hex::encode(hasher.finalize())));
        }
        prefix.pop();
    }
    Ok(())
}
