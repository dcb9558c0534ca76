// CLASSIFICATION: COMMUNITY
// Filename: util.rs v0.1
// Author: Lukas Bower
// Date Modified: 2025-10-18

//! Directory helpers.

use std::fs;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

/// Create a single directory with the given mode. Existing is not an error.
pub fn make_dir<P: AsRef<Path>>(path: P, mode: u32) -> io::Result<()> {
    match fs::DirBuilder::new().mode(mode).create(path.as_ref()) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        other => other,
    }
}

/// Create a directory and any missing ancestors, all with the given mode.
pub fn mkdir_recursive<P: AsRef<Path>>(path: P, mode: u32) -> io::Result<()> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path.as_ref())
}
