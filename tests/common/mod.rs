//! Shared helpers for integration tests
//!
//! External tools are stood in for by small shell scripts written into a
//! tempdir, so the supervision and sequencing logic runs against real OS
//! processes without any of the actual binaries installed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script and return its path
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");

    let mut perms = std::fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("make script executable");

    path
}
