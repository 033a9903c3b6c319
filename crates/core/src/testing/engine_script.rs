//! Fake engine executables for lifecycle tests.

/// Writes an executable `sh` script named `name` into `dir` and returns its path.
///
/// The body runs with the real engine's arguments in `$@`. Use `exec sleep`
/// rather than a bare `sleep` when the script must be killable as a single
/// process.
#[cfg(unix)]
pub fn write_engine_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let script = format!("#!/bin/sh\n{body}\n");
    std::fs::write(&path, script).expect("write engine script");
    let mut perms = std::fs::metadata(&path)
        .expect("stat engine script")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod engine script");
    path
}
