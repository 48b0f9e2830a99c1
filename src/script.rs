//! Companion scripts bundled into the binary.
//!
//! When no script path is configured, the bundled script matching the
//! interpreter is written to a private temporary file for the lifetime of
//! the session. Nothing depends on the source tree at run time.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Companion REPL for fish.
pub const REPL_FISH: &str = include_str!("../scripts/repl.fish");

/// Companion REPL for bash.
pub const REPL_BASH: &str = include_str!("../scripts/repl.bash");

/// Pick the bundled script for `executable` by its file name.
///
/// `bash` (or a path ending in it) gets the bash script; anything else is
/// assumed to be fish.
pub fn bundled_for(executable: &Path) -> (&'static str, &'static str) {
    match executable.file_name().and_then(|name| name.to_str()) {
        Some("bash") => (REPL_BASH, ".bash"),
        _ => (REPL_FISH, ".fish"),
    }
}

/// Write the bundled script for `executable` to a temporary file.
///
/// The file is removed when the returned handle is dropped.
pub(crate) fn materialize(executable: &Path) -> std::io::Result<NamedTempFile> {
    let (source, suffix) = bundled_for(executable);
    let mut file = tempfile::Builder::new()
        .prefix("shell-driver-repl-")
        .suffix(suffix)
        .tempfile()?;
    file.write_all(source.as_bytes())?;
    file.flush()?;
    debug!(path = %file.path().display(), "wrote bundled companion script");
    Ok(file)
}
