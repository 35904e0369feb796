//! Environment for the external OCR tool
//!
//! `ocrmypdf` shells out to further helpers. A locally built `jbig2enc`
//! (binary plus shared library) can live in a helper directory next to the
//! service; that directory is prepended to both `PATH` and
//! `LD_LIBRARY_PATH` of the child process so the tool picks it up.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

/// Search paths handed to the OCR subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnvironment {
    path: Option<OsString>,
    ld_library_path: Option<OsString>,
}

impl ToolEnvironment {
    /// Snapshot `PATH` and `LD_LIBRARY_PATH` of the current process
    pub fn from_process() -> Self {
        Self {
            path: env::var_os("PATH"),
            ld_library_path: env::var_os("LD_LIBRARY_PATH"),
        }
    }

    /// Build an environment from explicit values
    pub fn new(path: Option<OsString>, ld_library_path: Option<OsString>) -> Self {
        Self {
            path,
            ld_library_path,
        }
    }

    /// Prepend `dir` to both search paths if it is an existing directory.
    /// Anything else leaves the environment untouched.
    pub fn with_helper_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "helper directory not present, environment unchanged");
            return self;
        }

        debug!(dir = %dir.display(), "prepending helper directory to PATH and LD_LIBRARY_PATH");
        self.path = Some(prepend(dir, self.path.take()));
        self.ld_library_path = Some(prepend(dir, self.ld_library_path.take()));
        self
    }

    pub fn path(&self) -> Option<&OsStr> {
        self.path.as_deref()
    }

    pub fn ld_library_path(&self) -> Option<&OsStr> {
        self.ld_library_path.as_deref()
    }

    /// Set the search paths on a child command. Unset values are inherited.
    pub fn apply(&self, command: &mut Command) {
        if let Some(path) = &self.path {
            command.env("PATH", path);
        }
        if let Some(ld_library_path) = &self.ld_library_path {
            command.env("LD_LIBRARY_PATH", ld_library_path);
        }
    }
}

fn prepend(dir: &Path, existing: Option<OsString>) -> OsString {
    let mut value = OsString::from(dir);
    match existing {
        Some(existing) if !existing.is_empty() => {
            value.push(PATH_SEPARATOR);
            value.push(existing);
        }
        _ => {}
    }
    value
}

/// Locate an executable the way `which` does.
///
/// A name with a directory component is checked as given; a bare name is
/// looked up in each entry of `path`, in order.
pub fn find_executable(name: &str, path: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = path?;
    env::split_paths(path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
