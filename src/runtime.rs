//! Executable lookup shared by the timestamp sources and the binaries.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Env override naming the git executable to run.
pub const GIT_OVERRIDE_ENV: &str = "CATALOG_GIT";

/// Returns true when a file exists and has any execute bit set.
pub fn helper_is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path) {
            return meta.permissions().mode() & 0o111 != 0;
        }
        false
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Find an executable by name somewhere on PATH.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    for dir in env::split_paths(&paths) {
        for candidate in executable_names(&dir, name) {
            if helper_is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

fn executable_names(dir: &Path, name: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![dir.join(format!("{name}.exe")), dir.join(name)]
    } else {
        vec![dir.join(name)]
    }
}

/// Locate git: `CATALOG_GIT` when it names an executable, else PATH.
pub fn resolve_git_binary() -> Option<PathBuf> {
    git_binary_with_override(env::var_os(GIT_OVERRIDE_ENV))
}

fn git_binary_with_override(raw: Option<OsString>) -> Option<PathBuf> {
    if let Some(raw) = raw {
        let candidate = PathBuf::from(raw);
        if !candidate.as_os_str().is_empty() && helper_is_executable(&candidate) {
            return Some(candidate);
        }
        warn!(
            path = %candidate.display(),
            "{GIT_OVERRIDE_ENV} is not an executable; searching PATH"
        );
    }
    find_on_path("git")
}
