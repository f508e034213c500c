//! Helpers for locating external programs.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Find `program` in the directories listed by `path_var`
pub fn find_in(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    std::env::split_paths(path_var?)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

/// Find `program` on the current `PATH`
pub fn find_program(program: &str) -> Option<PathBuf> {
    find_in(program, std::env::var_os("PATH").as_deref())
}
