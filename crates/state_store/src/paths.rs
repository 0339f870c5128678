use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const STATE_DIR: &str = ".rabbithole";
pub const STATE_FILE_NAME: &str = "state.json";

#[must_use]
pub fn state_root(cwd: &Path) -> PathBuf {
    cwd.join(STATE_DIR)
}

#[must_use]
pub fn default_state_path(cwd: &Path) -> PathBuf {
    state_root(cwd).join(STATE_FILE_NAME)
}

/// Sibling path used to stage a write before it replaces `path`.
#[must_use]
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(STATE_FILE_NAME));
    name.push(".tmp");
    path.with_file_name(name)
}
