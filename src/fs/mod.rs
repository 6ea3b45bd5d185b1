use std::ffi::CString;
use std::fs;
use std::fs::{DirBuilder, Permissions};
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;

use crate::common::{Result, EmpttyError};

/// Changes the ownership of a file or directory.
///
/// # Arguments
/// * `path` - The path to the file or directory.
/// * `uid` - The user ID to set as the owner.
/// * `gid` - The group ID to set as the owner.
///
/// # Returns
/// A `Result` indicating success or an `EmpttyError` if the operation fails.
pub fn chown(path: &str, uid: u32, gid: u32) -> Result<()> {
    let cpath =
        CString::new(path).map_err(|error| EmpttyError::SystemError(format!("{}", error)))?;
    match unsafe { libc::chown(cpath.as_ptr(), uid, gid) } {
        0 => Ok(()),
        _ => Err(EmpttyError::SystemError(format!("Error changing ownership of file {}: {}", path, std::io::Error::last_os_error()))),
    }
}

/// Creates a directory, and its missing parents, with the given permissions.
/// Directories that already exist are left untouched.
///
/// # Returns
/// `true` if the directory was created, `false` if it already existed.
pub fn mkdir(path: &str, mode: u32) -> Result<bool> {
    if Path::new(path).is_dir() {
        return Ok(false);
    }
    DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .map_err(|error| EmpttyError::SystemError(format!("Could not create directory for path {}: {}", path, error)))?;

    // the umask may have masked some of the requested bits
    chmod(path, mode)?;
    Ok(true)
}

/// Changes the permissions of a file or directory.
///
/// # Arguments
/// * `path` - The path to the file or directory.
/// * `mode` - The permissions to set, in octal format (e.g., `0o755`).
pub fn chmod(path: &str, mode: u32) -> Result<()> {
    let mode = Permissions::from_mode(mode);
    if fs::set_permissions(path, mode).is_err() {
        return Err(EmpttyError::SystemError(format!("Could not change permissions: {}", path)));
    }
    Ok(())
}

/// Removes a file. A missing file is not an error.
pub fn remove_file(path: &str) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(EmpttyError::SystemError(format!("Could not remove file {}: {}", path, error))),
    }
}

pub fn file_exists(path: &str) -> bool {
    fs::metadata(path).is_ok()
}

/// Returns true if the path is a regular file with at least one execute bit set.
pub fn is_executable(path: &str) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}
