use std::fs::OpenOptions;
use std::io::Write;
use std::mem;
use std::slice;
use std::sync::Mutex;

use crate::common::{EmpttyError, PathSettings, Result};
use super::AccountingRecord;

/// The utmpx database functions share static state inside libc.
static UTMP_LOCK: Mutex<()> = Mutex::new(());

/// The `AccountingStore` trait is the boundary to the system login accounting files.
pub trait AccountingStore: Send + Sync {
    /// Records an active login (utmp and wtmp).
    fn write_login(&self, record: &AccountingRecord) -> Result<()>;

    /// Records the end of a login (utmp and wtmp).
    fn write_logout(&self, record: &AccountingRecord) -> Result<()>;

    /// Records a failed login attempt (btmp).
    fn write_failed_login(&self, record: &AccountingRecord) -> Result<()>;
}

/// The `UtmpStore` writes records to the system utmp database and appends them to the wtmp and btmp logs,
/// using the same binary layout as the standard tools (`who`, `last`, `lastb`).
pub struct UtmpStore {
    wtmp_path: String,
    btmp_path: String,
}

impl UtmpStore {
    pub fn new(wtmp_path: &str, btmp_path: &str) -> Self {
        Self {
            wtmp_path: wtmp_path.to_string(),
            btmp_path: btmp_path.to_string(),
        }
    }

    pub fn from_paths(paths: &PathSettings) -> Self {
        Self::new(&paths.wtmp, &paths.btmp)
    }

    fn put_utmp(&self, entry: &libc::utmpx) -> Result<()> {
        let _guard = UTMP_LOCK.lock()
            .map_err(|_| EmpttyError::AccountingError("utmp lock is poisoned".to_string()))?;

        let result = unsafe {
            libc::setutxent();
            let result = libc::pututxline(entry);
            libc::endutxent();
            result
        };

        if result.is_null() {
            return Err(EmpttyError::AccountingError(format!("Failed to write utmp entry: {}", std::io::Error::last_os_error())));
        }
        Ok(())
    }

    /// Appends a record to a wtmp-like log. The log is not created when missing.
    fn append(&self, path: &str, entry: &libc::utmpx) -> Result<()> {
        let bytes = unsafe {
            slice::from_raw_parts(entry as *const libc::utmpx as *const u8, mem::size_of::<libc::utmpx>())
        };

        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|error| EmpttyError::AccountingError(format!("Failed to open {}: {}", path, error)))?;

        file.write_all(bytes)
            .map_err(|error| EmpttyError::AccountingError(format!("Failed to write to {}: {}", path, error)))
    }
}

impl AccountingStore for UtmpStore {
    fn write_login(&self, record: &AccountingRecord) -> Result<()> {
        let entry = record.to_utmpx();
        let utmp_result = self.put_utmp(&entry);
        self.append(&self.wtmp_path, &entry)?;
        utmp_result
    }

    fn write_logout(&self, record: &AccountingRecord) -> Result<()> {
        let entry = record.to_utmpx();
        let utmp_result = self.put_utmp(&entry);
        self.append(&self.wtmp_path, &entry)?;
        utmp_result
    }

    fn write_failed_login(&self, record: &AccountingRecord) -> Result<()> {
        self.append(&self.btmp_path, &record.to_utmpx())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn failed_logins_are_appended_to_btmp() {
        let dir = tempfile::tempdir().unwrap();
        let btmp = dir.path().join("btmp");
        fs::write(&btmp, b"").unwrap();

        let store = UtmpStore::new("/nonexistent/wtmp", btmp.to_str().unwrap());
        store.write_failed_login(&AccountingRecord::failed_login(Some("alice"), 12, "1")).unwrap();
        store.write_failed_login(&AccountingRecord::failed_login(None, 13, "1")).unwrap();

        let size = fs::metadata(&btmp).unwrap().len() as usize;
        assert_eq!(size, 2 * mem::size_of::<libc::utmpx>());
    }

    #[test]
    fn missing_logs_are_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let btmp = dir.path().join("btmp");

        let store = UtmpStore::new("/nonexistent/wtmp", btmp.to_str().unwrap());
        let result = store.write_failed_login(&AccountingRecord::failed_login(Some("alice"), 12, "1"));
        assert!(matches!(result, Err(EmpttyError::AccountingError(_))));
        assert!(!btmp.exists());
    }
}
