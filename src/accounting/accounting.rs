use std::sync::Arc;

use crate::common::PathSettings;
use super::{AccountingRecord, AccountingStore, UtmpStore};

/// The `Accounting` struct opens and closes login accounting entries.
/// Every write is best effort: failures are logged and never abort a session.
#[derive(Clone)]
pub struct Accounting {
    store: Arc<dyn AccountingStore>,
}

impl Accounting {
    pub fn new(store: Arc<dyn AccountingStore>) -> Self {
        Self { store }
    }

    /// Creates an `Accounting` writing to the system utmp database and the configured wtmp/btmp logs.
    pub fn system(paths: &PathSettings) -> Self {
        Self::new(Arc::new(UtmpStore::from_paths(paths)))
    }

    /// Opens an accounting entry for a running display server or compositor.
    ///
    /// # Arguments
    /// * `username` - The logged in user.
    /// * `pid` - The pid of the process the session is bound to.
    /// * `tty_id` - The TTY number.
    /// * `display` - The X11 display, empty for Wayland.
    ///
    /// # Returns
    /// An `AccountingEntry` that must be closed (or dropped) when the session ends.
    pub fn open(&self, username: &str, pid: u32, tty_id: &str, display: &str) -> AccountingEntry {
        let record = AccountingRecord::login(username, pid, tty_id, display);
        match self.store.write_login(&record) {
            Ok(()) => debug!("Added utmp entry for {} on tty{} (pid {})", username, tty_id, pid),
            Err(error) => warn!("Could not add utmp entry for {}: {}", username, error),
        }

        AccountingEntry {
            record,
            store: self.store.clone(),
            closed: false,
        }
    }

    /// Records a failed login attempt.
    pub fn record_failed_login(&self, username: Option<&str>, pid: u32, tty_id: &str) {
        let record = AccountingRecord::failed_login(username, pid, tty_id);
        match self.store.write_failed_login(&record) {
            Ok(()) => debug!("Added btmp entry for {:?} on tty{}", username, tty_id),
            Err(error) => warn!("Could not add btmp entry: {}", error),
        }
    }
}

/// The `AccountingEntry` struct is the handle of an open accounting record.
/// The record is ended exactly once: by `close`, or when the handle is dropped.
pub struct AccountingEntry {
    record: AccountingRecord,
    store: Arc<dyn AccountingStore>,
    closed: bool,
}

impl AccountingEntry {
    pub fn record(&self) -> &AccountingRecord {
        &self.record
    }

    /// Ends the accounting record.
    pub fn close(mut self) {
        self.end();
    }

    fn end(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.store.write_logout(&self.record.ended()) {
            Ok(()) => debug!("Ended utmp entry for {}", self.record.username()),
            Err(error) => warn!("Could not end utmp entry for {}: {}", self.record.username(), error),
        }
    }
}

impl Drop for AccountingEntry {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::testing::{RecordingStore, StoreEvent};

    #[test]
    fn entry_is_ended_once_when_closed() {
        let store = Arc::new(RecordingStore::default());
        let accounting = Accounting::new(store.clone());

        let entry = accounting.open("alice", 100, "1", ":0");
        assert_eq!(entry.record().host(), ":0");
        entry.close();

        assert_eq!(store.count(StoreEvent::Login), 1);
        assert_eq!(store.count(StoreEvent::Logout), 1);
    }

    #[test]
    fn entry_is_ended_when_dropped() {
        let store = Arc::new(RecordingStore::default());
        let accounting = Accounting::new(store.clone());

        {
            let _entry = accounting.open("alice", 100, "1", "");
        }

        assert_eq!(store.count(StoreEvent::Logout), 1);
    }

    #[test]
    fn write_failures_are_not_fatal() {
        let store = Arc::new(RecordingStore::failing());
        let accounting = Accounting::new(store.clone());

        accounting.record_failed_login(Some("alice"), 1, "1");
        accounting.open("alice", 100, "1", "").close();

        assert_eq!(store.count(StoreEvent::FailedLogin), 1);
        assert_eq!(store.count(StoreEvent::Logout), 1);
    }
}
