pub use accounting::{Accounting, AccountingEntry};
pub use record::{AccountingRecord, RecordKind};
pub use utmp_store::{AccountingStore, UtmpStore};

mod accounting;
mod record;
mod utmp_store;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use crate::common::{EmpttyError, Result};
    use super::{AccountingRecord, AccountingStore};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StoreEvent {
        Login,
        Logout,
        FailedLogin,
    }

    /// Accounting store keeping the written records in memory.
    #[derive(Default)]
    pub struct RecordingStore {
        events: Mutex<Vec<(StoreEvent, AccountingRecord)>>,
        fail: bool,
    }

    impl RecordingStore {
        pub fn failing() -> Self {
            Self { events: Mutex::new(Vec::new()), fail: true }
        }

        pub fn events(&self) -> Vec<(StoreEvent, AccountingRecord)> {
            self.events.lock().unwrap().clone()
        }

        pub fn count(&self, event: StoreEvent) -> usize {
            self.events().iter().filter(|(kind, _)| *kind == event).count()
        }

        fn push(&self, event: StoreEvent, record: &AccountingRecord) -> Result<()> {
            self.events.lock().unwrap().push((event, record.clone()));
            if self.fail {
                return Err(EmpttyError::AccountingError("read-only file system".to_string()));
            }
            Ok(())
        }
    }

    impl AccountingStore for RecordingStore {
        fn write_login(&self, record: &AccountingRecord) -> Result<()> {
            self.push(StoreEvent::Login, record)
        }

        fn write_logout(&self, record: &AccountingRecord) -> Result<()> {
            self.push(StoreEvent::Logout, record)
        }

        fn write_failed_login(&self, record: &AccountingRecord) -> Result<()> {
            self.push(StoreEvent::FailedLogin, record)
        }
    }
}
