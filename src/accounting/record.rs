use std::mem;

use chrono::{DateTime, Utc};
use libc::c_char;

/// The kind of a login accounting record, mapped onto the `ut_type` values of utmpx.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// An active login
    UserProcess,
    /// The end of a login
    DeadProcess,
    /// A failed login attempt (btmp)
    LoginProcess,
}

impl RecordKind {
    fn ut_type(&self) -> libc::c_short {
        match self {
            RecordKind::UserProcess => libc::USER_PROCESS,
            RecordKind::DeadProcess => libc::DEAD_PROCESS,
            RecordKind::LoginProcess => libc::LOGIN_PROCESS,
        }
    }
}

/// The `AccountingRecord` struct holds the values of one utmpx record before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountingRecord {
    kind: RecordKind,
    pid: u32,
    line: String,
    id: String,
    username: String,
    host: String,
    time: DateTime<Utc>,
}

impl AccountingRecord {
    /// Creates the record of an active session.
    ///
    /// # Arguments
    /// * `username` - The logged in user.
    /// * `pid` - The pid of the display server or compositor.
    /// * `tty_id` - The TTY number, e.g. `1`.
    /// * `display` - The X11 display (`:0`), empty for Wayland.
    pub fn login(username: &str, pid: u32, tty_id: &str, display: &str) -> Self {
        Self {
            kind: RecordKind::UserProcess,
            pid,
            line: format!("tty{}", tty_id),
            id: tty_id.to_string(),
            username: username.to_string(),
            host: display.to_string(),
            time: Utc::now(),
        }
    }

    /// Creates the record of a failed login attempt. There is no display field.
    pub fn failed_login(username: Option<&str>, pid: u32, tty_id: &str) -> Self {
        Self {
            kind: RecordKind::LoginProcess,
            pid,
            line: format!("tty{}", tty_id),
            id: tty_id.to_string(),
            username: username.unwrap_or_default().to_string(),
            host: String::new(),
            time: Utc::now(),
        }
    }

    /// Creates the record that ends this login: same pid, line and id, no user, current time.
    pub fn ended(&self) -> Self {
        Self {
            kind: RecordKind::DeadProcess,
            pid: self.pid,
            line: self.line.clone(),
            id: self.id.clone(),
            username: String::new(),
            host: String::new(),
            time: Utc::now(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Converts the record into the system `utmpx` layout.
    pub fn to_utmpx(&self) -> libc::utmpx {
        let mut entry: libc::utmpx = unsafe { mem::zeroed() };

        entry.ut_type = self.kind.ut_type();
        entry.ut_pid = self.pid as libc::pid_t;
        copy_field(&mut entry.ut_line, &self.line);
        copy_field(&mut entry.ut_id, &self.id);
        copy_field(&mut entry.ut_user, &self.username);
        copy_field(&mut entry.ut_host, &self.host);
        entry.ut_tv.tv_sec = self.time.timestamp() as _;
        entry.ut_tv.tv_usec = self.time.timestamp_subsec_micros() as _;

        entry
    }
}

/// Copies a string into a fixed size utmpx field, truncating it when too long.
/// Fields are not required to be nul terminated when completely filled.
fn copy_field(field: &mut [c_char], value: &str) {
    for (target, byte) in field.iter_mut().zip(value.bytes()) {
        *target = byte as c_char;
    }
}
