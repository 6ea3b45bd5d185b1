use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;

use crate::common::Settings;

const CONSOLE_DEVICE: &str = "/dev/tty0";
const VT_ACTIVATE: libc::c_ulong = 0x5606;
const VT_WAITACTIVE: libc::c_ulong = 0x5607;

/// Switches the active virtual terminal to the configured tty.
///
/// # Returns
/// `true` when the terminal was switched.
pub fn switch_tty(settings: &Settings) -> bool {
    if !settings.switch_tty || settings.tty == 0 {
        return false;
    }

    let console = match OpenOptions::new().write(true).open(CONSOLE_DEVICE) {
        Ok(console) => console,
        Err(error) => {
            warn!("Could not open {}: {}", CONSOLE_DEVICE, error);
            return false;
        }
    };

    let fd = console.as_raw_fd();
    let tty = settings.tty as libc::c_ulong;
    unsafe {
        if libc::ioctl(fd, VT_ACTIVATE as _, tty) < 0 {
            warn!("Could not activate tty{}: {}", settings.tty, std::io::Error::last_os_error());
            return false;
        }
        if libc::ioctl(fd, VT_WAITACTIVE as _, tty) < 0 {
            warn!("Could not wait for tty{}: {}", settings.tty, std::io::Error::last_os_error());
            return false;
        }
    }

    debug!("Switched to tty{}", settings.tty);
    true
}
