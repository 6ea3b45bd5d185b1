use std::process::{Command, ExitStatus};
use std::sync::Arc;

use shared_child::SharedChild;
use shared_child::unix::SharedChildExt;

use crate::common::{Result, EmpttyError};

/// The `ProcessHandle` struct represents a handle to a linux process spawned for a session.
/// Handles are cheap to clone and can be waited on and signalled from several threads.
#[derive(Clone)]
pub struct ProcessHandle {
    process: Arc<SharedChild>,
}

impl ProcessHandle {
    /// Creates a new `ProcessHandle` by spawning a process using the provided command.
    ///
    /// # Arguments
    /// * `command` - The command to execute.
    ///
    /// # Returns
    /// A `Result` containing the `ProcessHandle` or an `EmpttyError` if the process could not be spawned.
    pub fn new(command: &mut Command) -> Result<ProcessHandle> {
        Ok(ProcessHandle {
            process: Arc::new(SharedChild::spawn(command)?),
        })
    }

    /// Kills the process associated with this handle.
    pub fn kill(&self) -> Result<()> {
        match self.process.kill() {
            Ok(_) => Ok(()),
            Err(error) => Err(EmpttyError::IoError(error))
        }
    }

    /// Sends SIGINT to the process. A process that has already been reaped is left alone.
    pub fn interrupt(&self) -> Result<()> {
        self.process.send_signal(libc::SIGINT)
            .map_err(|error| EmpttyError::SystemError(format!("Could not interrupt process [pid={}]: {}", self.pid(), error)))
    }

    /// Blocks until the process exits.
    pub fn wait(&self) -> Result<ExitStatus> {
        Ok(self.process.wait()?)
    }

    /// Interrupts the process and waits for it to exit. Errors are logged only.
    pub fn interrupt_and_wait(&self) {
        if let Err(error) = self.interrupt() {
            warn!("{}", error);
        }
        match self.wait() {
            Ok(status) => debug!("Process [pid={}] exited with {}", self.pid(), status),
            Err(error) => warn!("Failed to wait for process [pid={}]: {}", self.pid(), error),
        }
    }

    /// Returns the process ID (PID) of the process.
    pub fn pid(&self) -> u32 {
        self.process.id()
    }

    pub fn is_running(&self) -> Option<bool> {
        let terminate_result = self.process.try_wait();
        match terminate_result {
            Ok(expected_status) => match expected_status {
                Some(_status) => Some(false),
                None => Some(true)
            },
            Err(error) => {
                warn!("Failed to wait for process [pid={}]. Error: {}", self.process.id(), error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_and_wait_stops_a_running_process() {
        let process = ProcessHandle::new(Command::new("sleep").arg("30")).unwrap();
        assert_eq!(process.is_running(), Some(true));

        process.interrupt_and_wait();
        assert_eq!(process.is_running(), Some(false));

        // a second interrupt on a reaped process is harmless
        process.interrupt_and_wait();
    }

    #[test]
    fn wait_returns_the_exit_status() {
        let process = ProcessHandle::new(Command::new("sh").args(["-c", "exit 3"])).unwrap();
        let status = process.wait().unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
