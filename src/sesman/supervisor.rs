use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use crate::common::{EmpttyError, ProcessHandle, Result};

/// The `Supervisor` struct stops the processes of a session when emptty receives a
/// termination signal. Processes are interrupted and reaped in the order they were given,
/// so the session command should come before the display server it runs on.
///
/// The supervisor is installed before the first process starts. Processes supervised after
/// a signal has been received are stopped straight away. Dropping the supervisor stops
/// listening for signals.
pub struct Supervisor {
    handle: Handle,
    processes: Arc<Mutex<Vec<ProcessHandle>>>,
    interrupted: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Supervisor {
    /// Starts listening for SIGHUP, SIGINT, SIGTERM and SIGQUIT on a dedicated thread.
    pub fn install() -> Result<Supervisor> {
        let mut signals = Signals::new([SIGHUP, SIGINT, SIGTERM, SIGQUIT])?;
        let handle = signals.handle();
        let processes: Arc<Mutex<Vec<ProcessHandle>>> = Arc::new(Mutex::new(Vec::new()));
        let interrupted = Arc::new(AtomicBool::new(false));

        let thread_processes = processes.clone();
        let thread_interrupted = interrupted.clone();
        let thread = thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!("Received signal {}, stopping session processes", signal);
                let processes = match thread_processes.lock() {
                    Ok(processes) => processes,
                    Err(poisoned) => poisoned.into_inner(),
                };
                thread_interrupted.store(true, Ordering::SeqCst);
                for process in processes.iter() {
                    process.interrupt_and_wait();
                }
            }
        });

        Ok(Supervisor {
            handle,
            processes,
            interrupted,
            thread: Some(thread),
        })
    }

    /// Installs a supervisor for an initial list of processes. More processes can be
    /// supervised later with `supervise`.
    ///
    /// # Arguments
    /// * `processes` - The processes to stop, in order, when a signal is received.
    pub fn supervise_on_interrupt(processes: Vec<ProcessHandle>) -> Result<Supervisor> {
        let supervisor = Self::install()?;
        supervisor.supervise(processes)?;
        Ok(supervisor)
    }

    /// Replaces the supervised processes. When a signal has already been received the
    /// processes are stopped immediately.
    ///
    /// # Arguments
    /// * `processes` - The processes to stop, in order, when a signal is received.
    pub fn supervise(&self, processes: Vec<ProcessHandle>) -> Result<()> {
        let mut supervised = self.processes.lock()
            .map_err(|_| EmpttyError::SystemError("Supervised process list is poisoned".to_string()))?;

        if self.is_interrupted() {
            for process in processes.iter() {
                process.interrupt_and_wait();
            }
        }
        *supervised = processes;
        Ok(())
    }

    /// Returns whether a termination signal has been received.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Signal supervisor thread panicked");
            }
        }
    }
}

/// Tests delivering signals to the test process must not overlap with each other, nor
/// with tests installing a supervisor.
#[cfg(test)]
pub(crate) static SIGNAL_TEST_LOCK: Mutex<()> = Mutex::new(());
