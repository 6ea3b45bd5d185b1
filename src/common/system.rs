use crate::common::{Result, EmpttyError};
use nix::unistd::{gethostname, Uid};
use std::process::Command;

pub struct System {
}

impl System {
    pub fn get_current_user_uid() -> u32 {
        Uid::effective().as_raw()
    }

    pub fn is_root() -> bool {
        Uid::effective().is_root()
    }

    /// Returns the host name shown in the login prompt.
    pub fn get_hostname() -> String {
        match gethostname() {
            Ok(hostname) => hostname.to_string_lossy().into_owned(),
            Err(error) => {
                warn!("Failed to get hostname: {}", error);
                "localhost".to_string()
            }
        }
    }

    /// Runs a command to completion and returns its trimmed standard output.
    /// A non-zero exit status is an error.
    pub fn output(command: &mut Command) -> Result<String> {
        let program = command.get_program().to_string_lossy().into_owned();
        match command.output() {
            Err(error) => Err(EmpttyError::SystemError(format!("Failed to run {}: {}", program, error))),
            Ok(output) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(EmpttyError::SystemError(format!("{} exited with {}: {}", program, output.status, stderr.trim())));
                }

                let mut stdout = String::from_utf8(output.stdout)?;

                // Remove trailing endline
                let len = stdout.trim_end_matches(&['\r', '\n'][..]).len();
                stdout.truncate(len);

                Ok(stdout)
            }
        }
    }
}
