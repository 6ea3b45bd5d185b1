use std::process::Command;

use crate::fs::is_executable;

/// Runs a display start/stop script if one is configured. Failures are logged only.
pub fn run_display_script(path: &str) {
    if path.is_empty() {
        return;
    }

    if !is_executable(path) {
        warn!("{} is not executable", path);
        return;
    }

    match Command::new(path).status() {
        Ok(status) if status.success() => debug!("Ran display script {}", path),
        Ok(status) => warn!("Display script {} exited with {}", path, status),
        Err(error) => warn!("Failed to run display script {}: {}", path, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::chmod;
    use std::fs;

    #[test]
    fn only_executable_scripts_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = dir.path().join("start.sh");
        let script_path = script.to_str().unwrap();
        fs::write(&script, format!("#!/bin/sh\ntouch {}\n", marker.display())).unwrap();

        chmod(script_path, 0o644).unwrap();
        run_display_script(script_path);
        assert!(!marker.exists());

        chmod(script_path, 0o755).unwrap();
        run_display_script(script_path);
        assert!(marker.exists());

        run_display_script("");
        run_display_script("/nonexistent/stop.sh");
    }
}
