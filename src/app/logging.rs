use std::fs;
use std::path::PathBuf;

use crate::common::{LoggingMode, Settings};

const DEFAULT_FORMAT: &str = "[{timestamp}][{level}] {message}";

/// Returns the log file of the configured tty, e.g. `/var/log/emptty/1.log`.
pub fn log_file_path(settings: &Settings) -> PathBuf {
    PathBuf::from(&settings.logging.directory).join(format!("{}.log", settings.tty))
}

/// Initializes logging. In the default mode the previous log file is kept with a `.old`
/// suffix and a new one is started; in appending mode all runs share one file.
pub fn setup_logging(settings: &Settings) -> Result<(), fern::InitError> {
    let logging_config = &settings.logging;

    let format_string = logging_config.format.clone();
    let mut base_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            let format = format_string
                .as_deref()
                .unwrap_or(DEFAULT_FORMAT);
            let formatted_message = format
                .replace("{timestamp}", &chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string())
                .replace("{level}", &record.level().to_string())
                .replace("{message}", &message.to_string());
            out.finish(format_args!("{}", formatted_message))
        })
        .level(logging_config.level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info));

    if logging_config.mode != LoggingMode::Disabled {
        let path = log_file_path(settings);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if logging_config.mode == LoggingMode::Default && path.exists() {
            let mut backup = path.clone().into_os_string();
            backup.push(".old");
            fs::rename(&path, backup)?;
        }

        base_config = base_config.chain(fern::log_file(&path)?);
    }

    if logging_config.console.unwrap_or(false) {
        base_config = base_config.chain(std::io::stdout());
    }

    base_config.apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_named_after_the_tty() {
        let mut settings = Settings::default();
        settings.tty = 7;
        settings.logging.directory = "/tmp/emptty-logs".to_string();

        assert_eq!(log_file_path(&settings), PathBuf::from("/tmp/emptty-logs/7.log"));
    }
}
