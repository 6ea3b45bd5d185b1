#[macro_use]
extern crate log;

use emptty::{
    app::{setup_logging, Application},
    common::Settings,
};

use structopt::StructOpt;
use dotenv::dotenv;
use std::process;

/// Command-line options for emptty.
#[derive(StructOpt, Debug)]
#[structopt(name = "emptty", about = "Dead simple CLI display manager on TTY")]
struct Opt {
    /// Path to the configuration file.
    #[structopt(short, long, default_value = "")]
    config: String,

    /// Overrides the configured TTY number.
    #[structopt(short, long, default_value = "0")]
    tty: u32,

    /// Runs as a daemon, started by the init system rather than from a login shell.
    #[structopt(short, long)]
    daemon: bool,
}

/// Entry point of emptty.
fn main() {
    dotenv().ok();

    let opt = Opt::from_args();

    let mut settings = match Settings::new(&opt.config) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("Failed to load settings: {}", error);
            process::exit(1);
        }
    };

    if opt.tty > 0 {
        settings.tty = opt.tty;
    }
    if opt.daemon {
        settings.daemon_mode = true;
    }

    if let Err(error) = setup_logging(&settings) {
        eprintln!("Failed to initialize logging: {}", error);
        process::exit(1);
    }

    if !settings.verify() {
        error!("Settings are not valid");
        process::exit(1);
    }

    if settings.daemon_mode {
        debug!("Running in daemon mode on {}", settings.tty_name());
    }

    if let Err(error) = Application::new().run(&settings) {
        error!("{}", error);
        process::exit(1);
    }
}
