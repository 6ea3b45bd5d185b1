use std::io::{self, BufRead, BufReader, Write};

use crate::common::{color, EmpttyError, Result, Settings};
use super::DesktopDescriptor;

/// The `DesktopSelector` lets the user choose one of the installed desktops on the terminal.
pub struct DesktopSelector {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
}

impl DesktopSelector {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self { input, output }
    }

    /// Creates a selector reading from stdin and writing to stdout.
    pub fn terminal() -> Self {
        Self::new(Box::new(BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    /// Chooses a desktop. The autologin session, when configured and installed, and a single
    /// installed desktop are chosen without prompting; otherwise the user is asked until a
    /// valid index is entered.
    ///
    /// # Arguments
    /// * `desktops` - The installed desktops, X11 ones first.
    /// * `settings` - The settings holding the autologin session, layout and colours.
    pub fn select(&mut self, desktops: &[DesktopDescriptor], settings: &Settings) -> Result<DesktopDescriptor> {
        if desktops.is_empty() {
            return Err(EmpttyError::ResolutionError("No desktop sessions are installed".to_string()));
        }

        if settings.autologin && !settings.autologin_session.is_empty() {
            if let Some(desktop) = desktops.iter().find(|desktop| desktop.name().eq_ignore_ascii_case(&settings.autologin_session)) {
                debug!("Selected autologin session {}", desktop);
                return Ok(desktop.clone());
            }
            warn!("Autologin session {} is not installed", settings.autologin_session);
        }

        if desktops.len() == 1 {
            return Ok(desktops[0].clone());
        }

        loop {
            self.print_choices(desktops, settings)?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(EmpttyError::ResolutionError("No desktop was selected".to_string()));
            }

            match line.trim().parse::<usize>() {
                Ok(index) if index < desktops.len() => {
                    debug!("Selected desktop {}", desktops[index]);
                    return Ok(desktops[index].clone());
                }
                _ => writeln!(self.output, "Invalid choice \"{}\"", line.trim())?,
            }
        }
    }

    fn print_choices(&mut self, desktops: &[DesktopDescriptor], settings: &Settings) -> Result<()> {
        let choices: Vec<String> = desktops.iter()
            .enumerate()
            .map(|(index, desktop)| format!("[{}] {}", index, desktop))
            .collect();

        let text = if settings.vertical_selection {
            format!("{}\n", choices.join("\n"))
        } else {
            format!("{}\n", choices.join(", "))
        };
        let prompt = format!("Select [0-{}]: ", desktops.len() - 1);

        write!(self.output, "{}{}", color::paint(&text, &settings.fg_color, &settings.bg_color), prompt)?;
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use crate::desktop::Protocol;

    /// Output sink that can be inspected after the selector has taken ownership of it.
    #[derive(Clone, Default)]
    pub struct SharedOutput(pub Arc<Mutex<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedOutput {
        pub fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    pub fn selector(input: &str) -> (DesktopSelector, SharedOutput) {
        let output = SharedOutput::default();
        let selector = DesktopSelector::new(Box::new(Cursor::new(input.to_string().into_bytes())), Box::new(output.clone()));
        (selector, output)
    }

    fn desktops() -> Vec<DesktopDescriptor> {
        vec![
            DesktopDescriptor::new(Protocol::X11, "gnome", "gnome-session", "/usr/share/xsessions/gnome.desktop", false),
            DesktopDescriptor::new(Protocol::Wayland, "sway", "sway", "/usr/share/wayland-sessions/sway.desktop", false),
        ]
    }

    #[test]
    fn invalid_choices_are_prompted_again() {
        let (mut selector, output) = selector("7\nfoo\n1\n");
        let desktop = selector.select(&desktops(), &Settings::default()).unwrap();

        assert_eq!(desktop.name(), "sway");
        let text = output.text();
        assert!(text.contains("[0] gnome (X11), [1] sway (Wayland)"));
        assert!(text.contains("Invalid choice \"7\""));
        assert!(text.contains("Invalid choice \"foo\""));
    }

    #[test]
    fn vertical_layout_lists_one_desktop_per_line() {
        let (mut selector, output) = selector("0\n");
        let settings = Settings { vertical_selection: true, ..Settings::default() };
        selector.select(&desktops(), &settings).unwrap();

        assert!(output.text().starts_with("[0] gnome (X11)\n[1] sway (Wayland)\n"));
    }

    #[test]
    fn autologin_session_is_selected_without_prompting() {
        let (mut selector, output) = selector("");
        let settings = Settings {
            autologin: true,
            autologin_session: "Sway".to_string(),
            ..Settings::default()
        };

        assert_eq!(selector.select(&desktops(), &settings).unwrap().name(), "sway");
        assert!(output.text().is_empty());
    }

    #[test]
    fn end_of_input_is_a_resolution_error() {
        let (mut selector, _) = selector("");
        let result = selector.select(&desktops(), &Settings::default());
        assert!(matches!(result, Err(EmpttyError::ResolutionError(_))));

        let result = selector.select(&[], &Settings::default());
        assert!(matches!(result, Err(EmpttyError::ResolutionError(_))));
    }
}
