use std::fs;

use crate::common::{PathSettings, Result, Settings};
use super::{load_installed_desktops, DesktopDescriptor, DesktopSelector, Protocol, ResolvedDesktop};

/// User desktop files, relative to the home directory, in order of preference.
pub static USER_DESKTOP_FILES: [&str; 2] = ["/.config/emptty", "/.emptty"];

/// The `DesktopResolver` struct resolves the desktop session of a user: the one saved in
/// the user's desktop file, or one chosen from the installed sessions.
pub struct DesktopResolver {
    xsessions_dir: String,
    wayland_sessions_dir: String,
}

impl DesktopResolver {
    pub fn new(paths: &PathSettings) -> Self {
        Self {
            xsessions_dir: paths.xsessions.clone(),
            wayland_sessions_dir: paths.wayland_sessions.clone(),
        }
    }

    /// Reads the user's desktop file.
    ///
    /// # Arguments
    /// * `home` - The home directory of the user.
    ///
    /// # Returns
    /// The saved desktop, if the file describes one, and the locale it overrides, if any.
    pub fn resolve(&self, home: &str) -> (Option<DesktopDescriptor>, Option<String>) {
        for file in USER_DESKTOP_FILES.iter() {
            let path = format!("{}{}", home, file);
            if let Ok(content) = fs::read_to_string(&path) {
                debug!("Loading user desktop file {}", path);
                return parse_user_desktop(&path, &content);
            }
        }
        (None, None)
    }

    /// Returns the installed desktop sessions, X11 ones first.
    pub fn installed_desktops(&self) -> Vec<DesktopDescriptor> {
        load_installed_desktops(&self.xsessions_dir, &self.wayland_sessions_dir)
    }

    /// Resolves the final desktop of a user. The selector is only used when the user has no
    /// saved desktop or when the saved desktop is a selection menu.
    ///
    /// # Returns
    /// The resolved desktop and the user's locale override, if any.
    pub fn resolve_desktop(&self, home: &str, settings: &Settings, selector: &mut DesktopSelector) -> Result<(ResolvedDesktop, Option<String>)> {
        let (saved, lang) = self.resolve(home);

        let desktop = match saved {
            Some(desktop) if !desktop.is_selection() => ResolvedDesktop::Leaf(desktop),
            Some(menu) => {
                let child = selector.select(&self.installed_desktops(), settings)?;
                ResolvedDesktop::Menu { menu, child }
            }
            None => ResolvedDesktop::Leaf(selector.select(&self.installed_desktops(), settings)?),
        };

        info!("Resolved desktop {}", desktop);
        Ok((desktop, lang))
    }
}

/// Parses a user desktop file. Lines are `Key=Value`, optionally commented out with `#` so
/// that the file can also be an executable script.
fn parse_user_desktop(path: &str, content: &str) -> (Option<DesktopDescriptor>, Option<String>) {
    let mut name = String::new();
    let mut exec = String::new();
    let mut protocol = None;
    let mut lang = None;
    let mut selection = false;

    for line in content.lines() {
        let line = line.trim().trim_start_matches('#').trim();
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim();
            match key.trim().to_uppercase().as_str() {
                "NAME" => name = value.to_string(),
                "EXEC" => exec = value.to_string(),
                "ENVIRONMENT" => protocol = Protocol::parse(value),
                "LANG" if !value.is_empty() => lang = Some(value.to_string()),
                "SELECTION" => selection = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }
    }

    if !selection && exec.is_empty() && protocol.is_none() {
        return (None, lang);
    }

    let desktop = DesktopDescriptor::new(protocol.unwrap_or(Protocol::X11), &name, &exec, path, selection);
    (Some(desktop), lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::desktop_selector::tests::selector;

    struct Fixture {
        _dir: tempfile::TempDir,
        home: String,
        resolver: DesktopResolver,
    }

    fn fixture(desktops: &[(&str, &str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let xsessions = dir.path().join("xsessions");
        let wayland = dir.path().join("wayland-sessions");
        for path in [&home, &xsessions, &wayland] {
            fs::create_dir_all(path).unwrap();
        }

        for (kind, name, exec) in desktops {
            let dir = if *kind == "x11" { &xsessions } else { &wayland };
            fs::write(dir.join(format!("{}.desktop", name)), format!("[Desktop Entry]\nType=Application\nName={}\nExec={}\n", name, exec)).unwrap();
        }

        let paths = PathSettings {
            xsessions: xsessions.to_string_lossy().into_owned(),
            wayland_sessions: wayland.to_string_lossy().into_owned(),
            ..PathSettings::default()
        };

        Fixture {
            home: home.to_string_lossy().into_owned(),
            resolver: DesktopResolver::new(&paths),
            _dir: dir,
        }
    }

    #[test]
    fn single_desktop_is_chosen_without_prompting() {
        let fixture = fixture(&[("x11", "xfce", "startxfce4")]);
        let (mut selector, output) = selector("");
        let settings = Settings { autologin: true, default_user: "alice".to_string(), ..Settings::default() };

        let (desktop, lang) = fixture.resolver.resolve_desktop(&fixture.home, &settings, &mut selector).unwrap();

        assert_eq!(desktop.protocol(), Protocol::X11);
        assert_eq!(desktop.descriptor().exec(), "startxfce4");
        assert_eq!(lang, None);
        assert!(output.text().is_empty());
    }

    #[test]
    fn selection_menu_inherits_the_protocol_of_the_chosen_child() {
        let fixture = fixture(&[("x11", "gnome", "gnome-session"), ("wayland", "sway", "sway")]);
        let user_file = format!("{}/.config/emptty", fixture.home);
        fs::create_dir_all(format!("{}/.config", fixture.home)).unwrap();
        fs::write(&user_file, "#!/bin/sh\n# Selection=true\n# Environment=xorg\n# Lang=cs_CZ.UTF-8\nexec \"$@\"\n").unwrap();

        let (mut selector, output) = selector("1\n");
        let (desktop, lang) = fixture.resolver.resolve_desktop(&fixture.home, &Settings::default(), &mut selector).unwrap();

        assert!(output.text().contains("[1] sway (Wayland)"));
        assert_eq!(desktop.protocol(), Protocol::Wayland);
        assert_eq!(desktop.descriptor().path(), user_file);
        assert_eq!(desktop.child().map(|child| child.exec()), Some("sway"));
        assert_eq!(lang.as_deref(), Some("cs_CZ.UTF-8"));
    }

    #[test]
    fn saved_desktop_skips_the_chooser() {
        let fixture = fixture(&[("x11", "gnome", "gnome-session"), ("wayland", "sway", "sway")]);
        fs::write(format!("{}/.emptty", fixture.home), "Name=Sway\nExec=sway --unsupported-gpu\nEnvironment=wayland\n").unwrap();

        let (mut selector, output) = selector("");
        let (desktop, _) = fixture.resolver.resolve_desktop(&fixture.home, &Settings::default(), &mut selector).unwrap();

        assert_eq!(desktop, ResolvedDesktop::Leaf(DesktopDescriptor::new(
            Protocol::Wayland, "Sway", "sway --unsupported-gpu", &format!("{}/.emptty", fixture.home), false)));
        assert!(output.text().is_empty());
    }

    #[test]
    fn user_file_with_only_a_locale() {
        let (desktop, lang) = parse_user_desktop("/home/alice/.emptty", "LANG=de_DE.UTF-8\n");
        assert_eq!(desktop, None);
        assert_eq!(lang.as_deref(), Some("de_DE.UTF-8"));
    }
}
