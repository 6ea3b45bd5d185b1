use std::fs;
use std::path::Path;

use freedesktop_file_parser::{self as parser, EntryType};

use super::{DesktopDescriptor, Protocol};

/// Loads the session descriptors installed in the X11 and Wayland session directories.
/// X11 sessions come first, each group sorted by name.
pub fn load_installed_desktops(xsessions_dir: &str, wayland_sessions_dir: &str) -> Vec<DesktopDescriptor> {
    let mut desktops = load_desktop_dir(xsessions_dir, Protocol::X11);
    desktops.extend(load_desktop_dir(wayland_sessions_dir, Protocol::Wayland));
    desktops
}

fn load_desktop_dir(dir: &str, protocol: Protocol) -> Vec<DesktopDescriptor> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!("Could not read session directory {}: {}", dir, error);
            return Vec::new();
        }
    };

    let mut desktops: Vec<DesktopDescriptor> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|extension| extension == "desktop").unwrap_or(false))
        .filter_map(|path| load_desktop_file(&path, protocol))
        .collect();

    desktops.sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
    desktops
}

/// Parses the `[Desktop Entry]` group of a freedesktop session file.
/// Hidden entries, entries that are not applications and entries without `Exec` are skipped.
pub fn load_desktop_file(path: &Path, protocol: Protocol) -> Option<DesktopDescriptor> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            warn!("Could not read desktop file {}: {}", path.display(), error);
            return None;
        }
    };

    let entry = match parser::parse(&content) {
        Ok(parsed) => parsed.entry,
        Err(error) => {
            warn!("Invalid desktop file {}: {}", path.display(), error);
            return None;
        }
    };

    if entry.hidden.unwrap_or(false) || entry.no_display.unwrap_or(false) {
        return None;
    }

    let exec = match entry.entry_type {
        EntryType::Application(app) => app.exec.unwrap_or_default(),
        _ => {
            debug!("Desktop file {} is not an application", path.display());
            return None;
        }
    };
    if exec.trim().is_empty() {
        return None;
    }

    let mut name = entry.name.default;
    if name.is_empty() {
        name = path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    Some(DesktopDescriptor::new(protocol, &name, exec.trim(), &path.to_string_lossy(), false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_desktops_are_grouped_by_protocol() {
        let dir = tempfile::tempdir().unwrap();
        let xsessions = dir.path().join("xsessions");
        let wayland = dir.path().join("wayland-sessions");
        fs::create_dir(&xsessions).unwrap();
        fs::create_dir(&wayland).unwrap();

        fs::write(xsessions.join("xfce.desktop"), "[Desktop Entry]\nType=Application\nName=xfce\nName[de]=Xfce Sitzung\nExec=startxfce4\n").unwrap();
        fs::write(xsessions.join("i3.desktop"), "[Desktop Entry]\nType=Application\nName=i3\nExec=i3\n").unwrap();
        fs::write(xsessions.join("hidden.desktop"), "[Desktop Entry]\nType=Application\nName=hidden\nExec=hidden\nHidden=true\n").unwrap();
        fs::write(xsessions.join("nodisplay.desktop"), "[Desktop Entry]\nType=Application\nName=nodisplay\nExec=nodisplay\nNoDisplay=true\n").unwrap();
        fs::write(xsessions.join("link.desktop"), "[Desktop Entry]\nType=Link\nName=link\nURL=https://example.org\n").unwrap();
        fs::write(xsessions.join("notes.txt"), "Name=notes\nExec=notes\n").unwrap();
        fs::write(wayland.join("sway.desktop"), "[Desktop Entry]\nType=Application\nName=Sway\nExec=sway\nActions=x;\n\n[Desktop Action x]\nName=Other\nExec=other\n").unwrap();

        let desktops = load_installed_desktops(xsessions.to_str().unwrap(), wayland.to_str().unwrap());
        let names: Vec<&str> = desktops.iter().map(|desktop| desktop.name()).collect();

        assert_eq!(names, vec!["i3", "xfce", "Sway"]);
        assert_eq!(desktops[1].exec(), "startxfce4");
        assert_eq!(desktops[2].protocol(), Protocol::Wayland);
        assert_eq!(desktops[2].exec(), "sway");
    }

    #[test]
    fn missing_directories_are_empty() {
        assert!(load_installed_desktops("/nonexistent/xsessions", "/nonexistent/wayland").is_empty());
    }
}
