use std::fmt;

/// The display protocol a desktop session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    X11,
    Wayland,
}

impl Protocol {
    /// Parses the `Environment` value of a user desktop file.
    pub fn parse(value: &str) -> Option<Protocol> {
        match value.trim().to_lowercase().as_str() {
            "xorg" | "x11" => Some(Protocol::X11),
            "wayland" => Some(Protocol::Wayland),
            _ => None,
        }
    }

    /// Returns the value used for `XDG_SESSION_TYPE`.
    pub fn session_type(&self) -> &'static str {
        match self {
            Protocol::X11 => "x11",
            Protocol::Wayland => "wayland",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::X11 => write!(formatter, "X11"),
            Protocol::Wayland => write!(formatter, "Wayland"),
        }
    }
}

/// The `DesktopDescriptor` struct describes one selectable graphical session.
#[derive(Debug, Clone, PartialEq)]
pub struct DesktopDescriptor {
    protocol: Protocol,
    name: String,
    exec: String,
    path: String,
    selection: bool,
}

impl DesktopDescriptor {
    /// Creates a new `DesktopDescriptor` instance.
    ///
    /// # Arguments
    /// * `protocol` - The display protocol of the session.
    /// * `name` - The human readable name.
    /// * `exec` - The command line starting the session.
    /// * `path` - The path of the file describing the session.
    /// * `selection` - Whether the session defers to a desktop chosen at login.
    pub fn new(protocol: Protocol, name: &str, exec: &str, path: &str, selection: bool) -> Self {
        Self {
            protocol,
            name: name.to_string(),
            exec: exec.to_string(),
            path: path.to_string(),
            selection,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exec(&self) -> &str {
        &self.exec
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_selection(&self) -> bool {
        self.selection
    }
}

impl fmt::Display for DesktopDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.name, self.protocol)
    }
}

/// A desktop after resolution: either a plain descriptor, or a selection menu together
/// with the child chosen at login. The menu's own protocol and exec are never used.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedDesktop {
    Leaf(DesktopDescriptor),
    Menu {
        menu: DesktopDescriptor,
        child: DesktopDescriptor,
    },
}

impl ResolvedDesktop {
    /// Returns the effective display protocol.
    pub fn protocol(&self) -> Protocol {
        match self {
            ResolvedDesktop::Leaf(desktop) => desktop.protocol(),
            ResolvedDesktop::Menu { child, .. } => child.protocol(),
        }
    }

    /// Returns the session name, preferring the top level descriptor and
    /// falling back to the chosen child when the menu has no name.
    pub fn session_name(&self) -> Option<&str> {
        let (desktop, child) = match self {
            ResolvedDesktop::Leaf(desktop) => (desktop, None),
            ResolvedDesktop::Menu { menu, child } => (menu, Some(child)),
        };

        if !desktop.name().is_empty() {
            return Some(desktop.name());
        }
        child.map(|child| child.name()).filter(|name| !name.is_empty())
    }

    /// Returns the top level descriptor.
    pub fn descriptor(&self) -> &DesktopDescriptor {
        match self {
            ResolvedDesktop::Leaf(desktop) => desktop,
            ResolvedDesktop::Menu { menu, .. } => menu,
        }
    }

    pub fn child(&self) -> Option<&DesktopDescriptor> {
        match self {
            ResolvedDesktop::Leaf(_) => None,
            ResolvedDesktop::Menu { child, .. } => Some(child),
        }
    }
}

impl fmt::Display for ResolvedDesktop {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedDesktop::Leaf(desktop) => write!(formatter, "{}", desktop),
            ResolvedDesktop::Menu { menu, child } => write!(formatter, "{} -> {}", menu.path(), child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_takes_protocol_from_the_child() {
        let menu = DesktopDescriptor::new(Protocol::X11, "", "", "/home/alice/.config/emptty", true);
        let child = DesktopDescriptor::new(Protocol::Wayland, "Sway", "sway", "/usr/share/wayland-sessions/sway.desktop", false);
        let desktop = ResolvedDesktop::Menu { menu, child };

        assert_eq!(desktop.protocol(), Protocol::Wayland);
        assert_eq!(desktop.session_name(), Some("Sway"));
    }

    #[test]
    fn named_menu_keeps_its_name() {
        let menu = DesktopDescriptor::new(Protocol::X11, "Custom", "", "/home/alice/.config/emptty", true);
        let child = DesktopDescriptor::new(Protocol::Wayland, "Sway", "sway", "", false);
        let desktop = ResolvedDesktop::Menu { menu, child };

        assert_eq!(desktop.session_name(), Some("Custom"));
    }

    #[test]
    fn protocol_values_are_parsed() {
        assert_eq!(Protocol::parse("xorg"), Some(Protocol::X11));
        assert_eq!(Protocol::parse(" Wayland "), Some(Protocol::Wayland));
        assert_eq!(Protocol::parse("mir"), None);
        assert_eq!(Protocol::Wayland.session_type(), "wayland");
    }
}
