pub use desktop::{DesktopDescriptor, Protocol, ResolvedDesktop};
pub use desktop_loader::{load_desktop_file, load_installed_desktops};
pub use desktop_resolver::DesktopResolver;
pub use desktop_selector::DesktopSelector;

mod desktop;
mod desktop_loader;
mod desktop_resolver;
pub(crate) mod desktop_selector;
