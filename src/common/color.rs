/// Terminal colours configurable through `fg_color` and `bg_color`.
const COLORS: [&str; 16] = [
    "BLACK", "RED", "GREEN", "YELLOW", "BLUE", "PURPLE", "CYAN", "WHITE",
    "DARK_GRAY", "LIGHT_RED", "LIGHT_GREEN", "LIGHT_YELLOW", "LIGHT_BLUE", "LIGHT_PURPLE", "LIGHT_CYAN", "LIGHT_WHITE",
];

pub const RESET: &str = "\x1b[0m";

/// Returns the ANSI escape sequence of a colour name, or `None` for unknown or empty names.
///
/// # Arguments
/// * `name` - The colour name, case-insensitive.
/// * `background` - Whether the background rather than the foreground colour is wanted.
pub fn ansi_code(name: &str, background: bool) -> Option<String> {
    let name = name.trim().to_uppercase();
    let index = COLORS.iter().position(|color| *color == name)?;

    let base = match (index < 8, background) {
        (true, false) => 30,
        (true, true) => 40,
        (false, false) => 90,
        (false, true) => 100,
    };
    Some(format!("\x1b[{}m", base + (index % 8)))
}

/// Wraps text with the configured colours. Text is returned unchanged when no colour is set.
pub fn paint(text: &str, fg_color: &str, bg_color: &str) -> String {
    let fg = ansi_code(fg_color, false);
    let bg = ansi_code(bg_color, true);
    if fg.is_none() && bg.is_none() {
        return text.to_string();
    }

    format!("{}{}{}{}", fg.unwrap_or_default(), bg.unwrap_or_default(), text, RESET)
}
