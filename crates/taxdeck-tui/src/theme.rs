//! Palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ───────────────────────────────────────────────────────────

pub const ACCENT_PURPLE: Color = Color::Rgb(189, 147, 249); // #bd93f9
pub const ACCENT_CYAN: Color = Color::Rgb(139, 233, 253); // #8be9fd
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363
pub const WARNING_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default()
        .fg(ACCENT_CYAN)
        .add_modifier(Modifier::BOLD)
}

/// Border for a focused panel or field.
pub fn border_focused() -> Style {
    Style::default().fg(ACCENT_PURPLE)
}

/// Border for an unfocused panel or field.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(ACCENT_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Normal table row text.
pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Selected / highlighted table row.
pub fn table_selected() -> Style {
    Style::default()
        .fg(ACCENT_PURPLE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Inline error messages.
pub fn error_text() -> Style {
    Style::default().fg(ERROR_RED)
}

/// Non-fatal warnings (e.g. the country picker failing to load).
pub fn warning_text() -> Style {
    Style::default().fg(WARNING_YELLOW)
}

/// Form field labels.
pub fn field_label() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default()
        .fg(ACCENT_CYAN)
        .add_modifier(Modifier::BOLD)
}
