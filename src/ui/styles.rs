use ratatui::style::{Color, Modifier, Style};

/// Default text style
pub fn default_style() -> Style {
    Style::default().fg(Color::White)
}

/// Selected row highlight style
pub fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::LightCyan)
        .add_modifier(Modifier::BOLD)
}

/// Title style for panes
pub fn title_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Border style
pub fn border_style() -> Style {
    Style::default().fg(Color::Gray)
}

/// Modal background style
pub fn modal_bg_style() -> Style {
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

/// Modal title style
pub fn modal_title_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

/// Keybinding hint style
pub fn hint_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Error message style
pub fn error_style() -> Style {
    Style::default()
        .fg(Color::Red)
        .add_modifier(Modifier::BOLD)
}

/// Completed day style
pub fn done_style() -> Style {
    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
}

/// Range endpoints on the calendar
pub fn range_edge_style() -> Style {
    Style::default().fg(Color::Black).bg(Color::Cyan)
}

/// Days between the range endpoints
pub fn range_inner_style() -> Style {
    Style::default().fg(Color::Cyan)
}

/// Activities outside their date window
pub fn inactive_style() -> Style {
    Style::default().fg(Color::Gray)
}
