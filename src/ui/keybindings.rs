use crate::app::StatusMessage;
use crate::domain::UiMode;
use crate::ui::styles::{default_style, error_style, hint_style};
use ratatui::{layout::Rect, text::{Line, Span}, widgets::Paragraph, Frame};

/// Render the keybindings hint bar
pub fn render_keybindings(f: &mut Frame, mode: UiMode, area: Rect) {
    let hints = match mode {
        UiMode::Normal => Line::from(vec![
            Span::raw(" ↑/↓ select   "),
            Span::raw("a add   "),
            Span::raw("e edit   "),
            Span::raw("Space done today   "),
            Span::raw("x delete   "),
            Span::raw("r reschedule   "),
            Span::raw("q quit"),
        ]),
        UiMode::AddingActivity | UiMode::EditingActivity => Line::from(vec![
            Span::raw(" Tab/↓ next field   "),
            Span::raw("Shift+Tab/↑ previous   "),
            Span::raw("Enter save   "),
            Span::raw("Esc cancel"),
        ]),
        UiMode::ConfirmDelete => Line::raw(" y confirm   n/Esc cancel"),
    };

    let paragraph = Paragraph::new(hints).style(hint_style());
    f.render_widget(paragraph, area);
}

/// Render the one-line status message
pub fn render_status_bar(f: &mut Frame, status: Option<&StatusMessage>, area: Rect) {
    let Some(status) = status else {
        return;
    };

    let style = if status.is_error {
        error_style()
    } else {
        default_style()
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {}", status.text), style)));
    f.render_widget(paragraph, area);
}
