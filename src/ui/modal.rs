use crate::app::AppState;
use crate::notifications::NotificationHost;
use crate::persistence::Storage;
use crate::ui::{
    layout::create_modal_area,
    styles::{modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the delete confirmation modal
pub fn render_delete_modal<S: Storage, H: NotificationHost>(f: &mut Frame, app: &AppState<S, H>, area: Rect) {
    let Some(activity) = app.selected_activity() else {
        return;
    };

    let modal_area = create_modal_area(area, 9);
    f.render_widget(Clear, modal_area);

    let lines = vec![
        Line::raw(""),
        Line::raw(format!("  Delete \"{}\"?", activity.title)),
        Line::raw("  Its reminder is cancelled and its history is lost."),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  [y]", modal_title_style()),
            Span::raw(" Delete  "),
            Span::styled("[n]", modal_title_style()),
            Span::raw(" Keep"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Delete Activity ", modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}
