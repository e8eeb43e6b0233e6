use crate::app::AppState;
use crate::domain::{format_range_in_words, parse_date, FormField, UiMode};
use crate::notifications::NotificationHost;
use crate::persistence::Storage;
use crate::ui::{
    layout::create_modal_area,
    styles::{hint_style, modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the add/edit activity form
pub fn render_input_form<S: Storage, H: NotificationHost>(f: &mut Frame, app: &AppState<S, H>, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };

    let modal_area = create_modal_area(area, 20);
    f.render_widget(Clear, modal_area);

    let title_text = if app.ui_mode == UiMode::EditingActivity {
        " Edit Activity "
    } else {
        " Add Activity "
    };

    let mut lines = vec![Line::raw("")];

    for field in FormField::all() {
        let editing = *field == form.field;
        let label = if editing {
            format!("{}: (editing)", field.label())
        } else {
            format!("{}:", field.label())
        };
        lines.push(Line::raw(label));
        lines.push(Line::from(vec![
            Span::raw("> "),
            Span::styled(form.value(*field).to_string(), modal_title_style()),
            if editing {
                Span::styled("█", modal_title_style()) // Cursor
            } else {
                Span::raw("")
            },
        ]));
    }

    lines.push(Line::raw(""));
    // Range preview once both dates parse
    if let Some(start) = parse_date(&form.start_date) {
        let end = parse_date(&form.end_date);
        lines.push(Line::from(Span::styled(
            format_range_in_words(start, end),
            hint_style(),
        )));
    }
    lines.push(Line::raw("Tab to switch fields  ·  Enter to save  ·  Esc to cancel"));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title_text, modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}
