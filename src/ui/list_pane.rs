use crate::app::AppState;
use crate::domain::{format_range_in_words, Activity};
use crate::notifications::NotificationHost;
use crate::persistence::Storage;
use crate::ui::styles::{
    border_style, default_style, done_style, hint_style, inactive_style, selected_style,
    title_style,
};
use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Render the activity list pane
pub fn render_list_pane<S: Storage, H: NotificationHost>(f: &mut Frame, app: &AppState<S, H>, area: Rect) {
    let title = format!(" Activities ({}) ", app.today.format("%a %b %d"));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(title, title_style()));

    if !app.store.has_hydrated() {
        f.render_widget(Paragraph::new(" Loading...").block(block), area);
        return;
    }

    if app.activities().is_empty() {
        let empty = Paragraph::new(" No activities yet. Press 'a' to add one.")
            .style(hint_style())
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .activities()
        .iter()
        .enumerate()
        .map(|(idx, activity)| {
            let line = create_activity_line(activity, app.today);
            let style = if idx == app.selected_index {
                selected_style()
            } else if !activity.is_active_on(app.today) {
                inactive_style()
            } else {
                default_style()
            };

            ListItem::new(line).style(style)
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

/// Format: [✓] Read  ⏰ 09:00  Jan 5, 2025 - Ongoing  🔕
fn create_activity_line(activity: &Activity, today: NaiveDate) -> Line<'static> {
    let mut spans = Vec::new();

    if activity.is_completed_on(today) {
        spans.push(Span::styled("[✓] ".to_string(), done_style()));
    } else if activity.is_active_on(today) {
        spans.push(Span::raw("[ ] ".to_string()));
    } else {
        spans.push(Span::raw("[-] ".to_string()));
    }

    spans.push(Span::raw(activity.title.clone()));
    spans.push(Span::raw(format!("  ⏰ {}", activity.reminder_label())));
    spans.push(Span::raw(format!(
        "  {}",
        format_range_in_words(activity.start_date, activity.end_date)
    )));

    // No reminder registered
    if activity.notification_id.is_none() {
        spans.push(Span::raw("  🔕".to_string()));
    }

    Line::from(spans)
}
