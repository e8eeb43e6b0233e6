use crate::app::AppState;
use crate::domain::dates::DayMark;
use crate::domain::{date_range, format_date_in_words, Activity};
use crate::notifications::NotificationHost;
use crate::persistence::Storage;
use crate::ui::styles::{
    border_style, default_style, done_style, hint_style, range_edge_style, range_inner_style,
    title_style,
};
use chrono::{Datelike, Duration, Months, NaiveDate};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::collections::BTreeMap;

/// Render the details pane for the selected activity
pub fn render_details_pane<S: Storage, H: NotificationHost>(f: &mut Frame, app: &AppState<S, H>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(" Details ", title_style()));

    let Some(activity) = app.selected_activity() else {
        f.render_widget(Paragraph::new("No activity selected").block(block), area);
        return;
    };

    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Title:    ", title_style()),
        Span::raw(activity.title.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Start:    ", title_style()),
        Span::raw(format_date_in_words(activity.start_date)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("End:      ", title_style()),
        Span::raw(
            activity
                .end_date
                .map(format_date_in_words)
                .unwrap_or_else(|| "Ongoing".to_string()),
        ),
    ]));

    let reminder = match &activity.notification_id {
        Some(_) => format!("{} daily", activity.reminder_label()),
        None => format!("{} (not scheduled)", activity.reminder_label()),
    };
    lines.push(Line::from(vec![
        Span::styled("Reminder: ", title_style()),
        Span::raw(reminder),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Done:     ", title_style()),
        Span::raw(format!("{} day(s)", activity.completed_days())),
    ]));
    lines.push(Line::raw(""));

    match activity.description.as_deref() {
        Some(description) => {
            for text in description.lines() {
                lines.push(Line::raw(text.to_string()));
            }
        }
        None => lines.push(Line::from(Span::styled("No description", hint_style()))),
    }
    lines.push(Line::raw(""));

    lines.extend(calendar_lines(activity, app.today));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}

/// Month grid for the month containing `today`, with the activity's
/// window and completed days highlighted.
fn calendar_lines(activity: &Activity, today: NaiveDate) -> Vec<Line<'static>> {
    // Open-ended windows are drawn up to today
    let end = activity.end_date.unwrap_or(today.max(activity.start_date));

    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    let marks = month_marks(activity.start_date, end, first, last);
    let mut lines = vec![
        Line::from(Span::styled(today.format("%B %Y").to_string(), title_style())),
        Line::from(Span::styled("Mo Tu We Th Fr Sa Su".to_string(), hint_style())),
    ];

    let mut spans = Vec::new();
    for _ in 0..first.weekday().num_days_from_monday() {
        spans.push(Span::raw("   "));
    }

    let mut day = first;
    while day.month() == first.month() {
        let style = if activity.is_completed_on(day) {
            done_style()
        } else {
            match marks.get(&day) {
                Some(mark) if mark.is_inner() => range_inner_style(),
                Some(_) => range_edge_style(),
                None => default_style(),
            }
        };
        let style = if day == today {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        };

        spans.push(Span::styled(format!("{:>2}", day.day()), style));
        spans.push(Span::styled(" ", Style::default()));

        if day.weekday().num_days_from_monday() == 6 {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
        day += Duration::days(1);
    }

    if !spans.is_empty() {
        lines.push(Line::from(spans));
    }
    lines
}

/// Marks for the part of `[start, end]` inside `[first, last]`. Start and
/// end flags only appear on the window's own endpoints.
fn month_marks(
    start: NaiveDate,
    end: NaiveDate,
    first: NaiveDate,
    last: NaiveDate,
) -> BTreeMap<NaiveDate, DayMark> {
    if end < start {
        return date_range(start, end);
    }

    let from = start.max(first);
    let to = end.min(last);
    if from > to {
        return BTreeMap::new();
    }

    let mut marks = date_range(from, to);
    if from != start {
        marks.entry(from).or_default().starting_day = false;
    }
    if to != end {
        marks.entry(to).or_default().ending_day = false;
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_date, NewActivity};
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn span_for_day<'a>(lines: &'a [Line<'static>], day: u32) -> &'a Span<'static> {
        let label = format!("{:>2}", day);
        lines
            .iter()
            .skip(2)
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == label)
            .unwrap()
    }

    #[test]
    fn test_calendar_shape() {
        let activity = NewActivity {
            title: "Read".to_string(),
            start_date: date("2025-01-05"),
            end_date: Some(date("2025-01-09")),
            ..NewActivity::default()
        }
        .into_activity("1".to_string());

        // January 2025 starts on a Wednesday and spans five weeks
        let lines = calendar_lines(&activity, date("2025-01-15"));
        assert_eq!(lines.len(), 2 + 5);
        let first_week: String = lines[2].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first_week, "       1  2  3  4  5 ");
    }

    #[test]
    fn test_calendar_marks_range_and_completion() {
        let mut activity = NewActivity {
            title: "Read".to_string(),
            start_date: date("2025-01-05"),
            end_date: Some(date("2025-01-09")),
            ..NewActivity::default()
        }
        .into_activity("1".to_string());
        activity.completion.insert(date("2025-01-07"), true);

        let lines = calendar_lines(&activity, date("2025-01-20"));
        assert_eq!(span_for_day(&lines, 5).style, range_edge_style());
        assert_eq!(span_for_day(&lines, 6).style, range_inner_style());
        assert_eq!(span_for_day(&lines, 7).style, done_style());
        assert_eq!(span_for_day(&lines, 9).style, range_edge_style());
        assert_eq!(span_for_day(&lines, 10).style, default_style());
        assert_eq!(
            span_for_day(&lines, 20).style,
            default_style().add_modifier(Modifier::UNDERLINED)
        );
    }

    #[test]
    fn test_calendar_window_spanning_months() {
        let activity = NewActivity {
            title: "Read".to_string(),
            start_date: date("2024-12-20"),
            end_date: Some(date("2025-02-10")),
            ..NewActivity::default()
        }
        .into_activity("1".to_string());

        let lines = calendar_lines(&activity, date("2025-01-15"));
        assert_eq!(span_for_day(&lines, 1).style, range_inner_style());
        assert_eq!(span_for_day(&lines, 31).style, range_inner_style());

        let lines = calendar_lines(&activity, date("2025-02-03"));
        assert_eq!(span_for_day(&lines, 1).style, range_inner_style());
        assert_eq!(span_for_day(&lines, 10).style, range_edge_style());
        assert_eq!(span_for_day(&lines, 11).style, default_style());
    }

    #[test]
    fn test_calendar_very_long_window_only_expands_the_month() {
        let activity = NewActivity {
            title: "Forever".to_string(),
            start_date: date("2025-01-01"),
            end_date: Some(date("9999-12-31")),
            ..NewActivity::default()
        }
        .into_activity("1".to_string());

        let marks = month_marks(
            activity.start_date,
            date("9999-12-31"),
            date("2025-06-01"),
            date("2025-06-30"),
        );
        assert_eq!(marks.len(), 30);
        assert!(marks.values().all(DayMark::is_inner));

        let lines = calendar_lines(&activity, date("2025-06-15"));
        assert_eq!(span_for_day(&lines, 1).style, range_inner_style());
        assert_eq!(span_for_day(&lines, 30).style, range_inner_style());
    }

    #[test]
    fn test_month_marks_outside_window() {
        let marks = month_marks(
            date("2025-01-05"),
            date("2025-01-09"),
            date("2025-03-01"),
            date("2025-03-31"),
        );
        assert!(marks.is_empty());
    }
}
