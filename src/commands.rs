//! One-shot command handlers for the CLI.

use crate::app::{ActivityDraft, AppState, RescheduleOutcome};
use crate::config::{save_config, AppConfig};
use crate::domain::{format_range_in_words, parse_date, parse_reminder_time, today, Activity};
use crate::notifications::{LocalHost, Notification, NotificationService};
use crate::persistence::{reminders_file, FileStorage};
use crate::store::ActivityStore;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, TimeZone};
use std::path::Path;
use tracing::{debug, info, warn};

/// The application wired to files in the data directory
pub type App = AppState<FileStorage, LocalHost>;

/// Build the app on top of `data_dir` and load stored activities
pub fn open_app(data_dir: &Path, config: &AppConfig) -> Result<App> {
    let mut store = ActivityStore::new(FileStorage::new(data_dir));
    store
        .hydrate()
        .with_context(|| format!("Failed to load activities from {}", data_dir.display()))?;
    store.subscribe(|activities| debug!(count = activities.len(), "activities changed"));

    let host = LocalHost::new(reminders_file(data_dir), config.notifications_enabled)
        .with_desktop_alerts(config.desktop_alerts);
    let notifications =
        NotificationService::new(host).with_reminder_body(config.reminder_body.clone());

    Ok(AppState::new(store, notifications).with_default_reminder(config.default_reminder_time()))
}

/// Deliver reminders that are due now
pub fn deliver_due(app: &mut App) -> Vec<Notification> {
    match app.notifications.host_mut().fire_due(&Local::now()) {
        Ok(delivered) => delivered,
        Err(e) => {
            warn!(error = %e, "failed to check due reminders");
            Vec::new()
        }
    }
}

fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| anyhow!("Invalid date '{}'. Use YYYY-MM-DD", value))
}

fn find_activity<'a>(app: &'a App, id: &str) -> Result<&'a Activity> {
    app.store
        .get(id)
        .ok_or_else(|| anyhow!("No activity with id {}", id))
}

fn activity_row(activity: &Activity, today: NaiveDate) -> String {
    let mark = if activity.is_completed_on(today) {
        "x"
    } else if activity.is_active_on(today) {
        " "
    } else {
        "-"
    };
    let reminder = if activity.notification_id.is_some() {
        activity.reminder_label()
    } else {
        format!("{} (off)", activity.reminder_label())
    };

    format!(
        "[{}] {}  {}  {}  ⏰ {}",
        mark,
        activity.id,
        activity.title,
        format_range_in_words(activity.start_date, activity.end_date),
        reminder
    )
}

pub fn list(app: &App) {
    if app.activities().is_empty() {
        println!("No activities yet. Add one with 'habit add <title>'.");
        return;
    }

    let today = today();
    for activity in app.activities() {
        println!("{}", activity_row(activity, today));
    }

    match app.notifications.host().pending() {
        Ok(pending) => {
            if let Some(next) = pending.first() {
                if let Some(at) = Local.timestamp_millis_opt(next.trigger.timestamp).single() {
                    println!();
                    println!("Next reminder: {} at {}", next.notification.title, at.format("%a %H:%M"));
                }
            }
        }
        Err(e) => warn!(error = %e, "could not read reminder registry"),
    }
}

pub struct AddArgs {
    pub title: String,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub at: Option<String>,
}

pub fn add(app: &mut App, args: AddArgs) -> Result<String> {
    let start_date = match &args.start {
        Some(value) => parse_date_arg(value)?,
        None => today(),
    };
    let end_date = args.end.as_deref().map(parse_date_arg).transpose()?;
    let (hour, minute) = match &args.at {
        Some(value) => parse_reminder_time(value)
            .ok_or_else(|| anyhow!("Invalid reminder time '{}'. Use HH:MM", value))?,
        None => app.default_reminder,
    };

    let draft = ActivityDraft::new(
        &args.title,
        args.description.as_deref(),
        start_date,
        end_date,
        hour,
        minute,
    )?;

    let saved = app.create_activity(draft).context("Failed to save activity")?;
    if let Some(e) = &saved.reminder_error {
        eprintln!("Warning: saved without a reminder: {}", e);
    }
    println!("Added activity {}", saved.id);
    Ok(saved.id)
}

pub fn done(app: &mut App, id: &str, date: Option<&str>) -> Result<()> {
    let date = date.map(parse_date_arg).transpose()?.unwrap_or_else(today);
    let activity = find_activity(app, id)?;

    if !activity.is_active_on(date) {
        bail!("{} is outside the dates of '{}'", date, activity.title);
    }
    if app.mark_completed(id, date).context("Failed to save activity")? {
        println!("Marked '{}' done for {}", id, date);
    } else {
        println!("Already done for {}", date);
    }
    Ok(())
}

pub fn delete(app: &mut App, id: &str) -> Result<()> {
    if !app.delete_activity(id).context("Failed to save activities")? {
        bail!("No activity with id {}", id);
    }
    println!("Deleted activity {}", id);
    Ok(())
}

pub fn reschedule(app: &mut App) -> Result<()> {
    match app.reschedule_all().context("Failed to save activities")? {
        RescheduleOutcome::PermissionDenied => {
            bail!("Notifications are disabled. Run 'habit notifications on' first")
        }
        RescheduleOutcome::Rescheduled { scheduled, cleared } => {
            println!("Rescheduled {} reminder(s), cleared {}", scheduled, cleared);
        }
    }
    Ok(())
}

/// Deliver due reminders, once or until interrupted
pub fn remind(app: &mut App, once: bool, interval: std::time::Duration) -> Result<()> {
    info!(interval_secs = interval.as_secs(), once, "watching for due reminders");
    loop {
        for notification in deliver_due(app) {
            println!(
                "[{}] {}: {}",
                Local::now().format("%H:%M"),
                notification.title,
                notification.body
            );
        }
        if once {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

/// Turn reminder permission on or off and bring the registry in line
pub fn set_notifications(
    app: &mut App,
    config: &mut AppConfig,
    config_path: &Path,
    enabled: bool,
) -> Result<()> {
    config.notifications_enabled = enabled;
    save_config(config_path, config)?;

    // The host was opened with the previous setting
    let host = LocalHost::new(app.notifications.host().path(), enabled)
        .with_desktop_alerts(config.desktop_alerts);
    *app.notifications.host_mut() = host;

    if enabled {
        println!("Notifications enabled");
        reschedule(app)
    } else {
        let cleared = app.clear_reminders().context("Failed to save activities")?;
        println!("Notifications disabled, {} reminder(s) cancelled", cleared);
        Ok(())
    }
}
