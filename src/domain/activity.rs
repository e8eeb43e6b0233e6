use super::dates::{format_reminder_time, is_within_range};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier returned by the notification host for a scheduled trigger
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-defined habit with a date window and a daily reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    /// None means the activity is ongoing
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub end_date: Option<NaiveDate>,
    pub reminder_hour: u32,
    pub reminder_minute: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<NotificationHandle>,
    /// Days marked done
    #[serde(default)]
    pub completion: BTreeMap<NaiveDate, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Activity {
    /// Whether `day` falls inside the activity window
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        is_within_range(day, self.start_date, self.end_date)
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completion.get(&day).copied().unwrap_or(false)
    }

    pub fn completed_days(&self) -> usize {
        self.completion.values().filter(|done| **done).count()
    }

    /// Reminder time as "HH:MM"
    pub fn reminder_label(&self) -> String {
        format_reminder_time(self.reminder_hour, self.reminder_minute)
    }

    fn apply(&mut self, patch: ActivityPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(hour) = patch.reminder_hour {
            self.reminder_hour = hour;
        }
        if let Some(minute) = patch.reminder_minute {
            self.reminder_minute = minute;
        }
        if let Some(handle) = patch.notification_id {
            self.notification_id = handle;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

/// Input for creating an activity
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    /// Explicit id; a fresh one is generated when absent or already taken
    pub id: Option<String>,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub reminder_hour: u32,
    pub reminder_minute: u32,
    pub notification_id: Option<NotificationHandle>,
    pub description: Option<String>,
}

impl NewActivity {
    pub(crate) fn into_activity(self, id: String) -> Activity {
        Activity {
            id,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            reminder_hour: self.reminder_hour,
            reminder_minute: self.reminder_minute,
            notification_id: self.notification_id,
            completion: BTreeMap::new(),
            description: self.description,
        }
    }
}

/// Partial update: every `Some` field replaces the stored value.
///
/// Nested options let a patch clear an optional field (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub reminder_hour: Option<u32>,
    pub reminder_minute: Option<u32>,
    pub notification_id: Option<Option<NotificationHandle>>,
    pub description: Option<Option<String>>,
}

impl ActivityPatch {
    pub fn notification(handle: Option<NotificationHandle>) -> Self {
        Self {
            notification_id: Some(handle),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply_to(self, activity: &mut Activity) {
        activity.apply(self);
    }
}

/// Accept `null`, a missing field, or an empty string as "no end date"
fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
