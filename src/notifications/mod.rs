//! Daily reminder scheduling on top of the host's local-notification API.
//!
//! Permission and registration failures of a single scheduling call are
//! returned to the caller. Cancellation is best-effort: failures are logged
//! and never surface. Bulk rescheduling isolates per-activity failures.

pub mod host;
pub mod local;
pub mod trigger;

pub use host::{
    AuthorizationStatus, Channel, HostError, Importance, Notification, NotificationHost,
    RepeatFrequency, TimestampTrigger,
};
pub use local::LocalHost;
pub use trigger::next_trigger;

use crate::domain::{Activity, NotificationHandle};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Id of the single channel reminders are posted to
pub const CHANNEL_ID: &str = "daily";
pub const CHANNEL_NAME: &str = "Daily Reminders";

/// Body used for activity reminders unless configured otherwise
pub const DEFAULT_REMINDER_BODY: &str = "Time to complete your activity";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification permission denied")]
    PermissionDenied,

    #[error("failed to schedule notification: {0}")]
    SchedulingFailure(#[source] HostError),

    #[error("failed to create notification channel: {0}")]
    Channel(#[source] HostError),

    #[error("invalid reminder time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

/// The "daily" channel: high importance, default sound, vibration
pub fn daily_channel() -> Channel {
    Channel {
        id: CHANNEL_ID.to_string(),
        name: CHANNEL_NAME.to_string(),
        importance: Importance::High,
        sound: Some("default".to_string()),
        vibration: true,
    }
}

pub struct NotificationService<H: NotificationHost> {
    host: H,
    reminder_body: String,
}

impl<H: NotificationHost> NotificationService<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            reminder_body: DEFAULT_REMINDER_BODY.to_string(),
        }
    }

    pub fn with_reminder_body(mut self, body: impl Into<String>) -> Self {
        self.reminder_body = body.into();
        self
    }

    pub fn reminder_body(&self) -> &str {
        &self.reminder_body
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Ask the host for authorization. Host errors count as "not granted".
    pub fn request_permission(&mut self) -> bool {
        match self.host.request_permission() {
            Ok(status) => {
                debug!(?status, "notification authorization");
                status.is_granted()
            }
            Err(e) => {
                warn!(error = %e, "notification permission request failed");
                false
            }
        }
    }

    /// Make sure the "daily" channel exists. An existing channel is fine.
    pub fn ensure_channel(&mut self) -> Result<(), NotificationError> {
        match self.host.create_channel(&daily_channel()) {
            Ok(()) => {
                debug!(channel = CHANNEL_ID, "notification channel created");
                Ok(())
            }
            Err(HostError::ChannelExists(_)) => Ok(()),
            Err(e) => Err(NotificationError::Channel(e)),
        }
    }

    /// Schedule a reminder repeating daily at `hour:minute` local time
    pub fn schedule_daily(
        &mut self,
        title: &str,
        body: &str,
        hour: u32,
        minute: u32,
    ) -> Result<NotificationHandle, NotificationError> {
        self.schedule_daily_at(Local::now(), title, body, hour, minute)
    }

    pub fn schedule_daily_at(
        &mut self,
        now: DateTime<Local>,
        title: &str,
        body: &str,
        hour: u32,
        minute: u32,
    ) -> Result<NotificationHandle, NotificationError> {
        let fire_at =
            next_trigger(&now, hour, minute).ok_or(NotificationError::InvalidTime { hour, minute })?;

        if !self.request_permission() {
            return Err(NotificationError::PermissionDenied);
        }
        self.ensure_channel()?;

        self.register(title, body, fire_at)
    }

    /// Cancel one reminder. Failures (including unknown handles) are logged only.
    pub fn cancel(&mut self, handle: &NotificationHandle) {
        match self.host.cancel_notification(handle) {
            Ok(()) => debug!(%handle, "notification cancelled"),
            Err(e) => warn!(%handle, error = %e, "failed to cancel notification"),
        }
    }

    /// Cancel every reminder. Failures are logged only.
    pub fn cancel_all(&mut self) {
        match self.host.cancel_all_notifications() {
            Ok(()) => debug!("all notifications cancelled"),
            Err(e) => warn!(error = %e, "failed to cancel all notifications"),
        }
    }

    /// Re-establish reminders for every activity active today.
    ///
    /// Returns the new handle per rescheduled activity id, or None when
    /// permission is denied. Permission is requested once; when denied
    /// nothing else happens. Existing reminders are cancelled before
    /// scheduling starts.
    pub fn reschedule_all(
        &mut self,
        activities: &[Activity],
    ) -> Option<BTreeMap<String, NotificationHandle>> {
        self.reschedule_all_at(Local::now(), activities)
    }

    pub fn reschedule_all_at(
        &mut self,
        now: DateTime<Local>,
        activities: &[Activity],
    ) -> Option<BTreeMap<String, NotificationHandle>> {
        if !self.request_permission() {
            warn!("notification permission denied, skipping reschedule");
            return None;
        }
        let mut handles = BTreeMap::new();
        if let Err(e) = self.ensure_channel() {
            warn!(error = %e, "continuing reschedule without channel");
        }
        self.cancel_all();

        let today = now.date_naive();
        for activity in activities {
            if !activity.is_active_on(today) {
                debug!(id = %activity.id, "activity not active today, not rescheduled");
                continue;
            }

            let Some(fire_at) = next_trigger(&now, activity.reminder_hour, activity.reminder_minute)
            else {
                warn!(
                    id = %activity.id,
                    hour = activity.reminder_hour,
                    minute = activity.reminder_minute,
                    "invalid reminder time, skipping"
                );
                continue;
            };

            let body = self.reminder_body.clone();
            match self.register(&activity.title, &body, fire_at) {
                Ok(handle) => {
                    handles.insert(activity.id.clone(), handle);
                }
                Err(e) => warn!(id = %activity.id, error = %e, "failed to reschedule reminder"),
            }
        }

        info!(
            rescheduled = handles.len(),
            total = activities.len(),
            "reminders rescheduled"
        );
        Some(handles)
    }

    fn register(
        &mut self,
        title: &str,
        body: &str,
        fire_at: DateTime<Local>,
    ) -> Result<NotificationHandle, NotificationError> {
        let notification = Notification {
            title: title.to_string(),
            body: body.to_string(),
            channel_id: CHANNEL_ID.to_string(),
        };
        let trigger = TimestampTrigger {
            timestamp: fire_at.timestamp_millis(),
            repeat_frequency: Some(RepeatFrequency::Daily),
        };

        let handle = self
            .host
            .create_trigger_notification(&notification, &trigger)
            .map_err(NotificationError::SchedulingFailure)?;

        info!(%handle, %title, fire_at = %fire_at.format("%Y-%m-%d %H:%M"), "daily reminder scheduled");
        Ok(handle)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::{
        Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone,
    };

    /// US Eastern time for 2025: EST (-5) outside, EDT (-4) between
    /// 2025-03-09 07:00 UTC and 2025-11-02 06:00 UTC.
    #[derive(Debug, Clone, Copy)]
    pub struct Eastern2025;

    impl Eastern2025 {
        fn est() -> FixedOffset {
            FixedOffset::west_opt(5 * 3600).unwrap()
        }

        fn edt() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }
    }

    impl TimeZone for Eastern2025 {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Eastern2025
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            // Earlier instant first
            let valid: Vec<FixedOffset> = [Self::edt(), Self::est()]
                .into_iter()
                .filter(|offset| {
                    let utc = *local - Duration::seconds(offset.local_minus_utc() as i64);
                    self.offset_from_utc_datetime(&utc) == *offset
                })
                .collect();
            match valid[..] {
                [offset] => LocalResult::Single(offset),
                [earliest, latest] => LocalResult::Ambiguous(earliest, latest),
                _ => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let dst_start = NaiveDate::from_ymd_opt(2025, 3, 9)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap();
            let dst_end = NaiveDate::from_ymd_opt(2025, 11, 2)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap();
            if *utc >= dst_start && *utc < dst_end {
                Self::edt()
            } else {
                Self::est()
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostCall {
        RequestPermission,
        CreateChannel(String),
        CreateTrigger(String, TimestampTrigger),
        Cancel(String),
        CancelAll,
    }

    /// Records every call; behaviour is tuned per test
    #[derive(Debug)]
    pub struct RecordingHost {
        pub status: AuthorizationStatus,
        pub channel_exists: bool,
        pub fail_titles: Vec<String>,
        pub fail_cancel: bool,
        pub calls: Vec<HostCall>,
        pub bodies: Vec<String>,
        next_id: u32,
    }

    impl RecordingHost {
        pub fn granted() -> Self {
            Self {
                status: AuthorizationStatus::Authorized,
                channel_exists: false,
                fail_titles: Vec::new(),
                fail_cancel: false,
                calls: Vec::new(),
                bodies: Vec::new(),
                next_id: 0,
            }
        }

        pub fn denied() -> Self {
            Self {
                status: AuthorizationStatus::Denied,
                ..Self::granted()
            }
        }

        pub fn scheduled_titles(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    HostCall::CreateTrigger(title, _) => Some(title.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl NotificationHost for RecordingHost {
        fn request_permission(&mut self) -> Result<AuthorizationStatus, HostError> {
            self.calls.push(HostCall::RequestPermission);
            Ok(self.status)
        }

        fn create_channel(&mut self, channel: &Channel) -> Result<(), HostError> {
            self.calls.push(HostCall::CreateChannel(channel.id.clone()));
            if self.channel_exists {
                return Err(HostError::ChannelExists(channel.id.clone()));
            }
            self.channel_exists = true;
            Ok(())
        }

        fn create_trigger_notification(
            &mut self,
            notification: &Notification,
            trigger: &TimestampTrigger,
        ) -> Result<NotificationHandle, HostError> {
            self.calls
                .push(HostCall::CreateTrigger(notification.title.clone(), *trigger));
            self.bodies.push(notification.body.clone());
            if self.fail_titles.contains(&notification.title) {
                return Err(HostError::Registry(anyhow::anyhow!("registration rejected")));
            }
            self.next_id += 1;
            Ok(NotificationHandle::new(format!("n-{}", self.next_id)))
        }

        fn cancel_notification(&mut self, handle: &NotificationHandle) -> Result<(), HostError> {
            self.calls.push(HostCall::Cancel(handle.to_string()));
            if self.fail_cancel {
                return Err(HostError::UnknownNotification(handle.to_string()));
            }
            Ok(())
        }

        fn cancel_all_notifications(&mut self) -> Result<(), HostError> {
            self.calls.push(HostCall::CancelAll);
            if self.fail_cancel {
                return Err(HostError::Registry(anyhow::anyhow!("registry locked")));
            }
            Ok(())
        }
    }
}
