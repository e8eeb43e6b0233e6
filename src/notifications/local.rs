//! File-backed notification host.
//!
//! Channels and scheduled triggers live in a JSON registry in the data
//! directory. Due reminders are delivered by whichever process calls
//! `fire_due` (the TUI event loop or `habit remind`).

use super::host::{
    AuthorizationStatus, Channel, HostError, Notification, NotificationHost, RepeatFrequency,
    TimestampTrigger,
};
use super::trigger::next_trigger;
use crate::domain::NotificationHandle;
use crate::persistence::{atomic_write, read_file};
use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

#[cfg(target_os = "macos")]
use std::process::Command;

/// A trigger waiting to fire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTrigger {
    pub id: NotificationHandle,
    pub notification: Notification,
    pub trigger: TimestampTrigger,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Registry {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    triggers: Vec<ScheduledTrigger>,
}

pub struct LocalHost {
    path: PathBuf,
    enabled: bool,
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    desktop_alerts: bool,
}

impl LocalHost {
    /// `enabled` is the user's notification permission
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
            desktop_alerts: true,
        }
    }

    pub fn with_desktop_alerts(mut self, desktop_alerts: bool) -> Self {
        self.desktop_alerts = desktop_alerts;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Triggers currently registered, soonest first
    pub fn pending(&self) -> Result<Vec<ScheduledTrigger>, HostError> {
        let mut triggers = self.load()?.triggers;
        triggers.sort_by_key(|t| t.trigger.timestamp);
        Ok(triggers)
    }

    /// Deliver every trigger due at `now`.
    ///
    /// A trigger that missed several occurrences is delivered once. Daily
    /// triggers move to their next occurrence after `now` at the same
    /// wall-clock time in `now`'s timezone; one-shot triggers are removed.
    pub fn fire_due<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<Vec<Notification>, HostError> {
        let now_ms = now.timestamp_millis();
        let mut registry = self.load()?;
        let mut delivered = Vec::new();

        registry.triggers.retain_mut(|scheduled| {
            if scheduled.trigger.timestamp > now_ms {
                return true;
            }

            delivered.push(scheduled.notification.clone());
            match scheduled.trigger.repeat_frequency {
                Some(RepeatFrequency::Daily) => {
                    scheduled.trigger.timestamp = next_daily_occurrence(scheduled.trigger.timestamp, now);
                    true
                }
                None => false,
            }
        });

        if delivered.is_empty() {
            return Ok(delivered);
        }

        self.save(&registry)?;
        for notification in &delivered {
            self.deliver(notification);
        }
        Ok(delivered)
    }

    fn deliver(&self, notification: &Notification) {
        info!(title = %notification.title, body = %notification.body, "reminder due");

        #[cfg(target_os = "macos")]
        {
            if self.desktop_alerts {
                let script = format!(
                    r#"display notification "{}" with title "{}""#,
                    notification.body.replace('"', "\\\""),
                    notification.title.replace('"', "\\\"")
                );

                if let Err(e) = Command::new("osascript").arg("-e").arg(&script).output() {
                    tracing::warn!(error = %e, "failed to show desktop notification");
                }
            }
        }
    }

    fn load(&self) -> Result<Registry, HostError> {
        let content = read_file(&self.path).map_err(HostError::Registry)?;
        match content {
            None => Ok(Registry::default()),
            Some(content) if content.trim().is_empty() => Ok(Registry::default()),
            Some(content) => serde_json::from_str(&content)
                .map_err(|e| HostError::Registry(anyhow::Error::new(e).context("reminder registry is unreadable"))),
        }
    }

    fn save(&self, registry: &Registry) -> Result<(), HostError> {
        let json = serde_json::to_string_pretty(registry)
            .map_err(|e| HostError::Registry(anyhow::Error::new(e)))?;
        atomic_write(&self.path, &json).map_err(HostError::Registry)
    }
}

/// First occurrence strictly after `now` at the wall-clock time the
/// trigger last fired at
fn next_daily_occurrence<Tz: TimeZone>(timestamp_ms: i64, now: &DateTime<Tz>) -> i64 {
    let fired = now.timezone().timestamp_millis_opt(timestamp_ms).single();
    fired
        .and_then(|fired| next_trigger(now, fired.hour(), fired.minute()))
        .map(|next| next.timestamp_millis())
        .unwrap_or_else(|| now.timestamp_millis() + Duration::days(1).num_milliseconds())
}

impl NotificationHost for LocalHost {
    fn request_permission(&mut self) -> Result<AuthorizationStatus, HostError> {
        Ok(if self.enabled {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        })
    }

    fn create_channel(&mut self, channel: &Channel) -> Result<(), HostError> {
        let mut registry = self.load()?;
        if registry.channels.iter().any(|c| c.id == channel.id) {
            return Err(HostError::ChannelExists(channel.id.clone()));
        }
        registry.channels.push(channel.clone());
        self.save(&registry)
    }

    fn create_trigger_notification(
        &mut self,
        notification: &Notification,
        trigger: &TimestampTrigger,
    ) -> Result<NotificationHandle, HostError> {
        let mut registry = self.load()?;
        if !registry.channels.iter().any(|c| c.id == notification.channel_id) {
            return Err(HostError::UnknownChannel(notification.channel_id.clone()));
        }

        let id = NotificationHandle::new(Uuid::new_v4().to_string());
        registry.triggers.push(ScheduledTrigger {
            id: id.clone(),
            notification: notification.clone(),
            trigger: *trigger,
        });
        self.save(&registry)?;
        debug!(%id, timestamp = trigger.timestamp, "trigger registered");
        Ok(id)
    }

    fn cancel_notification(&mut self, handle: &NotificationHandle) -> Result<(), HostError> {
        let mut registry = self.load()?;
        let before = registry.triggers.len();
        registry.triggers.retain(|t| t.id != *handle);
        if registry.triggers.len() == before {
            return Err(HostError::UnknownNotification(handle.to_string()));
        }
        self.save(&registry)
    }

    fn cancel_all_notifications(&mut self) -> Result<(), HostError> {
        let mut registry = self.load()?;
        if registry.triggers.is_empty() {
            return Ok(());
        }
        registry.triggers.clear();
        self.save(&registry)
    }
}
