use crate::domain::NotificationHandle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authorization reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
}

impl AuthorizationStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Authorized | Self::Provisional)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    Default,
    High,
}

/// Delivery category reminders are posted to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub sound: Option<String>,
    pub vibration: bool,
}

/// Content of a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatFrequency {
    Daily,
}

/// Fire at a fixed instant, optionally repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampTrigger {
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub repeat_frequency: Option<RepeatFrequency>,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("channel '{0}' already exists")]
    ChannelExists(String),

    #[error("channel '{0}' does not exist")]
    UnknownChannel(String),

    #[error("no scheduled notification with handle '{0}'")]
    UnknownNotification(String),

    #[error("notification registry I/O failed: {0:#}")]
    Registry(anyhow::Error),
}

/// Local-notification primitives of the host platform
pub trait NotificationHost {
    fn request_permission(&mut self) -> Result<AuthorizationStatus, HostError>;

    /// Fails with `HostError::ChannelExists` when the id is already registered
    fn create_channel(&mut self, channel: &Channel) -> Result<(), HostError>;

    fn create_trigger_notification(
        &mut self,
        notification: &Notification,
        trigger: &TimestampTrigger,
    ) -> Result<NotificationHandle, HostError>;

    fn cancel_notification(&mut self, handle: &NotificationHandle) -> Result<(), HostError>;

    fn cancel_all_notifications(&mut self) -> Result<(), HostError>;
}
