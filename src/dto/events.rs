use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dto::shoot::Shoot;

/// The channel finished its handshake.
pub const EVENT_CONNECTED: &str = "websocket-connected";
/// The channel closed, either on request or by the transport.
pub const EVENT_DISCONNECTED: &str = "websocket-disconnected";
/// The transport failed.
pub const EVENT_ERROR: &str = "websocket-error";
/// The transport is retrying its connection.
pub const EVENT_RECONNECTING: &str = "websocket-reconnecting";
/// A full shoot snapshot was pushed.
pub const EVENT_SHOOT_UPDATED: &str = "shoot-updated";
/// A server notification about a shoot was pushed.
pub const EVENT_SHOOT_NOTIFICATION: &str = "shoot-notification";

/// Events emitted by a notification channel.
///
/// The serialised form is `{"event": <name>, "data": <payload>}` so channel
/// implementations can decode frames straight into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ChannelEvent {
    /// Handshake completed.
    #[serde(rename = "websocket-connected")]
    Connected,
    /// Connection closed.
    #[serde(rename = "websocket-disconnected")]
    Disconnected,
    /// Transport failure.
    #[serde(rename = "websocket-error")]
    Error {
        /// Transport description of the failure.
        #[serde(default)]
        message: String,
    },
    /// The transport is retrying.
    #[serde(rename = "websocket-reconnecting")]
    Reconnecting {
        /// One-based retry counter.
        #[serde(default)]
        attempt: u32,
    },
    /// Authoritative snapshot of a shoot.
    #[serde(rename = "shoot-updated")]
    ShootUpdated {
        /// Code the event was published under.
        code: String,
        /// The whole shoot as the server now sees it.
        shoot: Shoot,
    },
    /// Notification scoped to a shoot.
    #[serde(rename = "shoot-notification")]
    ShootNotification {
        /// Code the event was published under.
        code: String,
        /// The notification body.
        notification: ShootNotification,
    },
}

impl ChannelEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelEvent::Connected => EVENT_CONNECTED,
            ChannelEvent::Disconnected => EVENT_DISCONNECTED,
            ChannelEvent::Error { .. } => EVENT_ERROR,
            ChannelEvent::Reconnecting { .. } => EVENT_RECONNECTING,
            ChannelEvent::ShootUpdated { .. } => EVENT_SHOOT_UPDATED,
            ChannelEvent::ShootNotification { .. } => EVENT_SHOOT_NOTIFICATION,
        }
    }

    /// Shoot code carried by shoot-scoped events.
    pub fn shoot_code(&self) -> Option<&str> {
        match self {
            ChannelEvent::ShootUpdated { code, .. }
            | ChannelEvent::ShootNotification { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Server notification attached to a shoot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootNotification {
    /// Declared notification type.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Archer the notification is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archer_name: Option<String>,
    /// Snapshot of the shoot at the time the notification was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoot: Option<Shoot>,
    /// Free text from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ShootNotification {
    /// Notification of `kind` without archer or snapshot.
    pub fn new(kind: NotificationType) -> Self {
        Self {
            kind,
            archer_name: None,
            shoot: None,
            message: None,
        }
    }

    /// Attach the archer the notification is about.
    pub fn with_archer(mut self, archer_name: impl Into<String>) -> Self {
        self.archer_name = Some(archer_name.into());
        self
    }

    /// Attach the embedded shoot snapshot.
    pub fn with_shoot(mut self, shoot: Shoot) -> Self {
        self.shoot = Some(shoot);
        self
    }
}

/// Declared type of a [`ShootNotification`]. Unknown names are preserved for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    /// `joined_shoot`
    JoinedShoot,
    /// `left_shoot`
    LeftShoot,
    /// `position_change`
    PositionChange,
    /// `score_update`
    ScoreUpdate,
    /// `archer_finished`
    ArcherFinished,
    /// Any name this client does not recognise.
    Unknown(String),
}

impl NotificationType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::JoinedShoot => "joined_shoot",
            NotificationType::LeftShoot => "left_shoot",
            NotificationType::PositionChange => "position_change",
            NotificationType::ScoreUpdate => "score_update",
            NotificationType::ArcherFinished => "archer_finished",
            NotificationType::Unknown(other) => other,
        }
    }

    /// Types that carry score movement worth a device notification.
    pub fn is_score_bearing(&self) -> bool {
        matches!(
            self,
            NotificationType::ScoreUpdate
                | NotificationType::PositionChange
                | NotificationType::ArcherFinished
        )
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "joined_shoot" => NotificationType::JoinedShoot,
            "left_shoot" => NotificationType::LeftShoot,
            "position_change" => NotificationType::PositionChange,
            "score_update" => NotificationType::ScoreUpdate,
            "archer_finished" => NotificationType::ArcherFinished,
            _ => NotificationType::Unknown(value),
        }
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        match value {
            NotificationType::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
