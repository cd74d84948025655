use std::fmt;

use crate::dto::events::ChannelEvent;

/// Connection state of the notification channel as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No live connection; the initial state.
    #[default]
    Disconnected,
    /// The channel reported it is (re)establishing the connection.
    Connecting,
    /// Events are flowing.
    Connected,
    /// The channel reported a failure; it may still recover on its own.
    Error,
}

impl ConnectionStatus {
    /// Status the channel is in after emitting `event`.
    ///
    /// Shoot-scoped events say nothing about the connection and yield `None`.
    pub fn after(event: &ChannelEvent) -> Option<Self> {
        match event {
            ChannelEvent::Connected => Some(ConnectionStatus::Connected),
            ChannelEvent::Disconnected => Some(ConnectionStatus::Disconnected),
            ChannelEvent::Error { .. } => Some(ConnectionStatus::Error),
            ChannelEvent::Reconnecting { .. } => Some(ConnectionStatus::Connecting),
            ChannelEvent::ShootUpdated { .. } | ChannelEvent::ShootNotification { .. } => None,
        }
    }

    /// `true` only for `Connected`.
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// Lower-case label for logs and displays.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
