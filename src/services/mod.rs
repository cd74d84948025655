/// Notification channel port.
pub mod channel;
/// Channel event listener and per-event handling.
pub mod channel_events;
/// Reference shoot service speaking the REST API.
#[cfg(feature = "http-service")]
pub mod http_shoot_service;
/// Session coordinator flows.
pub mod live_shoot_service;
/// Mapping from server notifications to UI actions.
pub mod notification_dispatch;
/// Device notifications for shoot updates.
pub mod push_notifications;
/// Broadcast relay implementing the notification channel port.
pub mod relay_channel;
/// Shoot service port.
pub mod shoot_service;
/// Toast sink for user-visible messages.
pub mod user_notifier;
