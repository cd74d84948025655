//! Consumption of notification channel events.

use std::sync::Weak;

use futures::StreamExt;
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, info, warn};

use crate::{
    dto::events::{ChannelEvent, ShootNotification},
    services::notification_dispatch::{UiAction, ui_action_for},
    state::{ConnectionStatus, LiveShootState, SharedState},
};

/// Forward channel events to [`handle_channel_event`] until the stream closes or the
/// state is dropped.
pub(crate) fn spawn_event_listener(
    state: Weak<LiveShootState>,
    receiver: broadcast::Receiver<ChannelEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = BroadcastStream::new(receiver);
        while let Some(next) = events.next().await {
            match next {
                Ok(event) => {
                    let Some(state) = state.upgrade() else {
                        break;
                    };
                    handle_channel_event(&state, event).await;
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    // Skip lagged messages but keep listening.
                    warn!(skipped, "channel listener lagged; events dropped");
                }
            }
        }
        debug!("channel event listener stopped");
    })
}

/// Apply one channel event to the coordinator state.
///
/// Shoot-scoped events for any code other than the active one are discarded.
pub async fn handle_channel_event(state: &SharedState, event: ChannelEvent) {
    if let Some(status) = ConnectionStatus::after(&event) {
        state.set_connection_status(status);
    }

    match event {
        ChannelEvent::Connected => {
            info!("notification channel connected");
            resubscribe_active_shoot(state).await;
        }
        ChannelEvent::Disconnected => {
            info!("notification channel disconnected; keeping last known shoot");
        }
        ChannelEvent::Error { message } => {
            warn!(error = %message, "notification channel error");
        }
        ChannelEvent::Reconnecting { attempt } => {
            info!(attempt, "notification channel reconnecting");
        }
        ChannelEvent::ShootUpdated { code, shoot } => {
            if !is_active_code(state, &code) {
                debug!(code = %code, "discarding update for inactive shoot");
                return;
            }
            state.apply_shoot_update(shoot);
        }
        ChannelEvent::ShootNotification { code, notification } => {
            if !is_active_code(state, &code) {
                debug!(code = %code, "discarding notification for inactive shoot");
                return;
            }
            dispatch_notification(state, &code, &notification);
        }
    }
}

fn is_active_code(state: &SharedState, code: &str) -> bool {
    state.shoot_code().as_deref() == Some(code)
}

async fn resubscribe_active_shoot(state: &SharedState) {
    let (Some(code), Some(channel)) = (state.shoot_code(), state.existing_channel()) else {
        return;
    };

    if let Err(err) = channel.subscribe_to_shoot(code.clone()).await {
        warn!(code = %code, error = %err, "failed to resubscribe after reconnect");
    }
}

fn dispatch_notification(state: &SharedState, code: &str, notification: &ShootNotification) {
    match ui_action_for(notification) {
        UiAction::Toast(toast) => state.notify(toast),
        UiAction::Silent | UiAction::Ignored => {}
    }

    if !notification.kind.is_score_bearing() {
        return;
    }

    if let (Some(archer), Some(shoot)) = (&notification.archer_name, &notification.shoot) {
        state
            .push()
            .process_shoot_update(code, &shoot.participants, archer);
    }
}
