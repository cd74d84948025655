//! In-process [`NotificationChannel`] fed by a host-owned transport.
//!
//! The host (a websocket task, a UI bridge) hands every received frame to
//! [`RelayChannel::deliver_frame`]; the relay keeps the subscription set and only
//! forwards shoot-scoped events for subscribed codes.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashSet;
use futures::future::{self, BoxFuture};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    dto::events::ChannelEvent,
    services::channel::{ChannelResult, NotificationChannel},
};

/// Broadcast relay between a transport and the coordinator.
pub struct RelayChannel {
    sender: broadcast::Sender<ChannelEvent>,
    connected: AtomicBool,
    subscriptions: DashSet<String>,
}

impl RelayChannel {
    /// Create a relay buffering up to `capacity` undelivered events per listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            connected: AtomicBool::new(false),
            subscriptions: DashSet::new(),
        }
    }

    /// Whether events for `code` are currently forwarded.
    pub fn is_subscribed(&self, code: &str) -> bool {
        self.subscriptions.contains(code)
    }

    /// Forward `event` to listeners. Returns `false` when it was filtered out.
    pub fn deliver(&self, event: ChannelEvent) -> bool {
        if let Some(code) = event.shoot_code() {
            if !self.is_subscribed(code) {
                debug!(code, event = event.name(), "dropping event for unsubscribed shoot");
                return false;
            }
        }

        match event {
            ChannelEvent::Connected => self.connected.store(true, Ordering::SeqCst),
            ChannelEvent::Disconnected | ChannelEvent::Error { .. } => {
                self.connected.store(false, Ordering::SeqCst)
            }
            _ => {}
        }

        let _ = self.sender.send(event);
        true
    }

    /// Decode a `{"event": .., "data": ..}` frame and forward it.
    pub fn deliver_frame(&self, frame: &str) -> Result<bool, serde_json::Error> {
        let event = serde_json::from_str::<ChannelEvent>(frame)?;
        Ok(self.deliver(event))
    }
}

impl NotificationChannel for RelayChannel {
    fn connect(&self) -> BoxFuture<'static, ChannelResult<()>> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            let _ = self.sender.send(ChannelEvent::Connected);
        }
        Box::pin(future::ready(Ok(())))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self.sender.send(ChannelEvent::Disconnected);
        }
    }

    fn subscribe_to_shoot(&self, code: String) -> BoxFuture<'static, ChannelResult<()>> {
        self.subscriptions.insert(code);
        Box::pin(future::ready(Ok(())))
    }

    fn unsubscribe_from_shoot(&self, code: String) -> BoxFuture<'static, ChannelResult<()>> {
        self.subscriptions.remove(&code);
        Box::pin(future::ready(Ok(())))
    }

    fn events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }
}
