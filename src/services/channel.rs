use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::{dto::events::ChannelEvent, error::ChannelError};

/// Result alias for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Push transport delivering shoot events to this client.
///
/// Implementations own reconnection and backoff; they report progress through the
/// lifecycle variants of [`ChannelEvent`].
pub trait NotificationChannel: Send + Sync {
    /// Resolve once the connection is established or has failed.
    fn connect(&self) -> BoxFuture<'static, ChannelResult<()>>;
    /// Whether the transport currently holds a live connection.
    fn is_connected(&self) -> bool;
    /// Close the connection; a no-op when already closed.
    fn disconnect(&self);
    /// Start receiving events published under `code`.
    fn subscribe_to_shoot(&self, code: String) -> BoxFuture<'static, ChannelResult<()>>;
    /// Stop receiving events published under `code`.
    fn unsubscribe_from_shoot(&self, code: String) -> BoxFuture<'static, ChannelResult<()>>;
    /// Register a new listener for every event emitted from now on.
    fn events(&self) -> broadcast::Receiver<ChannelEvent>;
}

/// Builds the channel the first time a flow needs it.
pub type ChannelFactory = Box<dyn Fn() -> std::sync::Arc<dyn NotificationChannel> + Send + Sync>;
