//! Client-side coordinator for live archery shoots: session flows, channel event
//! handling and device notifications, exposed for binaries and embedding UIs.

/// Configuration loading.
pub mod config;
/// Persisted session record and its stores.
pub mod dao;
/// Payloads exchanged with the shoot service and the notification channel.
pub mod dto;
/// Error types shared across layers.
pub mod error;
/// Coordinator flows and collaborator ports.
pub mod services;
/// Shared coordinator state.
pub mod state;

#[cfg(test)]
mod testing;

pub use config::LiveShootConfig;
pub use error::{ChannelError, CoordinatorError, ServiceError};
pub use state::{Collaborators, ConnectionStatus, LiveShootState, SharedState};
