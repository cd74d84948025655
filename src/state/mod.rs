/// Connection status and its event transitions.
pub mod connection;

use std::{
    sync::{
        Arc, Mutex, OnceLock, PoisonError, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use time::OffsetDateTime;
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::{
    config::LiveShootConfig,
    dao::session_store::SessionStore,
    dto::shoot::Shoot,
    services::{
        channel::{ChannelFactory, NotificationChannel},
        channel_events::spawn_event_listener,
        push_notifications::{DeviceNotifier, PushNotificationManager},
        shoot_service::ShootService,
        user_notifier::{Toast, UserNotifier},
    },
};

pub use self::connection::ConnectionStatus;

/// Handle shared between flows and the event listener.
pub type SharedState = Arc<LiveShootState>;

/// External collaborators the coordinator is wired to.
pub struct Collaborators {
    /// Request/response port to the shoot server.
    pub service: Arc<dyn ShootService>,
    /// Called at most once, the first time a flow needs the channel.
    pub channel_factory: ChannelFactory,
    /// Persisted session record.
    pub store: Arc<dyn SessionStore>,
    /// Toast sink.
    pub user_notifier: Arc<dyn UserNotifier>,
    /// Native notification sink.
    pub device_notifier: Arc<dyn DeviceNotifier>,
}

/// Client-side state of the live shoot coordinator.
///
/// Owns the current shoot, connection status, loading flag and last update time, each
/// published through a [`watch`] channel so UI layers can follow changes. The channel
/// and push manager are constructed lazily and then reused for the lifetime of the state.
pub struct LiveShootState {
    self_ref: Weak<LiveShootState>,
    service: Arc<dyn ShootService>,
    store: Arc<dyn SessionStore>,
    user_notifier: Arc<dyn UserNotifier>,
    device_notifier: Arc<dyn DeviceNotifier>,
    channel_factory: ChannelFactory,
    channel: OnceLock<Arc<dyn NotificationChannel>>,
    push: OnceLock<Arc<PushNotificationManager>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    current_shoot: watch::Sender<Option<Shoot>>,
    connection_status: watch::Sender<ConnectionStatus>,
    is_loading: watch::Sender<bool>,
    loading_depth: AtomicUsize,
    last_update_time: watch::Sender<Option<OffsetDateTime>>,
    session_max_age: Duration,
}

impl LiveShootState {
    /// Construct a new [`LiveShootState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The state starts disconnected with no current shoot.
    pub fn new(collaborators: Collaborators, config: &LiveShootConfig) -> SharedState {
        let Collaborators {
            service,
            channel_factory,
            store,
            user_notifier,
            device_notifier,
        } = collaborators;

        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            service,
            store,
            user_notifier,
            device_notifier,
            channel_factory,
            channel: OnceLock::new(),
            push: OnceLock::new(),
            listener: Mutex::new(None),
            current_shoot: watch::Sender::new(None),
            connection_status: watch::Sender::new(ConnectionStatus::Disconnected),
            is_loading: watch::Sender::new(false),
            loading_depth: AtomicUsize::new(0),
            last_update_time: watch::Sender::new(None),
            session_max_age: config.session_max_age,
        })
    }

    /// Shoot service used by every flow.
    pub fn service(&self) -> &Arc<dyn ShootService> {
        &self.service
    }

    /// Store holding the persisted session record.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Maximum age of a restorable session record.
    pub fn session_max_age(&self) -> Duration {
        self.session_max_age
    }

    /// Obtain the notification channel, building it and starting the event listener on
    /// first use. Must be called from within a Tokio runtime.
    pub fn channel(&self) -> Arc<dyn NotificationChannel> {
        self.channel
            .get_or_init(|| {
                let channel = (self.channel_factory)();
                let handle = spawn_event_listener(self.self_ref.clone(), channel.events());
                let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
                *slot = Some(handle);
                debug!("notification channel constructed");
                channel
            })
            .clone()
    }

    /// The channel if a flow already constructed it.
    pub fn existing_channel(&self) -> Option<Arc<dyn NotificationChannel>> {
        self.channel.get().cloned()
    }

    /// Obtain the push notification manager, building it on first use.
    pub fn push(&self) -> Arc<PushNotificationManager> {
        self.push
            .get_or_init(|| Arc::new(PushNotificationManager::new(self.device_notifier.clone())))
            .clone()
    }

    /// The push manager if it was already constructed.
    pub fn existing_push(&self) -> Option<Arc<PushNotificationManager>> {
        self.push.get().cloned()
    }

    /// Raise a user-visible toast.
    pub fn notify(&self, toast: Toast) {
        self.user_notifier.notify(toast);
    }

    /// Snapshot of the current shoot.
    pub fn current_shoot(&self) -> Option<Shoot> {
        self.current_shoot.borrow().clone()
    }

    /// Subscribe to current shoot changes.
    pub fn watch_current_shoot(&self) -> watch::Receiver<Option<Shoot>> {
        self.current_shoot.subscribe()
    }

    /// Whether this client currently follows a shoot.
    pub fn is_in_shoot(&self) -> bool {
        self.current_shoot.borrow().is_some()
    }

    /// Code of the current shoot.
    pub fn shoot_code(&self) -> Option<String> {
        self.current_shoot
            .borrow()
            .as_ref()
            .map(|shoot| shoot.code.clone())
    }

    /// Current connection status.
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.connection_status.borrow()
    }

    /// Subscribe to connection status changes.
    pub fn watch_connection_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection_status.subscribe()
    }

    /// Whether any flow is waiting on the shoot service.
    pub fn is_loading(&self) -> bool {
        *self.is_loading.borrow()
    }

    /// Subscribe to loading flag changes.
    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.is_loading.subscribe()
    }

    /// Time the current shoot was last replaced by a channel update.
    pub fn last_update_time(&self) -> Option<OffsetDateTime> {
        *self.last_update_time.borrow()
    }

    /// Subscribe to last update time changes.
    pub fn watch_last_update_time(&self) -> watch::Receiver<Option<OffsetDateTime>> {
        self.last_update_time.subscribe()
    }

    /// Replace (or clear) the current shoot wholesale.
    pub(crate) fn replace_current_shoot(&self, shoot: Option<Shoot>) {
        self.current_shoot.send_replace(shoot);
    }

    /// Adopt a channel-delivered snapshot and advance the last update time.
    pub(crate) fn apply_shoot_update(&self, shoot: Shoot) {
        self.current_shoot.send_replace(Some(shoot));
        self.last_update_time.send_modify(|slot| {
            let now = OffsetDateTime::now_utc();
            let next = match *slot {
                Some(previous) if now <= previous => previous + time::Duration::nanoseconds(1),
                _ => now,
            };
            *slot = Some(next);
        });
    }

    pub(crate) fn set_connection_status(&self, status: ConnectionStatus) {
        self.connection_status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }

    /// Mark a flow as waiting on the service until the returned guard is dropped.
    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        if self.loading_depth.fetch_add(1, Ordering::SeqCst) == 0 {
            self.is_loading.send_replace(true);
        }
        LoadingGuard { state: self }
    }
}

impl Drop for LiveShootState {
    fn drop(&mut self) {
        let slot = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

/// Keeps the loading flag raised while alive.
pub(crate) struct LoadingGuard<'a> {
    state: &'a LiveShootState,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.state.loading_depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.is_loading.send_replace(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn starts_disconnected_without_a_shoot() {
        let harness = Harness::new();
        let state = &harness.state;

        assert_eq!(state.connection_status(), ConnectionStatus::Disconnected);
        assert!(!state.is_in_shoot());
        assert_eq!(state.shoot_code(), None);
        assert!(!state.is_loading());
        assert_eq!(state.last_update_time(), None);
    }

    #[tokio::test]
    async fn channel_is_built_once() {
        let harness = Harness::new();
        assert!(harness.state.existing_channel().is_none());

        let first = harness.state.channel();
        let second = harness.state.channel();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(harness.channel_builds(), 1);
    }

    #[tokio::test]
    async fn nested_loading_guards_keep_flag_raised() {
        let harness = Harness::new();
        let state = &harness.state;

        let outer = state.begin_loading();
        let inner = state.begin_loading();
        drop(inner);
        assert!(state.is_loading());
        drop(outer);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn last_update_time_strictly_increases() {
        let harness = Harness::new();
        let state = &harness.state;

        let mut previous = None;
        for _ in 0..50 {
            state.apply_shoot_update(Shoot::new("AB12"));
            let current = state.last_update_time();
            assert!(current > previous);
            previous = current;
        }
    }
}
