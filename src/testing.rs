//! In-crate fakes for the coordinator's collaborators.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use futures::future::BoxFuture;
use indexmap::IndexSet;
use tokio::sync::broadcast;

use crate::{
    config::LiveShootConfig,
    dao::{models::PersistedSessionRecord, session_store::MemorySessionStore},
    dto::{
        events::ChannelEvent,
        requests::{CreateShootResponse, ScoreSubmission, ShootResponse},
        shoot::{Participant, Shoot},
    },
    error::{ChannelError, ServiceError},
    services::{
        channel::{ChannelResult, NotificationChannel},
        push_notifications::{DeviceNotification, DeviceNotifier},
        shoot_service::{ServiceResult, ShootService},
        user_notifier::{Toast, UserNotifier},
    },
    state::{Collaborators, LiveShootState, SharedState},
};

/// Build a shoot with `(name, score, arrows)` participants shooting a national round.
pub fn shoot_with(code: &str, participants: &[(&str, u32, u32)]) -> Shoot {
    let mut shoot = Shoot::new(code);
    shoot.participants = participants
        .iter()
        .map(|(name, score, arrows)| Participant::new(*name, "national").with_score(*score, *arrows))
        .collect();
    shoot
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shoot service operations, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Join,
    Get,
    Leave,
    Update,
    Finish,
}

/// In-memory shoot server.
pub struct FakeShootService {
    shoots: Mutex<HashMap<String, Shoot>>,
    next_code: Mutex<String>,
    failing: Mutex<HashSet<Op>>,
    rejecting: Mutex<HashSet<Op>>,
    calls: Mutex<Vec<Op>>,
}

impl Default for FakeShootService {
    fn default() -> Self {
        Self {
            shoots: Mutex::new(HashMap::new()),
            next_code: Mutex::new("AB12".into()),
            failing: Mutex::new(HashSet::new()),
            rejecting: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeShootService {
    pub fn insert(&self, shoot: Shoot) {
        lock(&self.shoots).insert(shoot.code.clone(), shoot);
    }

    pub fn remove(&self, code: &str) {
        lock(&self.shoots).remove(code);
    }

    pub fn shoot(&self, code: &str) -> Option<Shoot> {
        lock(&self.shoots).get(code).cloned()
    }

    /// Make `op` fail with a transport error.
    pub fn fail(&self, op: Op) {
        lock(&self.failing).insert(op);
    }

    /// Make `op` answer `success: false`.
    pub fn reject(&self, op: Op) {
        lock(&self.rejecting).insert(op);
    }

    pub fn calls(&self) -> Vec<Op> {
        lock(&self.calls).clone()
    }

    /// Record `op` after yielding once, like a real network round trip.
    async fn begin(&self, op: Op) -> Result<bool, ServiceError> {
        tokio::task::yield_now().await;
        lock(&self.calls).push(op);
        if lock(&self.failing).contains(&op) {
            return Err(ServiceError::Transport("connection refused".into()));
        }
        Ok(!lock(&self.rejecting).contains(&op))
    }

    fn apply_score(&self, submission: &ScoreSubmission, finish: bool) -> ShootResponse {
        let mut shoots = lock(&self.shoots);
        let Some(shoot) = shoots.get_mut(&submission.code) else {
            return ShootResponse::rejected("shoot not found");
        };
        let Some(participant) = shoot
            .participants
            .iter_mut()
            .find(|participant| participant.archer_name == submission.archer_name)
        else {
            return ShootResponse::rejected("archer not in shoot");
        };

        participant.total_score = submission.total_score;
        participant.arrows_shot = submission.arrows_shot;
        participant.round_name = submission.round_name.clone();
        participant.classification = submission.classification.clone();
        participant.end_scores = submission.end_scores.clone();
        participant.finished |= finish;
        ShootResponse::ok(shoot.clone())
    }
}

impl ShootService for Arc<FakeShootService> {
    fn create_shoot(
        &self,
        creator_name: String,
        title: Option<String>,
    ) -> BoxFuture<'static, ServiceResult<CreateShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            this.begin(Op::Create).await?;
            let code = lock(&this.next_code).clone();
            let mut shoot = Shoot::new(code.clone());
            shoot.title = title;
            shoot.created_by = Some(creator_name);
            this.insert(shoot.clone());
            Ok(CreateShootResponse { code, shoot })
        })
    }

    fn join_shoot(
        &self,
        code: String,
        archer_name: String,
        round_name: String,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            if !this.begin(Op::Join).await? {
                return Ok(ShootResponse::rejected("join rejected"));
            }
            let mut shoots = lock(&this.shoots);
            let Some(shoot) = shoots.get_mut(&code) else {
                return Ok(ShootResponse::rejected("shoot not found"));
            };
            if !shoot.has_participant(&archer_name) {
                shoot
                    .participants
                    .push(Participant::new(archer_name, round_name));
            }
            Ok(ShootResponse::ok(shoot.clone()))
        })
    }

    fn get_shoot(&self, code: String) -> BoxFuture<'static, ServiceResult<Option<Shoot>>> {
        let this = self.clone();
        Box::pin(async move {
            this.begin(Op::Get).await?;
            Ok(this.shoot(&code))
        })
    }

    fn leave_shoot(
        &self,
        code: String,
        archer_name: String,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            if !this.begin(Op::Leave).await? {
                return Ok(ShootResponse::rejected("leave rejected"));
            }
            if let Some(shoot) = lock(&this.shoots).get_mut(&code) {
                shoot
                    .participants
                    .retain(|participant| participant.archer_name != archer_name);
            }
            Ok(ShootResponse::accepted())
        })
    }

    fn update_score(
        &self,
        submission: ScoreSubmission,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            if !this.begin(Op::Update).await? {
                return Ok(ShootResponse::rejected("score rejected"));
            }
            Ok(this.apply_score(&submission, false))
        })
    }

    fn finish_shoot(
        &self,
        submission: ScoreSubmission,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            if !this.begin(Op::Finish).await? {
                return Ok(ShootResponse::rejected("finish rejected"));
            }
            Ok(this.apply_score(&submission, true))
        })
    }
}

/// Channel that records calls, reports its lifecycle as events and lets tests emit
/// events of their own.
pub struct FakeChannel {
    connected: AtomicBool,
    fail_connect: AtomicBool,
    silent: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    subscriptions: Mutex<IndexSet<String>>,
    unsubscriptions: Mutex<Vec<String>>,
    sender: broadcast::Sender<ChannelEvent>,
}

impl Default for FakeChannel {
    fn default() -> Self {
        let (sender, _receiver) = broadcast::channel(64);
        Self {
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            silent: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            subscriptions: Mutex::new(IndexSet::new()),
            unsubscriptions: Mutex::new(Vec::new()),
            sender,
        }
    }
}

impl FakeChannel {
    pub fn emit(&self, event: ChannelEvent) {
        let _ = self.sender.send(event);
    }

    pub fn fail_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    /// Stop reporting lifecycle events; calls still succeed.
    pub fn silence(&self) {
        self.silent.store(true, Ordering::SeqCst);
    }

    /// Lose the connection as if the transport dropped.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.report(ChannelEvent::Disconnected);
    }

    fn report(&self, event: ChannelEvent) {
        if !self.silent.load(Ordering::SeqCst) {
            self.emit(event);
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Codes currently subscribed, in subscription order.
    pub fn subscriptions(&self) -> Vec<String> {
        lock(&self.subscriptions).iter().cloned().collect()
    }

    pub fn unsubscriptions(&self) -> Vec<String> {
        lock(&self.unsubscriptions).clone()
    }
}

impl NotificationChannel for Arc<FakeChannel> {
    fn connect(&self) -> BoxFuture<'static, ChannelResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            this.connects.fetch_add(1, Ordering::SeqCst);
            if this.fail_connect.load(Ordering::SeqCst) {
                this.report(ChannelEvent::Error {
                    message: "handshake refused".into(),
                });
                return Err(ChannelError::Connect("handshake refused".into()));
            }
            this.connected.store(true, Ordering::SeqCst);
            this.report(ChannelEvent::Connected);
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.connected.swap(false, Ordering::SeqCst) {
            self.report(ChannelEvent::Disconnected);
        }
    }

    fn subscribe_to_shoot(&self, code: String) -> BoxFuture<'static, ChannelResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            lock(&this.subscriptions).insert(code);
            Ok(())
        })
    }

    fn unsubscribe_from_shoot(&self, code: String) -> BoxFuture<'static, ChannelResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            lock(&this.subscriptions).shift_remove(&code);
            lock(&this.unsubscriptions).push(code);
            Ok(())
        })
    }

    fn events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }
}

/// Collects toasts.
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Toast> {
        lock(&self.toasts).clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        lock(&self.toasts).push(toast);
    }
}

/// Collects device notifications.
pub struct RecordingDeviceNotifier {
    permitted: bool,
    shown: Mutex<Vec<DeviceNotification>>,
}

impl Default for RecordingDeviceNotifier {
    fn default() -> Self {
        Self {
            permitted: true,
            shown: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingDeviceNotifier {
    pub fn denied() -> Self {
        Self {
            permitted: false,
            ..Self::default()
        }
    }

    pub fn shown(&self) -> Vec<DeviceNotification> {
        lock(&self.shown).clone()
    }
}

impl DeviceNotifier for RecordingDeviceNotifier {
    fn is_permitted(&self) -> bool {
        self.permitted
    }

    fn show(&self, notification: DeviceNotification) {
        lock(&self.shown).push(notification);
    }
}

/// Coordinator state wired to fakes, with handles to inspect each fake.
pub struct Harness {
    pub state: SharedState,
    pub service: Arc<FakeShootService>,
    pub channel: Arc<FakeChannel>,
    pub store: Arc<MemorySessionStore>,
    pub toasts: Arc<RecordingNotifier>,
    pub device: Arc<RecordingDeviceNotifier>,
    builds: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemorySessionStore::new())
    }

    pub fn with_record(record: PersistedSessionRecord) -> Self {
        Self::with_store(MemorySessionStore::with_record(record))
    }

    fn with_store(store: MemorySessionStore) -> Self {
        let service = Arc::new(FakeShootService::default());
        let channel = Arc::new(FakeChannel::default());
        let store = Arc::new(store);
        let toasts = Arc::new(RecordingNotifier::default());
        let device = Arc::new(RecordingDeviceNotifier::default());
        let builds = Arc::new(AtomicUsize::new(0));

        let factory_channel = channel.clone();
        let factory_builds = builds.clone();
        let state = LiveShootState::new(
            Collaborators {
                service: Arc::new(service.clone()),
                channel_factory: Box::new(move || {
                    factory_builds.fetch_add(1, Ordering::SeqCst);
                    Arc::new(factory_channel.clone()) as Arc<dyn NotificationChannel>
                }),
                store: store.clone(),
                user_notifier: toasts.clone(),
                device_notifier: device.clone(),
            },
            &LiveShootConfig::default(),
        );

        Self {
            state,
            service,
            channel,
            store,
            toasts,
            device,
            builds,
        }
    }

    pub fn channel_builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Let the event listener drain whatever the channel has emitted so far.
    pub async fn settle(&self) {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }
}
