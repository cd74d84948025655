//! Device notifications derived from live shoot updates.
//!
//! The manager keeps one [`ShootPushSettings`] entry per shoot code. Each update is
//! reduced to a roster fingerprint; an update whose fingerprint matches the last one
//! processed for that shoot is a duplicate and never reaches the device.

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::debug;
use uuid::Uuid;

use crate::dto::shoot::Participant;

/// Native notification handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNotification {
    /// Unique per notification.
    pub id: Uuid,
    /// Platform replacement tag; a newer notification with the same tag supersedes older ones.
    pub tag: String,
    /// Heading line.
    pub title: String,
    /// Message text.
    pub body: String,
}

/// Platform notification API.
pub trait DeviceNotifier: Send + Sync {
    /// Whether the user granted notification permission.
    fn is_permitted(&self) -> bool {
        true
    }
    /// Display `notification`.
    fn show(&self, notification: DeviceNotification);
}

/// Per-shoot notification state.
#[derive(Debug, Clone)]
pub struct ShootPushSettings {
    /// Notifications for this shoot are wanted.
    pub enabled: bool,
    /// Archer using this device; their own updates are not announced.
    pub local_archer: Option<String>,
    last_roster: Option<IndexMap<String, RosterMark>>,
    last_leader: Option<String>,
}

impl Default for ShootPushSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            local_archer: None,
            last_roster: None,
            last_leader: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RosterMark {
    total_score: u32,
    arrows_shot: u32,
    finished: bool,
}

/// Decides when a shoot update becomes a device notification.
pub struct PushNotificationManager {
    notifier: Arc<dyn DeviceNotifier>,
    settings: DashMap<String, ShootPushSettings>,
}

impl PushNotificationManager {
    /// Manager with no per-shoot settings yet.
    pub fn new(notifier: Arc<dyn DeviceNotifier>) -> Self {
        Self {
            notifier,
            settings: DashMap::new(),
        }
    }

    /// Set the local archer and enabled flag for `code`, keeping de-duplication state.
    pub fn configure_shoot(&self, code: &str, local_archer: Option<String>, enabled: bool) {
        let mut entry = self.settings.entry(code.to_string()).or_default();
        entry.local_archer = local_archer;
        entry.enabled = enabled;
    }

    /// Copy of the settings held for `code`.
    pub fn settings(&self, code: &str) -> Option<ShootPushSettings> {
        self.settings.get(code).map(|entry| entry.value().clone())
    }

    /// Drop every setting held for `code`.
    pub fn clear_shoot_settings(&self, code: &str) {
        if self.settings.remove(code).is_some() {
            debug!(code, "cleared push settings");
        }
    }

    /// Process a roster snapshot produced by `triggering_archer`'s update.
    ///
    /// Returns the notification that was shown, if any. Safe to call for every event:
    /// repeated rosters are ignored.
    pub fn process_shoot_update(
        &self,
        code: &str,
        participants: &[Participant],
        triggering_archer: &str,
    ) -> Option<DeviceNotification> {
        let roster = fingerprint(participants);
        let leader = leader_name(participants);

        let notification = {
            let mut entry = self.settings.entry(code.to_string()).or_default();
            if entry.last_roster.as_ref() == Some(&roster) {
                debug!(code, archer = triggering_archer, "duplicate shoot update ignored");
                return None;
            }

            let previous = entry.last_roster.replace(roster);
            let previous_leader = std::mem::replace(&mut entry.last_leader, leader.clone());

            if !entry.enabled || entry.local_archer.as_deref() == Some(triggering_archer) {
                return None;
            }

            let archer = participants
                .iter()
                .find(|participant| participant.archer_name == triggering_archer)?;
            let was_finished = previous
                .as_ref()
                .and_then(|roster| roster.get(triggering_archer))
                .is_some_and(|mark| mark.finished);

            let body = if archer.finished && !was_finished {
                format!("{} finished with {}", archer.archer_name, archer.total_score)
            } else if leader.as_deref() == Some(triggering_archer)
                && previous_leader.as_deref() != Some(triggering_archer)
            {
                format!(
                    "{} took the lead with {}",
                    archer.archer_name, archer.total_score
                )
            } else {
                format!(
                    "{} is on {} after {} arrows",
                    archer.archer_name, archer.total_score, archer.arrows_shot
                )
            };

            DeviceNotification {
                id: Uuid::new_v4(),
                tag: format!("shoot-{code}-{triggering_archer}"),
                title: format!("Live shoot {code}"),
                body,
            }
        };

        if !self.notifier.is_permitted() {
            debug!(code, "device notifications not permitted");
            return None;
        }

        self.notifier.show(notification.clone());
        Some(notification)
    }
}

fn fingerprint(participants: &[Participant]) -> IndexMap<String, RosterMark> {
    participants
        .iter()
        .map(|participant| {
            (
                participant.archer_name.clone(),
                RosterMark {
                    total_score: participant.total_score,
                    arrows_shot: participant.arrows_shot,
                    finished: participant.finished,
                },
            )
        })
        .collect()
}

fn leader_name(participants: &[Participant]) -> Option<String> {
    participants
        .iter()
        .fold(None, |best: Option<&Participant>, candidate| match best {
            Some(current) if current.total_score >= candidate.total_score => Some(current),
            _ => Some(candidate),
        })
        .map(|participant| participant.archer_name.clone())
}
