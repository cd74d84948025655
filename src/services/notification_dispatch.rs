use tracing::debug;

use crate::{
    dto::events::{NotificationType, ShootNotification},
    services::user_notifier::Toast,
};

/// What the UI should do with a server notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Show a toast.
    Toast(Toast),
    /// Recognised type that is deliberately not shown during a live shoot.
    Silent,
    /// Unrecognised type; logged and dropped.
    Ignored,
}

/// Map a notification to the UI action for the active shoot.
///
/// Only finished archers are announced; joins, leaves, score and position changes stay
/// silent while a shoot is live.
pub fn ui_action_for(notification: &ShootNotification) -> UiAction {
    match &notification.kind {
        NotificationType::ArcherFinished => UiAction::Toast(Toast::info(finished_message(notification))),
        NotificationType::JoinedShoot
        | NotificationType::LeftShoot
        | NotificationType::PositionChange
        | NotificationType::ScoreUpdate => UiAction::Silent,
        NotificationType::Unknown(kind) => {
            debug!(kind = %kind, "unknown shoot notification type");
            UiAction::Ignored
        }
    }
}

fn finished_message(notification: &ShootNotification) -> String {
    let Some(archer) = notification.archer_name.as_deref() else {
        return "An archer has finished".to_string();
    };

    let score = notification
        .shoot
        .as_ref()
        .and_then(|shoot| shoot.participant(archer))
        .map(|participant| participant.total_score);

    match score {
        Some(score) => format!("{archer} has finished with {score}"),
        None => format!("{archer} has finished"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::shoot::{Participant, Shoot};

    #[test]
    fn archer_finished_becomes_a_toast() {
        let mut shoot = Shoot::new("AB12");
        shoot.participants = vec![Participant::new("Bob", "national").with_score(512, 72).finished()];
        let notification = ShootNotification::new(NotificationType::ArcherFinished)
            .with_archer("Bob")
            .with_shoot(shoot);

        assert_eq!(
            ui_action_for(&notification),
            UiAction::Toast(Toast::info("Bob has finished with 512"))
        );
    }

    #[test]
    fn archer_finished_without_snapshot_omits_score() {
        let notification =
            ShootNotification::new(NotificationType::ArcherFinished).with_archer("Bob");
        assert_eq!(
            ui_action_for(&notification),
            UiAction::Toast(Toast::info("Bob has finished"))
        );
    }

    #[test]
    fn live_progress_types_are_silent() {
        for kind in [
            NotificationType::JoinedShoot,
            NotificationType::LeftShoot,
            NotificationType::PositionChange,
            NotificationType::ScoreUpdate,
        ] {
            assert_eq!(ui_action_for(&ShootNotification::new(kind)), UiAction::Silent);
        }
    }

    #[test]
    fn unknown_types_are_ignored() {
        let notification = ShootNotification::new(NotificationType::Unknown("wind_warning".into()));
        assert_eq!(ui_action_for(&notification), UiAction::Ignored);
    }
}
