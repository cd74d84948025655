//! Live shoot session flows: create, join, view, restore, leave, score and cleanup.
//!
//! Every flow runs against the [`SharedState`]; the channel event listener may replace
//! the current shoot at any await point, so each flow treats its own last assignment as
//! the value it returns.

use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    dao::models::{PersistedSessionRecord, now_millis},
    dto::{
        requests::{CreateShootRequest, JoinShootRequest, ScoreSubmission},
        shoot::Shoot,
        validation::{normalize_shoot_code, validate_not_blank, validate_shoot_code},
    },
    error::CoordinatorError,
    services::user_notifier::Toast,
    state::{ConnectionStatus, SharedState},
};

/// Open a new shoot, join it as `creator_name` and push the initial score.
///
/// Returns the shoot this flow assigned last. When the join step fails the bare
/// created shoot is adopted instead and no session record is written.
pub async fn create_shoot(
    state: &SharedState,
    creator_name: &str,
    round_name: &str,
    initial_score: u32,
    initial_arrows: u32,
    title: Option<String>,
) -> Result<Shoot, CoordinatorError> {
    let request = CreateShootRequest {
        creator_name: creator_name.trim().to_string(),
        title: title.map(|title| title.trim().to_string()).filter(|title| !title.is_empty()),
    };
    let round_name = round_name.trim().to_string();

    if let Err(err) = request.validate() {
        state.notify(Toast::error("Please enter a valid archer name"));
        return Err(err.into());
    }
    if validate_not_blank(&round_name).is_err() {
        state.notify(Toast::error("Please choose a round"));
        return Err(CoordinatorError::InvalidInput(
            "round name must not be empty".into(),
        ));
    }

    let _loading = state.begin_loading();
    let previous = state.shoot_code();
    let CreateShootRequest {
        creator_name,
        title,
    } = request;

    let created = match state.service().create_shoot(creator_name.clone(), title).await {
        Ok(created) => created,
        Err(err) => {
            warn!(creator = %creator_name, error = %err, "failed to create live shoot");
            state.notify(Toast::error(format!("Failed to create shoot: {err}")));
            return Err(err.into());
        }
    };
    let code = created.code.clone();
    info!(code = %code, creator = %creator_name, "live shoot created");

    // Adopt the new code first so a reconnect during the join resubscribes it.
    state.replace_current_shoot(Some(created.shoot.clone()));
    connect_and_subscribe(state, &code, previous.as_deref()).await;

    let joined = state
        .service()
        .join_shoot(code.clone(), creator_name.clone(), round_name.clone())
        .await;
    let shoot = match joined {
        Ok(response) if response.success => response.shoot.unwrap_or(created.shoot),
        Ok(response) => {
            warn!(
                code = %code,
                reason = response.message.as_deref().unwrap_or("unknown"),
                "creator could not join new shoot"
            );
            return Ok(created.shoot);
        }
        Err(err) => {
            warn!(code = %code, error = %err, "creator could not join new shoot");
            return Ok(created.shoot);
        }
    };

    state.replace_current_shoot(Some(shoot.clone()));
    persist_membership(state, &code, &creator_name, &round_name);
    state
        .push()
        .configure_shoot(&code, Some(creator_name.clone()), true);

    let submission = ScoreSubmission::new(
        code.as_str(),
        creator_name,
        initial_score,
        round_name,
        initial_arrows,
    );
    let shoot = sync_score(state, submission).await.unwrap_or(shoot);

    state.notify(Toast::success(format!("Shoot {code} created")));
    Ok(shoot)
}

/// Join the existing shoot `code` as `archer_name`.
///
/// Returns `false` without touching the state when the input is invalid or the service
/// refuses or fails the join.
pub async fn join_shoot(
    state: &SharedState,
    code: &str,
    archer_name: &str,
    round_name: &str,
    initial_score: u32,
    initial_arrows: u32,
) -> bool {
    let request = JoinShootRequest {
        code: normalize_shoot_code(code),
        archer_name: archer_name.trim().to_string(),
        round_name: round_name.trim().to_string(),
    };
    if let Err(err) = request.validate() {
        debug!(error = %err, "join request rejected locally");
        state.notify(Toast::error("Please enter a valid shoot code and archer name"));
        return false;
    }

    let _loading = state.begin_loading();
    let JoinShootRequest {
        code,
        archer_name,
        round_name,
    } = request;

    let joined = state
        .service()
        .join_shoot(code.clone(), archer_name.clone(), round_name.clone())
        .await;
    let shoot = match joined {
        Ok(response) => {
            let reason = response.message.clone();
            match response.into_confirmed() {
                Some(shoot) => shoot,
                None => {
                    let reason = reason.unwrap_or_else(|| "shoot not found".into());
                    warn!(code = %code, archer = %archer_name, reason = %reason, "join rejected");
                    state.notify(Toast::error(format!("Could not join shoot {code}: {reason}")));
                    return false;
                }
            }
        }
        Err(err) => {
            warn!(code = %code, archer = %archer_name, error = %err, "failed to join live shoot");
            state.notify(Toast::error(format!("Could not join shoot {code}: {err}")));
            return false;
        }
    };

    let previous = state.shoot_code();
    state.replace_current_shoot(Some(shoot));
    persist_membership(state, &code, &archer_name, &round_name);
    state
        .push()
        .configure_shoot(&code, Some(archer_name.clone()), true);

    connect_and_subscribe(state, &code, previous.as_deref()).await;

    info!(code = %code, archer = %archer_name, "joined live shoot");
    let submission = ScoreSubmission::new(
        code.as_str(),
        archer_name,
        initial_score,
        round_name,
        initial_arrows,
    );
    sync_score(state, submission).await;

    true
}

/// Follow `code` without joining it. Nothing is persisted.
pub async fn connect_as_viewer(state: &SharedState, code: &str) -> bool {
    let code = normalize_shoot_code(code);
    if validate_shoot_code(&code).is_err() {
        state.notify(Toast::error("Please enter a valid shoot code"));
        return false;
    }

    let _loading = state.begin_loading();
    let shoot = match state.service().get_shoot(code.clone()).await {
        Ok(Some(shoot)) => shoot,
        Ok(None) => {
            info!(code = %code, "shoot to view not found");
            state.notify(Toast::error(format!("Shoot {code} not found")));
            return false;
        }
        Err(err) => {
            warn!(code = %code, error = %err, "failed to fetch shoot for viewing");
            state.notify(Toast::error(format!("Could not load shoot {code}: {err}")));
            return false;
        }
    };

    let previous = state.shoot_code();
    state.replace_current_shoot(Some(shoot));
    state.push().configure_shoot(&code, None, true);
    connect_and_subscribe(state, &code, previous.as_deref()).await;

    info!(code = %code, "viewing live shoot");
    true
}

/// Resume the shoot named by the persisted session record, if it is still valid.
///
/// Any record that cannot be resumed is purged. Failures here are never shown to the
/// user.
pub async fn restore_from_persisted_state(state: &SharedState) -> bool {
    let record = match state.store().load() {
        Ok(Some(record)) => record,
        Ok(None) => return false,
        Err(err) => {
            warn!(error = %err, "unreadable session record; discarding");
            purge_record(state);
            return false;
        }
    };

    let code = record.shoot_code.clone();
    if record.is_expired_at(now_millis(), state.session_max_age()) {
        info!(code = %code, "session record expired");
        purge_record(state);
        return false;
    }

    let _loading = state.begin_loading();
    let shoot = match state.service().get_shoot(code.clone()).await {
        Ok(Some(shoot)) => shoot,
        Ok(None) => {
            info!(code = %code, "persisted shoot no longer exists");
            purge_record(state);
            return false;
        }
        Err(err) => {
            warn!(code = %code, error = %err, "could not verify persisted shoot");
            purge_record(state);
            return false;
        }
    };

    if !shoot.has_participant(&record.archer_name) {
        info!(code = %code, archer = %record.archer_name, "archer no longer in persisted shoot");
        purge_record(state);
        return false;
    }

    let previous = state.shoot_code();
    state.replace_current_shoot(Some(shoot));
    state
        .push()
        .configure_shoot(&code, Some(record.archer_name.clone()), true);
    connect_and_subscribe(state, &code, previous.as_deref()).await;

    info!(code = %code, archer = %record.archer_name, "restored live shoot session");
    true
}

/// Leave the current shoot as `archer_name`.
///
/// On failure the state and the session record are left untouched.
pub async fn leave_shoot(state: &SharedState, archer_name: &str) -> Result<(), CoordinatorError> {
    let Some(code) = state.shoot_code() else {
        return Ok(());
    };

    let _loading = state.begin_loading();
    let response = match state
        .service()
        .leave_shoot(code.clone(), archer_name.to_string())
        .await
    {
        Ok(response) => response,
        Err(err) => {
            warn!(code = %code, archer = %archer_name, error = %err, "failed to leave live shoot");
            state.notify(Toast::error(format!("Could not leave shoot: {err}")));
            return Err(err.into());
        }
    };

    if !response.success {
        let reason = response.message.unwrap_or_else(|| "leave rejected".into());
        warn!(code = %code, archer = %archer_name, reason = %reason, "leave rejected");
        state.notify(Toast::error(format!("Could not leave shoot: {reason}")));
        return Err(CoordinatorError::Rejected(reason));
    }

    if let Some(channel) = state.existing_channel() {
        if let Err(err) = channel.unsubscribe_from_shoot(code.clone()).await {
            warn!(code = %code, error = %err, "failed to unsubscribe after leaving");
        }
    }
    purge_record(state);
    if let Some(push) = state.existing_push() {
        push.clear_shoot_settings(&code);
    }
    state.replace_current_shoot(None);

    info!(code = %code, archer = %archer_name, "left live shoot");
    Ok(())
}

/// Push `archer_name`'s running score.
///
/// The current shoot is not replaced; the broadcast echo carries the confirmed state.
pub async fn update_score(
    state: &SharedState,
    archer_name: &str,
    total_score: u32,
    round_name: &str,
    arrows_shot: u32,
    classification: Option<String>,
    end_scores: Option<Vec<u32>>,
) -> bool {
    let Some(code) = state.shoot_code() else {
        debug!("score update without an active shoot");
        return false;
    };

    let mut submission =
        ScoreSubmission::new(code, archer_name, total_score, round_name, arrows_shot);
    submission.classification = classification;
    submission.end_scores = end_scores;

    submit_score(state, submission, false).await.is_some()
}

/// Submit `archer_name`'s final score and adopt the confirmed shoot.
pub async fn finish_shoot(
    state: &SharedState,
    archer_name: &str,
    total_score: u32,
    round_name: &str,
    arrows_shot: u32,
    classification: Option<String>,
    end_scores: Option<Vec<u32>>,
) -> bool {
    let Some(code) = state.shoot_code() else {
        debug!("finish without an active shoot");
        return false;
    };

    let mut submission =
        ScoreSubmission::new(code, archer_name, total_score, round_name, arrows_shot);
    submission.classification = classification;
    submission.end_scores = end_scores;

    let _loading = state.begin_loading();
    let Some(confirmed) = submit_score(state, submission, true).await else {
        return false;
    };

    if let Some(shoot) = confirmed {
        state.replace_current_shoot(Some(shoot));
    }
    state.notify(Toast::success(format!(
        "Final score of {total_score} submitted"
    )));
    true
}

/// Stop following the current shoot without leaving it.
///
/// The session record survives so the shoot can be restored later.
pub fn cleanup(state: &SharedState) {
    if let Some(channel) = state.existing_channel() {
        channel.disconnect();
    }
    if let (Some(code), Some(push)) = (state.shoot_code(), state.existing_push()) {
        push.clear_shoot_settings(&code);
    }
    state.set_connection_status(ConnectionStatus::Disconnected);
    state.replace_current_shoot(None);
    debug!("live shoot coordinator cleaned up");
}

/// Make sure the channel is connected and subscribed to `code`, dropping the
/// subscription to `previous` when it names another shoot.
///
/// Channel failures are only logged; the connection status follows the channel's own
/// lifecycle events.
async fn connect_and_subscribe(state: &SharedState, code: &str, previous: Option<&str>) {
    let channel = state.channel();

    if let Some(previous) = previous.filter(|previous| *previous != code) {
        if let Err(err) = channel.unsubscribe_from_shoot(previous.to_string()).await {
            warn!(code = %previous, error = %err, "failed to unsubscribe from previous shoot");
        }
    }

    if !channel.is_connected() {
        if let Err(err) = channel.connect().await {
            warn!(error = %err, "notification channel connect failed");
            return;
        }
    }

    if let Err(err) = channel.subscribe_to_shoot(code.to_string()).await {
        warn!(code = %code, error = %err, "failed to subscribe to shoot");
    }
}

/// Push the initial score after joining and adopt the returned shoot, if any.
async fn sync_score(state: &SharedState, submission: ScoreSubmission) -> Option<Shoot> {
    let code = submission.code.clone();
    match state.service().update_score(submission).await {
        Ok(response) => {
            let shoot = response.into_confirmed()?;
            state.replace_current_shoot(Some(shoot.clone()));
            Some(shoot)
        }
        Err(err) => {
            warn!(code = %code, error = %err, "initial score sync failed");
            None
        }
    }
}

/// Send a score submission. `Some` carries the confirmed shoot, when the service
/// returned one; `None` means the submission failed and the user was told.
async fn submit_score(
    state: &SharedState,
    submission: ScoreSubmission,
    finish: bool,
) -> Option<Option<Shoot>> {
    if let Err(err) = submission.validate() {
        debug!(error = %err, "score submission rejected locally");
        state.notify(Toast::error("Score could not be sent: invalid archer or round"));
        return None;
    }

    let code = submission.code.clone();
    let archer = submission.archer_name.clone();
    let result = if finish {
        state.service().finish_shoot(submission).await
    } else {
        state.service().update_score(submission).await
    };

    match result {
        Ok(response) if response.success => {
            debug!(code = %code, archer = %archer, finish, "score accepted");
            Some(response.shoot)
        }
        Ok(response) => {
            let reason = response.message.unwrap_or_else(|| "rejected".into());
            warn!(code = %code, archer = %archer, reason = %reason, "score rejected");
            state.notify(Toast::error(format!("Score could not be sent: {reason}")));
            None
        }
        Err(err) => {
            warn!(code = %code, archer = %archer, error = %err, "score submission failed");
            state.notify(Toast::error(format!("Score could not be sent: {err}")));
            None
        }
    }
}

fn persist_membership(state: &SharedState, code: &str, archer_name: &str, round_name: &str) {
    let record = PersistedSessionRecord::new(code, archer_name, round_name);
    if let Err(err) = state.store().save(&record) {
        warn!(code = %code, error = %err, "failed to persist session record");
    }
}

fn purge_record(state: &SharedState) {
    if let Err(err) = state.store().clear() {
        warn!(error = %err, "failed to clear session record");
    }
}
