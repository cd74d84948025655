//! Request and response payloads exchanged with the shoot service.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dto::{
    shoot::Shoot,
    validation::{validate_not_blank, validate_shoot_code},
};

const MAX_NAME_LENGTH: usize = 64;
const MAX_TITLE_LENGTH: usize = 120;

/// Payload used to open a new live shoot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShootRequest {
    /// Name of the archer opening the shoot.
    pub creator_name: String,
    /// Optional display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Validate for CreateShootRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_name(&self.creator_name) {
            errors.add("creator_name", e);
        }

        if let Some(title) = self.title.as_deref() {
            if title.chars().count() > MAX_TITLE_LENGTH {
                let mut err = ValidationError::new("title_length");
                err.message =
                    Some(format!("Title must be at most {MAX_TITLE_LENGTH} characters").into());
                errors.add("title", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to register an archer in an existing shoot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinShootRequest {
    /// Normalised shoot code.
    pub code: String,
    /// Name the archer appears under.
    pub archer_name: String,
    /// Round the archer is shooting.
    pub round_name: String,
}

impl Validate for JoinShootRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_shoot_code(&self.code) {
            errors.add("code", e);
        }
        if let Err(e) = validate_name(&self.archer_name) {
            errors.add("archer_name", e);
        }
        if let Err(e) = validate_not_blank(&self.round_name) {
            errors.add("round_name", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to remove an archer from a shoot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveShootRequest {
    /// Archer to remove.
    pub archer_name: String,
}

/// Score state pushed for one archer, used by both score updates and finishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    /// Target shoot; carried in the path, not the body.
    #[serde(skip)]
    pub code: String,
    /// Archer the score belongs to.
    #[validate(length(min = 1, max = 64))]
    pub archer_name: String,
    /// Running total.
    pub total_score: u32,
    /// Round being shot.
    #[validate(length(min = 1))]
    pub round_name: String,
    /// Arrows counted so far.
    pub arrows_shot: u32,
    /// Classification reached, if computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Per-end subtotals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_scores: Option<Vec<u32>>,
}

impl ScoreSubmission {
    /// Submission without classification or per-end detail.
    pub fn new(
        code: impl Into<String>,
        archer_name: impl Into<String>,
        total_score: u32,
        round_name: impl Into<String>,
        arrows_shot: u32,
    ) -> Self {
        Self {
            code: code.into(),
            archer_name: archer_name.into(),
            total_score,
            round_name: round_name.into(),
            arrows_shot,
            classification: None,
            end_scores: None,
        }
    }
}

/// Result of creating a shoot: the allocated code and the (participant-less) shoot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShootResponse {
    /// Code allocated by the server.
    pub code: String,
    /// The new shoot.
    pub shoot: Shoot,
}

/// Generic outcome returned by join, leave, score and finish calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootResponse {
    /// Whether the server accepted the call.
    pub success: bool,
    /// Updated snapshot, when the server sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoot: Option<Shoot>,
    /// Server-provided reason when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ShootResponse {
    /// Successful outcome carrying `shoot`.
    pub fn ok(shoot: Shoot) -> Self {
        Self {
            success: true,
            shoot: Some(shoot),
            message: None,
        }
    }

    /// Successful outcome without a snapshot.
    pub fn accepted() -> Self {
        Self {
            success: true,
            shoot: None,
            message: None,
        }
    }

    /// Rejected outcome with a reason.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            shoot: None,
            message: Some(message.into()),
        }
    }

    /// The confirmed shoot, only when the call succeeded.
    pub fn into_confirmed(self) -> Option<Shoot> {
        if self.success { self.shoot } else { None }
    }
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;
    if value.chars().count() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some(format!("Name must be at most {MAX_NAME_LENGTH} characters").into());
        return Err(err);
    }
    Ok(())
}
