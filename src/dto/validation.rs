//! Validation helpers for DTOs.

use validator::ValidationError;

const MIN_CODE_LENGTH: usize = 4;
const MAX_CODE_LENGTH: usize = 8;

/// Normalise a user-entered shoot code: surrounding whitespace removed, upper-cased.
pub fn normalize_shoot_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validates that a shoot code is 4 to 8 upper-case ASCII alphanumerics.
///
/// # Examples
///
/// ```ignore
/// validate_shoot_code("AB12")  // Ok
/// validate_shoot_code("ab12")  // Err - lowercase, normalise first
/// validate_shoot_code("AB1")   // Err - too short
/// ```
pub fn validate_shoot_code(code: &str) -> Result<(), ValidationError> {
    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len()) {
        let mut err = ValidationError::new("shoot_code_length");
        err.message = Some(
            format!(
                "Shoot code must be {MIN_CODE_LENGTH} to {MAX_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        let mut err = ValidationError::new("shoot_code_format");
        err.message = Some("Shoot code must contain only upper-case letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Rejects names made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
