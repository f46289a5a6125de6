//! Validation Utilities

use validator::ValidationErrors;

use super::error::{AppError, FieldError};

/// Maximum message length in characters.
pub const MAX_CONTENT_LENGTH: usize = 4000;

/// Maximum emoji identifier length in characters.
pub const MAX_EMOJI_LENGTH: usize = 32;

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
            })
        })
        .collect();

    let message = field_errors
        .first()
        .map(|e| format!("{}: {}", e.field, e.message))
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Message content must carry something besides whitespace and fit the length cap.
pub fn validate_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Message content cannot be empty".into()));
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(AppError::Validation(format!(
            "Message content cannot exceed {} characters",
            MAX_CONTENT_LENGTH
        )));
    }
    Ok(())
}

/// Emoji are opaque short tokens (unicode sequence or custom name).
pub fn validate_emoji(emoji: &str) -> Result<(), AppError> {
    if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_LENGTH {
        return Err(AppError::Validation("Invalid emoji".into()));
    }
    if emoji.chars().any(char::is_whitespace) {
        return Err(AppError::Validation("Invalid emoji".into()));
    }
    Ok(())
}

/// Channel handles: 3-30 ASCII letters, digits or underscores.
pub fn validate_channel_username(username: &str) -> Result<(), AppError> {
    let len = username.len();
    let well_formed = (3..=30).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !well_formed {
        return Err(AppError::Validation(
            "Username must be 3-30 characters and contain only letters, numbers, and underscores"
                .into(),
        ));
    }
    Ok(())
}
