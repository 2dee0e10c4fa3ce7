pub mod auth;
pub mod bookings;
pub mod orders;
pub mod products;
pub mod reviews;

use crate::error::{AppError, AppResult};

/// Trimmed copy of a required text field.
pub(crate) fn require_text(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
