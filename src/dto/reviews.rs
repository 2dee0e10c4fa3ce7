use serde::{Deserialize, Serialize};

use crate::dto::optional_text;
use crate::error::{AppError, AppResult};
use crate::models::ReviewTarget;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewDraft {
    pub target: ReviewTarget,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

impl ReviewDraft {
    pub fn validate(&self) -> AppResult<(u8, String)> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::Validation("rating must be between 1 and 5".into()));
        }
        let comment = optional_text(Some(&self.comment)).unwrap_or_default();
        Ok((self.rating as u8, comment))
    }
}
