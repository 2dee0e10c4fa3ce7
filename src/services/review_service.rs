use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::reviews::ReviewDraft,
    error::AppResult,
    models::{Review, ReviewTarget},
    state::AppState,
};

pub const REVIEW_FORM: &str = "review";

pub async fn submit_review(state: &AppState, draft: &ReviewDraft) -> AppResult<Review> {
    let (rating, comment) = draft.validate()?;
    let reviewer = state.session.actor()?;
    let review = Review {
        id: Uuid::new_v4(),
        reviewer_id: reviewer.id,
        target: draft.target,
        rating,
        comment,
        created_at: Utc::now(),
    };

    let _ticket = state.guard.begin(REVIEW_FORM)?;
    let review = state.data.insert_review(&reviewer, &review).await?;
    // Ratings shown in the catalog are recomputed server-side.
    state.catalog.refresh().await;

    match review.target {
        ReviewTarget::Product(id) => tracing::info!(product_id = %id, rating, "product reviewed"),
        ReviewTarget::Booking(id) => tracing::info!(booking_id = %id, rating, "booking reviewed"),
    }
    Ok(review)
}
