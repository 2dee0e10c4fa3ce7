use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderDraft {
    pub product_id: Uuid,
    pub quantity: i64,
    pub delivery_address: String,
}
