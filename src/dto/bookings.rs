use serde::{Deserialize, Serialize};

use crate::enums::FulfillmentMode;

/// Booking form values. `location` is only read for on-site bookings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BookingForm {
    pub mode: FulfillmentMode,
    #[serde(default)]
    pub location: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:00`
    pub time: String,
    #[serde(default)]
    pub notes: String,
}
