use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{
    BookingStatus, Capability, FulfillmentMode, Location, OrderStatus, ProductCategory, Role,
    ServiceCategory, TimeSlot,
};
use crate::error::{AppError, AppResult};

pub const LOW_STOCK_THRESHOLD: u32 = 5;
pub const DEFAULT_PRODUCT_IMAGE: &str = "https://images.pexels.com/photos/699122/pexels-photo-699122.jpeg";
pub const DEFAULT_ELECTRICIAN_IMAGE: &str =
    "https://images.pexels.com/photos/1516680/pexels-photo-1516680.jpeg";
pub const DEFAULT_SHOP_ADDRESS: &str = "Electrician's Shop";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<Location>,
    pub verified: bool,
    pub avatar: Option<String>,
    /// Present only for electricians.
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
}

impl Identity {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    pub fn ensure(&self, capability: Capability) -> AppResult<()> {
        if !self.can(capability) {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: ProductCategory,
    pub brand: String,
    pub images: Vec<String>,
    pub seller_id: Uuid,
    pub seller_name: String,
    pub stock: u32,
    pub sold: u32,
    pub rating: f32,
    pub review_count: u32,
    pub specifications: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn low_stock(&self) -> bool {
        self.in_stock() && self.stock <= LOW_STOCK_THRESHOLD
    }

    pub fn cover_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_PRODUCT_IMAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    pub base_price: i64,
    pub on_site_price: i64,
    pub electrician_id: Uuid,
    pub electrician_name: String,
    pub electrician_rating: f32,
    pub electrician_image: Option<String>,
    pub shop_address: String,
    pub duration: String,
    pub availability: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePair {
    pub base_rate: i64,
    pub on_site_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricianProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialties: Vec<String>,
    pub experience_years: u32,
    pub rating: f32,
    pub review_count: u32,
    pub avatar: Option<String>,
    pub certifications: Vec<String>,
    pub service_areas: Vec<Location>,
    pub pricing: RatePair,
}

/// A service booking. Everything but `status` is fixed once created, so the
/// price snapshot never drifts from what the customer agreed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub(crate) id: Uuid,
    pub(crate) service_id: Uuid,
    pub(crate) customer_id: Uuid,
    pub(crate) electrician_id: Uuid,
    pub(crate) mode: FulfillmentMode,
    pub(crate) location: String,
    pub(crate) price: i64,
    pub(crate) scheduled_date: NaiveDate,
    pub(crate) scheduled_time: TimeSlot,
    pub(crate) notes: String,
    pub(crate) status: BookingStatus,
    pub(crate) created_at: DateTime<Utc>,
}

impl Booking {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service_id(&self) -> Uuid {
        self.service_id
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn electrician_id(&self) -> Uuid {
        self.electrician_id
    }

    pub fn mode(&self) -> FulfillmentMode {
        self.mode
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    pub fn scheduled_time(&self) -> TimeSlot {
        self.scheduled_time
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Equal in every field except identity and creation time.
    pub fn same_request_as(&self, other: &Booking) -> bool {
        self.service_id == other.service_id
            && self.customer_id == other.customer_id
            && self.electrician_id == other.electrician_id
            && self.mode == other.mode
            && self.location == other.location
            && self.price == other.price
            && self.scheduled_date == other.scheduled_date
            && self.scheduled_time == other.scheduled_time
            && self.notes == other.notes
            && self.status == other.status
    }

    pub(crate) fn transition(&mut self, next: BookingStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "booking cannot move from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// A product order. Like [`Booking`], only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub(crate) id: Uuid,
    pub(crate) customer_id: Uuid,
    pub(crate) product_id: Uuid,
    pub(crate) seller_id: Uuid,
    pub(crate) quantity: u32,
    pub(crate) unit_price: i64,
    pub(crate) total_price: i64,
    pub(crate) status: OrderStatus,
    pub(crate) delivery_address: String,
    pub(crate) estimated_delivery: Option<NaiveDate>,
    pub(crate) created_at: DateTime<Utc>,
}

impl Order {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    pub fn seller_id(&self) -> Uuid {
        self.seller_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }

    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn estimated_delivery(&self) -> Option<NaiveDate> {
        self.estimated_delivery
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn transition(&mut self, next: OrderStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "order cannot move from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// An order joined with the display fields of its product and seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order: Order,
    pub product_name: String,
    pub product_image: String,
    pub seller_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum ReviewTarget {
    Product(Uuid),
    Booking(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub target: ReviewTarget,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Seller dashboard figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOverview {
    pub product_count: usize,
    pub out_of_stock: usize,
    pub units_sold: u64,
    pub revenue: i64,
}
