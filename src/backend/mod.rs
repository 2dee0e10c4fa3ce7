//! Seams to the hosted marketplace: the row-oriented data service and the
//! session service. The stores only ever talk to these traits.

pub mod memory;
pub mod orm;
pub mod session;
pub mod unconfigured;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::auth::{NewProfile, ProfileChanges};
use crate::dto::products::{NewProduct, ProductChanges};
use crate::enums::{BookingStatus, OrderStatus};
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, ElectricianProfile, Identity, Order, OrderSummary, Product, Review, Service,
};

pub use memory::MemoryBackend;
pub use orm::OrmBackend;
pub use session::OrmSessionBackend;
pub use unconfigured::UnconfiguredBackend;

/// Predicates pushed down to the products table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub seller_id: Option<Uuid>,
    pub in_stock_only: bool,
}

impl ProductQuery {
    pub fn for_seller(seller_id: Uuid) -> Self {
        Self {
            seller_id: Some(seller_id),
            in_stock_only: false,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.seller_id.is_none_or(|seller| product.seller_id == seller)
            && (!self.in_stock_only || product.in_stock())
    }
}

/// Out-of-band session changes pushed by the session service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Uuid),
    SignedOut,
    Expired,
}

#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Products newest first.
    async fn list_products(&self, query: ProductQuery) -> AppResult<Vec<Product>>;

    /// Active services newest first, joined with their electrician.
    async fn list_services(&self) -> AppResult<Vec<Service>>;

    async fn list_electricians(&self) -> AppResult<Vec<ElectricianProfile>>;

    async fn insert_product(&self, actor: &Identity, product: NewProduct) -> AppResult<Product>;

    async fn update_product(
        &self,
        actor: &Identity,
        id: Uuid,
        changes: &ProductChanges,
    ) -> AppResult<Product>;

    async fn delete_product(&self, actor: &Identity, id: Uuid) -> AppResult<()>;

    async fn insert_booking(&self, actor: &Identity, booking: &Booking) -> AppResult<Booking>;

    /// Bookings where the actor is the customer or the electrician.
    async fn list_bookings(&self, actor: &Identity) -> AppResult<Vec<Booking>>;

    async fn update_booking_status(
        &self,
        actor: &Identity,
        id: Uuid,
        status: BookingStatus,
    ) -> AppResult<Booking>;

    /// Records the order and moves `quantity` units from stock to sold.
    async fn insert_order(&self, actor: &Identity, order: &Order) -> AppResult<Order>;

    /// Orders where the actor is the customer or the seller, newest first.
    async fn list_orders(&self, actor: &Identity) -> AppResult<Vec<OrderSummary>>;

    async fn update_order_status(
        &self,
        actor: &Identity,
        id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Order>;

    async fn insert_review(&self, actor: &Identity, review: &Review) -> AppResult<Review>;
}

#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Creates the account and signs it in.
    async fn sign_up(&self, profile: &NewProfile, password: &str) -> AppResult<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;

    async fn sign_out(&self) -> AppResult<()>;

    async fn current_session(&self) -> AppResult<Option<Identity>>;

    async fn update_profile(
        &self,
        actor: &Identity,
        changes: &ProfileChanges,
    ) -> AppResult<Identity>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// The customer may only cancel; the electrician drives the rest.
pub(crate) fn authorize_booking_change(
    actor: &Identity,
    booking: &Booking,
    next: BookingStatus,
) -> AppResult<()> {
    if actor.id == booking.electrician_id() {
        return Ok(());
    }
    if actor.id == booking.customer_id() {
        return match next {
            BookingStatus::Cancelled => Ok(()),
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Completed => {
                Err(AppError::Forbidden)
            }
        };
    }
    Err(AppError::NotOwner)
}

/// The customer may only cancel; the seller drives fulfilment.
pub(crate) fn authorize_order_change(
    actor: &Identity,
    order: &Order,
    next: OrderStatus,
) -> AppResult<()> {
    if actor.id == order.seller_id() {
        return Ok(());
    }
    if actor.id == order.customer_id() {
        return match next {
            OrderStatus::Cancelled => Ok(()),
            OrderStatus::Pending
            | OrderStatus::Confirmed
            | OrderStatus::Shipped
            | OrderStatus::Delivered => Err(AppError::Forbidden),
        };
    }
    Err(AppError::NotOwner)
}
