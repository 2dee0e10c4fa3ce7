use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::backend::{DataBackend, ProductQuery, SessionBackend, SessionEvent};
use crate::dto::auth::{NewProfile, ProfileChanges};
use crate::dto::products::{NewProduct, ProductChanges};
use crate::enums::{BookingStatus, OrderStatus};
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, ElectricianProfile, Identity, Order, OrderSummary, Product, Review, Service,
};

/// Stand-in used when no hosted backend is configured. Reads fail so the
/// stores fall back to the seed dataset; writes fail so the UI reports them.
pub struct UnconfiguredBackend {
    events: broadcast::Sender<SessionEvent>,
}

impl Default for UnconfiguredBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl UnconfiguredBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

fn unavailable<T>() -> AppResult<T> {
    Err(AppError::ServiceUnavailable(
        "hosted backend is not configured".into(),
    ))
}

#[async_trait]
impl DataBackend for UnconfiguredBackend {
    async fn list_products(&self, _query: ProductQuery) -> AppResult<Vec<Product>> {
        unavailable()
    }

    async fn list_services(&self) -> AppResult<Vec<Service>> {
        unavailable()
    }

    async fn list_electricians(&self) -> AppResult<Vec<ElectricianProfile>> {
        unavailable()
    }

    async fn insert_product(&self, _actor: &Identity, _product: NewProduct) -> AppResult<Product> {
        unavailable()
    }

    async fn update_product(
        &self,
        _actor: &Identity,
        _id: Uuid,
        _changes: &ProductChanges,
    ) -> AppResult<Product> {
        unavailable()
    }

    async fn delete_product(&self, _actor: &Identity, _id: Uuid) -> AppResult<()> {
        unavailable()
    }

    async fn insert_booking(&self, _actor: &Identity, _booking: &Booking) -> AppResult<Booking> {
        unavailable()
    }

    async fn list_bookings(&self, _actor: &Identity) -> AppResult<Vec<Booking>> {
        unavailable()
    }

    async fn update_booking_status(
        &self,
        _actor: &Identity,
        _id: Uuid,
        _status: BookingStatus,
    ) -> AppResult<Booking> {
        unavailable()
    }

    async fn insert_order(&self, _actor: &Identity, _order: &Order) -> AppResult<Order> {
        unavailable()
    }

    async fn list_orders(&self, _actor: &Identity) -> AppResult<Vec<OrderSummary>> {
        unavailable()
    }

    async fn update_order_status(
        &self,
        _actor: &Identity,
        _id: Uuid,
        _status: OrderStatus,
    ) -> AppResult<Order> {
        unavailable()
    }

    async fn insert_review(&self, _actor: &Identity, _review: &Review) -> AppResult<Review> {
        unavailable()
    }
}

#[async_trait]
impl SessionBackend for UnconfiguredBackend {
    async fn sign_up(&self, _profile: &NewProfile, _password: &str) -> AppResult<Identity> {
        unavailable()
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> AppResult<Identity> {
        unavailable()
    }

    async fn sign_out(&self) -> AppResult<()> {
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Identity>> {
        Ok(None)
    }

    async fn update_profile(
        &self,
        _actor: &Identity,
        _changes: &ProfileChanges,
    ) -> AppResult<Identity> {
        unavailable()
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
