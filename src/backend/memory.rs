use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::backend::{
    DataBackend, ProductQuery, SessionBackend, SessionEvent, authorize_booking_change,
    authorize_order_change,
};
use crate::dto::auth::{NewProfile, ProfileChanges};
use crate::dto::products::{NewProduct, ProductChanges};
use crate::enums::{BookingStatus, Capability, OrderStatus, Role};
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, ElectricianProfile, Identity, Order, OrderSummary, Product, RatePair, Review,
    ReviewTarget, Service, DEFAULT_PRODUCT_IMAGE,
};
use crate::seed;

#[derive(Default)]
struct Tables {
    identities: Vec<Identity>,
    credentials: HashMap<String, (Uuid, String)>,
    current: Option<Uuid>,
    products: Vec<Product>,
    services: Vec<Service>,
    electricians: Vec<ElectricianProfile>,
    bookings: Vec<Booking>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
}

/// In-process stand-in for both hosted collaborators. Counts every call and
/// can be switched offline or slowed down, which is what the store tests
/// observe.
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    available: AtomicBool,
    calls: AtomicUsize,
    write_latency: Mutex<Option<Duration>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            write_latency: Mutex::new(None),
            events,
        }
    }

    /// Pre-loaded with the seed catalog and the accounts that own it.
    pub fn seeded() -> Self {
        let backend = Self::new();
        {
            let mut tables = backend.tables();
            tables.identities = seed::seed_identities();
            tables.products = seed::seed_products();
            tables.services = seed::seed_services();
            tables.electricians = seed::seed_electricians();
        }
        backend
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every write sleeps this long before applying.
    pub fn set_write_latency(&self, latency: Duration) {
        *self
            .write_latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(latency);
    }

    /// Number of collaborator calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Registers credentials for an existing identity.
    pub fn add_account(&self, identity: Identity, password: &str) {
        let mut tables = self.tables();
        tables
            .credentials
            .insert(identity.email.to_lowercase(), (identity.id, password.to_string()));
        tables.identities.retain(|i| i.id != identity.id);
        tables.identities.push(identity);
    }

    pub fn insert_product_row(&self, product: Product) {
        self.tables().products.push(product);
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.tables().products.iter().find(|p| p.id == id).cloned()
    }

    pub fn product_count(&self) -> usize {
        self.tables().products.len()
    }

    pub fn booking_count(&self) -> usize {
        self.tables().bookings.len()
    }

    /// Drops the current session the way a token expiry would.
    pub fn expire_session(&self) {
        self.tables().current = None;
        let _ = self.events.send(SessionEvent::Expired);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(AppError::ServiceUnavailable("memory backend is offline".into()));
        }
        Ok(())
    }

    async fn enter_write(&self) -> AppResult<()> {
        self.enter()?;
        let latency = *self
            .write_latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        // Availability can flip while the write is in flight.
        if !self.available.load(Ordering::SeqCst) {
            return Err(AppError::ServiceUnavailable("memory backend is offline".into()));
        }
        Ok(())
    }

    fn sign_in_as(&self, tables: &mut Tables, id: Uuid) {
        tables.current = Some(id);
        let _ = self.events.send(SessionEvent::SignedIn(id));
    }
}

fn refresh_electrician_rating(tables: &mut Tables, electrician_id: Uuid) {
    let booking_ids: Vec<Uuid> = tables
        .bookings
        .iter()
        .filter(|b| b.electrician_id() == electrician_id)
        .map(Booking::id)
        .collect();
    let ratings: Vec<u8> = tables
        .reviews
        .iter()
        .filter_map(|r| match r.target {
            ReviewTarget::Booking(id) if booking_ids.contains(&id) => Some(r.rating),
            _ => None,
        })
        .collect();
    if ratings.is_empty() {
        return;
    }
    let average = ratings.iter().map(|r| f32::from(*r)).sum::<f32>() / ratings.len() as f32;
    let count = ratings.len() as u32;
    for electrician in tables.electricians.iter_mut().filter(|e| e.id == electrician_id) {
        electrician.rating = average;
        electrician.review_count = count;
    }
    for service in tables.services.iter_mut().filter(|s| s.electrician_id == electrician_id) {
        service.electrician_rating = average;
    }
    for identity in tables.identities.iter_mut().filter(|i| i.id == electrician_id) {
        identity.rating = Some(average);
        identity.review_count = Some(count);
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn list_products(&self, query: ProductQuery) -> AppResult<Vec<Product>> {
        self.enter()?;
        let mut products: Vec<Product> = self
            .tables()
            .products
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn list_services(&self) -> AppResult<Vec<Service>> {
        self.enter()?;
        Ok(self.tables().services.clone())
    }

    async fn list_electricians(&self) -> AppResult<Vec<ElectricianProfile>> {
        self.enter()?;
        Ok(self.tables().electricians.clone())
    }

    async fn insert_product(&self, actor: &Identity, product: NewProduct) -> AppResult<Product> {
        self.enter_write().await?;
        actor.ensure(Capability::ManageInventory)?;
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            brand: product.brand,
            images: product.images,
            seller_id: actor.id,
            seller_name: actor.name.clone(),
            stock: product.stock,
            sold: 0,
            rating: 0.0,
            review_count: 0,
            specifications: product.specifications,
            created_at: Utc::now(),
        };
        self.tables().products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        actor: &Identity,
        id: Uuid,
        changes: &ProductChanges,
    ) -> AppResult<Product> {
        self.enter_write().await?;
        let mut tables = self.tables();
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        if product.seller_id != actor.id {
            return Err(AppError::NotOwner);
        }
        changes.apply_to(product);
        Ok(product.clone())
    }

    async fn delete_product(&self, actor: &Identity, id: Uuid) -> AppResult<()> {
        self.enter_write().await?;
        let mut tables = self.tables();
        let product = tables
            .products
            .iter()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        if product.seller_id != actor.id {
            return Err(AppError::NotOwner);
        }
        if tables.orders.iter().any(|o| o.product_id() == id) {
            return Err(AppError::BadRequest(
                "product has orders; set its stock to 0 to hide it instead".into(),
            ));
        }
        tables.products.retain(|p| p.id != id);
        tables
            .reviews
            .retain(|r| r.target != ReviewTarget::Product(id));
        Ok(())
    }

    async fn insert_booking(&self, actor: &Identity, booking: &Booking) -> AppResult<Booking> {
        self.enter_write().await?;
        if booking.customer_id() != actor.id {
            return Err(AppError::NotOwner);
        }
        let mut tables = self.tables();
        if !tables.services.iter().any(|s| s.id == booking.service_id()) {
            return Err(AppError::NotFound);
        }
        tables.bookings.push(booking.clone());
        Ok(booking.clone())
    }

    async fn list_bookings(&self, actor: &Identity) -> AppResult<Vec<Booking>> {
        self.enter()?;
        let mut bookings: Vec<Booking> = self
            .tables()
            .bookings
            .iter()
            .filter(|b| b.customer_id() == actor.id || b.electrician_id() == actor.id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        actor: &Identity,
        id: Uuid,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        self.enter_write().await?;
        let mut tables = self.tables();
        let booking = tables
            .bookings
            .iter_mut()
            .find(|b| b.id() == id)
            .ok_or(AppError::NotFound)?;
        authorize_booking_change(actor, booking, status)?;
        booking.transition(status)?;
        Ok(booking.clone())
    }

    async fn insert_order(&self, actor: &Identity, order: &Order) -> AppResult<Order> {
        self.enter_write().await?;
        if order.customer_id() != actor.id {
            return Err(AppError::NotOwner);
        }
        let mut tables = self.tables();
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == order.product_id())
            .ok_or(AppError::NotFound)?;
        if product.seller_id != order.seller_id() {
            return Err(AppError::BadRequest("seller does not match product".into()));
        }
        if product.price != order.unit_price() {
            return Err(AppError::BadRequest(
                "price has changed, refresh and try again".into(),
            ));
        }
        if product.stock < order.quantity() {
            return Err(AppError::OutOfStock(product.name.clone()));
        }
        product.stock -= order.quantity();
        product.sold += order.quantity();
        tables.orders.push(order.clone());
        Ok(order.clone())
    }

    async fn list_orders(&self, actor: &Identity) -> AppResult<Vec<OrderSummary>> {
        self.enter()?;
        let tables = self.tables();
        let mut summaries: Vec<OrderSummary> = tables
            .orders
            .iter()
            .filter(|o| o.customer_id() == actor.id || o.seller_id() == actor.id)
            .map(|order| {
                let product = tables.products.iter().find(|p| p.id == order.product_id());
                let seller = tables.identities.iter().find(|i| i.id == order.seller_id());
                OrderSummary {
                    order: order.clone(),
                    product_name: product
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| "Unknown Product".into()),
                    product_image: product
                        .map(|p| p.cover_image().to_string())
                        .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.into()),
                    seller_name: seller
                        .map(|s| s.name.clone())
                        .or_else(|| product.map(|p| p.seller_name.clone()))
                        .unwrap_or_else(|| "Unknown Seller".into()),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.order.created_at().cmp(&a.order.created_at()));
        Ok(summaries)
    }

    async fn update_order_status(
        &self,
        actor: &Identity,
        id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Order> {
        self.enter_write().await?;
        let mut tables = self.tables();
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id() == id)
            .ok_or(AppError::NotFound)?;
        authorize_order_change(actor, order, status)?;
        order.transition(status)?;
        let order = order.clone();
        if status == OrderStatus::Cancelled {
            if let Some(product) = tables.products.iter_mut().find(|p| p.id == order.product_id()) {
                product.stock += order.quantity();
                product.sold = product.sold.saturating_sub(order.quantity());
            }
        }
        Ok(order)
    }

    async fn insert_review(&self, actor: &Identity, review: &Review) -> AppResult<Review> {
        self.enter_write().await?;
        if review.reviewer_id != actor.id {
            return Err(AppError::NotOwner);
        }
        let mut tables = self.tables();
        match review.target {
            ReviewTarget::Product(product_id) => {
                let seller_id = tables
                    .products
                    .iter()
                    .find(|p| p.id == product_id)
                    .map(|p| p.seller_id)
                    .ok_or(AppError::NotFound)?;
                if seller_id == actor.id {
                    return Err(AppError::BadRequest(
                        "sellers cannot review their own products".into(),
                    ));
                }
                tables.reviews.push(review.clone());
                let ratings: Vec<u8> = tables
                    .reviews
                    .iter()
                    .filter(|r| r.target == ReviewTarget::Product(product_id))
                    .map(|r| r.rating)
                    .collect();
                let average =
                    ratings.iter().map(|r| f32::from(*r)).sum::<f32>() / ratings.len() as f32;
                if let Some(product) = tables.products.iter_mut().find(|p| p.id == product_id) {
                    product.rating = average;
                    product.review_count = ratings.len() as u32;
                }
            }
            ReviewTarget::Booking(booking_id) => {
                let booking = tables
                    .bookings
                    .iter()
                    .find(|b| b.id() == booking_id)
                    .ok_or(AppError::NotFound)?;
                if booking.customer_id() != actor.id {
                    return Err(AppError::NotOwner);
                }
                if booking.status() != BookingStatus::Completed {
                    return Err(AppError::BadRequest(
                        "only completed bookings can be reviewed".into(),
                    ));
                }
                let electrician_id = booking.electrician_id();
                tables.reviews.push(review.clone());
                refresh_electrician_rating(&mut tables, electrician_id);
            }
        }
        Ok(review.clone())
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn sign_up(&self, profile: &NewProfile, password: &str) -> AppResult<Identity> {
        self.enter_write().await?;
        let mut tables = self.tables();
        if tables.credentials.contains_key(&profile.email) {
            return Err(AppError::BadRequest("Email is already taken".into()));
        }
        let is_electrician = profile.role == Role::Electrician;
        let identity = Identity {
            id: Uuid::new_v4(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            role: profile.role,
            phone: profile.phone.clone(),
            location: Some(profile.location),
            verified: profile.role.verified_on_signup(),
            avatar: None,
            rating: is_electrician.then_some(0.0),
            review_count: is_electrician.then_some(0),
        };
        if let Some(details) = &profile.electrician {
            tables.electricians.push(ElectricianProfile {
                id: identity.id,
                name: identity.name.clone(),
                email: identity.email.clone(),
                phone: identity.phone.clone().unwrap_or_default(),
                specialties: details.specialties.clone(),
                experience_years: details.experience_years,
                rating: 0.0,
                review_count: 0,
                avatar: None,
                certifications: Vec::new(),
                service_areas: vec![profile.location],
                pricing: RatePair {
                    base_rate: 0,
                    on_site_rate: 0,
                },
            });
        }
        tables
            .credentials
            .insert(profile.email.clone(), (identity.id, password.to_string()));
        tables.identities.push(identity.clone());
        self.sign_in_as(&mut tables, identity.id);
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.enter()?;
        let mut tables = self.tables();
        let id = match tables.credentials.get(&email.trim().to_lowercase()) {
            Some((id, stored)) if stored == password => *id,
            _ => return Err(AppError::InvalidCredentials),
        };
        let identity = tables
            .identities
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(AppError::InvalidCredentials)?;
        self.sign_in_as(&mut tables, id);
        Ok(identity)
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.enter()?;
        self.tables().current = None;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Identity>> {
        self.enter()?;
        let tables = self.tables();
        Ok(tables
            .current
            .and_then(|id| tables.identities.iter().find(|i| i.id == id).cloned()))
    }

    async fn update_profile(
        &self,
        actor: &Identity,
        changes: &ProfileChanges,
    ) -> AppResult<Identity> {
        self.enter_write().await?;
        let mut tables = self.tables();
        let identity = tables
            .identities
            .iter_mut()
            .find(|i| i.id == actor.id)
            .ok_or(AppError::NotFound)?;
        if let Some(name) = &changes.name {
            identity.name = name.clone();
        }
        if let Some(phone) = &changes.phone {
            identity.phone = phone.clone();
        }
        if let Some(location) = changes.location {
            identity.location = Some(location);
        }
        Ok(identity.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
