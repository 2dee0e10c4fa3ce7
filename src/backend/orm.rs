use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::backend::{
    DataBackend, ProductQuery, authorize_booking_change, authorize_order_change,
};
use crate::db::create_orm_conn;
use crate::dto::products::{NewProduct, ProductChanges};
use crate::entity::{
    Bookings, Electricians, Orders, Products, Profiles, Reviews, Services,
    bookings::{ActiveModel as BookingActive, Column as BookingCol, Model as BookingModel},
    electricians::{ActiveModel as ElectricianActive, Model as ElectricianModel},
    orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
    products::{ActiveModel as ProductActive, Column as ProdCol, Model as ProductModel},
    profiles::{Column as ProfileCol, Model as ProfileModel},
    reviews::{ActiveModel as ReviewActive, Column as ReviewCol},
    services::{Column as ServiceCol, Model as ServiceModel},
};
use crate::enums::{BookingStatus, Capability, Location, OrderStatus, Role};
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, DEFAULT_PRODUCT_IMAGE, DEFAULT_SHOP_ADDRESS, ElectricianProfile, Identity, Order,
    OrderSummary, Product, RatePair, Review, ReviewTarget, Service,
};

/// Data collaborator over the hosted Postgres schema.
#[derive(Clone)]
pub struct OrmBackend {
    orm: DatabaseConnection,
}

impl OrmBackend {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::new(create_orm_conn(database_url).await?))
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.orm
    }

    async fn seller_names<C: ConnectionTrait>(
        conn: &C,
        ids: Vec<Uuid>,
    ) -> AppResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(Profiles::find()
            .filter(ProfileCol::Id.is_in(ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect())
    }

    async fn hydrate_product<C: ConnectionTrait>(
        conn: &C,
        model: ProductModel,
    ) -> AppResult<Product> {
        let seller_name = Profiles::find_by_id(model.seller_id)
            .one(conn)
            .await?
            .map(|p| p.name)
            .unwrap_or_default();
        product_from_entity(model, seller_name)
    }
}

fn corrupt(table: &str, id: Uuid, detail: impl std::fmt::Display) -> AppError {
    AppError::Internal(anyhow::anyhow!("corrupt {table} row {id}: {detail}"))
}

fn count(table: &str, id: Uuid, value: i32) -> AppResult<u32> {
    u32::try_from(value).map_err(|_| corrupt(table, id, format!("negative count {value}")))
}

pub(crate) fn product_from_entity(model: ProductModel, seller_name: String) -> AppResult<Product> {
    let specifications: BTreeMap<String, String> =
        serde_json::from_value(model.specifications).map_err(|e| corrupt("products", model.id, e))?;
    Ok(Product {
        id: model.id,
        category: model
            .category
            .parse()
            .map_err(|e| corrupt("products", model.id, e))?,
        stock: count("products", model.id, model.stock)?,
        sold: count("products", model.id, model.sold)?,
        review_count: count("products", model.id, model.review_count)?,
        rating: model.rating as f32,
        name: model.name,
        description: model.description,
        price: model.price,
        brand: model.brand,
        images: model.images,
        seller_id: model.seller_id,
        seller_name,
        specifications,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub(crate) fn identity_from_entity(
    profile: ProfileModel,
    electrician: Option<&ElectricianModel>,
) -> AppResult<Identity> {
    let role: Role = profile
        .role
        .parse()
        .map_err(|e| corrupt("profiles", profile.id, e))?;
    let location = profile
        .location
        .as_deref()
        .map(str::parse::<Location>)
        .transpose()
        .map_err(|e| corrupt("profiles", profile.id, e))?;
    let (rating, review_count) = match (role, electrician) {
        (Role::Electrician, Some(e)) => (
            Some(e.rating as f32),
            Some(count("electricians", e.id, e.review_count)?),
        ),
        (Role::Electrician, None) => (Some(0.0), Some(0)),
        (Role::Customer | Role::Seller, _) => (None, None),
    };
    Ok(Identity {
        id: profile.id,
        name: profile.name,
        email: profile.email,
        role,
        phone: profile.phone,
        location,
        verified: profile.verified,
        avatar: profile.avatar_url,
        rating,
        review_count,
    })
}

fn electrician_from_entity(
    model: ElectricianModel,
    profile: ProfileModel,
) -> AppResult<ElectricianProfile> {
    let service_areas = model
        .service_areas
        .iter()
        .map(|area| area.parse())
        .collect::<AppResult<Vec<Location>>>()
        .map_err(|e| corrupt("electricians", model.id, e))?;
    Ok(ElectricianProfile {
        id: model.id,
        name: profile.name,
        email: profile.email,
        phone: profile.phone.unwrap_or_default(),
        specialties: model.specialties,
        experience_years: count("electricians", model.id, model.experience_years)?,
        rating: model.rating as f32,
        review_count: count("electricians", model.id, model.review_count)?,
        avatar: profile.avatar_url,
        certifications: model.certifications,
        service_areas,
        pricing: RatePair {
            base_rate: model.base_rate,
            on_site_rate: model.onsite_rate,
        },
    })
}

fn service_from_entity(
    model: ServiceModel,
    electrician: &ElectricianModel,
    profile: Option<&ProfileModel>,
) -> AppResult<Service> {
    Ok(Service {
        id: model.id,
        category: model
            .category
            .parse()
            .map_err(|e| corrupt("services", model.id, e))?,
        name: model.name,
        description: model.description,
        base_price: model.base_price,
        on_site_price: model.onsite_price,
        electrician_id: electrician.id,
        electrician_name: profile.map(|p| p.name.clone()).unwrap_or_default(),
        electrician_rating: electrician.rating as f32,
        electrician_image: profile.and_then(|p| p.avatar_url.clone()),
        shop_address: electrician
            .shop_address
            .clone()
            .unwrap_or_else(|| DEFAULT_SHOP_ADDRESS.to_string()),
        duration: model.duration,
        availability: electrician.availability.clone(),
    })
}

fn booking_from_entity(model: BookingModel) -> AppResult<Booking> {
    Ok(Booking {
        id: model.id,
        service_id: model.service_id,
        customer_id: model.customer_id,
        electrician_id: model.electrician_id,
        mode: model
            .booking_type
            .parse()
            .map_err(|e| corrupt("bookings", model.id, e))?,
        location: model.customer_location,
        price: model.price,
        scheduled_date: model.scheduled_date,
        scheduled_time: model
            .scheduled_time
            .parse()
            .map_err(|e| corrupt("bookings", model.id, e))?,
        notes: model.notes,
        status: model
            .status
            .parse()
            .map_err(|e| corrupt("bookings", model.id, e))?,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        product_id: model.product_id,
        seller_id: model.seller_id,
        quantity: count("orders", model.id, model.quantity)?,
        unit_price: model.unit_price,
        total_price: model.total_price,
        status: model
            .status
            .parse()
            .map_err(|e| corrupt("orders", model.id, e))?,
        delivery_address: model.delivery_address,
        estimated_delivery: model.estimated_delivery,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn average(ratings: &[i32]) -> (f64, i32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i32 = ratings.iter().sum();
    (f64::from(sum) / ratings.len() as f64, ratings.len() as i32)
}

#[async_trait]
impl DataBackend for OrmBackend {
    async fn list_products(&self, query: ProductQuery) -> AppResult<Vec<Product>> {
        let mut condition = Condition::all();
        if let Some(seller_id) = query.seller_id {
            condition = condition.add(ProdCol::SellerId.eq(seller_id));
        }
        if query.in_stock_only {
            condition = condition.add(ProdCol::Stock.gt(0));
        }

        let rows = Products::find()
            .filter(condition)
            .order_by_desc(ProdCol::CreatedAt)
            .find_also_related(Profiles)
            .all(&self.orm)
            .await?;

        rows.into_iter()
            .map(|(product, seller)| {
                let seller_name = seller.map(|s| s.name).unwrap_or_default();
                product_from_entity(product, seller_name)
            })
            .collect()
    }

    async fn list_services(&self) -> AppResult<Vec<Service>> {
        let rows = Services::find()
            .filter(ServiceCol::Active.eq(true))
            .order_by_desc(ServiceCol::CreatedAt)
            .find_also_related(Electricians)
            .all(&self.orm)
            .await?;

        let electrician_ids: Vec<Uuid> = rows.iter().map(|(s, _)| s.electrician_id).collect();
        let profiles: HashMap<Uuid, ProfileModel> = if electrician_ids.is_empty() {
            HashMap::new()
        } else {
            Profiles::find()
                .filter(ProfileCol::Id.is_in(electrician_ids))
                .all(&self.orm)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let mut services = Vec::with_capacity(rows.len());
        for (service, electrician) in rows {
            // Services whose electrician row is gone are not bookable.
            let Some(electrician) = electrician else {
                tracing::warn!(service_id = %service.id, "service without electrician skipped");
                continue;
            };
            let profile = profiles.get(&electrician.id);
            services.push(service_from_entity(service, &electrician, profile)?);
        }
        Ok(services)
    }

    async fn list_electricians(&self) -> AppResult<Vec<ElectricianProfile>> {
        Electricians::find()
            .find_also_related(Profiles)
            .all(&self.orm)
            .await?
            .into_iter()
            .filter_map(|(electrician, profile)| {
                profile.map(|profile| electrician_from_entity(electrician, profile))
            })
            .collect()
    }

    async fn insert_product(&self, actor: &Identity, product: NewProduct) -> AppResult<Product> {
        actor.ensure(Capability::ManageInventory)?;
        let specifications = serde_json::to_value(&product.specifications)
            .map_err(|e| AppError::Internal(e.into()))?;
        let active = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            category: Set(product.category.as_str().to_string()),
            brand: Set(product.brand),
            images: Set(product.images),
            seller_id: Set(actor.id),
            stock: Set(product.stock as i32),
            sold: Set(0),
            rating: Set(0.0),
            review_count: Set(0),
            specifications: Set(specifications),
            created_at: NotSet,
            updated_at: NotSet,
        };
        let model = active.insert(&self.orm).await?;
        tracing::info!(product_id = %model.id, seller_id = %actor.id, "product inserted");
        product_from_entity(model, actor.name.clone())
    }

    async fn update_product(
        &self,
        actor: &Identity,
        id: Uuid,
        changes: &ProductChanges,
    ) -> AppResult<Product> {
        let txn = self.orm.begin().await?;

        let model = Products::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if model.seller_id != actor.id {
            return Err(AppError::NotOwner);
        }

        let mut active: ProductActive = model.into();
        if let Some(name) = &changes.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &changes.description {
            active.description = Set(description.clone());
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(category) = changes.category {
            active.category = Set(category.as_str().to_string());
        }
        if let Some(brand) = &changes.brand {
            active.brand = Set(brand.clone());
        }
        if let Some(stock) = changes.stock {
            active.stock = Set(stock as i32);
        }
        if let Some(specifications) = &changes.specifications {
            active.specifications = Set(
                serde_json::to_value(specifications).map_err(|e| AppError::Internal(e.into()))?,
            );
        }
        if let Some(images) = &changes.images {
            active.images = Set(images.clone());
        }
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&txn).await?;
        let product = Self::hydrate_product(&txn, model).await?;

        txn.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, actor: &Identity, id: Uuid) -> AppResult<()> {
        let txn = self.orm.begin().await?;

        let model = Products::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if model.seller_id != actor.id {
            return Err(AppError::NotOwner);
        }

        let referenced = Orders::find()
            .filter(OrderCol::ProductId.eq(id))
            .count(&txn)
            .await?;
        if referenced > 0 {
            return Err(AppError::BadRequest(
                "product has orders; set its stock to 0 to hide it instead".into(),
            ));
        }

        Reviews::delete_many()
            .filter(ReviewCol::ProductId.eq(id))
            .exec(&txn)
            .await?;
        Products::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn insert_booking(&self, actor: &Identity, booking: &Booking) -> AppResult<Booking> {
        if booking.customer_id() != actor.id {
            return Err(AppError::NotOwner);
        }
        if Services::find_by_id(booking.service_id())
            .one(&self.orm)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound);
        }

        let active = BookingActive {
            id: Set(booking.id()),
            service_id: Set(booking.service_id()),
            customer_id: Set(booking.customer_id()),
            electrician_id: Set(booking.electrician_id()),
            booking_type: Set(booking.mode().as_str().to_string()),
            customer_location: Set(booking.location().to_string()),
            scheduled_date: Set(booking.scheduled_date()),
            scheduled_time: Set(booking.scheduled_time().to_string()),
            status: Set(booking.status().as_str().to_string()),
            price: Set(booking.price()),
            notes: Set(booking.notes().to_string()),
            created_at: Set(booking.created_at().into()),
            updated_at: NotSet,
        };
        let model = active.insert(&self.orm).await?;
        booking_from_entity(model)
    }

    async fn list_bookings(&self, actor: &Identity) -> AppResult<Vec<Booking>> {
        Bookings::find()
            .filter(
                Condition::any()
                    .add(BookingCol::CustomerId.eq(actor.id))
                    .add(BookingCol::ElectricianId.eq(actor.id)),
            )
            .order_by_desc(BookingCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(booking_from_entity)
            .collect()
    }

    async fn update_booking_status(
        &self,
        actor: &Identity,
        id: Uuid,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        let txn = self.orm.begin().await?;

        let model = Bookings::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut booking = booking_from_entity(model.clone())?;
        authorize_booking_change(actor, &booking, status)?;
        booking.transition(status)?;

        let mut active: BookingActive = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(booking)
    }

    async fn insert_order(&self, actor: &Identity, order: &Order) -> AppResult<Order> {
        if order.customer_id() != actor.id {
            return Err(AppError::NotOwner);
        }
        let txn = self.orm.begin().await?;

        let product = Products::find_by_id(order.product_id())
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if product.seller_id != order.seller_id() {
            return Err(AppError::BadRequest("seller does not match product".into()));
        }
        if product.price != order.unit_price() {
            return Err(AppError::BadRequest(
                "price has changed, refresh and try again".into(),
            ));
        }
        let quantity = order.quantity() as i32;
        if product.stock < quantity {
            return Err(AppError::OutOfStock(product.name));
        }

        let model = OrderActive {
            id: Set(order.id()),
            customer_id: Set(order.customer_id()),
            product_id: Set(order.product_id()),
            seller_id: Set(order.seller_id()),
            quantity: Set(quantity),
            unit_price: Set(order.unit_price()),
            total_price: Set(order.total_price()),
            status: Set(order.status().as_str().to_string()),
            delivery_address: Set(order.delivery_address().to_string()),
            estimated_delivery: Set(order.estimated_delivery()),
            created_at: Set(order.created_at().into()),
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
            .col_expr(ProdCol::Sold, Expr::col(ProdCol::Sold).add(quantity))
            .filter(ProdCol::Id.eq(order.product_id()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::info!(order_id = %model.id, product_id = %model.product_id, quantity, "order inserted");
        order_from_entity(model)
    }

    async fn list_orders(&self, actor: &Identity) -> AppResult<Vec<OrderSummary>> {
        let rows = Orders::find()
            .filter(
                Condition::any()
                    .add(OrderCol::CustomerId.eq(actor.id))
                    .add(OrderCol::SellerId.eq(actor.id)),
            )
            .order_by_desc(OrderCol::CreatedAt)
            .find_also_related(Products)
            .all(&self.orm)
            .await?;

        let seller_ids: Vec<Uuid> = rows.iter().map(|(o, _)| o.seller_id).collect();
        let sellers = Self::seller_names(&self.orm, seller_ids).await?;

        rows.into_iter()
            .map(|(order, product)| {
                let seller_name = sellers
                    .get(&order.seller_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown Seller".into());
                let (product_name, product_image) = match product {
                    Some(p) => (
                        p.name,
                        p.images
                            .into_iter()
                            .next()
                            .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.into()),
                    ),
                    None => ("Unknown Product".into(), DEFAULT_PRODUCT_IMAGE.into()),
                };
                Ok(OrderSummary {
                    order: order_from_entity(order)?,
                    product_name,
                    product_image,
                    seller_name,
                })
            })
            .collect()
    }

    async fn update_order_status(
        &self,
        actor: &Identity,
        id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Order> {
        let txn = self.orm.begin().await?;

        let model = Orders::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut order = order_from_entity(model.clone())?;
        authorize_order_change(actor, &order, status)?;
        order.transition(status)?;

        let mut active: OrderActive = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        if status == OrderStatus::Cancelled {
            let quantity = order.quantity() as i32;
            Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(quantity))
                .col_expr(ProdCol::Sold, Expr::col(ProdCol::Sold).sub(quantity))
                .filter(ProdCol::Id.eq(order.product_id()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(order)
    }

    async fn insert_review(&self, actor: &Identity, review: &Review) -> AppResult<Review> {
        if review.reviewer_id != actor.id {
            return Err(AppError::NotOwner);
        }
        let txn = self.orm.begin().await?;

        let mut active = ReviewActive {
            id: Set(review.id),
            reviewer_id: Set(review.reviewer_id),
            reviewee_id: Set(None),
            product_id: Set(None),
            order_id: Set(None),
            booking_id: Set(None),
            rating: Set(i32::from(review.rating)),
            comment: Set(review.comment.clone()),
            created_at: Set(review.created_at.into()),
        };

        match review.target {
            ReviewTarget::Product(product_id) => {
                let product = Products::find_by_id(product_id)
                    .lock(LockType::Update)
                    .one(&txn)
                    .await?
                    .ok_or(AppError::NotFound)?;
                if product.seller_id == actor.id {
                    return Err(AppError::BadRequest(
                        "sellers cannot review their own products".into(),
                    ));
                }
                active.product_id = Set(Some(product_id));
                active.reviewee_id = Set(Some(product.seller_id));
                active.insert(&txn).await?;

                let ratings: Vec<i32> = Reviews::find()
                    .filter(ReviewCol::ProductId.eq(product_id))
                    .all(&txn)
                    .await?
                    .into_iter()
                    .map(|r| r.rating)
                    .collect();
                let (rating, review_count) = average(&ratings);
                let mut product: ProductActive = product.into();
                product.rating = Set(rating);
                product.review_count = Set(review_count);
                product.update(&txn).await?;
            }
            ReviewTarget::Booking(booking_id) => {
                let booking = Bookings::find_by_id(booking_id)
                    .one(&txn)
                    .await?
                    .ok_or(AppError::NotFound)?;
                if booking.customer_id != actor.id {
                    return Err(AppError::NotOwner);
                }
                if booking.status != BookingStatus::Completed.as_str() {
                    return Err(AppError::BadRequest(
                        "only completed bookings can be reviewed".into(),
                    ));
                }
                active.booking_id = Set(Some(booking_id));
                active.reviewee_id = Set(Some(booking.electrician_id));
                active.insert(&txn).await?;

                let ratings: Vec<i32> = Reviews::find()
                    .filter(ReviewCol::RevieweeId.eq(booking.electrician_id))
                    .filter(ReviewCol::BookingId.is_not_null())
                    .all(&txn)
                    .await?
                    .into_iter()
                    .map(|r| r.rating)
                    .collect();
                let (rating, review_count) = average(&ratings);
                if let Some(electrician) = Electricians::find_by_id(booking.electrician_id)
                    .one(&txn)
                    .await?
                {
                    let mut electrician: ElectricianActive = electrician.into();
                    electrician.rating = Set(rating);
                    electrician.review_count = Set(review_count);
                    electrician.updated_at = Set(Utc::now().into());
                    electrician.update(&txn).await?;
                }
            }
        }

        txn.commit().await?;
        Ok(review.clone())
    }
}
