use chrono::{Days, Utc};
use uuid::Uuid;

use crate::{
    dto::{orders::OrderDraft, require_text},
    enums::{Capability, OrderStatus},
    error::{AppError, AppResult},
    models::{Order, OrderSummary},
    state::AppState,
};

pub const PLACE_ORDER_FORM: &str = "place_order";

/// Acknowledgement shown after an add-to-cart click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartNotice {
    pub product_id: Uuid,
    pub message: String,
}

/// Rejects out-of-stock products from the snapshot; the backend is not called.
pub fn add_to_cart(state: &AppState, product_id: Uuid) -> AppResult<CartNotice> {
    state.session.require_capability(Capability::Purchase)?;
    let product = state.catalog.product(product_id).ok_or(AppError::NotFound)?;
    if !product.in_stock() {
        return Err(AppError::OutOfStock(product.name));
    }
    tracing::debug!(product_id = %product_id, "added to cart");
    Ok(CartNotice {
        product_id,
        message: format!("{} added to cart!", product.name),
    })
}

/// Snapshots the unit price, moves the quantity out of stock on the backend
/// and reloads the catalog.
pub async fn place_order(state: &AppState, draft: &OrderDraft) -> AppResult<Order> {
    let customer = state.session.require_capability(Capability::Purchase)?;
    let product = state
        .catalog
        .product(draft.product_id)
        .ok_or(AppError::NotFound)?;
    if product.seller_id == customer.id {
        return Err(AppError::Validation("you cannot order your own product".into()));
    }
    if !product.in_stock() {
        return Err(AppError::OutOfStock(product.name));
    }
    let quantity = u32::try_from(draft.quantity)
        .ok()
        .filter(|q| (1..=product.stock).contains(q))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "quantity must be between 1 and {}",
                product.stock
            ))
        })?;
    let delivery_address = require_text("delivery address", &draft.delivery_address)?;
    let total_price = product
        .price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::Validation("order total is too large".into()))?;

    let now = Utc::now();
    let lead_days = u64::try_from(state.config.delivery_lead_days).unwrap_or(0);
    let order = Order {
        id: Uuid::new_v4(),
        customer_id: customer.id,
        product_id: product.id,
        seller_id: product.seller_id,
        quantity,
        unit_price: product.price,
        total_price,
        status: OrderStatus::Pending,
        delivery_address,
        estimated_delivery: now.date_naive().checked_add_days(Days::new(lead_days)),
        created_at: now,
    };

    let _ticket = state.guard.begin(PLACE_ORDER_FORM)?;
    let order = state.data.insert_order(&customer, &order).await?;
    state.catalog.refresh().await;

    tracing::info!(
        order_id = %order.id(),
        product_id = %product.id,
        quantity,
        total = order.total_price(),
        "order placed"
    );
    Ok(order)
}

pub async fn list_orders(state: &AppState) -> AppResult<Vec<OrderSummary>> {
    let actor = state.session.actor()?;
    state.data.list_orders(&actor).await
}

pub async fn update_order_status(
    state: &AppState,
    id: Uuid,
    status: OrderStatus,
) -> AppResult<Order> {
    let actor = state.session.actor()?;
    let order = state.data.update_order_status(&actor, id, status).await?;
    if status == OrderStatus::Cancelled {
        // stock was restored
        state.catalog.refresh().await;
    }
    tracing::info!(order_id = %id, status = %status, "order status changed");
    Ok(order)
}
