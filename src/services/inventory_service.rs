use uuid::Uuid;

use crate::{
    backend::ProductQuery,
    dto::products::{ProductDraft, ProductPatch},
    enums::Capability,
    error::{AppError, AppResult},
    models::{Identity, Product, SellerOverview},
    state::AppState,
};

pub const ADD_PRODUCT_FORM: &str = "add_product";
pub const UPDATE_PRODUCT_FORM: &str = "update_product";
pub const DELETE_PRODUCT_FORM: &str = "delete_product";

fn seller(state: &AppState) -> AppResult<Identity> {
    state.session.require_capability(Capability::ManageInventory)
}

/// Validates before anything is sent. New listings start with nothing sold;
/// the catalog is reloaded once the backend has the row.
pub async fn add_product(state: &AppState, draft: &ProductDraft) -> AppResult<Product> {
    let product = draft.validate()?;
    let seller = seller(state)?;

    let _ticket = state.guard.begin(ADD_PRODUCT_FORM)?;
    let product = state.data.insert_product(&seller, product).await?;
    state.catalog.refresh().await;

    tracing::info!(product_id = %product.id, seller_id = %seller.id, "product added");
    Ok(product)
}

/// Ownership is the backend's call; a `NotOwner` rejection leaves the
/// catalog as it was.
pub async fn update_product(state: &AppState, id: Uuid, patch: &ProductPatch) -> AppResult<Product> {
    let changes = patch.validate()?;
    let seller = seller(state)?;

    let _ticket = state.guard.begin(UPDATE_PRODUCT_FORM)?;
    let product = state.data.update_product(&seller, id, &changes).await?;
    state.catalog.refresh().await;

    tracing::info!(product_id = %id, "product updated");
    Ok(product)
}

/// Pending deletion awaiting the seller's answer. Dropping it is the same as
/// cancelling.
#[derive(Clone)]
#[must_use = "the product is only deleted once `confirm` is called"]
pub struct DeleteConfirmation {
    state: AppState,
    seller: Identity,
    product_id: Uuid,
    product_name: String,
}

impl DeleteConfirmation {
    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    pub fn prompt(&self) -> String {
        format!(
            "Delete \"{}\"? This cannot be undone.",
            self.product_name
        )
    }

    pub async fn confirm(self) -> AppResult<()> {
        let _ticket = self.state.guard.begin(DELETE_PRODUCT_FORM)?;
        self.state
            .data
            .delete_product(&self.seller, self.product_id)
            .await?;
        self.state.catalog.refresh().await;
        tracing::info!(product_id = %self.product_id, "product deleted");
        Ok(())
    }

    pub fn cancel(self) {
        tracing::debug!(product_id = %self.product_id, "product deletion cancelled");
    }
}

/// First step of a deletion: nothing is sent until the returned
/// confirmation is confirmed.
pub fn request_delete(state: &AppState, id: Uuid) -> AppResult<DeleteConfirmation> {
    let seller = seller(state)?;
    let product = state.catalog.product(id).ok_or(AppError::NotFound)?;
    Ok(DeleteConfirmation {
        state: state.clone(),
        seller,
        product_id: id,
        product_name: product.name,
    })
}

/// The seller's listings straight from the backend, falling back to the
/// catalog snapshot when it cannot be reached.
pub async fn my_products(state: &AppState) -> AppResult<Vec<Product>> {
    let seller = seller(state)?;
    match state.data.list_products(ProductQuery::for_seller(seller.id)).await {
        Ok(products) => Ok(products),
        Err(err) if err.is_unavailable() => {
            tracing::warn!(error = %err, "serving seller listings from snapshot");
            Ok(state.catalog.products_by_seller(seller.id))
        }
        Err(err) => Err(err),
    }
}

pub fn overview_of(products: &[Product]) -> SellerOverview {
    SellerOverview {
        product_count: products.len(),
        out_of_stock: products.iter().filter(|p| !p.in_stock()).count(),
        units_sold: products.iter().map(|p| u64::from(p.sold)).sum(),
        revenue: products
            .iter()
            .map(|p| p.price.saturating_mul(i64::from(p.sold)))
            .fold(0, i64::saturating_add),
    }
}

pub fn seller_overview(state: &AppState) -> AppResult<SellerOverview> {
    let seller = seller(state)?;
    Ok(overview_of(&state.catalog.products_by_seller(seller.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn overview_sums_sold_units_and_revenue() {
        let products: Vec<Product> = seed::seed_products()
            .into_iter()
            .filter(|p| p.seller_id == seed::TECHHUB_KENYA)
            .collect();
        let overview = overview_of(&products);
        assert_eq!(overview.product_count, 2);
        assert_eq!(overview.out_of_stock, 0);
        assert_eq!(overview.units_sold, 11);
        assert_eq!(overview.revenue, 120_000 * 8 + 65_000 * 3);
    }

    #[test]
    fn overview_revenue_saturates_instead_of_wrapping() {
        let mut products = seed::seed_products();
        products[0].price = i64::MAX / 2 + 1;
        let overview = overview_of(&products);
        assert_eq!(overview.revenue, i64::MAX);
        assert_eq!(overview.product_count, products.len());
    }
}
