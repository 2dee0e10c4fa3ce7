use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use uuid::Uuid;

use crate::backend::{DataBackend, ProductQuery};
use crate::enums::{ProductCategory, ServiceCategory};
use crate::error::{AppError, AppResult};
use crate::models::{ElectricianProfile, Product, Service};
use crate::seed;

/// One consistent view of the catalog. Replaced wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub services: Vec<Service>,
    pub electricians: Vec<ElectricianProfile>,
    /// Set when the snapshot is the built-in seed data.
    pub degraded: bool,
}

impl CatalogSnapshot {
    pub fn seed() -> Self {
        Self {
            products: seed::seed_products(),
            services: seed::seed_services(),
            electricians: seed::seed_electricians(),
            degraded: true,
        }
    }
}

/// Interest token held by a view. Closing it makes any refresh still in
/// flight for that view drop its result.
#[derive(Debug, Clone)]
pub struct ViewScope {
    open: Arc<AtomicBool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

pub struct CatalogStore {
    data: Arc<dyn DataBackend>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    pub fn new(data: Arc<dyn DataBackend>) -> Self {
        Self {
            data,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())),
        }
    }

    async fn fetch(&self) -> AppResult<CatalogSnapshot> {
        let products = self.data.list_products(ProductQuery::default()).await?;
        let services = self.data.list_services().await?;
        let electricians = self.data.list_electricians().await?;
        Ok(CatalogSnapshot {
            products,
            services,
            electricians,
            degraded: false,
        })
    }

    fn fetch_or_seed(result: AppResult<CatalogSnapshot>) -> CatalogSnapshot {
        match result {
            Ok(snapshot) => {
                tracing::debug!(
                    products = snapshot.products.len(),
                    services = snapshot.services.len(),
                    "catalog fetched"
                );
                snapshot
            }
            Err(err) => {
                tracing::warn!(error = %err, "catalog fetch failed, serving seed data");
                CatalogSnapshot::seed()
            }
        }
    }

    fn install(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write().unwrap_or_else(|p| p.into_inner()) = Arc::clone(&snapshot);
        snapshot
    }

    /// Fetches current truth and installs it. Never fails: any collaborator
    /// error installs the seed dataset instead.
    pub async fn load(&self) -> Arc<CatalogSnapshot> {
        let snapshot = Self::fetch_or_seed(self.fetch().await);
        self.install(snapshot)
    }

    /// Reload after a write. Whichever refresh completes last wins.
    pub async fn refresh(&self) -> Arc<CatalogSnapshot> {
        self.load().await
    }

    /// Like [`CatalogStore::refresh`], but the result is discarded if `scope`
    /// closed while the fetch was pending.
    pub async fn refresh_for(&self, scope: &ViewScope) -> AppResult<Arc<CatalogSnapshot>> {
        let snapshot = Self::fetch_or_seed(self.fetch().await);
        if !scope.is_open() {
            tracing::warn!("late catalog result ignored for closed view");
            return Err(AppError::Cancelled);
        }
        Ok(self.install(snapshot))
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(|p| p.into_inner()))
    }

    pub fn products(&self, query: &str, category: Option<ProductCategory>) -> Vec<Product> {
        filter_products(&self.snapshot().products, query, category)
    }

    pub fn services(&self, query: &str, category: Option<ServiceCategory>) -> Vec<Service> {
        filter_services(&self.snapshot().services, query, category)
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.snapshot().products.iter().find(|p| p.id == id).cloned()
    }

    pub fn service(&self, id: Uuid) -> Option<Service> {
        self.snapshot().services.iter().find(|s| s.id == id).cloned()
    }

    /// The seller-scoped view of the same snapshot the public view reads.
    pub fn products_by_seller(&self, seller_id: Uuid) -> Vec<Product> {
        let query = ProductQuery::for_seller(seller_id);
        self.snapshot()
            .products
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect()
    }

    pub fn top_electricians(&self, limit: usize) -> Vec<ElectricianProfile> {
        top_electricians(&self.snapshot().electricians, limit)
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Name or description contains `query` (case-insensitive) and, when given,
/// the category matches. Snapshot order is kept.
pub fn filter_products(
    products: &[Product],
    query: &str,
    category: Option<ProductCategory>,
) -> Vec<Product> {
    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|p| contains_folded(&p.name, &needle) || contains_folded(&p.description, &needle))
        .filter(|p| category.is_none_or(|c| p.category == c))
        .cloned()
        .collect()
}

/// Text match also covers the electrician's name. Highest-rated first; equal
/// ratings keep snapshot order.
pub fn filter_services(
    services: &[Service],
    query: &str,
    category: Option<ServiceCategory>,
) -> Vec<Service> {
    let needle = query.to_lowercase();
    let mut matched: Vec<Service> = services
        .iter()
        .filter(|s| {
            contains_folded(&s.name, &needle)
                || contains_folded(&s.description, &needle)
                || contains_folded(&s.electrician_name, &needle)
        })
        .filter(|s| category.is_none_or(|c| s.category == c))
        .cloned()
        .collect();
    // sort_by is stable
    matched.sort_by(|a, b| b.electrician_rating.total_cmp(&a.electrician_rating));
    matched
}

pub fn top_electricians(electricians: &[ElectricianProfile], limit: usize) -> Vec<ElectricianProfile> {
    let mut ranked = electricians.to_vec();
    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked.truncate(limit);
    ranked
}
