//! Cached product lookups.
//!
//! Products are cached by id using `moka` (60-second TTL). Only found
//! products are cached, so a product created after a miss shows up on the
//! next request.

use std::collections::HashMap;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};
use vitrine_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;

const CACHE_TTL: Duration = Duration::from_secs(60);
const CACHE_CAPACITY: u64 = 10_000;

/// Read-through product cache.
#[derive(Clone)]
pub struct ProductCatalog {
    cache: Cache<ProductId, Product>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductCatalog {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self { cache }
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database lookup fails.
    #[instrument(skip(self, pool), fields(product_id = %id))]
    pub async fn get(&self, pool: &PgPool, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(Some(product));
        }

        let product = ProductRepository::new(pool).get(id).await?;
        if let Some(product) = &product {
            self.cache.insert(id, product.clone()).await;
        }
        Ok(product)
    }

    /// Get several products, querying the database only for cache misses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database lookup fails.
    #[instrument(skip(self, pool, ids), fields(count = ids.len()))]
    pub async fn get_many(
        &self,
        pool: &PgPool,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Product>, RepositoryError> {
        let mut found = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            match self.cache.get(&id).await {
                Some(product) => {
                    found.insert(id, product);
                }
                None => missing.push(id),
            }
        }

        if !missing.is_empty() {
            debug!(misses = missing.len(), "Loading products");
            for product in ProductRepository::new(pool).get_many(&missing).await? {
                self.cache.insert(product.id, product.clone()).await;
                found.insert(product.id, product);
            }
        }

        Ok(found)
    }
}
