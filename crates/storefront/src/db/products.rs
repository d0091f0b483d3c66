//! Product repository.
//!
//! Each product kind has its own table, so most reads dispatch on
//! [`ProductKind`] and wrap the row in [`Product`].

use sqlx::PgPool;

use techmart_core::catalog::{Notebook, Product, Smartphone};
use techmart_core::{CategoryId, ProductKind, Slug};

use super::RepositoryError;

macro_rules! notebook_columns {
    () => {
        "id, category_id, title, slug, image, description, price, created_at, \
         diagonal, display_type, processor_freq, ram, video, time_without_charge"
    };
}

macro_rules! smartphone_columns {
    () => {
        "id, category_id, title, slug, image, description, price, created_at, \
         diagonal, display_type, resolution, ram, sd, sd_volume_max, battery_volume, \
         main_cam_mp, front_cam_mp"
    };
}

/// Read access to products of every kind.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The newest products of one kind, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(
        &self,
        kind: ProductKind,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let products = match kind {
            ProductKind::Notebook => sqlx::query_as::<_, Notebook>(concat!(
                "SELECT ",
                notebook_columns!(),
                " FROM shop.notebook ORDER BY id DESC LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Product::from)
            .collect(),
            ProductKind::Smartphone => sqlx::query_as::<_, Smartphone>(concat!(
                "SELECT ",
                smartphone_columns!(),
                " FROM shop.smartphone ORDER BY id DESC LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Product::from)
            .collect(),
        };
        Ok(products)
    }

    /// Find a product by kind and slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(
        &self,
        kind: ProductKind,
        slug: &Slug,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = match kind {
            ProductKind::Notebook => sqlx::query_as::<_, Notebook>(concat!(
                "SELECT ",
                notebook_columns!(),
                " FROM shop.notebook WHERE slug = $1"
            ))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .map(Product::from),
            ProductKind::Smartphone => sqlx::query_as::<_, Smartphone>(concat!(
                "SELECT ",
                smartphone_columns!(),
                " FROM shop.smartphone WHERE slug = $1"
            ))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .map(Product::from),
        };
        Ok(product)
    }

    /// Load several products of one kind by id, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(
        &self,
        kind: ProductKind,
        ids: &[i32],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let products = match kind {
            ProductKind::Notebook => sqlx::query_as::<_, Notebook>(concat!(
                "SELECT ",
                notebook_columns!(),
                " FROM shop.notebook WHERE id = ANY($1)"
            ))
            .bind(ids)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Product::from)
            .collect(),
            ProductKind::Smartphone => sqlx::query_as::<_, Smartphone>(concat!(
                "SELECT ",
                smartphone_columns!(),
                " FROM shop.smartphone WHERE id = ANY($1)"
            ))
            .bind(ids)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Product::from)
            .collect(),
        };
        Ok(products)
    }

    /// Every product in a category, notebooks first, newest first within a kind.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let notebooks = sqlx::query_as::<_, Notebook>(concat!(
            "SELECT ",
            notebook_columns!(),
            " FROM shop.notebook WHERE category_id = $1 ORDER BY id DESC"
        ))
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        let smartphones = sqlx::query_as::<_, Smartphone>(concat!(
            "SELECT ",
            smartphone_columns!(),
            " FROM shop.smartphone WHERE category_id = $1 ORDER BY id DESC"
        ))
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(notebooks
            .into_iter()
            .map(Product::from)
            .chain(smartphones.into_iter().map(Product::from))
            .collect())
    }
}
