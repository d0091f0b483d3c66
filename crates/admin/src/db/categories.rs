//! Category repository.

use sqlx::PgPool;

use techmart_core::catalog::Category;
use techmart_core::{CategoryId, ProductKind, Slug};

use super::RepositoryError;
use super::carts::detach_products;

/// Database access for categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug FROM shop.category ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Categories a product of `kind` may be filed under.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn choices_for(&self, kind: ProductKind) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug FROM shop.category WHERE slug = $1 ORDER BY id",
        )
        .bind(kind.category_slug())
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, slug FROM shop.category WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(category)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn create(&self, name: &str, slug: &Slug) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO shop.category (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category with this slug"))
    }

    /// Rename a category or change its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist,
    /// `RepositoryError::Conflict` if the slug is taken, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        slug: &Slug,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "UPDATE shop.category SET name = $1, slug = $2 WHERE id = $3 RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category with this slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Create the category, or rename the one with this slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, name: &str, slug: &Slug) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            INSERT INTO shop.category (name, slug) VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;
        Ok(category)
    }

    /// Delete a category together with its products.
    ///
    /// Returns the image file names of the deleted products so the caller can
    /// remove them from the media root.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist, or
    /// `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: CategoryId) -> Result<Vec<String>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, CategoryId>(
            "SELECT id FROM shop.category WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let mut images = Vec::new();
        for kind in ProductKind::ALL {
            let table = match kind {
                ProductKind::Notebook => "shop.notebook",
                ProductKind::Smartphone => "shop.smartphone",
            };
            let rows = sqlx::query_as::<_, (i32, Option<String>)>(&format!(
                "DELETE FROM {table} WHERE category_id = $1 RETURNING id, image"
            ))
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            let ids: Vec<i32> = rows.iter().map(|(product_id, _)| *product_id).collect();
            detach_products(&mut tx, kind, &ids).await?;
            images.extend(rows.into_iter().filter_map(|(_, image)| image));
        }

        sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(category_id = %id, images = images.len(), "Category deleted");
        Ok(images)
    }
}
