//! Product repository.
//!
//! Writes go through [`ProductDraft`] and images only through
//! [`ValidatedImage`], so nothing reaches the catalog tables or the media
//! root without passing the product rules.

use sqlx::{PgConnection, PgPool};

use techmart_core::catalog::{Notebook, Product, Smartphone};
use techmart_core::media::ValidatedImage;
use techmart_core::{CategoryId, Price, ProductKind, ProductRef, Slug};

use super::RepositoryError;
use super::carts::{detach_products, reprice_product};
use crate::media::MediaStore;

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

/// Technical attributes of a notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookAttributes {
    pub diagonal: String,
    pub display_type: String,
    pub processor_freq: String,
    pub ram: String,
    pub video: String,
    pub time_without_charge: String,
}

/// Technical attributes of a smartphone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartphoneAttributes {
    pub diagonal: String,
    pub display_type: String,
    pub resolution: String,
    pub ram: String,
    pub sd: bool,
    pub sd_volume_max: String,
    pub battery_volume: String,
    pub main_cam_mp: String,
    pub front_cam_mp: String,
}

/// Kind-specific attributes; the variant decides which table is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attributes {
    Notebook(NotebookAttributes),
    Smartphone(SmartphoneAttributes),
}

impl Attributes {
    #[must_use]
    pub const fn kind(&self) -> ProductKind {
        match self {
            Self::Notebook(_) => ProductKind::Notebook,
            Self::Smartphone(_) => ProductKind::Smartphone,
        }
    }
}

/// A validated product, ready to insert or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub category_id: CategoryId,
    pub title: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Price,
    pub attributes: Attributes,
}

impl ProductDraft {
    #[must_use]
    pub const fn kind(&self) -> ProductKind {
        self.attributes.kind()
    }
}

/// What to do with a product's image on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the current image in place.
    Keep,
    /// Remove the current image.
    Clear,
    /// Store a new image and remove the old one.
    Replace(ValidatedImage),
}

/// Database access for notebooks and smartphones.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
    media: &'a MediaStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository writing images to `media`.
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a MediaStore) -> Self {
        Self { pool, media }
    }

    /// All products of one kind, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, kind: ProductKind) -> Result<Vec<Product>, RepositoryError> {
        let products = match kind {
            ProductKind::Notebook => sqlx::query_as::<_, Notebook>(concat!(
                "SELECT ",
                notebook_columns!(),
                " FROM shop.notebook ORDER BY id DESC"
            ))
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Product::from)
            .collect(),
            ProductKind::Smartphone => sqlx::query_as::<_, Smartphone>(concat!(
                "SELECT ",
                smartphone_columns!(),
                " FROM shop.smartphone ORDER BY id DESC"
            ))
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Product::from)
            .collect(),
        };
        Ok(products)
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, product: ProductRef) -> Result<Option<Product>, RepositoryError> {
        let found = match product {
            ProductRef::Notebook(id) => sqlx::query_as::<_, Notebook>(concat!(
                "SELECT ",
                notebook_columns!(),
                " FROM shop.notebook WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Product::from),
            ProductRef::Smartphone(id) => sqlx::query_as::<_, Smartphone>(concat!(
                "SELECT ",
                smartphone_columns!(),
                " FROM shop.smartphone WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Product::from),
        };
        Ok(found)
    }

    /// Find the ID of a product by kind and slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_id_by_slug(
        &self,
        kind: ProductKind,
        slug: &Slug,
    ) -> Result<Option<ProductRef>, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(&format!(
            "SELECT id FROM {} WHERE slug = $1",
            table(kind)
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(id.map(|id| ProductRef::from_parts(kind, id)))
    }

    /// Insert a product, storing its image first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken,
    /// `RepositoryError::Media` if the image cannot be written, or
    /// `RepositoryError::Database` if the query fails. A stored image is
    /// removed again when the insert fails.
    pub async fn create(
        &self,
        draft: &ProductDraft,
        image: Option<&ValidatedImage>,
    ) -> Result<Product, RepositoryError> {
        let image_name = match image {
            Some(image) => Some(self.media.save(draft.kind(), &draft.slug, image).await?),
            None => None,
        };

        let inserted = insert(self.pool, draft, image_name.as_deref())
            .await
            .map_err(|e| RepositoryError::from_unique(e, "product with this slug"));

        let id = match inserted {
            Ok(id) => id,
            Err(e) => {
                if let Some(name) = &image_name {
                    self.media.discard(name).await;
                }
                return Err(e);
            }
        };

        let product_ref = ProductRef::from_parts(draft.kind(), id);
        tracing::info!(product = ?product_ref, slug = %draft.slug, "Product created");
        self.get(product_ref)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("{product_ref:?} vanished")))
    }

    /// Update a product and apply an image change.
    ///
    /// The draft's attributes decide the kind; `id` is the row within that
    /// kind's table. A price change reprices the open carts holding the
    /// product in the same transaction. A replaced or cleared image file is
    /// removed only after the row no longer points at it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` if the slug is taken,
    /// `RepositoryError::Rejected` if a repriced cart total is too large,
    /// `RepositoryError::Media` if the new image cannot be written, or
    /// `RepositoryError::Database` if a query fails. A newly stored image is
    /// removed again when the update fails.
    pub async fn update(
        &self,
        id: i32,
        draft: &ProductDraft,
        image: ImageChange,
    ) -> Result<Product, RepositoryError> {
        let kind = draft.kind();
        let (keep_current, stored_new) = match image {
            ImageChange::Keep => (true, None),
            ImageChange::Clear => (false, None),
            ImageChange::Replace(new) => {
                (false, Some(self.media.save(kind, &draft.slug, &new).await?))
            }
        };

        let unused = match self.update_row(id, draft, keep_current, stored_new.as_deref()).await {
            Ok(unused) => unused,
            Err(e) => {
                if let Some(name) = &stored_new {
                    self.media.discard(name).await;
                }
                return Err(e);
            }
        };

        if let Some(old) = unused {
            self.media.discard(&old).await;
        }

        let product_ref = ProductRef::from_parts(kind, id);
        tracing::info!(product = ?product_ref, slug = %draft.slug, "Product updated");
        self.get(product_ref).await?.ok_or(RepositoryError::NotFound)
    }

    /// Write the row and reprice carts on a price change.
    ///
    /// The row keeps its image when `keep_current` is set and points at
    /// `stored_new` otherwise. Returns the previous image file if the row no
    /// longer points at it.
    async fn update_row(
        &self,
        id: i32,
        draft: &ProductDraft,
        keep_current: bool,
        stored_new: Option<&str>,
    ) -> Result<Option<String>, RepositoryError> {
        let kind = draft.kind();
        let mut tx = self.pool.begin().await?;

        let (current_image, current_price) = sqlx::query_as::<_, (Option<String>, Price)>(
            &format!("SELECT image, price FROM {} WHERE id = $1 FOR UPDATE", table(kind)),
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let image_name = if keep_current {
            current_image.clone()
        } else {
            stored_new.map(str::to_owned)
        };

        let affected = update(&mut tx, id, draft, image_name.as_deref())
            .await
            .map_err(|e| RepositoryError::from_unique(e, "product with this slug"))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        if draft.price != current_price {
            reprice_product(&mut tx, kind, id).await?;
        }
        tx.commit().await?;

        Ok(current_image.filter(|old| image_name.as_deref() != Some(old.as_str())))
    }

    /// Delete a product, drop it from open carts and remove its image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist, or
    /// `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, product: ProductRef) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let image = sqlx::query_scalar::<_, Option<String>>(&format!(
            "DELETE FROM {} WHERE id = $1 RETURNING image",
            table(product.kind())
        ))
        .bind(product.id())
        .fetch_optional(&mut *tx)
        .await?;
        let image = image.ok_or(RepositoryError::NotFound)?;

        detach_products(&mut tx, product.kind(), &[product.id()]).await?;
        tx.commit().await?;

        if let Some(name) = image {
            self.media.discard(&name).await;
        }
        tracing::info!(product = ?product, "Product deleted");
        Ok(())
    }
}

const fn table(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Notebook => "shop.notebook",
        ProductKind::Smartphone => "shop.smartphone",
    }
}

async fn insert(
    pool: &PgPool,
    draft: &ProductDraft,
    image: Option<&str>,
) -> Result<i32, sqlx::Error> {
    match &draft.attributes {
        Attributes::Notebook(n) => {
            sqlx::query_scalar::<_, i32>(
                r"
                INSERT INTO shop.notebook
                    (category_id, title, slug, image, description, price,
                     diagonal, display_type, processor_freq, ram, video, time_without_charge)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING id
                ",
            )
            .bind(draft.category_id)
            .bind(&draft.title)
            .bind(&draft.slug)
            .bind(image)
            .bind(draft.description.as_deref())
            .bind(draft.price)
            .bind(&n.diagonal)
            .bind(&n.display_type)
            .bind(&n.processor_freq)
            .bind(&n.ram)
            .bind(&n.video)
            .bind(&n.time_without_charge)
            .fetch_one(pool)
            .await
        }
        Attributes::Smartphone(s) => {
            sqlx::query_scalar::<_, i32>(
                r"
                INSERT INTO shop.smartphone
                    (category_id, title, slug, image, description, price,
                     diagonal, display_type, resolution, ram, sd, sd_volume_max,
                     battery_volume, main_cam_mp, front_cam_mp)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                RETURNING id
                ",
            )
            .bind(draft.category_id)
            .bind(&draft.title)
            .bind(&draft.slug)
            .bind(image)
            .bind(draft.description.as_deref())
            .bind(draft.price)
            .bind(&s.diagonal)
            .bind(&s.display_type)
            .bind(&s.resolution)
            .bind(&s.ram)
            .bind(s.sd)
            .bind(&s.sd_volume_max)
            .bind(&s.battery_volume)
            .bind(&s.main_cam_mp)
            .bind(&s.front_cam_mp)
            .fetch_one(pool)
            .await
        }
    }
}

/// Returns the number of rows changed.
async fn update(
    conn: &mut PgConnection,
    id: i32,
    draft: &ProductDraft,
    image: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = match &draft.attributes {
        Attributes::Notebook(n) => {
            sqlx::query(
                r"
                UPDATE shop.notebook
                SET category_id = $1, title = $2, slug = $3, image = $4, description = $5,
                    price = $6, diagonal = $7, display_type = $8, processor_freq = $9,
                    ram = $10, video = $11, time_without_charge = $12
                WHERE id = $13
                ",
            )
            .bind(draft.category_id)
            .bind(&draft.title)
            .bind(&draft.slug)
            .bind(image)
            .bind(draft.description.as_deref())
            .bind(draft.price)
            .bind(&n.diagonal)
            .bind(&n.display_type)
            .bind(&n.processor_freq)
            .bind(&n.ram)
            .bind(&n.video)
            .bind(&n.time_without_charge)
            .bind(id)
            .execute(&mut *conn)
            .await?
        }
        Attributes::Smartphone(s) => {
            sqlx::query(
                r"
                UPDATE shop.smartphone
                SET category_id = $1, title = $2, slug = $3, image = $4, description = $5,
                    price = $6, diagonal = $7, display_type = $8, resolution = $9, ram = $10,
                    sd = $11, sd_volume_max = $12, battery_volume = $13, main_cam_mp = $14,
                    front_cam_mp = $15
                WHERE id = $16
                ",
            )
            .bind(draft.category_id)
            .bind(&draft.title)
            .bind(&draft.slug)
            .bind(image)
            .bind(draft.description.as_deref())
            .bind(draft.price)
            .bind(&s.diagonal)
            .bind(&s.display_type)
            .bind(&s.resolution)
            .bind(&s.ram)
            .bind(s.sd)
            .bind(&s.sd_volume_max)
            .bind(&s.battery_volume)
            .bind(&s.main_cam_mp)
            .bind(&s.front_cam_mp)
            .bind(id)
            .execute(&mut *conn)
            .await?
        }
    };
    Ok(result.rows_affected())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_decide_kind() {
        let notebook = Attributes::Notebook(NotebookAttributes {
            diagonal: "14".to_owned(),
            display_type: "IPS".to_owned(),
            processor_freq: "3 GHz".to_owned(),
            ram: "16 GB".to_owned(),
            video: "iGPU".to_owned(),
            time_without_charge: "9 h".to_owned(),
        });
        assert_eq!(notebook.kind(), ProductKind::Notebook);
        assert_eq!(table(notebook.kind()), "shop.notebook");
    }
}
