//! Cart repository.
//!
//! The admin only reads carts and freezes them. Catalog deletions also come
//! through here: lines pointing at a deleted product are removed from open
//! carts, which are then repriced.

use std::collections::BTreeMap;

use sqlx::{PgConnection, PgPool};

use techmart_core::cart::{Cart, CartProduct, LineInput, quantity_to_db, reprice};
use techmart_core::{CartId, CartProductId, Price, ProductKind};

use super::RepositoryError;

macro_rules! cart_columns {
    () => {
        "c.id, c.owner_id, c.total_products, c.final_price, c.in_order, \
         c.for_anonymous_user, c.created_at"
    };
}

/// A cart with its owner's name for listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartSummary {
    #[sqlx(flatten)]
    pub cart: Cart,
    pub owner_name: Option<String>,
    pub line_count: i64,
}

/// A cart line with the title of its product, if it still exists.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLineRow {
    #[sqlx(flatten)]
    pub line: CartProduct,
    pub title: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PricedLine {
    id: CartProductId,
    cart_id: CartId,
    quantity: i32,
    unit_price: Option<Price>,
}

/// Database access for carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The most recent carts with owner names and line counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<CartSummary>, RepositoryError> {
        let carts = sqlx::query_as::<_, CartSummary>(concat!(
            "SELECT ",
            cart_columns!(),
            ", cu.first_name || ' ' || cu.last_name AS owner_name, \
             (SELECT COUNT(*) FROM shop.cart_product cp WHERE cp.cart_id = c.id) AS line_count \
             FROM shop.cart c \
             LEFT JOIN shop.customer cu ON cu.id = c.owner_id \
             ORDER BY c.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(carts)
    }

    /// Get one cart with its owner's name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CartId) -> Result<Option<CartSummary>, RepositoryError> {
        let cart = sqlx::query_as::<_, CartSummary>(concat!(
            "SELECT ",
            cart_columns!(),
            ", cu.first_name || ' ' || cu.last_name AS owner_name, \
             (SELECT COUNT(*) FROM shop.cart_product cp WHERE cp.cart_id = c.id) AS line_count \
             FROM shop.cart c \
             LEFT JOIN shop.customer cu ON cu.id = c.owner_id \
             WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(cart)
    }

    /// Lines of a cart with product titles, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, id: CartId) -> Result<Vec<CartLineRow>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT cp.id, cp.cart_id, cp.customer_id, cp.product_kind, cp.product_id,
                   cp.quantity, cp.final_price,
                   COALESCE(n.title, s.title) AS title
            FROM shop.cart_product cp
            LEFT JOIN shop.notebook n
                ON cp.product_kind = 'notebook' AND n.id = cp.product_id
            LEFT JOIN shop.smartphone s
                ON cp.product_kind = 'smartphone' AND s.id = cp.product_id
            WHERE cp.cart_id = $1
            ORDER BY cp.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Freeze a cart once it has become an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn mark_in_order(&self, id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.cart SET in_order = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(cart_id = %id, "Cart marked as in order");
        Ok(())
    }
}

/// Remove lines pointing at the given products from open carts and reprice
/// those carts.
///
/// Carts already turned into orders keep their lines as recorded.
pub(crate) async fn detach_products(
    conn: &mut PgConnection,
    kind: ProductKind,
    product_ids: &[i32],
) -> Result<(), RepositoryError> {
    if product_ids.is_empty() {
        return Ok(());
    }

    let mut affected = sqlx::query_scalar::<_, CartId>(
        r"
        DELETE FROM shop.cart_product cp
        USING shop.cart c
        WHERE c.id = cp.cart_id
          AND NOT c.in_order
          AND cp.product_kind = $1
          AND cp.product_id = ANY($2)
        RETURNING cp.cart_id
        ",
    )
    .bind(kind)
    .bind(product_ids)
    .fetch_all(&mut *conn)
    .await?;

    affected.sort_unstable();
    affected.dedup();
    if affected.is_empty() {
        return Ok(());
    }

    tracing::info!(%kind, carts = affected.len(), "Removed deleted products from carts");
    reprice_carts(conn, &affected).await
}

/// Reprice the open carts holding a product after its price changed.
pub(crate) async fn reprice_product(
    conn: &mut PgConnection,
    kind: ProductKind,
    product_id: i32,
) -> Result<(), RepositoryError> {
    let affected = sqlx::query_scalar::<_, CartId>(
        r"
        SELECT DISTINCT cp.cart_id
        FROM shop.cart_product cp
        JOIN shop.cart c ON c.id = cp.cart_id
        WHERE NOT c.in_order
          AND cp.product_kind = $1
          AND cp.product_id = $2
        ORDER BY cp.cart_id
        ",
    )
    .bind(kind)
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    if affected.is_empty() {
        return Ok(());
    }

    tracing::info!(%kind, product_id, carts = affected.len(), "Repricing carts after price change");
    reprice_carts(conn, &affected).await
}

async fn reprice_carts(conn: &mut PgConnection, cart_ids: &[CartId]) -> Result<(), RepositoryError> {
    let ids: Vec<i32> = cart_ids.iter().map(CartId::as_i32).collect();

    let rows = sqlx::query_as::<_, PricedLine>(
        r"
        SELECT cp.id, cp.cart_id, cp.quantity, COALESCE(n.price, s.price) AS unit_price
        FROM shop.cart_product cp
        LEFT JOIN shop.notebook n
            ON cp.product_kind = 'notebook' AND n.id = cp.product_id
        LEFT JOIN shop.smartphone s
            ON cp.product_kind = 'smartphone' AND s.id = cp.product_id
        WHERE cp.cart_id = ANY($1)
        ORDER BY cp.cart_id, cp.id
        FOR UPDATE OF cp
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_cart: BTreeMap<CartId, Vec<(CartProductId, LineInput)>> =
        cart_ids.iter().map(|id| (*id, Vec::new())).collect();
    for row in rows {
        // Lines whose product vanished are left for the storefront to drop.
        let (Some(unit_price), Ok(quantity)) = (row.unit_price, u32::try_from(row.quantity)) else {
            continue;
        };
        by_cart.entry(row.cart_id).or_default().push((
            row.id,
            LineInput {
                quantity,
                unit_price,
            },
        ));
    }

    for (cart_id, lines) in by_cart {
        let repriced = reprice(lines);
        repriced
            .totals
            .check_storable()
            .map_err(|e| RepositoryError::Rejected(format!("cart {cart_id}: {e}")))?;
        for (line_id, final_price) in &repriced.lines {
            sqlx::query("UPDATE shop.cart_product SET final_price = $1 WHERE id = $2")
                .bind(final_price)
                .bind(line_id)
                .execute(&mut *conn)
                .await?;
        }
        sqlx::query("UPDATE shop.cart SET total_products = $1, final_price = $2 WHERE id = $3")
            .bind(quantity_to_db(repriced.totals.total_products))
            .bind(repriced.totals.final_price)
            .bind(cart_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
