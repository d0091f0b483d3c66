//! Cart repository.
//!
//! Every mutation runs in one transaction that locks the cart row, applies the
//! change and then reprices all lines from current product prices, so the
//! cached totals on `shop.cart` always match its lines.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use techmart_core::cart::{
    Cart, CartLine, CartProduct, LineInput, MAX_LINE_QUANTITY, merged_quantity, quantity_to_db,
    reprice,
};
use techmart_core::catalog::Product;
use techmart_core::{CartId, CartProductId, CustomerId, Price, ProductKind, ProductRef};

use super::{ProductRepository, RepositoryError};

const CART_COLUMNS: &str =
    "id, owner_id, total_products, final_price, in_order, for_anonymous_user, created_at";

/// A line with the current unit price of its product, if the product exists.
#[derive(sqlx::FromRow)]
struct PricedLine {
    id: CartProductId,
    quantity: i32,
    unit_price: Option<Price>,
}

/// Database access for carts and their lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(&format!(
            "SELECT {CART_COLUMNS} FROM shop.cart WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(cart)
    }

    /// Create an empty cart.
    ///
    /// A cart without an owner is marked as belonging to an anonymous user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, owner: Option<CustomerId>) -> Result<Cart, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(&format!(
            "INSERT INTO shop.cart (owner_id, for_anonymous_user) VALUES ($1, $2) \
             RETURNING {CART_COLUMNS}"
        ))
        .bind(owner)
        .bind(owner.is_none())
        .fetch_one(self.pool)
        .await?;
        Ok(cart)
    }

    /// Lines of a cart with their products, in the order they were added.
    ///
    /// Lines whose product no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartProduct>(
            r"
            SELECT id, cart_id, customer_id, product_kind, product_id, quantity, final_price
            FROM shop.cart_product
            WHERE cart_id = $1
            ORDER BY id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        let products = ProductRepository::new(self.pool);
        let mut by_ref: HashMap<ProductRef, Product> = HashMap::new();
        for kind in ProductKind::ALL {
            let ids: Vec<i32> = rows
                .iter()
                .filter(|row| row.product_kind == kind)
                .map(|row| row.product_id)
                .collect();
            for product in products.get_many(kind, &ids).await? {
                by_ref.insert(product.product_ref(), product);
            }
        }

        Ok(rows
            .into_iter()
            .filter_map(|line| {
                let product = by_ref.get(&line.product_ref())?.clone();
                Some(CartLine { line, product })
            })
            .collect())
    }

    /// Add units of a product to a cart.
    ///
    /// A product already in the cart has its quantity increased, capped at
    /// [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist,
    /// `RepositoryError::Conflict` if it has already been ordered, and
    /// `RepositoryError::Rejected` if the new total is too large to store.
    pub async fn add_product(
        &self,
        cart_id: CartId,
        product: ProductRef,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart = lock_open_cart(&mut tx, cart_id).await?;

        let current = sqlx::query_scalar::<_, i32>(
            r"
            SELECT quantity FROM shop.cart_product
            WHERE cart_id = $1 AND product_kind = $2 AND product_id = $3
            ",
        )
        .bind(cart.id)
        .bind(product.kind())
        .bind(product.id())
        .fetch_optional(&mut *tx)
        .await?
        .and_then(|quantity| u32::try_from(quantity).ok())
        .unwrap_or(0);

        sqlx::query(
            r"
            INSERT INTO shop.cart_product
                (cart_id, customer_id, product_kind, product_id, quantity, final_price)
            VALUES ($1, $2, $3, $4, $5, 0)
            ON CONFLICT (cart_id, product_kind, product_id) DO UPDATE
            SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(cart.id)
        .bind(cart.owner_id)
        .bind(product.kind())
        .bind(product.id())
        .bind(quantity_to_db(merged_quantity(current, quantity)))
        .execute(&mut *tx)
        .await?;

        let cart = recalculate(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart or line does not exist,
    /// `RepositoryError::Conflict` if the cart has already been ordered, and
    /// `RepositoryError::Rejected` if the new total is too large to store.
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        line_id: CartProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        if quantity == 0 {
            return self.remove_line(cart_id, line_id).await;
        }

        let mut tx = self.pool.begin().await?;
        lock_open_cart(&mut tx, cart_id).await?;

        let result =
            sqlx::query("UPDATE shop.cart_product SET quantity = $1 WHERE id = $2 AND cart_id = $3")
                .bind(quantity_to_db(quantity.min(MAX_LINE_QUANTITY)))
                .bind(line_id)
                .bind(cart_id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let cart = recalculate(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Remove a line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart or line does not exist,
    /// `RepositoryError::Conflict` if the cart has already been ordered.
    pub async fn remove_line(
        &self,
        cart_id: CartId,
        line_id: CartProductId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_open_cart(&mut tx, cart_id).await?;

        let result = sqlx::query("DELETE FROM shop.cart_product WHERE id = $1 AND cart_id = $2")
            .bind(line_id)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let cart = recalculate(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Hand a cart over to a customer.
    ///
    /// The cart stops being anonymous and its lines are attributed to the
    /// customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist,
    /// `RepositoryError::Conflict` if it has already been ordered.
    pub async fn attach_customer(
        &self,
        cart_id: CartId,
        customer_id: CustomerId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_open_cart(&mut tx, cart_id).await?;

        sqlx::query(
            "UPDATE shop.cart SET owner_id = $1, for_anonymous_user = FALSE WHERE id = $2",
        )
        .bind(customer_id)
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE shop.cart_product SET customer_id = $1 WHERE cart_id = $2")
            .bind(customer_id)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        let cart = recalculate(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

/// Lock a cart row for the rest of the transaction.
async fn lock_open_cart(conn: &mut PgConnection, cart_id: CartId) -> Result<Cart, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM shop.cart WHERE id = $1 FOR UPDATE"
    ))
    .bind(cart_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    if !cart.is_open() {
        return Err(RepositoryError::Conflict(format!(
            "cart {cart_id} has already been ordered"
        )));
    }
    Ok(cart)
}

/// Reprice every line of a cart and store the new totals.
///
/// Lines whose product has been deleted are dropped. A total that does not fit
/// the stored columns is rejected and the caller's transaction rolls back.
async fn recalculate(conn: &mut PgConnection, cart_id: CartId) -> Result<Cart, RepositoryError> {
    let rows = sqlx::query_as::<_, PricedLine>(
        r"
        SELECT cp.id, cp.quantity, COALESCE(n.price, s.price) AS unit_price
        FROM shop.cart_product cp
        LEFT JOIN shop.notebook n
            ON cp.product_kind = 'notebook' AND n.id = cp.product_id
        LEFT JOIN shop.smartphone s
            ON cp.product_kind = 'smartphone' AND s.id = cp.product_id
        WHERE cp.cart_id = $1
        ORDER BY cp.id
        FOR UPDATE OF cp
        ",
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut orphaned = Vec::new();
    let mut priced = Vec::with_capacity(rows.len());
    for row in rows {
        match (row.unit_price, u32::try_from(row.quantity)) {
            (Some(unit_price), Ok(quantity)) => priced.push((
                row.id,
                LineInput {
                    quantity,
                    unit_price,
                },
            )),
            _ => orphaned.push(row.id.as_i32()),
        }
    }

    if !orphaned.is_empty() {
        tracing::warn!(%cart_id, count = orphaned.len(), "Dropping cart lines without a product");
        sqlx::query("DELETE FROM shop.cart_product WHERE id = ANY($1)")
            .bind(&orphaned)
            .execute(&mut *conn)
            .await?;
    }

    let repriced = reprice(priced);
    repriced
        .totals
        .check_storable()
        .map_err(|e| RepositoryError::Rejected(e.to_string()))?;
    for (line_id, final_price) in &repriced.lines {
        sqlx::query("UPDATE shop.cart_product SET final_price = $1 WHERE id = $2")
            .bind(final_price)
            .bind(line_id)
            .execute(&mut *conn)
            .await?;
    }

    let cart = sqlx::query_as::<_, Cart>(&format!(
        "UPDATE shop.cart SET total_products = $1, final_price = $2 WHERE id = $3 \
         RETURNING {CART_COLUMNS}"
    ))
    .bind(quantity_to_db(repriced.totals.total_products))
    .bind(repriced.totals.final_price)
    .bind(cart_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(cart)
}
