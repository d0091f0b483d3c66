//! Display data for templates.
//!
//! Templates never format prices or build URLs themselves; these views carry
//! ready-to-print strings.

use techmart_core::cart::{Cart, CartLine};
use techmart_core::catalog::{Product, SpecRow};
use techmart_core::format_money;

/// A product card in a listing.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub kind_label: &'static str,
    pub title: String,
    pub url: String,
    pub price: String,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let base = product.base();
        Self {
            kind_label: product.kind().label(),
            title: base.title.clone(),
            url: product.url(),
            price: base.price.display(),
            image_url: base.image_url(),
        }
    }
}

/// A product detail page.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub kind: &'static str,
    pub kind_label: &'static str,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub specs: Vec<SpecRow>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let base = product.base();
        Self {
            kind: product.kind().as_str(),
            kind_label: product.kind().label(),
            title: base.title.clone(),
            slug: base.slug.to_string(),
            description: base.description.clone(),
            price: base.price.display(),
            image_url: base.image_url(),
            specs: product.spec_rows(),
        }
    }
}

/// One line on the cart page.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub quantity: i32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let base = line.product.base();
        Self {
            id: line.line.id.as_i32(),
            title: base.title.clone(),
            url: line.product.url(),
            quantity: line.line.quantity,
            price: base.price.display(),
            line_price: format_money(line.line.final_price),
            image_url: base.image_url(),
        }
    }
}

/// The cart page.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: i32,
    pub for_anonymous_user: bool,
}

impl CartView {
    /// A cart with nothing in it.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: format_money(rust_decimal::Decimal::ZERO),
            item_count: 0,
            for_anonymous_user: true,
        }
    }

    /// Build the view from a cart row and its lines.
    #[must_use]
    pub fn new(cart: &Cart, lines: &[CartLine]) -> Self {
        Self {
            items: lines.iter().map(CartItemView::from).collect(),
            subtotal: format_money(cart.final_price),
            item_count: cart.total_products,
            for_anonymous_user: cart.for_anonymous_user,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use techmart_core::catalog::{ProductBase, Smartphone};
    use techmart_core::{CartId, CategoryId, Price, Slug, SmartphoneId};

    use super::*;

    fn phone() -> Product {
        Smartphone {
            id: SmartphoneId::new(2),
            base: ProductBase {
                category_id: CategoryId::new(1),
                title: "Pixel 8".to_owned(),
                slug: Slug::parse("pixel-8").unwrap(),
                image: Some("smartphone-pixel-8-0a1b2c3d.png".to_owned()),
                description: None,
                price: Price::parse("699.00").unwrap(),
                created_at: DateTime::<Utc>::UNIX_EPOCH,
            },
            diagonal: "6.2".to_owned(),
            display_type: "OLED".to_owned(),
            resolution: "2400x1080".to_owned(),
            ram: "8 GB".to_owned(),
            sd: true,
            sd_volume_max: "1 TB".to_owned(),
            battery_volume: "4575 mAh".to_owned(),
            main_cam_mp: "50 MP".to_owned(),
            front_cam_mp: "10.5 MP".to_owned(),
        }
        .into()
    }

    #[test]
    fn test_product_card_view() {
        let card = ProductCardView::from(&phone());
        assert_eq!(card.url, "/products/smartphone/pixel-8");
        assert_eq!(card.price, "$699.00");
        assert_eq!(
            card.image_url.as_deref(),
            Some("/media/smartphone-pixel-8-0a1b2c3d.png")
        );
    }

    #[test]
    fn test_cart_view_uses_stored_totals() {
        let cart = Cart {
            id: CartId::new(1),
            owner_id: None,
            total_products: 3,
            final_price: Decimal::new(209_700, 2),
            in_order: false,
            for_anonymous_user: true,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let view = CartView::new(&cart, &[]);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$2,097.00");
        assert!(CartView::empty().items.is_empty());
    }
}
