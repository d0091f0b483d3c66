//! Catalog entities: categories and the product kinds.
//!
//! Notebooks and smartphones share a common set of fields ([`ProductBase`])
//! and add their own technical attributes. [`Product`] wraps either kind so
//! listings can mix them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, NotebookId, Price, ProductKind, ProductRef, Slug, SmartphoneId};

/// Maximum length of short text fields (titles, names, attributes).
pub const MAX_TEXT_LENGTH: usize = 255;

/// Maximum length of the screen diagonal field.
pub const MAX_DIAGONAL_LENGTH: usize = 5;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Fields every product kind has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProductBase {
    pub category_id: CategoryId,
    pub title: String,
    pub slug: Slug,
    /// Stored file name under the media root, if an image was uploaded.
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

impl ProductBase {
    /// Public URL of the image, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|name| format!("/media/{name}"))
    }
}

/// One label/value row of a product specification table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecRow {
    pub label: &'static str,
    pub value: String,
}

impl SpecRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// A notebook computer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Notebook {
    pub id: NotebookId,
    #[cfg_attr(feature = "postgres", sqlx(flatten))]
    pub base: ProductBase,
    pub diagonal: String,
    pub display_type: String,
    pub processor_freq: String,
    pub ram: String,
    pub video: String,
    pub time_without_charge: String,
}

impl Notebook {
    /// Rows of the specification table, in display order.
    #[must_use]
    pub fn spec_rows(&self) -> Vec<SpecRow> {
        vec![
            SpecRow::new("Diagonal", self.diagonal.as_str()),
            SpecRow::new("Display type", self.display_type.as_str()),
            SpecRow::new("Processor frequency", self.processor_freq.as_str()),
            SpecRow::new("RAM", self.ram.as_str()),
            SpecRow::new("Video memory", self.video.as_str()),
            SpecRow::new("Battery life", self.time_without_charge.as_str()),
        ]
    }
}

impl std::fmt::Display for Notebook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.base.title, self.base.slug)
    }
}

/// A smartphone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Smartphone {
    pub id: SmartphoneId,
    #[cfg_attr(feature = "postgres", sqlx(flatten))]
    pub base: ProductBase,
    pub diagonal: String,
    pub display_type: String,
    pub resolution: String,
    pub ram: String,
    /// Whether the phone takes a memory card.
    pub sd: bool,
    pub sd_volume_max: String,
    pub battery_volume: String,
    pub main_cam_mp: String,
    pub front_cam_mp: String,
}

impl Smartphone {
    /// Rows of the specification table, in display order.
    #[must_use]
    pub fn spec_rows(&self) -> Vec<SpecRow> {
        vec![
            SpecRow::new("Diagonal", self.diagonal.as_str()),
            SpecRow::new("Display type", self.display_type.as_str()),
            SpecRow::new("Screen resolution", self.resolution.as_str()),
            SpecRow::new("RAM", self.ram.as_str()),
            SpecRow::new("SD card", if self.sd { "Yes" } else { "No" }),
            SpecRow::new("Max SD volume", self.sd_volume_max.as_str()),
            SpecRow::new("Battery capacity", self.battery_volume.as_str()),
            SpecRow::new("Main camera", self.main_cam_mp.as_str()),
            SpecRow::new("Front camera", self.front_cam_mp.as_str()),
        ]
    }
}

impl std::fmt::Display for Smartphone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.base.title, self.base.slug)
    }
}

/// A product of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Product {
    Notebook(Notebook),
    Smartphone(Smartphone),
}

impl Product {
    #[must_use]
    pub const fn kind(&self) -> ProductKind {
        match self {
            Self::Notebook(_) => ProductKind::Notebook,
            Self::Smartphone(_) => ProductKind::Smartphone,
        }
    }

    #[must_use]
    pub const fn base(&self) -> &ProductBase {
        match self {
            Self::Notebook(n) => &n.base,
            Self::Smartphone(s) => &s.base,
        }
    }

    /// The `(kind, id)` reference cart lines store.
    #[must_use]
    pub const fn product_ref(&self) -> ProductRef {
        match self {
            Self::Notebook(n) => ProductRef::Notebook(n.id),
            Self::Smartphone(s) => ProductRef::Smartphone(s.id),
        }
    }

    /// Storefront detail page path.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/products/{}/{}", self.kind(), self.base().slug)
    }

    #[must_use]
    pub fn spec_rows(&self) -> Vec<SpecRow> {
        match self {
            Self::Notebook(n) => n.spec_rows(),
            Self::Smartphone(s) => s.spec_rows(),
        }
    }
}

impl From<Notebook> for Product {
    fn from(notebook: Notebook) -> Self {
        Self::Notebook(notebook)
    }
}

impl From<Smartphone> for Product {
    fn from(smartphone: Smartphone) -> Self {
        Self::Smartphone(smartphone)
    }
}

/// Number of newest products per kind shown on the home page.
pub const LATEST_PER_KIND: usize = 5;

/// Arrange the home page listing.
///
/// Keeps only products whose kind is in `kinds`. When `with_respect_to` is
/// one of `kinds`, products of that kind move to the front; the relative order
/// within each group is preserved. Otherwise the input order is kept.
#[must_use]
pub fn order_for_home(
    products: Vec<Product>,
    kinds: &[ProductKind],
    with_respect_to: Option<ProductKind>,
) -> Vec<Product> {
    let mut products: Vec<Product> = products
        .into_iter()
        .filter(|p| kinds.contains(&p.kind()))
        .collect();

    if let Some(featured) = with_respect_to.filter(|k| kinds.contains(k)) {
        // Stable: `false` (featured) sorts before `true`.
        products.sort_by_key(|p| p.kind() != featured);
    }

    products
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn base(title: &str, slug: &str, price: i64) -> ProductBase {
        ProductBase {
            category_id: CategoryId::new(1),
            title: title.to_owned(),
            slug: Slug::parse(slug).unwrap(),
            image: None,
            description: None,
            price: Price::new(Decimal::new(price, 0)).unwrap(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn notebook(id: i32, slug: &str) -> Notebook {
        Notebook {
            id: NotebookId::new(id),
            base: base("ThinkPad X1", slug, 1500),
            diagonal: "14".to_owned(),
            display_type: "IPS".to_owned(),
            processor_freq: "3.2 GHz".to_owned(),
            ram: "16 GB".to_owned(),
            video: "Intel Iris Xe".to_owned(),
            time_without_charge: "10 h".to_owned(),
        }
    }

    fn smartphone(id: i32, slug: &str) -> Smartphone {
        Smartphone {
            id: SmartphoneId::new(id),
            base: base("Pixel 8", slug, 700),
            diagonal: "6.2".to_owned(),
            display_type: "OLED".to_owned(),
            resolution: "2400x1080".to_owned(),
            ram: "8 GB".to_owned(),
            sd: false,
            sd_volume_max: "0".to_owned(),
            battery_volume: "4575 mAh".to_owned(),
            main_cam_mp: "50 MP".to_owned(),
            front_cam_mp: "10.5 MP".to_owned(),
        }
    }

    fn slugs(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.base().slug.as_str()).collect()
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(notebook(1, "x1").to_string(), "ThinkPad X1 - x1");
        assert_eq!(smartphone(1, "pixel-8").to_string(), "Pixel 8 - pixel-8");
    }

    #[test]
    fn test_notebook_spec_rows_in_order() {
        let labels: Vec<_> = notebook(1, "x1")
            .spec_rows()
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(
            labels,
            [
                "Diagonal",
                "Display type",
                "Processor frequency",
                "RAM",
                "Video memory",
                "Battery life"
            ]
        );
    }

    #[test]
    fn test_smartphone_spec_rows_render_sd_flag() {
        let mut phone = smartphone(1, "pixel-8");
        let rows = phone.spec_rows();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows.get(4).unwrap().value, "No");

        phone.sd = true;
        assert_eq!(phone.spec_rows().get(4).unwrap().value, "Yes");
    }

    #[test]
    fn test_product_url_and_ref() {
        let product = Product::from(smartphone(3, "pixel-8"));
        assert_eq!(product.url(), "/products/smartphone/pixel-8");
        assert_eq!(product.product_ref().id(), 3);
        assert_eq!(product.kind(), ProductKind::Smartphone);
    }

    #[test]
    fn test_order_for_home_without_preference_keeps_order() {
        let products = vec![
            Product::from(notebook(2, "nb-2")),
            Product::from(smartphone(1, "sp-1")),
            Product::from(notebook(1, "nb-1")),
        ];
        let ordered = order_for_home(products, &ProductKind::ALL, None);
        assert_eq!(slugs(&ordered), ["nb-2", "sp-1", "nb-1"]);
    }

    #[test]
    fn test_order_for_home_moves_featured_kind_first() {
        let products = vec![
            Product::from(notebook(2, "nb-2")),
            Product::from(notebook(1, "nb-1")),
            Product::from(smartphone(5, "sp-5")),
            Product::from(smartphone(4, "sp-4")),
        ];
        let ordered = order_for_home(products, &ProductKind::ALL, Some(ProductKind::Smartphone));
        assert_eq!(slugs(&ordered), ["sp-5", "sp-4", "nb-2", "nb-1"]);
    }

    #[test]
    fn test_order_for_home_ignores_featured_kind_not_requested() {
        let products = vec![
            Product::from(notebook(1, "nb-1")),
            Product::from(smartphone(1, "sp-1")),
        ];
        let ordered = order_for_home(
            products,
            &[ProductKind::Notebook],
            Some(ProductKind::Smartphone),
        );
        assert_eq!(slugs(&ordered), ["nb-1"]);
    }

    #[test]
    fn test_image_url() {
        let mut b = base("X", "x", 1);
        assert_eq!(b.image_url(), None);
        b.image = Some("notebook-x-1a2b.png".to_owned());
        assert_eq!(b.image_url().as_deref(), Some("/media/notebook-x-1a2b.png"));
    }
}
