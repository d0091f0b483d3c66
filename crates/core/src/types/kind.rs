//! Product kinds and polymorphic product references.
//!
//! Each kind of product lives in its own table. A cart line points at a
//! product through a `(kind, id)` pair, see [`ProductRef`].

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::{NotebookId, SmartphoneId};

/// The kinds of product the catalog sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.product_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Notebook,
    Smartphone,
}

/// Error returned when a string names no known product kind.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown product kind: {0}")]
pub struct UnknownProductKind(pub String);

impl ProductKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 2] = [Self::Notebook, Self::Smartphone];

    /// Machine name used in URLs and the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notebook => "notebook",
            Self::Smartphone => "smartphone",
        }
    }

    /// Singular human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Notebook => "Notebook",
            Self::Smartphone => "Smartphone",
        }
    }

    /// Plural human label.
    #[must_use]
    pub const fn plural_label(self) -> &'static str {
        match self {
            Self::Notebook => "Notebooks",
            Self::Smartphone => "Smartphones",
        }
    }

    /// Slug of the category products of this kind belong to.
    ///
    /// The admin only offers this category when editing a product of the kind.
    #[must_use]
    pub const fn category_slug(self) -> &'static str {
        match self {
            Self::Notebook => "notebooks",
            Self::Smartphone => "smartphones",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductKind {
    type Err = UnknownProductKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notebook" => Ok(Self::Notebook),
            "smartphone" => Ok(Self::Smartphone),
            other => Err(UnknownProductKind(other.to_owned())),
        }
    }
}

/// A reference to one product row of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProductRef {
    Notebook(NotebookId),
    Smartphone(SmartphoneId),
}

impl ProductRef {
    /// Build a reference from its stored `(kind, id)` columns.
    #[must_use]
    pub const fn from_parts(kind: ProductKind, id: i32) -> Self {
        match kind {
            ProductKind::Notebook => Self::Notebook(NotebookId::new(id)),
            ProductKind::Smartphone => Self::Smartphone(SmartphoneId::new(id)),
        }
    }

    /// The product kind.
    #[must_use]
    pub const fn kind(self) -> ProductKind {
        match self {
            Self::Notebook(_) => ProductKind::Notebook,
            Self::Smartphone(_) => ProductKind::Smartphone,
        }
    }

    /// The raw row id within the kind's table.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Notebook(id) => id.as_i32(),
            Self::Smartphone(id) => id.as_i32(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_its_own_name() {
        for kind in ProductKind::ALL {
            assert_eq!(kind.as_str().parse::<ProductKind>().unwrap(), kind);
        }
        assert!("tablet".parse::<ProductKind>().is_err());
        assert!("Notebook".parse::<ProductKind>().is_err());
    }

    #[test]
    fn test_category_slugs() {
        assert_eq!(ProductKind::Notebook.category_slug(), "notebooks");
        assert_eq!(ProductKind::Smartphone.category_slug(), "smartphones");
    }

    #[test]
    fn test_product_ref_parts() {
        let r = ProductRef::from_parts(ProductKind::Smartphone, 9);
        assert_eq!(r, ProductRef::Smartphone(SmartphoneId::new(9)));
        assert_eq!(r.kind(), ProductKind::Smartphone);
        assert_eq!(r.id(), 9);
    }

    #[test]
    fn test_product_ref_serde() {
        let r = ProductRef::Notebook(NotebookId::new(4));
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"kind":"notebook","id":4}"#
        );
    }
}
