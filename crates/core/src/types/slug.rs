//! URL slugs for categories and products.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9_-]`.
    #[error("slug may only contain lowercase letters, digits, hyphens and underscores (found {0:?})")]
    InvalidCharacter(char),
}

/// A URL-safe identifier: lowercase ASCII letters, digits, `-` and `_`.
///
/// ```
/// use techmart_core::Slug;
///
/// assert!(Slug::parse("macbook-air-13").is_ok());
/// assert!(Slug::parse("MacBook Air").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a `Slug` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than
    /// [`Slug::MAX_LENGTH`], or contains characters other than lowercase ASCII
    /// letters, digits, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s.chars().find(|c| !is_slug_char(*c)) {
            return Err(SlugError::InvalidCharacter(c));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}

/// Derive a slug from a human title.
///
/// Lowercases ASCII letters, collapses every run of other characters into a
/// single hyphen and trims hyphens from both ends. Returns `None` when nothing
/// usable is left (e.g. a title written entirely in another script).
///
/// ```
/// use techmart_core::slugify;
///
/// assert_eq!(slugify("Lenovo IdeaPad 5 (2024)").unwrap().as_str(), "lenovo-ideapad-5-2024");
/// assert!(slugify("!!!").is_none());
/// ```
#[must_use]
pub fn slugify(title: &str) -> Option<Slug> {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if out.len() >= Slug::MAX_LENGTH {
            break;
        }
    }

    out.truncate(Slug::MAX_LENGTH);
    let trimmed = out.trim_end_matches('-');
    Slug::parse(trimmed).ok()
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        for s in ["notebooks", "smartphones", "iphone_15-pro", "a", "x1"] {
            assert!(Slug::parse(s).is_ok(), "{s} should be a valid slug");
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(
            Slug::parse("Notebooks"),
            Err(SlugError::InvalidCharacter('N'))
        );
        assert_eq!(
            Slug::parse("two words"),
            Err(SlugError::InvalidCharacter(' '))
        );
        assert!(matches!(
            Slug::parse(&"a".repeat(51)),
            Err(SlugError::TooLong { max: 50 })
        ));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("  Apple MacBook Pro 14\" M3 ").unwrap().as_str(),
            "apple-macbook-pro-14-m3"
        );
        assert_eq!(slugify("Galaxy S24").unwrap().as_str(), "galaxy-s24");
        assert!(slugify("---").is_none());
        assert!(slugify("Ноутбук").is_none());
    }

    #[test]
    fn test_slugify_respects_max_length() {
        let slug = slugify(&"word ".repeat(40)).unwrap();
        assert!(slug.as_str().len() <= Slug::MAX_LENGTH);
        assert!(!slug.as_str().ends_with('-'));
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<Slug>("\"Bad Slug\"").is_err());
        let slug: Slug = serde_json::from_str("\"good-slug\"").unwrap();
        assert_eq!(slug.as_str(), "good-slug");
    }
}
