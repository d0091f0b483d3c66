//! Seed the catalog from a YAML file.
//!
//! Categories are upserted by slug. Products are matched by kind and slug:
//! existing ones are updated, new ones inserted. Every product goes through
//! the same validation as the admin form, images included, so a seeded
//! catalog never holds anything the admin would reject.
//!
//! ```yaml
//! categories:
//!   - name: Notebooks
//!     slug: notebooks
//! products:
//!   - kind: notebook
//!     category: notebooks
//!     title: ThinkPad X1 Carbon
//!     price: "1899.00"
//!     image: images/x1-carbon.png
//!     attributes:
//!       diagonal: "14"
//!       display_type: IPS
//!       processor_freq: 3.4 GHz
//!       ram: 16 GB
//!       video: Intel Iris Xe
//!       time_without_charge: 15 hours
//! ```
//!
//! Image paths are relative to `--media-dir`, or to the YAML file's directory
//! when it is not given.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use techmart_admin::db::{
    self, CategoryRepository, ImageChange, ProductRepository, RepositoryError,
};
use techmart_admin::forms::{
    FormData, FormErrors, Upload, checkbox_defaults, validate_category, validate_product,
};
use techmart_admin::media::MediaStore;
use techmart_core::ProductKind;
use techmart_core::catalog::Category;

use super::database_url;

/// Errors that abort seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid category {name:?}: {errors}")]
    InvalidCategory { name: String, errors: String },

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0} products failed")]
    ProductsFailed(usize),
}

/// A YAML scalar kept as text; numbers and booleans are accepted unquoted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_yaml::Number),
    Flag(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Contents of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub kind: ProductKind,
    /// Slug of the category.
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Scalar,
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Scalar>,
}

impl SeedProduct {
    /// The product as the admin form would submit it.
    fn form_data(&self, category: Option<&Category>) -> FormData {
        let mut pairs: Vec<(String, String)> = vec![
            (
                "category".to_owned(),
                category.map(|c| c.id.to_string()).unwrap_or_default(),
            ),
            ("title".to_owned(), self.title.clone()),
            ("slug".to_owned(), self.slug.clone().unwrap_or_default()),
            (
                "description".to_owned(),
                self.description.clone().unwrap_or_default(),
            ),
            ("price".to_owned(), self.price.to_string()),
        ];
        pairs.extend(
            self.attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string())),
        );
        // Omitted checkboxes keep their default instead of reading as unchecked
        pairs.extend(
            checkbox_defaults(self.kind)
                .filter(|(name, _)| !self.attributes.contains_key(*name))
                .map(|(name, value)| (name.to_owned(), value)),
        );
        FormData::from_pairs(pairs)
    }
}

/// Totals reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: Vec<(String, String)>,
}

/// Parse a catalog file.
///
/// # Errors
///
/// Returns `SeedError::Yaml` if the document does not match the format.
pub fn parse_catalog(content: &str) -> Result<CatalogFile, SeedError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Join form errors into one line.
fn describe(errors: &FormErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

async fn read_image(dir: &Path, relative: &Path) -> Result<Upload, SeedError> {
    let path = dir.join(relative);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.clone(),
            source,
        })?;
    Ok(Upload {
        file_name: relative.file_name().map(|n| n.to_string_lossy().into_owned()),
        bytes,
    })
}

/// Seed categories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a category is
/// invalid, the database is unreachable, or any product failed.
pub async fn catalog(file_path: &Path, media_dir: Option<&Path>) -> Result<SeedSummary, SeedError> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_path_buf(),
            source,
        })?;
    let catalog = parse_catalog(&content)?;
    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Parsed catalog file"
    );

    // Validate categories before connecting
    let mut categories = Vec::with_capacity(catalog.categories.len());
    for category in &catalog.categories {
        let form = FormData::from_pairs([
            ("name", category.name.clone()),
            ("slug", category.slug.clone().unwrap_or_default()),
        ]);
        let validated = validate_category(&form).map_err(|errors| SeedError::InvalidCategory {
            name: category.name.clone(),
            errors: describe(&errors),
        })?;
        categories.push(validated);
    }

    let database_url = database_url("ADMIN_DATABASE_URL")
        .ok_or(SeedError::MissingEnvVar("ADMIN_DATABASE_URL"))?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_owned());
    let media = MediaStore::new(PathBuf::from(media_root));
    let image_dir = media_dir
        .map(Path::to_path_buf)
        .or_else(|| file_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let mut summary = SeedSummary::default();
    let category_repo = CategoryRepository::new(&pool);
    for (name, slug) in &categories {
        category_repo.upsert(name, slug).await?;
        summary.categories += 1;
    }
    // Products may also name categories that already exist
    let by_slug: HashMap<String, Category> = category_repo
        .list()
        .await?
        .into_iter()
        .map(|c| (c.slug.to_string(), c))
        .collect();

    let mut choices: HashMap<ProductKind, Vec<Category>> = HashMap::new();
    for kind in ProductKind::ALL {
        choices.insert(kind, category_repo.choices_for(kind).await?);
    }

    let products = ProductRepository::new(&pool, &media);
    for product in &catalog.products {
        let mut form = product.form_data(by_slug.get(&product.category));
        if let Some(image) = &product.image {
            match read_image(&image_dir, image).await {
                Ok(upload) => form = form.with_image(upload),
                Err(e) => {
                    error!(title = %product.title, error = %e, "Skipping product");
                    summary.failed.push((product.title.clone(), e.to_string()));
                    continue;
                }
            }
        }

        let kind_choices = choices.get(&product.kind).map_or(&[][..], Vec::as_slice);
        let (draft, image) = match validate_product(product.kind, &form, kind_choices) {
            Ok(validated) => validated,
            Err(errors) => {
                let reason = describe(&errors);
                error!(title = %product.title, %reason, "Skipping invalid product");
                summary.failed.push((product.title.clone(), reason));
                continue;
            }
        };

        let result = match products.find_id_by_slug(product.kind, &draft.slug).await? {
            Some(existing) => products
                .update(existing.id(), &draft, image)
                .await
                .map(|_| summary.updated += 1),
            None => {
                let image = match &image {
                    ImageChange::Replace(image) => Some(image),
                    ImageChange::Keep | ImageChange::Clear => None,
                };
                products
                    .create(&draft, image)
                    .await
                    .map(|_| summary.created += 1)
            }
        };
        if let Err(e) = result {
            error!(title = %product.title, error = %e, "Failed to store product");
            summary.failed.push((product.title.clone(), e.to_string()));
        }
    }

    info!("Seeding complete!");
    info!("  Categories upserted: {}", summary.categories);
    info!("  Products created: {}", summary.created);
    info!("  Products updated: {}", summary.updated);

    if !summary.failed.is_empty() {
        error!("  Failed: {}", summary.failed.len());
        for (title, reason) in &summary.failed {
            error!("    - {title}: {reason}");
        }
        return Err(SeedError::ProductsFailed(summary.failed.len()));
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use techmart_admin::db::Attributes;
    use techmart_core::{CategoryId, Slug};

    use super::*;

    const CATALOG: &str = r#"
categories:
  - name: Smartphones
    slug: smartphones
products:
  - kind: smartphone
    category: smartphones
    title: Pixel 9
    price: 799.00
    description: Android phone
    attributes:
      diagonal: 6.3
      display_type: OLED
      resolution: 2424x1080
      ram: 12 GB
      sd: false
      sd_volume_max: "-"
      battery_volume: 4700 mAh
      main_cam_mp: 50
      front_cam_mp: 10.5
"#;

    fn smartphones() -> Category {
        Category {
            id: CategoryId::new(2),
            name: "Smartphones".to_owned(),
            slug: Slug::parse("smartphones").unwrap(),
        }
    }

    #[test]
    fn test_parse_catalog() {
        let catalog = parse_catalog(CATALOG).unwrap();
        assert_eq!(catalog.categories.len(), 1);
        let product = catalog.products.first().unwrap();
        assert_eq!(product.kind, ProductKind::Smartphone);
        assert_eq!(product.attributes.len(), 9);
        assert!(product.image.is_none());
    }

    #[test]
    fn test_seed_product_passes_form_validation() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let product = catalog.products.first().unwrap();
        let category = smartphones();
        let form = product.form_data(Some(&category));

        let (draft, image) =
            validate_product(ProductKind::Smartphone, &form, &[category]).unwrap();
        assert_eq!(draft.slug.as_str(), "pixel-9");
        assert_eq!(draft.price.display(), "$799.00");
        assert_eq!(image, ImageChange::Keep);
        assert!(!form.is_checked("sd"));
    }

    #[test]
    fn test_omitted_sd_defaults_to_true() {
        let yaml = CATALOG.replace("      sd: false\n", "");
        let catalog = parse_catalog(&yaml).unwrap();
        let product = catalog.products.first().unwrap();
        assert!(!product.attributes.contains_key("sd"));

        let category = smartphones();
        let form = product.form_data(Some(&category));
        let (draft, _) = validate_product(ProductKind::Smartphone, &form, &[category]).unwrap();
        assert!(matches!(draft.attributes, Attributes::Smartphone(ref s) if s.sd));
    }

    #[test]
    fn test_unknown_category_is_a_form_error() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let form = catalog.products.first().unwrap().form_data(None);
        let errors = validate_product(ProductKind::Smartphone, &form, &[smartphones()]).unwrap_err();
        assert!(describe(&errors).starts_with("category: "));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let yaml = "products:\n  - kind: tablet\n    category: x\n    title: T\n    price: 1\n";
        assert!(matches!(parse_catalog(yaml), Err(SeedError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_missing_image_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_image(dir.path(), Path::new("missing.png"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SeedError::Read { .. }));
    }

    #[tokio::test]
    async fn test_image_is_read_relative_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("phone.png"), b"not really a png").unwrap();
        let upload = read_image(dir.path(), Path::new("phone.png")).await.unwrap();
        assert_eq!(upload.file_name.as_deref(), Some("phone.png"));
        assert_eq!(upload.bytes.len(), 16);
    }
}
