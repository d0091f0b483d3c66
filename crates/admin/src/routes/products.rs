//! Notebook and smartphone route handlers.
//!
//! Both kinds share these handlers; the `{kind}` path segment picks the
//! table, the attribute fields and the categories offered in the form.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::catalog::{Category, Product};
use techmart_core::media::ImageRules;
use techmart_core::{ProductKind, ProductRef};

use crate::db::{CategoryRepository, ImageChange, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{FormData, FormErrors, attribute_fields, checkbox_defaults, validate_product};
use crate::models::Flash;
use crate::models::session::set_flash;
use crate::routes::Page;
use crate::routes::categories::capitalize;
use crate::state::AppState;

/// A product row on the list page.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub price: String,
    pub image_url: Option<String>,
}

impl ProductRow {
    fn new(product: &Product, category_names: &HashMap<i32, String>) -> Self {
        let base = product.base();
        Self {
            id: product.product_ref().id(),
            title: base.title.clone(),
            slug: base.slug.to_string(),
            category: category_names
                .get(&base.category_id.as_i32())
                .cloned()
                .unwrap_or_default(),
            price: base.price.display(),
            image_url: base.image_url(),
        }
    }
}

/// One kind-specific input, ready for the template.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub checkbox: bool,
    pub checked: bool,
    pub max_length: usize,
    pub error: Option<String>,
}

fn field_views(kind: ProductKind, form: &FormData, errors: &FormErrors) -> Vec<FieldView> {
    attribute_fields(kind)
        .iter()
        .map(|spec| FieldView {
            name: spec.name,
            label: spec.label,
            value: form.value(spec.name).to_owned(),
            checkbox: spec.checkbox,
            checked: spec.checkbox && form.is_checked(spec.name),
            max_length: spec.max_length,
            error: errors.get(spec.name).map(str::to_owned),
        })
        .collect()
}

/// Product list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: Page,
    pub kind: ProductKind,
    pub products: Vec<ProductRow>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: Page,
    pub kind: ProductKind,
    pub heading: String,
    pub action: String,
    pub delete_action: Option<String>,
    pub choices: Vec<Category>,
    pub form: FormData,
    pub fields: Vec<FieldView>,
    pub errors: FormErrors,
    pub image_help: String,
    pub current_image: Option<String>,
}

impl ProductFormTemplate {
    fn new(
        kind: ProductKind,
        page: Page,
        choices: Vec<Category>,
        form: FormData,
        errors: FormErrors,
    ) -> Self {
        Self {
            heading: format!("Add {}", kind.label().to_lowercase()),
            action: format!("/products/{kind}"),
            delete_action: None,
            fields: field_views(kind, &form, &errors),
            image_help: ImageRules::PRODUCT.help_text(),
            current_image: None,
            page,
            kind,
            choices,
            form,
            errors,
        }
    }

    fn editing(mut self, product: &Product) -> Self {
        let id = product.product_ref().id();
        self.heading = format!("Change {} \"{}\"", self.kind.label().to_lowercase(), product.base().title);
        self.action = format!("/products/{}/{id}", self.kind);
        self.delete_action = Some(format!("/products/{}/{id}/delete", self.kind));
        self.current_image = product.base().image_url();
        self
    }

    /// Whether `category` is the selected choice.
    #[must_use]
    pub fn is_selected(&self, category: &Category) -> bool {
        self.form.value("category") == category.id.to_string()
    }
}

/// Prefill a form from a stored product.
fn product_form_data(product: &Product) -> FormData {
    let base = product.base();
    let mut pairs = vec![
        ("category", base.category_id.to_string()),
        ("title", base.title.clone()),
        ("slug", base.slug.to_string()),
        ("description", base.description.clone().unwrap_or_default()),
        ("price", base.price.amount().to_string()),
    ];
    match product {
        Product::Notebook(n) => pairs.extend([
            ("diagonal", n.diagonal.clone()),
            ("display_type", n.display_type.clone()),
            ("processor_freq", n.processor_freq.clone()),
            ("ram", n.ram.clone()),
            ("video", n.video.clone()),
            ("time_without_charge", n.time_without_charge.clone()),
        ]),
        Product::Smartphone(s) => {
            pairs.extend([
                ("diagonal", s.diagonal.clone()),
                ("display_type", s.display_type.clone()),
                ("resolution", s.resolution.clone()),
                ("ram", s.ram.clone()),
                ("sd_volume_max", s.sd_volume_max.clone()),
                ("battery_volume", s.battery_volume.clone()),
                ("main_cam_mp", s.main_cam_mp.clone()),
                ("front_cam_mp", s.front_cam_mp.clone()),
            ]);
            if s.sd {
                pairs.push(("sd", "on".to_owned()));
            }
        }
    }
    FormData::from_pairs(pairs)
}

fn parse_kind(kind: &str) -> Result<ProductKind> {
    kind.parse::<ProductKind>()
        .map_err(|_| AppError::NotFound(format!("product kind {kind}")))
}

fn list_path(kind: ProductKind) -> String {
    format!("/products/{kind}")
}

/// Product list page handler.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<String>,
) -> Result<ProductsIndexTemplate> {
    let kind = parse_kind(&kind)?;
    let products = ProductRepository::new(state.pool(), state.media())
        .list(kind)
        .await?;
    let category_names: HashMap<i32, String> = CategoryRepository::new(state.pool())
        .list()
        .await?
        .into_iter()
        .map(|c| (c.id.as_i32(), c.name))
        .collect();

    Ok(ProductsIndexTemplate {
        page: Page::load(&session, list_path(kind)).await,
        kind,
        products: products
            .iter()
            .map(|p| ProductRow::new(p, &category_names))
            .collect(),
    })
}

/// New product form.
#[instrument(skip(state, session))]
pub async fn new_form(
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<String>,
) -> Result<ProductFormTemplate> {
    let kind = parse_kind(&kind)?;
    let choices = CategoryRepository::new(state.pool())
        .choices_for(kind)
        .await?;
    let mut pairs: Vec<(&str, String)> = checkbox_defaults(kind).collect();
    // Preselect the only possible category
    if let [only] = choices.as_slice() {
        pairs.push(("category", only.id.to_string()));
    }
    let form = FormData::from_pairs(pairs);

    Ok(ProductFormTemplate::new(
        kind,
        Page::load(&session, list_path(kind)).await,
        choices,
        form,
        FormErrors::default(),
    ))
}

/// Create a product from the multipart form.
#[instrument(skip(state, session, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;
    let form = FormData::from_multipart(multipart).await?;
    let choices = CategoryRepository::new(state.pool())
        .choices_for(kind)
        .await?;

    let errors = match validate_product(kind, &form, &choices) {
        Ok((draft, image)) => {
            let image = match &image {
                ImageChange::Replace(image) => Some(image),
                ImageChange::Keep | ImageChange::Clear => None,
            };
            match ProductRepository::new(state.pool(), state.media())
                .create(&draft, image)
                .await
            {
                Ok(product) => {
                    set_flash(
                        &session,
                        Flash::success(format!("{} \"{}\" added", kind.label(), product.base().title)),
                    )
                    .await;
                    return Ok(Redirect::to(&list_path(kind)).into_response());
                }
                Err(RepositoryError::Conflict(msg)) => {
                    let mut errors = FormErrors::default();
                    errors.add("slug", capitalize(&msg));
                    errors
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };

    tracing::info!(%kind, fields = ?errors.iter().map(|(f, _)| f).collect::<Vec<_>>(), "Product form rejected");
    let page = ProductFormTemplate::new(
        kind,
        Page::load(&session, list_path(kind)).await,
        choices,
        form,
        errors,
    );
    Ok((StatusCode::BAD_REQUEST, page).into_response())
}

/// Edit product form.
#[instrument(skip(state, session))]
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path((kind, id)): Path<(String, i32)>,
) -> Result<ProductFormTemplate> {
    let kind = parse_kind(&kind)?;
    let product = ProductRepository::new(state.pool(), state.media())
        .get(ProductRef::from_parts(kind, id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{kind} {id}")))?;
    let choices = CategoryRepository::new(state.pool())
        .choices_for(kind)
        .await?;

    Ok(ProductFormTemplate::new(
        kind,
        Page::load(&session, list_path(kind)).await,
        choices,
        product_form_data(&product),
        FormErrors::default(),
    )
    .editing(&product))
}

/// Update a product from the multipart form.
#[instrument(skip(state, session, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path((kind, id)): Path<(String, i32)>,
    multipart: Multipart,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;
    let form = FormData::from_multipart(multipart).await?;
    let repo = ProductRepository::new(state.pool(), state.media());
    let product = repo
        .get(ProductRef::from_parts(kind, id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{kind} {id}")))?;
    let choices = CategoryRepository::new(state.pool())
        .choices_for(kind)
        .await?;

    let errors = match validate_product(kind, &form, &choices) {
        Ok((draft, image)) => match repo.update(id, &draft, image).await {
            Ok(updated) => {
                set_flash(
                    &session,
                    Flash::success(format!("{} \"{}\" changed", kind.label(), updated.base().title)),
                )
                .await;
                return Ok(Redirect::to(&list_path(kind)).into_response());
            }
            Err(RepositoryError::Conflict(msg)) => {
                let mut errors = FormErrors::default();
                errors.add("slug", capitalize(&msg));
                errors
            }
            Err(RepositoryError::Rejected(msg)) => {
                let mut errors = FormErrors::default();
                errors.add("price", capitalize(&msg));
                errors
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    let page = ProductFormTemplate::new(
        kind,
        Page::load(&session, list_path(kind)).await,
        choices,
        form,
        errors,
    )
    .editing(&product);
    Ok((StatusCode::BAD_REQUEST, page).into_response())
}

/// Delete a product.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path((kind, id)): Path<(String, i32)>,
) -> Result<Redirect> {
    let kind = parse_kind(&kind)?;
    ProductRepository::new(state.pool(), state.media())
        .delete(ProductRef::from_parts(kind, id))
        .await?;
    set_flash(&session, Flash::success(format!("{} deleted", kind.label()))).await;
    Ok(Redirect::to(&list_path(kind)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use techmart_core::catalog::{ProductBase, Smartphone};
    use techmart_core::{CategoryId, Price, Slug, SmartphoneId};

    use super::*;

    fn smartphone() -> Product {
        Smartphone {
            id: SmartphoneId::new(4),
            base: ProductBase {
                category_id: CategoryId::new(2),
                title: "Pixel 9".to_owned(),
                slug: Slug::parse("pixel-9").unwrap(),
                image: Some("smartphone-pixel-9-abcd1234.png".to_owned()),
                description: None,
                price: Price::parse("799.00").unwrap(),
                created_at: DateTime::<Utc>::UNIX_EPOCH,
            },
            diagonal: "6.3".to_owned(),
            display_type: "OLED".to_owned(),
            resolution: "2424x1080".to_owned(),
            ram: "12 GB".to_owned(),
            sd: false,
            sd_volume_max: "-".to_owned(),
            battery_volume: "4700 mAh".to_owned(),
            main_cam_mp: "50".to_owned(),
            front_cam_mp: "10.5".to_owned(),
        }
        .into()
    }

    fn choices() -> Vec<Category> {
        vec![Category {
            id: CategoryId::new(2),
            name: "Smartphones".to_owned(),
            slug: Slug::parse("smartphones").unwrap(),
        }]
    }

    fn page() -> Page {
        Page {
            current_path: "/products/smartphone".to_owned(),
            flash: None,
        }
    }

    #[test]
    fn test_prefilled_form_round_trips_through_validation() {
        let product = smartphone();
        let form = product_form_data(&product);
        let (draft, image) = validate_product(ProductKind::Smartphone, &form, &choices()).unwrap();

        assert_eq!(draft.title, "Pixel 9");
        assert_eq!(draft.category_id, CategoryId::new(2));
        assert_eq!(image, ImageChange::Keep);
        assert!(!form.is_checked("sd"));
    }

    #[test]
    fn test_form_shows_help_text_and_current_image() {
        let product = smartphone();
        let template = ProductFormTemplate::new(
            ProductKind::Smartphone,
            page(),
            choices(),
            product_form_data(&product),
            FormErrors::default(),
        )
        .editing(&product);

        assert!(template.is_selected(choices().first().unwrap()));
        let html = template.render().unwrap();
        assert!(html.contains("at least 400x400"));
        assert!(html.contains("/media/smartphone-pixel-9-abcd1234.png"));
        assert!(html.contains(r#"action="/products/smartphone/4""#));
        assert!(html.contains("Screen resolution"));
    }

    #[test]
    fn test_form_shows_image_error() {
        let mut errors = FormErrors::default();
        errors.add("image", "Image resolution is below the minimum");
        let html = ProductFormTemplate::new(
            ProductKind::Notebook,
            page(),
            Vec::new(),
            FormData::default(),
            errors,
        )
        .render()
        .unwrap();

        assert!(html.contains("Image resolution is below the minimum"));
        assert!(html.contains("Battery life"));
    }

    #[test]
    fn test_product_row_uses_category_name() {
        let names = HashMap::from([(2, "Smartphones".to_owned())]);
        let row = ProductRow::new(&smartphone(), &names);
        assert_eq!(row.id, 4);
        assert_eq!(row.category, "Smartphones");
        assert_eq!(row.image_url.as_deref(), Some("/media/smartphone-pixel-9-abcd1234.png"));
    }
}
