//! Category route handlers.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::CategoryId;
use techmart_core::catalog::Category;

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{FormData, FormErrors, validate_category};
use crate::models::Flash;
use crate::models::session::set_flash;
use crate::routes::Page;
use crate::state::AppState;

/// Categories list page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: Page,
    pub categories: Vec<Category>,
}

/// Category create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub page: Page,
    pub heading: String,
    pub action: String,
    /// Set when editing, for the delete button.
    pub delete_action: Option<String>,
    pub form: FormData,
    pub errors: FormErrors,
}

fn category_form_data(category: &Category) -> FormData {
    FormData::from_pairs([
        ("name", category.name.clone()),
        ("slug", category.slug.to_string()),
    ])
}

/// Categories list page handler.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<CategoriesIndexTemplate> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(CategoriesIndexTemplate {
        page: Page::load(&session, "/categories").await,
        categories,
    })
}

/// New category form.
#[instrument(skip(session))]
pub async fn new_form(session: Session) -> CategoryFormTemplate {
    CategoryFormTemplate {
        page: Page::load(&session, "/categories").await,
        heading: "Add category".to_owned(),
        action: "/categories".to_owned(),
        delete_action: None,
        form: FormData::default(),
        errors: FormErrors::default(),
    }
}

/// Create a category.
#[instrument(skip(state, session, fields))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response> {
    let form = FormData::from_pairs(fields);
    let mut errors = match validate_category(&form) {
        Ok((name, slug)) => {
            match CategoryRepository::new(state.pool())
                .create(&name, &slug)
                .await
            {
                Ok(category) => {
                    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
                    set_flash(&session, Flash::success(format!("Category \"{category}\" added"))).await;
                    return Ok(Redirect::to("/categories").into_response());
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
    errors.add("__form__", "Please correct the errors below");

    let page = CategoryFormTemplate {
        page: Page::load(&session, "/categories").await,
        heading: "Add category".to_owned(),
        action: "/categories".to_owned(),
        delete_action: None,
        form,
        errors,
    };
    Ok((StatusCode::BAD_REQUEST, page).into_response())
}

/// Edit category form.
#[instrument(skip(state, session))]
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<CategoryFormTemplate> {
    let id = CategoryId::new(id);
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(CategoryFormTemplate {
        page: Page::load(&session, "/categories").await,
        heading: format!("Change category \"{category}\""),
        action: format!("/categories/{id}"),
        delete_action: Some(format!("/categories/{id}/delete")),
        form: category_form_data(&category),
        errors: FormErrors::default(),
    })
}

/// Update a category.
#[instrument(skip(state, session, fields))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response> {
    let id = CategoryId::new(id);
    let form = FormData::from_pairs(fields);
    let mut errors = match validate_category(&form) {
        Ok((name, slug)) => {
            match CategoryRepository::new(state.pool())
                .update(id, &name, &slug)
                .await
            {
                Ok(category) => {
                    tracing::info!(category_id = %id, slug = %category.slug, "Category updated");
                    set_flash(&session, Flash::success(format!("Category \"{category}\" changed"))).await;
                    return Ok(Redirect::to("/categories").into_response());
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
    errors.add("__form__", "Please correct the errors below");

    let page = CategoryFormTemplate {
        page: Page::load(&session, "/categories").await,
        heading: "Change category".to_owned(),
        action: format!("/categories/{id}"),
        delete_action: Some(format!("/categories/{id}/delete")),
        form,
        errors,
    };
    Ok((StatusCode::BAD_REQUEST, page).into_response())
}

/// Delete a category, its products and their images.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = CategoryId::new(id);
    let images = CategoryRepository::new(state.pool()).delete(id).await?;
    for image in &images {
        state.media().discard(image).await;
    }
    set_flash(&session, Flash::success("Category deleted")).await;
    Ok(Redirect::to("/categories"))
}

/// Uppercase the first letter of a repository message.
pub(crate) fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
