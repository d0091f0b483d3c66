//! Integration tests for TechMart.
//!
//! The tests talk to running servers over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p techmart-cli -- migrate all
//! cargo run -p techmart-storefront &
//! cargo run -p techmart-admin &
//! cargo test -p techmart-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` and `ADMIN_BASE_URL` override the default
//! `http://localhost:3000` and `http://localhost:3001`.

use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, Rgb};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

/// Base URL of the running storefront.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the running admin panel.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Client that keeps session cookies between requests.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Encode a solid PNG of the given size.
///
/// # Panics
///
/// Panics if encoding fails, which it does not for in-memory buffers.
#[must_use]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 120, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}

/// A slug that will not collide with earlier runs.
#[must_use]
pub fn unique_slug(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..8])
}

/// GET a page and return its body.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn get_text(client: &reqwest::Client, url: &str) -> String {
    client
        .get(url)
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body")
}

/// The digits following `marker` at its first match in `body` after `from`.
#[must_use]
pub fn digits_after(body: &str, from: usize, marker: &str) -> Option<String> {
    let start = body.get(from..)?.find(marker)? + from + marker.len();
    let digits: String = body
        .get(start..)?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    (!digits.is_empty()).then_some(digits)
}

/// Look up the `notebooks` category id on the admin's new notebook form.
///
/// # Panics
///
/// Panics if the admin is unreachable or has no notebooks category.
pub async fn notebooks_category_id(client: &reqwest::Client) -> String {
    let body = get_text(client, &format!("{}/products/notebook/new", admin_base_url())).await;
    digits_after(&body, 0, "<option value=\"")
        .expect("No notebooks category; seed the catalog first")
}

/// The admin's multipart notebook form.
///
/// # Panics
///
/// Panics if the image part cannot be built.
#[must_use]
pub fn notebook_form(category: &str, slug: &str, price: &str, image: Option<Vec<u8>>) -> Form {
    let mut form = Form::new()
        .text("category", category.to_owned())
        .text("title", format!("Test notebook {slug}"))
        .text("slug", slug.to_owned())
        .text("description", "Created by integration tests")
        .text("price", price.to_owned())
        .text("diagonal", "15.6")
        .text("display_type", "IPS")
        .text("processor_freq", "3.2 GHz")
        .text("ram", "16 GB")
        .text("video", "RTX 4060")
        .text("time_without_charge", "8 hours");
    if let Some(bytes) = image {
        let part = Part::bytes(bytes)
            .file_name("notebook.png")
            .mime_str("image/png")
            .expect("Invalid mime type");
        form = form.part("image", part);
    }
    form
}

/// Admin id of the test notebook with this slug, from the notebook list.
#[must_use]
pub fn notebook_id(list: &str, slug: &str) -> Option<String> {
    let title = list.find(&format!(">Test notebook {slug}<"))?;
    let marker = "/products/notebook/";
    let link = list.get(..title)?.rfind(marker)?;
    digits_after(list, link, marker)
}

/// Create a test notebook through the admin and return its id.
///
/// # Panics
///
/// Panics if the admin rejects the notebook.
pub async fn create_notebook(client: &reqwest::Client, slug: &str, price: &str) -> String {
    let base_url = admin_base_url();
    let category = notebooks_category_id(client).await;
    let resp = client
        .post(format!("{base_url}/products/notebook"))
        .multipart(notebook_form(&category, slug, price, None))
        .send()
        .await
        .expect("Failed to submit form");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let list = get_text(client, &format!("{base_url}/products/notebook")).await;
    notebook_id(&list, slug).expect("Created notebook missing from list")
}

/// Delete a notebook through the admin.
///
/// # Panics
///
/// Panics if the delete is not accepted.
pub async fn delete_notebook(client: &reqwest::Client, id: &str) {
    let resp = client
        .post(format!("{}/products/notebook/{id}/delete", admin_base_url()))
        .send()
        .await
        .expect("Failed to delete");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notebook_id_uses_the_matching_row() {
        let list = r#"
            <tr><td><a href="/products/notebook/12/edit">Test notebook a-1</a></td></tr>
            <tr><td><a href="/products/notebook/7/edit">Test notebook b-2</a></td></tr>
        "#;
        assert_eq!(notebook_id(list, "b-2").as_deref(), Some("7"));
        assert_eq!(notebook_id(list, "a-1").as_deref(), Some("12"));
        assert!(notebook_id(list, "c-3").is_none());
    }

    #[test]
    fn test_digits_after_skips_to_offset() {
        let body = "x=1 y=22 x=333";
        assert_eq!(digits_after(body, 0, "x=").as_deref(), Some("1"));
        assert_eq!(digits_after(body, 4, "x=").as_deref(), Some("333"));
        assert!(digits_after(body, 0, "z=").is_none());
    }
}
