//! Admin catalog integration tests.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (tm-cli migrate all)
//! - The admin running (cargo run -p techmart-admin)
//! - A `notebooks` category (tm-cli seed catalog)

use reqwest::StatusCode;

use techmart_integration_tests::{
    admin_base_url, client, delete_notebook, get_text, notebook_form, notebook_id,
    notebooks_category_id, png, unique_slug,
};

#[tokio::test]
#[ignore = "Requires running admin"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin and database"]
async fn test_dashboard_lists_models() {
    let resp = client()
        .get(admin_base_url())
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    for label in ["Categories", "Notebooks", "Smartphones", "Carts", "Customers"] {
        assert!(body.contains(label), "dashboard is missing {label}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin, database and a notebooks category"]
async fn test_undersized_image_is_rejected() {
    let client = client();
    let category = notebooks_category_id(&client).await;
    let slug = unique_slug("tiny-image");

    let resp = client
        .post(format!("{}/products/notebook", admin_base_url()))
        .multipart(notebook_form(&category, &slug, "1299.90", Some(png(120, 120))))
        .send()
        .await
        .expect("Failed to submit form");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Image resolution is below the minimum"));
}

#[tokio::test]
#[ignore = "Requires running admin, database and a notebooks category"]
async fn test_oversized_image_is_rejected() {
    let client = client();
    let category = notebooks_category_id(&client).await;
    let slug = unique_slug("huge-image");

    let resp = client
        .post(format!("{}/products/notebook", admin_base_url()))
        .multipart(notebook_form(&category, &slug, "1299.90", Some(png(1200, 900))))
        .send()
        .await
        .expect("Failed to submit form");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Image resolution is above the maximum"));
}

#[tokio::test]
#[ignore = "Requires running admin, database and a notebooks category"]
async fn test_create_and_delete_notebook_with_image() {
    let client = client();
    let base_url = admin_base_url();
    let category = notebooks_category_id(&client).await;
    let slug = unique_slug("it-notebook");

    let resp = client
        .post(format!("{base_url}/products/notebook"))
        .multipart(notebook_form(&category, &slug, "1299.90", Some(png(600, 600))))
        .send()
        .await
        .expect("Failed to submit form");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let list = get_text(&client, &format!("{base_url}/products/notebook")).await;
    assert!(list.contains(&slug));

    // The image was stored and is served from /media
    let marker = format!("/media/notebook-{slug}-");
    let start = list.find(&marker).expect("No stored notebook image");
    let path: String = list[start..].chars().take_while(|c| *c != '"').collect();
    let image = client
        .get(format!("{base_url}{path}"))
        .send()
        .await
        .expect("Failed to fetch image");
    assert_eq!(image.status(), StatusCode::OK);

    // Duplicate slug is a field error
    let resp = client
        .post(format!("{base_url}/products/notebook"))
        .multipart(notebook_form(&category, &slug, "1299.90", None))
        .send()
        .await
        .expect("Failed to submit form");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Product with this slug already exists"));

    // Clean up via the edit link in our row
    let id = notebook_id(&list, &slug).expect("Created notebook missing from list");
    delete_notebook(&client, &id).await;
}
