use axum::http::StatusCode;
use palengke_api_integration::TestApp;
use serde_json::json;

#[tokio::test]
async fn unverified_farmers_cannot_list_products() {
    let app = TestApp::spawn().await;
    let token = app.customer("newfarm@example.com").await;
    let (status, _) = app
        .post(
            "/api/auth/register-farmer",
            Some(&token),
            json!({ "farm_name": "New Farm" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Re-login to pick up the FARMER role.
    let (_, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "newfarm@example.com", "password": "secret1" }),
        )
        .await;
    let farmer_token = body["token"].as_str().unwrap().to_owned();

    let (status, body) = app
        .post(
            "/api/products",
            Some(&farmer_token),
            json!({ "product_name": "Early Corn", "category": "Vegetables", "price": 10.0, "quantity": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[tokio::test]
async fn farmer_registration_is_one_shot() {
    let app = TestApp::spawn().await;
    let token = app.customer("once@example.com").await;
    let register = json!({ "farm_name": "Once Farm" });
    let (status, _) = app
        .post("/api/auth/register-farmer", Some(&token), register.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app
        .post("/api/auth/register-farmer", Some(&token), register)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User is already registered as a farmer");
}

#[tokio::test]
async fn public_listing_hides_unverified_and_out_of_stock() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (verified, _) = app.verified_farmer("ver@example.com", &admin).await;
    app.product(&verified, "Carrots", 40.0, 10).await;
    let zero_stock = app.product(&verified, "Sold Out Beans", 90.0, 0).await;

    // A still-unverified farm, seeded through the store since the API
    // refuses to list products for it.
    let unverified = app.customer("unver@example.com").await;
    let (_, body) = app
        .post(
            "/api/auth/register-farmer",
            Some(&unverified),
            json!({ "farm_name": "Hidden Farm" }),
        )
        .await;
    let hidden_farm = body["farmer"]["farmer_id"].as_i64().unwrap();
    app.store
        .create_product(
            hidden_farm,
            &palengke_server::store::NewProduct {
                product_name: "Hidden Squash".into(),
                category: "Vegetables".into(),
                price: 20.0,
                quantity: 5,
                harvest_date: None,
                description: None,
                image_url: None,
            },
        )
        .await
        .unwrap();

    let (status, body) = app.get("/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["product_name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Carrots"));
    assert!(!names.contains(&"Sold Out Beans"), "zero stock starts UNAVAILABLE");
    assert!(!names.contains(&"Hidden Squash"), "unverified farms stay hidden");

    // Restocking brings it back automatically.
    let (status, _) = app
        .put(
            &format!("/api/products/{zero_stock}"),
            Some(&verified),
            json!({ "quantity": 6 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/products", None).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn catalog_filters_and_search() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    app.product(&farmer, "Red Onions", 95.0, 10).await;
    app.product(&farmer, "White Onions", 85.0, 10).await;
    app.product(&farmer, "Bok Choy", 25.0, 10).await;

    let (_, body) = app.get("/api/products?min_price=80&max_price=100", None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = app.get("/api/products?category=Vegetables", None).await;
    assert_eq!(body["count"], 3);

    let (_, body) = app.get("/api/products/search?query=onion", None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = app.get("/api/products/search?query=Harvest%20Hill", None).await;
    assert_eq!(body["count"], 3, "search also matches farm names");

    let (status, _) = app.get("/api/products/search?query=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/products/category/Vegetables", None).await;
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn only_the_owner_can_mutate_a_product() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (owner, _) = app.verified_farmer("owner@example.com", &admin).await;
    let (other, _) = app.verified_farmer("other@example.com", &admin).await;
    let product = app.product(&owner, "Upland Rice", 70.0, 10).await;

    let (status, _) = app
        .put(
            &format!("/api/products/{product}"),
            Some(&other),
            json!({ "price": 1.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/api/products/{product}"), Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &format!("/api/products/{product}"),
            Some(&owner),
            json!({ "price": 75.0, "description": "Newly milled" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["price"], 75.0);
    assert_eq!(body["product"]["description"], "Newly milled");
}

#[tokio::test]
async fn soft_delete_keeps_the_row_but_hides_the_listing() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Ampalaya", 33.0, 9).await;

    let (status, _) = app.delete(&format!("/api/products/{product}"), Some(&farmer)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = app.get("/api/products", None).await;
    assert_eq!(listing["count"], 0);

    // Still visible to its owner.
    let (_, mine) = app.get("/api/products/mine", Some(&farmer)).await;
    assert_eq!(mine["count"], 1);
    assert_eq!(mine["products"][0]["status"], "UNAVAILABLE");
}

#[tokio::test]
async fn owner_status_toggle_is_limited_to_shelf_states() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Gabi", 28.0, 4).await;
    let path = format!("/api/products/{product}/status");

    let (status, _) = app
        .patch(&path, Some(&farmer), json!({ "status": "REMOVED" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "moderation states are admin-only");

    let (status, body) = app
        .patch(&path, Some(&farmer), json!({ "status": "UNAVAILABLE" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["status"], "UNAVAILABLE");

    let (status, _) = app
        .patch(&path, Some(&farmer), json!({ "status": "AVAILABLE" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn feedback_requires_a_purchase_and_feeds_the_rating_stats() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Honey", 250.0, 10).await;
    let buyer = app.customer("buyer@example.com").await;
    let path = format!("/api/products/{product}/feedback");

    let (status, _) = app
        .post(&path, Some(&buyer), json!({ "rating": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no purchase yet");

    app.post(
        "/api/orders",
        Some(&buyer),
        json!({ "items": [{ "product_id": product, "quantity": 1 }] }),
    )
    .await;

    let (status, _) = app
        .post(&path, Some(&buyer), json!({ "rating": 6 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "rating out of range");

    let (status, body) = app
        .post(&path, Some(&buyer), json!({ "rating": 4, "comment": "Great honey" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, detail) = app.get(&format!("/api/products/{product}"), None).await;
    assert_eq!(detail["ratings"]["total"], 1);
    assert_eq!(detail["ratings"]["average"], 4.0);
    assert_eq!(detail["ratings"]["distribution"][3], 1);

    let (_, dashboard) = app.get("/api/farmers/dashboard", Some(&farmer)).await;
    assert_eq!(dashboard["recent_feedback"][0]["comment"], "Great honey");
    assert_eq!(dashboard["recent_feedback"][0]["customer_name"], "Test Customer");
}

#[tokio::test]
async fn customer_views_are_recorded_and_removed_products_hidden() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Lanzones", 110.0, 15).await;
    let customer = app.customer("viewer@example.com").await;

    // Anonymous and customer views both succeed; only the latter counts.
    let (status, _) = app.get(&format!("/api/products/{product}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/products/{product}"), Some(&customer)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, trending) = app.get("/api/recommendations/trending", None).await;
    assert_eq!(trending["trending"][0]["unique_viewers"], 1);

    let (status, _) = app
        .patch(
            &format!("/api/admin/products/{product}/status"),
            Some(&admin),
            json!({ "status": "REMOVED", "reason": "spoiled batch" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/products/{product}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
