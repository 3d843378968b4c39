use axum::http::StatusCode;
use palengke_api_integration::TestApp;
use serde_json::json;

#[tokio::test]
async fn dashboard_gathers_stats_orders_and_feedback() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let kangkong = app.product(&farmer, "Kangkong", 12.0, 6).await;
    app.product(&farmer, "Empty Shelf", 55.0, 0).await;
    let buyer = app.customer("buyer@example.com").await;

    let (_, created) = app
        .post(
            "/api/orders",
            Some(&buyer),
            json!({ "items": [{ "product_id": kangkong, "quantity": 2 }] }),
        )
        .await;
    let order_id = created["order"]["order_id"].as_i64().unwrap();
    app.put(
        &format!("/api/orders/{order_id}/status"),
        Some(&farmer),
        json!({ "status": "DELIVERED" }),
    )
    .await;

    let (status, body) = app.get("/api/farmers/dashboard", Some(&farmer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farmer"]["farm_name"], "Harvest Hill");
    assert_eq!(body["stats"]["total_products"], 2);
    assert_eq!(body["stats"]["total_orders"], 1);
    assert_eq!(body["stats"]["total_sales"], 24.0);
    assert_eq!(body["recent_orders"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["unavailable_products"][0]["product_name"],
        "Empty Shelf"
    );
}

#[tokio::test]
async fn dashboard_requires_a_farmer_profile() {
    let app = TestApp::spawn().await;
    let customer = app.customer("plain@example.com").await;
    let (status, body) = app.get("/api/farmers/dashboard", Some(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["your_role"], "CUSTOMER");
}

#[tokio::test]
async fn farm_profile_partial_update() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;

    let (status, body) = app
        .put(
            "/api/farmers/profile",
            Some(&farmer),
            json!({ "product_categories": "Vegetables,Fruits" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farmer"]["product_categories"], "Vegetables,Fruits");
    assert_eq!(body["farmer"]["farm_name"], "Harvest Hill", "untouched field kept");

    let (status, _) = app
        .put("/api/farmers/profile", Some(&farmer), json!({ "farm_name": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sales_report_counts_only_delivered_orders() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Calamansi", 40.0, 30).await;
    let buyer = app.customer("buyer@example.com").await;

    let mut order_ids = Vec::new();
    for qty in [2, 3, 5] {
        let (_, created) = app
            .post(
                "/api/orders",
                Some(&buyer),
                json!({ "items": [{ "product_id": product, "quantity": qty }] }),
            )
            .await;
        order_ids.push(created["order"]["order_id"].as_i64().unwrap());
    }
    // Deliver the first two, leave the third pending.
    for order_id in &order_ids[..2] {
        app.put(
            &format!("/api/orders/{order_id}/status"),
            Some(&farmer),
            json!({ "status": "DELIVERED" }),
        )
        .await;
    }

    let (status, body) = app
        .get("/api/farmers/sales-report?period=weekly", Some(&farmer))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "weekly");
    assert_eq!(body["report"]["total_orders"], 2);
    assert_eq!(body["report"]["total_revenue"], 40.0 * 5.0);
    assert_eq!(body["report"]["daily"].as_array().unwrap().len(), 1);
    assert_eq!(body["report"]["products"][0]["units_sold"], 5);
}

#[tokio::test]
async fn inventory_summarizes_stock_and_sales() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let papaya = app.product(&farmer, "Papaya", 50.0, 10).await;
    app.product(&farmer, "Drained", 10.0, 0).await;
    let buyer = app.customer("buyer@example.com").await;
    app.post(
        "/api/orders",
        Some(&buyer),
        json!({ "items": [{ "product_id": papaya, "quantity": 4 }] }),
    )
    .await;

    let (status, body) = app.get("/api/farmers/inventory", Some(&farmer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_products"], 2);
    assert_eq!(body["summary"]["out_of_stock"], 1);
    assert_eq!(body["summary"]["units_sold"], 4);
    // 6 papayas left at 50 plus an empty shelf.
    assert_eq!(body["summary"]["stock_value"], 300.0);

    let (_, filtered) = app
        .get("/api/farmers/inventory?status=UNAVAILABLE", Some(&farmer))
        .await;
    assert_eq!(filtered["inventory"].as_array().unwrap().len(), 1);
    assert_eq!(filtered["inventory"][0]["product_name"], "Drained");
}

#[tokio::test]
async fn reviews_list_filters_by_rating_and_product() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let honey = app.product(&farmer, "Honey", 250.0, 10).await;
    let sili = app.product(&farmer, "Sili", 15.0, 30).await;
    let buyer = app.customer("buyer@example.com").await;
    app.post(
        "/api/orders",
        Some(&buyer),
        json!({ "items": [
            { "product_id": honey, "quantity": 1 },
            { "product_id": sili, "quantity": 2 },
        ] }),
    )
    .await;
    app.post(
        &format!("/api/products/{honey}/feedback"),
        Some(&buyer),
        json!({ "rating": 5, "comment": "Sweetest in the palengke" }),
    )
    .await;
    app.post(
        &format!("/api/products/{sili}/feedback"),
        Some(&buyer),
        json!({ "rating": 3 }),
    )
    .await;

    let (status, body) = app.get("/api/farmers/reviews", Some(&farmer)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(body["rating_stats"]["total"], 2);
    assert_eq!(body["rating_stats"]["average"], 4.0);

    let (_, filtered) = app
        .get("/api/farmers/reviews?min_rating=4", Some(&farmer))
        .await;
    assert_eq!(filtered["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(filtered["reviews"][0]["product_name"], "Honey");

    let (_, by_product) = app
        .get(
            &format!("/api/farmers/reviews?product_id={sili}"),
            Some(&farmer),
        )
        .await;
    assert_eq!(by_product["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(by_product["reviews"][0]["rating"], 3);

    let (status, body) = app
        .get("/api/farmers/reviews?min_rating=9", Some(&farmer))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rating must be a number between 1 and 5");
}

#[tokio::test]
async fn performance_scores_a_delivering_farmer() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Kamatis", 60.0, 20).await;
    let buyer = app.customer("buyer@example.com").await;
    let (_, created) = app
        .post(
            "/api/orders",
            Some(&buyer),
            json!({ "items": [{ "product_id": product, "quantity": 3 }] }),
        )
        .await;
    let order_id = created["order"]["order_id"].as_i64().unwrap();
    app.put(
        &format!("/api/orders/{order_id}/status"),
        Some(&farmer),
        json!({ "status": "DELIVERED" }),
    )
    .await;
    app.post(
        &format!("/api/products/{product}/feedback"),
        Some(&buyer),
        json!({ "rating": 5 }),
    )
    .await;

    let (status, body) = app.get("/api/farmers/performance", Some(&farmer)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let fulfillment = body["performance_metrics"]["order_fulfillment"]
        .as_array()
        .unwrap();
    assert_eq!(fulfillment.len(), 1);
    assert_eq!(fulfillment[0]["order_status"], "DELIVERED");
    assert_eq!(fulfillment[0]["percentage"], 100.0);
    assert_eq!(body["performance_score"]["fulfillment_rate"], 100.0);
    assert_eq!(body["performance_score"]["avg_rating"], 5.0);
    assert!(body["performance_score"]["overall"].as_f64().unwrap() > 0.0);
    assert!(body["performance_score"]["level"].is_string());
    assert!(body["recommendations"].is_array());

    let (status, _) = app.get("/api/farmers/performance", Some(&buyer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
