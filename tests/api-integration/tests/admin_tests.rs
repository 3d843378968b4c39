use axum::http::StatusCode;
use palengke_api_integration::TestApp;
use serde_json::json;

async fn user_id_by_email(app: &TestApp, admin: &str, email: &str) -> i64 {
    let (_, body) = app.get("/api/admin/users?limit=100", Some(admin)).await;
    body["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == email)
        .unwrap_or_else(|| panic!("no user {email}"))["user_id"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn admin_endpoints_reject_non_admins_with_role_disclosure() {
    let app = TestApp::spawn().await;
    app.first_admin().await;
    let customer = app.customer("plain@example.com").await;

    let (status, body) = app.get("/api/admin/users", Some(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["your_role"], "CUSTOMER");
    assert_eq!(body["required_roles"], json!(["ADMIN"]));
}

#[tokio::test]
async fn user_listing_filters_and_paginates() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    for i in 0..3 {
        app.customer(&format!("c{i}@example.com")).await;
    }

    let (_, body) = app
        .get("/api/admin/users?role=CUSTOMER&page=1&limit=2", Some(&admin))
        .await;
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);

    let (_, body) = app.get("/api/admin/users?role=ADMIN", Some(&admin)).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn promoting_to_farmer_creates_a_default_farm_profile() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    app.customer("upgrade@example.com").await;
    let user_id = user_id_by_email(&app, &admin, "upgrade@example.com").await;

    let (status, body) = app
        .patch(
            &format!("/api/admin/users/{user_id}/role"),
            Some(&admin),
            json!({ "role": "FARMER" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "FARMER");
    assert_eq!(body["note"], "Farmer profile created");

    let (_, details) = app
        .get(&format!("/api/admin/users/{user_id}"), Some(&admin))
        .await;
    assert_eq!(
        details["details"]["farmer"]["farm_name"],
        "Test Customer's Farm"
    );
    assert_eq!(details["details"]["farmer"]["verified_status"], false);
}

#[tokio::test]
async fn demoting_a_farmer_removes_the_farm_profile() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (_, _farmer_id) = app.verified_farmer("demote@example.com", &admin).await;
    let user_id = user_id_by_email(&app, &admin, "demote@example.com").await;

    let (status, body) = app
        .patch(
            &format!("/api/admin/users/{user_id}/role"),
            Some(&admin),
            json!({ "role": "CUSTOMER" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"], "Farmer profile removed");

    let (_, details) = app
        .get(&format!("/api/admin/users/{user_id}"), Some(&admin))
        .await;
    assert_eq!(details["user"]["role"], "CUSTOMER");
    assert!(details["details"]["stats"].is_object(), "customer stats attached");
}

#[tokio::test]
async fn admins_cannot_lock_themselves_out() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let admin_id = user_id_by_email(&app, &admin, "admin@palengke.test").await;

    let (status, _) = app
        .patch(
            &format!("/api/admin/users/{admin_id}/status"),
            Some(&admin),
            json!({ "status": "SUSPENDED" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch(
            &format!("/api/admin/users/{admin_id}/role"),
            Some(&admin),
            json!({ "role": "CUSTOMER" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Setting their own status to ACTIVE is a no-op and allowed.
    let (status, _) = app
        .patch(
            &format!("/api/admin/users/{admin_id}/status"),
            Some(&admin),
            json!({ "status": "ACTIVE" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn pending_verifications_shrink_as_farms_are_approved() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    for email in ["p1@example.com", "p2@example.com"] {
        let token = app.customer(email).await;
        app.post(
            "/api/auth/register-farmer",
            Some(&token),
            json!({ "farm_name": format!("{email} farm") }),
        )
        .await;
    }

    let (_, body) = app.get("/api/admin/farmers/pending", Some(&admin)).await;
    assert_eq!(body["pagination"]["total"], 2);
    let farmer_id = body["farmers"][0]["farmer_id"].as_i64().unwrap();

    let (status, _) = app
        .patch(
            &format!("/api/admin/farmers/{farmer_id}/verify"),
            Some(&admin),
            json!({ "verified": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/admin/farmers/pending", Some(&admin)).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn moderation_and_oversight_land_in_the_audit_log() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, farmer_id) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Salted Fish", 200.0, 3).await;

    let (status, _) = app
        .patch(
            &format!("/api/admin/products/{product}/status"),
            Some(&admin),
            json!({ "status": "UNDER_REVIEW", "reason": "mislabeled weight" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, logs) = app.get("/api/admin/logs", Some(&admin)).await;
    let entries = logs["logs"].as_array().unwrap();
    // Verification during setup plus the moderation above.
    assert!(entries.len() >= 2, "expected audit entries, got {entries:?}");
    let moderation = entries
        .iter()
        .find(|e| e["action_type"] == "PRODUCT_STATUS_CHANGE")
        .expect("moderation entry");
    assert_eq!(moderation["target_id"], product);
    assert_eq!(moderation["admin_email"], "admin@palengke.test");
    assert!(moderation["details"]
        .as_str()
        .unwrap()
        .contains("mislabeled weight"));

    let (_, filtered) = app
        .get("/api/admin/logs?action_type=FARMER_VERIFICATION", Some(&admin))
        .await;
    let filtered = filtered["logs"].as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["target_id"], farmer_id);
}

#[tokio::test]
async fn admin_order_override_is_audited_and_respects_terminal_states() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Bangus", 180.0, 10).await;
    let buyer = app.customer("buyer@example.com").await;
    let (_, created) = app
        .post(
            "/api/orders",
            Some(&buyer),
            json!({ "items": [{ "product_id": product, "quantity": 2 }] }),
        )
        .await;
    let order_id = created["order"]["order_id"].as_i64().unwrap();
    let path = format!("/api/admin/orders/{order_id}");

    let (status, body) = app
        .put(&path, Some(&admin), json!({ "order_status": "CANCELLED", "total_amount": 0.0 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["order_status"], "CANCELLED");
    assert_eq!(body["order"]["total_amount"], 0.0);

    let (status, _) = app
        .put(&path, Some(&admin), json!({ "order_status": "PENDING" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "CANCELLED is final");

    let (_, logs) = app
        .get("/api/admin/logs?action_type=ORDER_UPDATE", Some(&admin))
        .await;
    assert_eq!(logs["logs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn analytics_summary_counts_the_platform() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let (farmer, _) = app.verified_farmer("farm@example.com", &admin).await;
    let product = app.product(&farmer, "Kamote", 30.0, 20).await;
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

    let (status, body) = app.get("/api/admin/analytics", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let analytics = &body["analytics"];
    assert_eq!(analytics["total_customers"], 1);
    assert_eq!(analytics["total_farmers"], 1);
    assert_eq!(analytics["verified_farmers"], 1);
    assert_eq!(analytics["total_orders"], 1);
    assert_eq!(analytics["delivered_orders"], 1);
    assert_eq!(analytics["total_revenue"], 90.0);
}

#[tokio::test]
async fn unknown_role_strings_get_a_structured_400() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    app.customer("someone@example.com").await;
    let user_id = user_id_by_email(&app, &admin, "someone@example.com").await;

    let (status, body) = app
        .patch(
            &format!("/api/admin/users/{user_id}/role"),
            Some(&admin),
            json!({ "role": "SUPERUSER" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("SUPERUSER"));
}

#[tokio::test]
async fn settings_update_merges_defaults_and_audits() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;

    let (status, body) = app
        .put(
            "/api/admin/settings",
            Some(&admin),
            json!({ "settings": { "commission_rate": 0.08, "maintenance_mode": true } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["commission_rate"], 0.08);
    assert_eq!(body["settings"]["maintenance_mode"], true);
    // Untouched keys keep their defaults.
    assert_eq!(body["settings"]["cod_enabled"], true);
    assert!(body["settings"]["platform_name"].is_string());

    let (_, body) = app
        .get("/api/admin/logs?action_type=SYSTEM_SETTINGS_UPDATE", Some(&admin))
        .await;
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0]["details"].as_str().unwrap().contains("commission_rate"));
}

#[tokio::test]
async fn settings_require_an_admin_and_an_object() {
    let app = TestApp::spawn().await;
    let admin = app.first_admin().await;
    let customer = app.customer("plain@example.com").await;

    let (status, _) = app
        .put(
            "/api/admin/settings",
            Some(&customer),
            json!({ "settings": {} }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            "/api/admin/settings",
            Some(&admin),
            json!({ "settings": [1, 2, 3] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid settings data");
}
