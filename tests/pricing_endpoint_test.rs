use axum::http::StatusCode;
use markprice::api::{self, AppState};
use markprice::db::init_db;
use markprice::{Config, Repository};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

fn test_config(database_path: String) -> Config {
    Config {
        port: 0,
        database_path,
        catalog_path: None,
        price_decimals: 2,
        currency: "EUR".to_string(),
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    let state = AppState::new(repo, test_config(db_path));

    TestApp {
        app: api::create_router(state),
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let v = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, v)
}

async fn seed(app: &axum::Router) {
    let (status, _) = request(
        app.clone(),
        "PUT",
        "/v1/products/1042/tiers",
        Some(json!([
            {"cantidad_desde": "0", "cantidad_hasta": "9", "precio": "10,00"},
            {"cantidad_desde": "10", "cantidad_hasta": "0", "precio": "8,00", "origen": "feed"},
            {"cantidad_desde": "-5", "precio": "1"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        app.clone(),
        "PUT",
        "/v1/techniques/SERIG",
        Some(json!({
            "col_inc": 1,
            "cliche": "5.00",
            "cliche_repetition": "2.00",
            "min": 50,
            "precio_escalas": [{"desde": 1, "hasta": 0, "price": "1.00", "price_col": "0.20"}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_ready() {
    let test_app = setup_test_app().await;

    let (status, body) = request(test_app.app.clone(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(test_app.app.clone(), "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_put_tiers_returns_normalized_table() {
    let test_app = setup_test_app().await;
    seed(&test_app.app).await;

    let (status, body) =
        request(test_app.app.clone(), "GET", "/v1/products/1042/tiers", None).await;
    assert_eq!(status, StatusCode::OK);

    let tiers = body["tiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[0]["qtyFrom"], 0);
    assert_eq!(tiers[0]["unitPrice"], "10.00");
    assert_eq!(tiers[1]["qtyTo"], 0);
    assert_eq!(tiers[1]["source"], "feed");
    assert_eq!(tiers[1]["currency"], "EUR");
}

#[tokio::test]
async fn test_csv_price_sheet_import() {
    let test_app = setup_test_app().await;
    let sheet = "Desde;Hasta;Precio\n1;99;2,50\n100;0;1,95\n-1;5;9\n";

    let req = axum::http::Request::builder()
        .method("PUT")
        .uri("/v1/products/77/tiers.csv?delimiter=;")
        .header("content-type", "text/csv")
        .body(axum::body::Body::from(sheet))
        .unwrap();
    let res = test_app.app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = request(
        test_app.app.clone(),
        "GET",
        "/v1/products/77/price?qty=150",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "found");
    assert_eq!(body["unitPrice"], "1.95");

    let (_, body) = request(test_app.app.clone(), "GET", "/v1/products/77/tiers", None).await;
    assert_eq!(body["tiers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_price_lookup_found_and_not_found() {
    let test_app = setup_test_app().await;
    seed(&test_app.app).await;

    let (status, body) = request(
        test_app.app.clone(),
        "GET",
        "/v1/products/1042/price?qty=10",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "found");
    assert_eq!(body["unitPrice"], "8.00");
    assert_eq!(body["tier"]["qtyFrom"], 10);

    let (status, body) = request(
        test_app.app.clone(),
        "GET",
        "/v1/products/unknown/price?qty=10",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_found");
    assert!(body.get("unitPrice").is_none());
}

#[tokio::test]
async fn test_get_tiers_unknown_product_is_404() {
    let test_app = setup_test_app().await;
    let (status, body) =
        request(test_app.app.clone(), "GET", "/v1/products/nope/tiers", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_customization_breakdown() {
    let test_app = setup_test_app().await;
    seed(&test_app.app).await;

    let (status, body) = request(
        test_app.app.clone(),
        "POST",
        "/v1/customization/price",
        Some(json!({
            "quantity": 10,
            "selections": {
                "0": {"enabled": "1", "technique": "SERIG", "colors": "3"},
                "1": {"enabled": "0", "technique": "SERIG", "colors": "1"}
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "69.00");

    let area = &body["areas"]["0"];
    assert_eq!(area["quantityForTechnique"], 50);
    assert_eq!(area["minApplied"], true);
    assert_eq!(area["techniqueTotal"], "50.00");
    assert_eq!(area["colorExtraTotal"], "4.00");
    assert_eq!(area["clicheTotal"], "15.00");
    assert!(body["areas"].get("1").is_none());
}

#[tokio::test]
async fn test_cart_price_applies_tiers() {
    let test_app = setup_test_app().await;
    seed(&test_app.app).await;

    let (status, body) = request(
        test_app.app.clone(),
        "POST",
        "/v1/cart/price",
        Some(json!({
            "lines": [
                {"lineId": "a", "productId": "1042", "variationId": "1042-S", "quantity": 6, "basePrice": "12"},
                {"lineId": "b", "productId": "1042", "variationId": "1042-M", "quantity": 6, "basePrice": "12"},
                {"lineId": "c", "productId": "77", "quantity": 2, "basePrice": "3.5"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let lines = body["lines"].as_array().unwrap();
    assert_eq!(lines[0]["subjectQuantity"], 12);
    assert_eq!(lines[0]["unitPrice"], "8.00");
    assert_eq!(lines[1]["lineTotal"], "48.00");
    assert_eq!(lines[2]["unitPrice"], "3.50");
    assert!(lines[2].get("tier").is_none());
}

#[tokio::test]
async fn test_cart_rejects_bad_base_price() {
    let test_app = setup_test_app().await;
    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/cart/price",
        Some(json!({"lines": [{"lineId": "a", "productId": "1", "quantity": 1, "basePrice": "-3"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_snapshot_survives_tier_changes() {
    let test_app = setup_test_app().await;
    seed(&test_app.app).await;

    let capture = json!({"lines": [{"lineId": "1", "productId": "1042", "quantity": 25}]});
    let (status, body) = request(
        test_app.app.clone(),
        "POST",
        "/v1/orders/5001/lines",
        Some(capture.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"][0]["unitPrice"], "8.00");
    assert_eq!(body["lines"][0]["qtyFrom"], 10);

    // Reprice the product, then capture again: the first snapshot stays.
    let (status, _) = request(
        test_app.app.clone(),
        "PUT",
        "/v1/products/1042/tiers",
        Some(json!([{"qty_from": 1, "unit_price": "6.00"}])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/orders/5001/lines",
        Some(capture),
    )
    .await;

    let (status, body) =
        request(test_app.app.clone(), "GET", "/v1/orders/5001/lines", None).await;
    assert_eq!(status, StatusCode::OK);
    let lines = body["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["unitPrice"], "8.00");
    assert_eq!(lines[0]["source"], "feed");
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let test_app = setup_test_app().await;
    let (status, _) = request(test_app.app.clone(), "GET", "/v1/orders/none/lines", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_capture_without_any_tier_is_404() {
    let test_app = setup_test_app().await;
    seed(&test_app.app).await;

    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/orders/6001/lines",
        Some(json!({"lines": [{"lineId": "1", "productId": "no-tiers", "quantity": 3}]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(test_app.app.clone(), "GET", "/v1/orders/6001/lines", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_capture_reports_lines_without_tier() {
    let test_app = setup_test_app().await;
    seed(&test_app.app).await;

    let (status, body) = request(
        test_app.app.clone(),
        "POST",
        "/v1/orders/6002/lines",
        Some(json!({"lines": [
            {"lineId": "1", "productId": "1042", "quantity": 5},
            {"lineId": "2", "productId": "no-tiers", "quantity": 5}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(body["lines"][0]["lineId"], "1");
    assert_eq!(body["skipped"], json!(["2"]));
}
