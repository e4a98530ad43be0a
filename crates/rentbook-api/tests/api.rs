//! HTTP-level tests driving the router with `oneshot`

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use rentbook_api::{create_router, AppState, ServerConfig};
use rentbook_storage::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let config = ServerConfig::default();
    create_router(Arc::new(AppState::new(Arc::new(MemoryStore::new()), &config)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-email", "clerk@example.com");
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn renter(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/renters",
        Some(json!({
            "full_name": "Ana Ruiz",
            "phone": "7185550123",
            "driver_license_number": "R5550123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn plate(app: &Router, number: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/plates",
        Some(json!({
            "plate_number": number,
            "purchase_date": "2024-01-02",
            "purchase_amount": "18000.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn lease(app: &Router, plate: &str, renter: &str, total: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/leases",
        Some(json!({
            "asset_id": plate,
            "renter_id": renter,
            "start_date": "2024-02-01",
            "total_amount": total,
            "frequency": "weekly"
        })),
    )
    .await
}

fn amount(value: &Value) -> rust_decimal::Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["storage"], "memory");
}

#[tokio::test]
async fn test_lease_payment_flow() {
    let app = app();
    let renter = renter(&app).await;
    let plate = plate(&app, "T123456C").await;

    let (status, body) = lease(&app, &plate, &renter, "1000.00").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["payment_status"], "unpaid");
    assert_eq!(body["data"]["create_by"], "clerk@example.com");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, &format!("/api/v1/plates/{}", plate), None).await;
    assert_eq!(body["data"]["status"], "rented");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/leases/{}/pay", id),
        Some(json!({"amount": "600", "payment_date": "2024-02-08"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["data"]["remaining_amount"]), rust_decimal::Decimal::from(400));

    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/leases/{}/pay", id),
        Some(json!({"amount": "400", "payment_date": "2024-02-15", "note": "final"})),
    )
    .await;
    assert_eq!(body["data"]["payment_status"], "paid");

    let (_, body) = send(&app, Method::GET, &format!("/api/v1/plates/{}", plate), None).await;
    assert_eq!(body["data"]["status"], "available");

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/leases/{}/payments", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["data"][0]["payment_date"], "2024-02-15");
    assert_eq!(body["data"]["data"][0]["note"], "final");

    let (_, body) = send(&app, Method::GET, &format!("/api/v1/leases/{}", id), None).await;
    assert_eq!(body["data"]["renter_name"], "Ana Ruiz");
    assert_eq!(body["data"]["plate_number"], "T123456C");
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();
    let renter = renter(&app).await;
    let plate = plate(&app, "T654321C").await;
    let (_, body) = lease(&app, &plate, &renter, "500").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = lease(&app, &plate, &renter, "300").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/leases/{}/pay", id),
        Some(json!({"amount": "-5", "payment_date": "2024-02-08"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_AMOUNT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/leases/00000000-0000-0000-0000-000000000000/freeze",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(&app, Method::GET, "/api/v1/leases/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = send(&app, Method::POST, "/api/v1/renters", Some(json!({"full_name": "X"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/renters",
        Some(json!({"full_name": "X", "phone": "1", "driver_license_number": "ABCD"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_freeze_update_and_delete() {
    let app = app();
    let renter = renter(&app).await;
    let plate = plate(&app, "T777777C").await;
    let (_, body) = lease(&app, &plate, &renter, "900").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::POST, &format!("/api/v1/leases/{}/freeze", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "cancel");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/leases/{}", id),
        Some(json!({"status": "ended", "notes": "returned early"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ended");
    assert_eq!(body["data"]["notes"], "returned early");

    let (status, body) = send(&app, Method::GET, "/api/v1/leases?status=ended&renter=ana", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/v1/leases/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/leases/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/renters/{}", renter), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rental_over_car() {
    let app = app();
    let renter = renter(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/cars",
        Some(json!({
            "model": "Toyota Camry",
            "year": 2022,
            "plate_number": "T300300C",
            "price": "25000",
            "maintenance_costs": "500"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["car_number"], 1);
    let car = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rentals",
        Some(json!({
            "asset_id": car,
            "renter_id": renter,
            "start_date": "2024-03-01",
            "rental_type": "lease_to_own"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(amount(&body["data"]["total_amount"]), rust_decimal::Decimal::from(25500));

    let (status, body) = send(&app, Method::DELETE, &format!("/api/v1/cars/{}", car), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = send(&app, Method::GET, "/api/v1/cars?model=camry&plate_number=300&status=rented", None).await;
    assert_eq!(body["data"]["count"], 1);
    let (_, body) = send(&app, Method::GET, "/api/v1/cars?model=camry&plate_number=999", None).await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_list_pagination_is_capped() {
    let config = ServerConfig {
        default_page_limit: 2,
        max_page_limit: 3,
        ..Default::default()
    };
    let app = create_router(Arc::new(AppState::new(Arc::new(MemoryStore::new()), &config)));
    for number in ["T1C", "T2C", "T3C", "T4C", "T5C"] {
        plate(&app, number).await;
    }

    let (_, body) = send(&app, Method::GET, "/api/v1/plates", None).await;
    assert_eq!(body["data"]["count"], 5);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/api/v1/plates?skip=1&limit=50", None).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 3);
}
