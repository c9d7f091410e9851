//! HTTP routes over the lifecycle manager.
//!
//! Path segments that name a status are parsed before the manager is called,
//! so an unknown token is a 400 and never reaches the store.

use axum::{extract::{Path, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{delete, get, patch}, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::domain::{Order, OrderStatus, PaymentStatus};
use crate::service::OrderManager;
use crate::OrderError;

#[derive(Clone)] pub struct AppState { pub orders: OrderManager }

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/orders/health", get(health))
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/order/:order_id", get(get_by_order_id))
        .route("/api/orders/user/:user_id", get(list_by_user))
        .route("/api/orders/status/:status", get(list_by_status))
        .route("/api/orders/payment-status/:payment_status", get(list_by_payment_status))
        .route("/api/orders/:id", get(get_order).delete(delete_order))
        .route("/api/orders/:id/status", patch(update_status))
        .route("/api/orders/:id/payment-status", patch(update_payment_status))
        .route("/api/orders/:id/cancel", delete(cancel_order))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

pub enum ApiError { NotFound, Order(OrderError) }

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self { Self::Order(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound => (StatusCode::NOT_FOUND, json!({"message": "Order not found"})),
            Self::Order(e) if e.is_validation() => (StatusCode::BAD_REQUEST, json!({"message": "Invalid request", "error": e.to_string()})),
            Self::Order(OrderError::StateConflict(msg)) => (StatusCode::CONFLICT, json!({"message": msg})),
            Self::Order(e) => {
                tracing::error!(error = %e, "order operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "Storage error", "error": e.to_string()}))
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn found(order: Option<Order>, message: &str) -> ApiResult<Json<serde_json::Value>> {
    order.map(|o| Json(json!({"message": message, "order": o}))).ok_or(ApiError::NotFound)
}

async fn health() -> Json<serde_json::Value> { Json(json!({"status": "healthy", "service": "order-service"})) }

async fn create_order(State(s): State<AppState>, Json(draft): Json<Order>) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let order = s.orders.create_order(draft).await?;
    Ok((StatusCode::CREATED, Json(json!({"message": "Order created successfully", "order": order}))))
}

async fn list_orders(State(s): State<AppState>) -> ApiResult<Json<Vec<Order>>> { Ok(Json(s.orders.list_orders().await?)) }

/// Internal ids that are not UUIDs cannot name a stored order.
fn internal_id(raw: &str) -> Option<Uuid> { Uuid::parse_str(raw).ok() }

async fn get_order(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    let Some(id) = internal_id(&id) else { return Err(ApiError::NotFound) };
    s.orders.get_order_by_id(id).await?.map(Json).ok_or(ApiError::NotFound)
}

async fn get_by_order_id(State(s): State<AppState>, Path(order_id): Path<String>) -> ApiResult<Json<Order>> {
    s.orders.get_order_by_business_id(&order_id).await?.map(Json).ok_or(ApiError::NotFound)
}

async fn list_by_user(State(s): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Json<Vec<Order>>> { Ok(Json(s.orders.get_orders_by_owner(&user_id).await?)) }

async fn list_by_status(State(s): State<AppState>, Path(status): Path<String>) -> ApiResult<Json<Vec<Order>>> {
    let status: OrderStatus = status.parse()?;
    Ok(Json(s.orders.get_orders_by_status(status).await?))
}

async fn list_by_payment_status(State(s): State<AppState>, Path(payment_status): Path<String>) -> ApiResult<Json<Vec<Order>>> {
    let payment_status: PaymentStatus = payment_status.parse()?;
    Ok(Json(s.orders.get_orders_by_payment_status(payment_status).await?))
}

#[derive(Debug, Deserialize)] pub struct StatusRequest { #[serde(default)] pub status: String }

async fn update_status(State(s): State<AppState>, Path(order_id): Path<String>, Json(r): Json<StatusRequest>) -> ApiResult<Json<serde_json::Value>> {
    let status: OrderStatus = r.status.parse()?;
    found(s.orders.update_order_status(&order_id, status).await?, "Order status updated")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusRequest { #[serde(default)] pub payment_status: String, pub transaction_id: Option<String> }

async fn update_payment_status(State(s): State<AppState>, Path(order_id): Path<String>, Json(r): Json<PaymentStatusRequest>) -> ApiResult<Json<serde_json::Value>> {
    let payment_status: PaymentStatus = r.payment_status.parse()?;
    found(s.orders.update_payment_status(&order_id, payment_status, r.transaction_id).await?, "Payment status updated")
}

async fn cancel_order(State(s): State<AppState>, Path(order_id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    found(s.orders.cancel_order(&order_id).await?, "Order cancelled successfully")
}

async fn delete_order(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    if let Some(id) = internal_id(&id) {
        s.orders.delete_order(id).await?;
    }
    Ok(Json(json!({"message": "Order deleted successfully"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryOrderStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router { router(AppState { orders: OrderManager::new(Arc::new(MemoryOrderStore::new())) }) }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().method(method).uri(uri).header("content-type", "application/json");
        let req = req.body(body.map_or_else(Body::empty, |b| Body::from(b.to_string()))).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn new_order() -> serde_json::Value {
        json!({"userId": "u1", "items": [{"productId": "p1", "productName": "Widget", "quantity": 2, "price": 9.99}], "totalAmount": 19.98})
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/api/orders/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_order_lifecycle_over_http() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/orders", Some(new_order())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order"]["status"], "PENDING");
        assert_eq!(body["order"]["paymentStatus"], "PENDING");
        assert!(body["order"]["totalAmount"].is_f64());
        assert_eq!(body["order"]["totalAmount"].as_f64(), Some(19.98));
        assert_eq!(body["order"]["items"][0]["price"].as_f64(), Some(9.99));
        let order_id = body["order"]["orderId"].as_str().unwrap().to_string();
        let id = body["order"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "PATCH", &format!("/api/orders/{order_id}/payment-status"), Some(json!({"paymentStatus": "PAID", "transactionId": "tx-1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["status"], "CONFIRMED");
        assert_eq!(body["order"]["transactionId"], "tx-1");

        let (status, body) = send(&app, "GET", &format!("/api/orders/order/{order_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());

        let (status, body) = send(&app, "GET", "/api/orders/user/u1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, "DELETE", &format!("/api/orders/{order_id}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["status"], "CANCELLED");

        let (status, _) = send(&app, "DELETE", &format!("/api/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "GET", &format!("/api/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
    }

    #[tokio::test]
    async fn test_unknown_status_is_bad_request() {
        let app = app();
        let (_, body) = send(&app, "POST", "/api/orders", Some(new_order())).await;
        let order_id = body["order"]["orderId"].as_str().unwrap().to_string();
        let (status, body) = send(&app, "PATCH", &format!("/api/orders/{order_id}/status"), Some(json!({"status": "LOST"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("LOST"));
        let (status, _) = send(&app, "GET", "/api/orders/status/shipped", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cancel_delivered_is_conflict() {
        let app = app();
        let (_, body) = send(&app, "POST", "/api/orders", Some(new_order())).await;
        let order_id = body["order"]["orderId"].as_str().unwrap().to_string();
        let (status, body) = send(&app, "PATCH", &format!("/api/orders/{order_id}/status"), Some(json!({"status": "DELIVERED"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["order"]["deliveredAt"].is_string());
        let (status, body) = send(&app, "DELETE", &format!("/api/orders/{order_id}/cancel"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "cannot cancel delivered order");
        let (_, body) = send(&app, "GET", "/api/orders/status/DELIVERED", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_uuid_internal_id() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/orders/64b7f0c2e4b0a1a2b3c4d5e6", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
        let (status, body) = send(&app, "DELETE", "/api/orders/64b7f0c2e4b0a1a2b3c4d5e6", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Order deleted successfully");
    }

    #[tokio::test]
    async fn test_mutations_on_missing_order_are_not_found() {
        let app = app();
        let (status, _) = send(&app, "PATCH", "/api/orders/ORD-missing/status", Some(json!({"status": "SHIPPED"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", "/api/orders/ORD-missing/cancel", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
