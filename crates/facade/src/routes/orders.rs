//! Order CRUD and saga-trigger endpoints (spec §6 HTTP façade contract).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ClientId, OrderId};
use domain::Order;
use repository::Repository;
use saga::{CancellationSaga, ConfirmationSaga};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all order-route handlers.
pub struct AppState<R> {
    pub repository: Arc<R>,
    pub confirmation: Arc<ConfirmationSaga<R>>,
    pub cancellation: Arc<CancellationSaga<R>>,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: i64,
    pub pieces_a: u32,
    pub pieces_b: u32,
    pub description: String,
    pub address: Option<String>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub client_id: i64,
    pub description: String,
    pub address: Option<String>,
    pub pieces_a: u32,
    pub pieces_b: u32,
    pub creation_status: String,
    pub fabrication_status: String,
    pub delivery_status: String,
    pub overall_status: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.as_i64(),
            client_id: order.client_id.as_i64(),
            description: order.description.clone(),
            address: order.address.clone(),
            pieces_a: order.pieces_a,
            pieces_b: order.pieces_b,
            creation_status: order.creation_status.to_string(),
            fabrication_status: order.fabrication_status.to_string(),
            delivery_status: order.delivery_status.to_string(),
            overall_status: order.overall_status(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderStatusResponse {
    pub id: i64,
    pub status: String,
}

#[derive(Serialize)]
pub struct CancelAcceptedResponse {
    pub order_id: i64,
    pub saga_id: String,
}

/// `POST /order` — create an order and start the confirmation saga.
#[tracing::instrument(skip(state, req))]
pub async fn create<R: Repository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .repository
        .create_order(
            ClientId::new(req.client_id),
            req.pieces_a,
            req.pieces_b,
            req.description,
            req.address,
        )
        .await?;

    state.confirmation.start(order.id).await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// `GET /order` — list all orders.
#[tracing::instrument(skip(state))]
pub async fn list<R: Repository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.repository.list_orders().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// `GET /order/{id}` — load a single order.
#[tracing::instrument(skip(state))]
pub async fn get<R: Repository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.repository.get_order(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}

/// `GET /order/{id}/status` — the order's derived overall status.
#[tracing::instrument(skip(state))]
pub async fn status<R: Repository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderStatusResponse>, ApiError> {
    let order = state.repository.get_order(OrderId::new(id)).await?;
    Ok(Json(OrderStatusResponse {
        id: order.id.as_i64(),
        status: order.overall_status(),
    }))
}

/// `POST /order/{id}/cancel` — admission check, then start the cancellation
/// saga. 409 on admission violation (mapped by [`ApiError`]).
#[tracing::instrument(skip(state))]
pub async fn cancel<R: Repository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<CancelAcceptedResponse>), ApiError> {
    let order_id = OrderId::new(id);
    let saga_id = state.cancellation.start(order_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CancelAcceptedResponse {
            order_id: order_id.as_i64(),
            saga_id: saga_id.as_uuid().to_string(),
        }),
    ))
}

/// `DELETE /order/{id}`.
#[tracing::instrument(skip(state))]
pub async fn delete<R: Repository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repository.delete_order(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
