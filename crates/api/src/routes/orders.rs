//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{CreateOrder, PatchOrder, PricedOrder};
use store::{MarketplaceStore, OrderId};

use super::{AppState, parse_id};
use crate::error::ApiError;

/// POST /orders: create an order and decrement stock atomically.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<PricedOrder>), ApiError> {
    let Json(request) = payload?;
    let order = state.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(PricedOrder::try_from(order)?)))
}

/// GET /orders: every order with its total, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<PricedOrder>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /orders/{id}: one order with its line items and total.
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PricedOrder>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    Ok(Json(state.orders.get_order(id).await?))
}

/// PATCH /orders/{id}: change the order status.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<PatchOrder>, JsonRejection>,
) -> Result<Json<PricedOrder>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let Json(patch) = payload?;
    Ok(Json(state.orders.update_order(id, patch).await?))
}

/// DELETE /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: OrderId = parse_id(&id)?;
    state.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
