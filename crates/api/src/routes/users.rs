//! User endpoints, including a user's orders and saved products.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{CreateUser, PatchUser, PricedOrder, ToggleSavedProduct};
use serde::Deserialize;
use store::{MarketplaceStore, Product, User, UserId, UserOrder, UserQuery};

use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub order: Option<UserOrder>,
}

impl From<ListUsersParams> for UserQuery {
    fn from(params: ListUsersParams) -> Self {
        let mut query = UserQuery::new().order(params.order.unwrap_or_default());
        if let Some(offset) = params.offset {
            query = query.offset(offset);
        }
        if let Some(limit) = params.limit {
            query = query.limit(limit);
        }
        query
    }
}

/// GET /users
#[tracing::instrument(skip(state))]
pub async fn list<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListUsersParams>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.users.list_users(params.into()).await?))
}

/// GET /users/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(state.users.get_user(id).await?))
}

/// POST /users: create a user together with its preference.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(request) = payload?;
    let user = state.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /users/{id}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<PatchUser>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let Json(patch) = payload?;
    Ok(Json(state.users.update_user(id, patch).await?))
}

/// DELETE /users/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: UserId = parse_id(&id)?;
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{id}/orders
#[tracing::instrument(skip(state))]
pub async fn orders<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PricedOrder>>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(state.orders.list_user_orders(id).await?))
}

/// GET /users/{id}/saved-products
#[tracing::instrument(skip(state))]
pub async fn saved_products<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(state.saved.list(id).await?))
}

/// POST /users/{id}/saved-products: toggle one product in the saved set.
#[tracing::instrument(skip(state, payload))]
pub async fn toggle_saved_product<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<ToggleSavedProduct>, JsonRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let Json(request) = payload?;
    Ok(Json(state.saved.toggle(id, request).await?))
}
