//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{CreateProduct, PatchProduct};
use serde::Deserialize;
use store::{Category, MarketplaceStore, Product, ProductId, ProductOrder, ProductQuery};

use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub order: Option<ProductOrder>,
    pub category: Option<Category>,
}

impl From<ListProductsParams> for ProductQuery {
    fn from(params: ListProductsParams) -> Self {
        let mut query = ProductQuery::new().order(params.order.unwrap_or_default());
        if let Some(offset) = params.offset {
            query = query.offset(offset);
        }
        if let Some(limit) = params.limit {
            query = query.limit(limit);
        }
        if let Some(category) = params.category {
            query = query.category(category);
        }
        query
    }
}

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn list<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListProductsParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.products.list_products(params.into()).await?))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    Ok(Json(state.products.get_product(id).await?))
}

/// POST /products
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(request) = payload?;
    let product = state.products.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /products/{id}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<PatchProduct>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let Json(patch) = payload?;
    Ok(Json(state.products.update_product(id, patch).await?))
}

/// DELETE /products/{id}: refused with 409 while orders reference the product.
#[tracing::instrument(skip(state))]
pub async fn delete<S: MarketplaceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ProductId = parse_id(&id)?;
    state.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
