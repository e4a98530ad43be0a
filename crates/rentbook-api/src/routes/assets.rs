//! Plate and car endpoints

use super::blocking;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rentbook_core::model::{Asset, AssetStatus};
use rentbook_core::{AssetFilter, Page};
use rentbook_storage::Store;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

type Shared<S> = State<Arc<AppState<S>>>;

pub fn routes<S: Store + 'static, A: Asset>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/", get(list::<S, A>).post(create::<S, A>))
        .route("/:id", get(fetch::<S, A>).put(update::<S, A>).delete(remove::<S, A>))
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    pub model: Option<String>,
    pub plate_number: Option<String>,
    pub status: Option<AssetStatus>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

async fn list<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiQuery(query): ApiQuery<AssetQuery>,
) -> Result<Json<ApiResponse<Page<A>>>, ApiError> {
    let params = state.pages.params(query.skip, query.limit);
    let filter = AssetFilter {
        model: query.model,
        plate_number: query.plate_number,
        status: query.status,
    };
    let registry = state.registry.clone();
    let page = blocking(move || registry.list::<A>(&filter, params)).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn create<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    CurrentUser(user): CurrentUser,
    ApiJson(draft): ApiJson<A::Draft>,
) -> Result<(StatusCode, Json<ApiResponse<A>>), ApiError> {
    let registry = state.registry.clone();
    let asset = blocking(move || registry.create::<A>(draft, &user)).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(asset))))
}

async fn fetch<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<A>>, ApiError> {
    let registry = state.registry.clone();
    let asset = blocking(move || registry.get::<A>(id)).await?;
    Ok(Json(ApiResponse::success(asset)))
}

async fn update<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<A::Patch>,
) -> Result<Json<ApiResponse<A>>, ApiError> {
    let registry = state.registry.clone();
    let asset = blocking(move || registry.update::<A>(id, patch)).await?;
    Ok(Json(ApiResponse::success(asset)))
}

async fn remove<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    let registry = state.registry.clone();
    blocking(move || registry.delete::<A>(id)).await?;
    Ok(Json(ApiResponse::success(Deleted { id, deleted: true })))
}
