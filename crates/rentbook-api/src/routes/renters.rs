//! Renter endpoints

use super::blocking;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rentbook_core::model::{Renter, RenterDraft, RenterPatch};
use rentbook_core::{Page, RenterFilter};
use rentbook_storage::Store;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

type Shared<S> = State<Arc<AppState<S>>>;

pub fn routes<S: Store + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/", get(list::<S>).post(create::<S>))
        .route("/:id", get(fetch::<S>).put(update::<S>).delete(remove::<S>))
}

#[derive(Debug, Default, Deserialize)]
pub struct RenterQuery {
    pub name: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

async fn list<S: Store + 'static>(
    State(state): Shared<S>,
    ApiQuery(query): ApiQuery<RenterQuery>,
) -> Result<Json<ApiResponse<Page<Renter>>>, ApiError> {
    let params = state.pages.params(query.skip, query.limit);
    let filter = RenterFilter { name: query.name };
    let directory = state.directory.clone();
    let page = blocking(move || directory.list(&filter, params)).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn create<S: Store + 'static>(
    State(state): Shared<S>,
    CurrentUser(user): CurrentUser,
    ApiJson(draft): ApiJson<RenterDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Renter>>), ApiError> {
    let directory = state.directory.clone();
    let renter = blocking(move || directory.create(draft, &user)).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(renter))))
}

async fn fetch<S: Store + 'static>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Renter>>, ApiError> {
    let directory = state.directory.clone();
    let renter = blocking(move || directory.get(id)).await?;
    Ok(Json(ApiResponse::success(renter)))
}

async fn update<S: Store + 'static>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<RenterPatch>,
) -> Result<Json<ApiResponse<Renter>>, ApiError> {
    let directory = state.directory.clone();
    let renter = blocking(move || directory.update(id, patch)).await?;
    Ok(Json(ApiResponse::success(renter)))
}

async fn remove<S: Store + 'static>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    let directory = state.directory.clone();
    blocking(move || directory.delete(id)).await?;
    Ok(Json(ApiResponse::success(Deleted { id, deleted: true })))
}
