//! Lease and rental endpoints

use super::blocking;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rentbook_core::model::{Agreement, AgreementPatch, AgreementStatus, Asset, NewAgreement, NewPayment, Payment};
use rentbook_core::{AgreementFilter, AgreementView, Page};
use rentbook_storage::Store;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

type Shared<S> = State<Arc<AppState<S>>>;
type Reply<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn routes<S: Store + 'static, A: Asset>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/", get(list::<S, A>).post(create::<S, A>))
        .route("/:id", get(fetch::<S, A>).put(update::<S, A>).delete(remove::<S, A>))
        .route("/:id/pay", post(pay::<S, A>))
        .route("/:id/freeze", post(freeze::<S, A>))
        .route("/:id/payments", get(payments::<S, A>))
}

#[derive(Debug, Default, Deserialize)]
pub struct AgreementQuery {
    pub asset: Option<String>,
    pub renter: Option<String>,
    pub status: Option<AgreementStatus>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

async fn list<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiQuery(query): ApiQuery<AgreementQuery>,
) -> Reply<Page<AgreementView<A>>> {
    let params = state.pages.params(query.skip, query.limit);
    let filter = AgreementFilter {
        asset: query.asset,
        renter: query.renter,
        status: query.status,
    };
    let engine = state.engine.clone();
    let page = blocking(move || engine.list::<A>(&filter, params)).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn create<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<NewAgreement>,
) -> Result<(StatusCode, Json<ApiResponse<Agreement<A>>>), ApiError> {
    let engine = state.engine.clone();
    let agreement = blocking(move || engine.create::<A>(input, &user)).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(agreement))))
}

async fn fetch<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<AgreementView<A>> {
    let engine = state.engine.clone();
    let view = blocking(move || engine.view::<A>(id)).await?;
    Ok(Json(ApiResponse::success(view)))
}

async fn update<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<AgreementPatch>,
) -> Reply<Agreement<A>> {
    let engine = state.engine.clone();
    let agreement = blocking(move || engine.update::<A>(id, patch)).await?;
    Ok(Json(ApiResponse::success(agreement)))
}

async fn remove<S: Store + 'static, A: Asset>(State(state): Shared<S>, ApiPath(id): ApiPath<Uuid>) -> Reply<Deleted> {
    let engine = state.engine.clone();
    blocking(move || engine.delete::<A>(id)).await?;
    Ok(Json(ApiResponse::success(Deleted { id, deleted: true })))
}

async fn pay<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payment): ApiJson<NewPayment>,
) -> Reply<Agreement<A>> {
    let engine = state.engine.clone();
    let agreement = blocking(move || engine.pay::<A>(id, payment, &user)).await?;
    Ok(Json(ApiResponse::success(agreement)))
}

async fn freeze<S: Store + 'static, A: Asset>(State(state): Shared<S>, ApiPath(id): ApiPath<Uuid>) -> Reply<Agreement<A>> {
    let engine = state.engine.clone();
    let agreement = blocking(move || engine.freeze::<A>(id)).await?;
    Ok(Json(ApiResponse::success(agreement)))
}

async fn payments<S: Store + 'static, A: Asset>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Reply<Page<Payment>> {
    let params = state.pages.params(query.skip, query.limit);
    let engine = state.engine.clone();
    let page = blocking(move || engine.list_payments::<A>(id, params)).await?;
    Ok(Json(ApiResponse::success(page)))
}
