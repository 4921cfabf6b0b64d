//! Handlers for the `/villa-numbers` resource.
//!
//! Every create or update resolves the referenced villa first and reports a
//! missing one as an invalid parent reference, distinct from a missing
//! villa number.

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{header, StatusCode};
use axum::Json;
use validator::Validate;
use villa_core::error::CoreError;
use villa_core::patch::PatchDocument;
use villa_core::predicate::Direction;
use villa_core::types::DbId;
use villa_db::models::villa_number::{
    CreateVillaNumber, UpdateVillaNumber, VillaNumber, VillaNumberField,
};
use villa_db::patch::{Loaded, PatchPipeline};
use villa_db::query::Query;
use villa_db::repositories::{VillaNumberRepo, VillaRepo};
use villa_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::handlers::{ensure_same_id, reject_sentinel};
use crate::query::IncludeParams;
use crate::response::DataResponse;
use crate::state::AppState;

async fn ensure_villa_exists(pool: &DbPool, villa_id: DbId) -> AppResult<()> {
    if !VillaRepo::exists(pool, villa_id).await? {
        tracing::warn!(villa_id, "Villa number references a missing villa");
        return Err(AppError::Core(CoreError::invalid_parent()));
    }
    Ok(())
}

/// GET /api/v1/villa-numbers
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<IncludeParams>,
) -> AppResult<Json<DataResponse<Vec<VillaNumber>>>> {
    let query = Query::<VillaNumber>::all()
        .include_all(params.relations()?)
        .order_by(VillaNumberField::VillaNo, Direction::Asc);
    let numbers = VillaNumberRepo::get_all(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: numbers }))
}

/// GET /api/v1/villa-numbers/{no}
pub async fn get_by_no(
    State(state): State<AppState>,
    Path(villa_no): Path<DbId>,
    QueryParams(params): QueryParams<IncludeParams>,
) -> AppResult<Json<DataResponse<VillaNumber>>> {
    reject_sentinel(villa_no)?;
    let number = VillaNumberRepo::find_by_villa_no(&state.pool, villa_no, &params.relations()?)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VillaNumber",
            id: villa_no,
        }))?;
    Ok(Json(DataResponse { data: number }))
}

/// POST /api/v1/villa-numbers
///
/// The villa number is chosen by the caller and stored as given.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateVillaNumber>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<DataResponse<VillaNumber>>)> {
    reject_sentinel(input.villa_no)?;
    input.validate()?;

    if VillaNumberRepo::find_by_villa_no(&state.pool, input.villa_no, &[])
        .await?
        .is_some()
    {
        tracing::warn!(villa_no = input.villa_no, "Duplicate villa number");
        return Err(AppError::Core(CoreError::ConstraintViolation(
            "Villa number already exists".to_string(),
        )));
    }
    ensure_villa_exists(&state.pool, input.villa_id).await?;

    let number = VillaNumberRepo::create(&state.pool, &VillaNumber::from(input)).await?;
    tracing::info!(
        villa_no = number.villa_no,
        villa_id = number.villa_id,
        "Villa number created"
    );

    let location = format!("/api/v1/villa-numbers/{}", number.villa_no);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(DataResponse { data: number }),
    ))
}

/// PUT /api/v1/villa-numbers/{no}
pub async fn update(
    State(state): State<AppState>,
    Path(villa_no): Path<DbId>,
    ApiJson(input): ApiJson<UpdateVillaNumber>,
) -> AppResult<StatusCode> {
    reject_sentinel(villa_no)?;
    ensure_same_id(villa_no, input.villa_no)?;
    input.validate()?;
    ensure_villa_exists(&state.pool, input.villa_id).await?;

    VillaNumberRepo::update(&state.pool, &VillaNumber::from(input)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/villa-numbers/{no}
///
/// The parent check runs against the merged entity, between merge and
/// persist.
pub async fn patch(
    State(state): State<AppState>,
    Path(villa_no): Path<DbId>,
    ApiJson(doc): ApiJson<PatchDocument>,
) -> AppResult<StatusCode> {
    reject_sentinel(villa_no)?;
    let merged = PatchPipeline::<Loaded<VillaNumber>>::load(&state.pool, villa_no)
        .await?
        .merge(&doc)?;
    ensure_villa_exists(&state.pool, merged.entity().villa_id).await?;
    merged.persist(&state.pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/villa-numbers/{no}
pub async fn delete(
    State(state): State<AppState>,
    Path(villa_no): Path<DbId>,
) -> AppResult<StatusCode> {
    reject_sentinel(villa_no)?;
    let number = VillaNumberRepo::find_by_villa_no(&state.pool, villa_no, &[])
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VillaNumber",
            id: villa_no,
        }))?;
    VillaNumberRepo::remove(&state.pool, &number).await?;
    Ok(StatusCode::NO_CONTENT)
}
