//! Handlers for the `/villas` resource.

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{header, StatusCode};
use axum::Json;
use validator::Validate;
use villa_core::error::CoreError;
use villa_core::patch::PatchDocument;
use villa_core::predicate::Direction;
use villa_core::types::DbId;
use villa_db::models::villa::{CreateVilla, UpdateVilla, Villa, VillaField};
use villa_db::query::Query;
use villa_db::repositories::VillaRepo;

use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::handlers::{ensure_same_id, reject_sentinel};
use crate::query::IncludeParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/villas
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<IncludeParams>,
) -> AppResult<Json<DataResponse<Vec<Villa>>>> {
    let query = Query::<Villa>::all()
        .include_all(params.relations()?)
        .order_by(VillaField::Id, Direction::Asc);
    let villas = VillaRepo::get_all(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: villas }))
}

/// GET /api/v1/villas/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    QueryParams(params): QueryParams<IncludeParams>,
) -> AppResult<Json<DataResponse<Villa>>> {
    reject_sentinel(id)?;
    let villa = VillaRepo::find_by_id(&state.pool, id, &params.relations()?)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Villa",
            id,
        }))?;
    Ok(Json(DataResponse { data: villa }))
}

/// POST /api/v1/villas
///
/// Villa ids are generated by the store, so any id in the body is rejected.
/// The name check is case-insensitive; the unique index on `LOWER(name)`
/// backs it up for concurrent creates.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateVilla>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<DataResponse<Villa>>)> {
    if let Some(id) = input.id {
        reject_sentinel(id)?;
        return Err(AppError::BadRequest(
            "villa id is assigned by the server".to_string(),
        ));
    }
    input.validate()?;

    if VillaRepo::find_by_name(&state.pool, &input.name)
        .await?
        .is_some()
    {
        tracing::warn!(name = %input.name, "Duplicate villa name");
        return Err(AppError::Core(CoreError::ConstraintViolation(
            "Villa already exists".to_string(),
        )));
    }

    let villa = VillaRepo::create(&state.pool, &Villa::from(input)).await?;
    tracing::info!(id = villa.id, name = %villa.name, "Villa created");

    let location = format!("/api/v1/villas/{}", villa.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(DataResponse { data: villa }),
    ))
}

/// PUT /api/v1/villas/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ApiJson(input): ApiJson<UpdateVilla>,
) -> AppResult<StatusCode> {
    reject_sentinel(id)?;
    ensure_same_id(id, input.id)?;
    input.validate()?;

    VillaRepo::update(&state.pool, &Villa::from(input)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/villas/{id}
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ApiJson(doc): ApiJson<PatchDocument>,
) -> AppResult<StatusCode> {
    reject_sentinel(id)?;
    villa_db::patch::apply::<Villa>(&state.pool, id, &doc).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/villas/{id}
///
/// Removing a villa cascades to its villa numbers.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    reject_sentinel(id)?;
    let villa = VillaRepo::find_by_id(&state.pool, id, &[])
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Villa",
            id,
        }))?;
    VillaRepo::remove(&state.pool, &villa).await?;
    Ok(StatusCode::NO_CONTENT)
}
