// handlers/nursery.rs - /api/tree-nursery/* handlers (bearer token required)

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Json, Path, Query, State};

use super::AppState;
use crate::database::models::NurseryRecord;
use crate::error::ApiError;
use crate::filter::NurseryFilter;
use crate::ledger::{Deletion, NurseryWithHistory, RegisterRequest, Registration, UpdateRequest};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// POST /api/tree-nursery/register
///
/// Records new nursery stock. Responds 201 with the created nursery row, the
/// description with its new `quantity_nursery`, and the monitoring entry.
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Registration> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let record = request.validate(Some(user.user_id))?;

    let registration = state.ledger.register(record).await?;

    Ok(ApiResponse::created(registration).with_message("Tree nursery registered successfully"))
}

/// GET /api/tree-nursery?tree_desc_id=&village_id=&registration_date=
pub async fn view(
    State(state): State<AppState>,
    query: Result<Query<NurseryFilter>, QueryRejection>,
) -> ApiResult<Vec<NurseryWithHistory>> {
    let Query(filter) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let rows = state.ledger.view(&filter).await?;
    if rows.is_empty() {
        return Err(ApiError::not_found("No records found"));
    }

    Ok(ApiResponse::success(rows).with_message("Records retrieved successfully"))
}

/// GET /api/tree-nursery/:id
pub async fn view_one(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<NurseryWithHistory> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let row = state.ledger.view_one(id).await?;

    Ok(ApiResponse::success(row).with_message("Tree nursery record retrieved successfully"))
}

/// PUT /api/tree-nursery/:id (also /api/tree-nursery/update/:id)
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<NurseryRecord> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let changes = request.validate()?;

    let updated = state.ledger.update(id, changes).await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/tree-nursery/:id
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Deletion> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let deletion = state.ledger.delete(id).await?;

    Ok(ApiResponse::success(deletion)
        .with_message("Tree nursery record and related data deleted successfully"))
}
