//! Drone resource handlers: admin-guarded CRUD/status-change plus the
//! drone-guarded heartbeat submission (spec.md §6.1, §4.4).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use drone_auth::{RequireAdmin, RequireDrone};
use drone_core::CoreError;
use drone_domain::{
    CreateDroneRequest, Drone, DroneFilter, DomainError, GeoFilter, Page, Pagination,
    ProcessHeartbeatRequest, UpdateDroneRequest,
};
use uuid::Uuid;

use crate::dto::{DroneListQuery, PaginationQuery, UpdateDroneStatusRequest};
use crate::error::{validate, ApiError, ApiResult};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(actor): RequireAdmin,
    Json(req): Json<CreateDroneRequest>,
) -> ApiResult<(StatusCode, Json<Drone>)> {
    validate(&req)?;
    let drone = state.drones.create(&req, actor.id).await?;
    Ok((StatusCode::CREATED, Json(drone)))
}

pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_actor): RequireAdmin,
    Query(filter): Query<DroneListQuery>,
    Query(page): Query<PaginationQuery>,
) -> ApiResult<Json<Page<Drone>>> {
    let geo = match (filter.center_lat, filter.center_lon, filter.radius_km) {
        (Some(center_lat), Some(center_lon), Some(radius_km)) => Some(GeoFilter {
            center_lat,
            center_lon,
            radius_km,
        }),
        _ => None,
    };
    let domain_filter = DroneFilter {
        status: filter.status,
        statuses: None,
        active: filter.active,
        user_id: filter.user_id,
        geo,
    };
    let pagination = Pagination::new(page.limit, page.offset).map_err(|e| ApiError::from(CoreError::Domain(e)))?;
    let result = state.drones.list(&domain_filter, pagination).await?;
    Ok(Json(result))
}

pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_actor): RequireAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Drone>> {
    Ok(Json(state.drones.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_actor): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateDroneRequest>,
) -> ApiResult<Json<Drone>> {
    Ok(Json(state.drones.update(id, patch).await?))
}

pub async fn change_status(
    State(state): State<AppState>,
    RequireAdmin(actor): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDroneStatusRequest>,
) -> ApiResult<Json<Drone>> {
    Ok(Json(state.drones.update_status(&actor, id, req.status).await?))
}

pub async fn heartbeat(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    Path(id): Path<Uuid>,
    Json(req): Json<ProcessHeartbeatRequest>,
) -> ApiResult<Json<Drone>> {
    if actor.drone_id != Some(id) {
        return Err(ApiError::from(CoreError::Domain(DomainError::access_denied())));
    }
    validate(&req)?;
    Ok(Json(state.drones.process_heartbeat(&actor, id, &req).await?))
}
