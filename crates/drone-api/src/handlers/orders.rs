//! Order resource handlers: create/list/get/update plus the ten
//! transitions of spec.md §4.5, each scoped to its actor via
//! `OrderService::read_scope`/the write-scope embedded in the service
//! itself.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use drone_auth::{RequireAdmin, RequireAnyRole, RequireDrone, RequireEnduser};
use drone_domain::{
    CreateOrderRequest, Order, OrderFilter, Page, Pagination, UpdateOrderLocationRequest,
    UpdateOrderRequest,
};
use drone_core::{CoreError, OrderService};
use uuid::Uuid;

use crate::dto::{PaginationQuery, ReassignRequest};
use crate::error::{validate, ApiError, ApiResult};
use crate::extract::CorrelationId;
use crate::state::AppState;

/// Merges the caller-supplied filter with their read scope: an admin's
/// query passes through untouched, everyone else has the scope fields
/// (`user_id`/`drone_id`/`delivered_by_drone_id`) overwritten so a
/// non-admin can't widen their own visibility by query string.
fn scoped_filter(actor: &drone_domain::Actor, mut filter: OrderFilter) -> OrderFilter {
    let scope = OrderService::read_scope(actor);
    if matches!(actor.role, drone_domain::Role::Admin) {
        return filter;
    }
    filter.user_id = scope.user_id;
    filter.drone_id = scope.drone_id;
    filter.delivered_by_drone_id = scope.delivered_by_drone_id;
    filter
}

pub async fn create(
    State(state): State<AppState>,
    RequireEnduser(actor): RequireEnduser,
    CorrelationId(correlation_id): CorrelationId,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    validate(&req)?;
    let order = state.orders.create(&actor, &correlation_id, &req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(state): State<AppState>,
    RequireAnyRole(actor): RequireAnyRole,
    Query(filter): Query<OrderFilter>,
    Query(page): Query<PaginationQuery>,
) -> ApiResult<Json<Page<Order>>> {
    let filter = scoped_filter(&actor, filter);
    let pagination = Pagination::new(page.limit, page.offset).map_err(|e| ApiError::from(CoreError::Domain(e)))?;
    let result = state.orders.list(&filter, pagination).await?;
    Ok(Json(result))
}

pub async fn get(
    State(state): State<AppState>,
    RequireAnyRole(actor): RequireAnyRole,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let filter = scoped_filter(&actor, OrderFilter::default());
    Ok(Json(state.orders.get(id, &filter).await?))
}

pub async fn current(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
) -> ApiResult<Json<Order>> {
    let drone_id = actor
        .drone_id
        .ok_or_else(|| ApiError::from(drone_core::CoreError::Domain(drone_domain::DomainError::user_not_found())))?;
    Ok(Json(state.orders.current_for_drone(drone_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(actor): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateOrderRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.update(&actor, id, patch).await?))
}

pub async fn withdraw(
    State(state): State<AppState>,
    RequireEnduser(actor): RequireEnduser,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.withdraw(&actor, &correlation_id, id).await?))
}

pub async fn reserve(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.reserve(&actor, &correlation_id, id).await?))
}

pub async fn confirm_pickup(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.confirm_pickup(&actor, &correlation_id, id).await?))
}

pub async fn start_transit(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.start_transit(&actor, &correlation_id, id).await?))
}

pub async fn confirm_arrived(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.confirm_arrived(&actor, &correlation_id, id).await?))
}

pub async fn confirm_delivery(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.confirm_delivery(&actor, &correlation_id, id).await?))
}

pub async fn delivery_failed(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.delivery_failed(&actor, &correlation_id, id).await?))
}

pub async fn handoff(
    State(state): State<AppState>,
    RequireAdmin(actor): RequireAdmin,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.handoff(&actor, &correlation_id, id).await?))
}

pub async fn reassign(
    State(state): State<AppState>,
    RequireAdmin(actor): RequireAdmin,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
    Json(req): Json<ReassignRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(
        state
            .orders
            .reassign(&actor, &correlation_id, id, req.new_drone_id)
            .await?,
    ))
}

pub async fn update_location(
    State(state): State<AppState>,
    RequireDrone(actor): RequireDrone,
    CorrelationId(correlation_id): CorrelationId,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderLocationRequest>,
) -> ApiResult<Json<Order>> {
    validate(&req)?;
    Ok(Json(
        state.orders.update_location(&actor, &correlation_id, id, &req).await?,
    ))
}
