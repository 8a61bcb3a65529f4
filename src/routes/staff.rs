use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, UpdateStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::OrderView,
    response::ApiResponse,
    routes::{
        extract::{ApiJson, ApiPath, ApiQuery},
        params::OrderListQuery,
    },
    services::staff_order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_assigned_orders))
        .route("/orders/{id}", get(get_order_details))
        .route("/orders/{id}/status", patch(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/staff/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders assigned to the caller", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_assigned_orders(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = staff_order_service::list_assigned_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/staff/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "An order assigned to the caller", body = ApiResponse<OrderView>),
        (status = 404, description = "Not found or not assigned to the caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn get_order_details(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = staff_order_service::get_order_details(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/staff/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<OrderView>),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Not found or not assigned to the caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = staff_order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
