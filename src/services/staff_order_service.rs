use sea_orm::{ColumnTrait, Condition, Set};
use uuid::Uuid;

use crate::{
    audit::record_order_event,
    dto::orders::{OrderList, UpdateStatusRequest},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol},
    error::AppResult,
    middleware::auth::{AuthUser, Operation, authorize},
    models::OrderView,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_view::{apply_guarded, find_order, list_orders, populate_order},
    state::AppState,
};

fn assigned_to(user: &AuthUser) -> Condition {
    Condition::all().add(OrderCol::AssignedStaffId.eq(user.user_id))
}

pub async fn list_assigned_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Operation::ListAssignedOrders)?;
    let (items, meta) = list_orders(&state.orm, assigned_to(user), &query).await?;
    Ok(ApiResponse::success("Assigned orders", OrderList { items }, Some(meta)))
}

pub async fn get_order_details(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    authorize(user, Operation::GetAssignedOrder)?;
    let order = find_order(&state.orm, assigned_to(user).add(OrderCol::Id.eq(id))).await?;
    let view = populate_order(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateStatusRequest,
) -> AppResult<ApiResponse<OrderView>> {
    authorize(user, Operation::UpdateOrderStatus)?;
    let order = find_order(&state.orm, assigned_to(user).add(OrderCol::Id.eq(id))).await?;

    let previous = order.status;
    previous.ensure_staff_transition(payload.status)?;

    let changes = OrderActive {
        status: Set(payload.status),
        ..Default::default()
    };
    // Also guards against the order being reassigned in the meantime.
    let order = apply_guarded(&state.orm, &order, assigned_to(user), changes).await?;

    tracing::info!(
        order_id = %order.id,
        staff_id = %user.user_id,
        from = %previous,
        to = %order.status,
        "order status updated"
    );
    record_order_event(
        &state.orm,
        user.user_id,
        "order_status_updated",
        serde_json::json!({
            "order_id": order.id,
            "from": previous.as_str(),
            "to": order.status.as_str(),
        }),
    )
    .await;

    let view = populate_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order updated", view, Some(Meta::empty())))
}
