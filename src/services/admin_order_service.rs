use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::record_order_event,
    dto::orders::{AssignStaffRequest, OrderList, StaffList},
    entity::{
        Users,
        orders::{ActiveModel as OrderActive, Column as OrderCol},
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::{OrderStatus, OrderView, Role},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_view::{apply_guarded, find_order, list_orders, populate_order, user_summary},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Operation::ListAllOrders)?;
    let (items, meta) = list_orders(&state.orm, Condition::all(), &query).await?;
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    authorize(user, Operation::GetAnyOrder)?;
    let order = find_order(&state.orm, Condition::all().add(OrderCol::Id.eq(id))).await?;
    let view = populate_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", view, Some(Meta::empty())))
}

pub async fn assign_order_to_staff(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AssignStaffRequest,
) -> AppResult<ApiResponse<OrderView>> {
    authorize(user, Operation::AssignOrder)?;
    let order = find_order(&state.orm, Condition::all().add(OrderCol::Id.eq(id))).await?;

    let staff = Users::find_by_id(payload.staff_id).one(&state.orm).await?;
    if !staff.is_some_and(|s| s.role == Role::Staff && s.is_active) {
        return Err(AppError::Validation(
            "Staff member not found or inactive".into(),
        ));
    }

    order.status.ensure_assignable()?;

    let changes = OrderActive {
        assigned_staff_id: Set(Some(payload.staff_id)),
        status: Set(OrderStatus::Confirmed),
        ..Default::default()
    };
    let order = apply_guarded(&state.orm, &order, Condition::all(), changes).await?;

    tracing::info!(
        order_id = %order.id,
        staff_id = %payload.staff_id,
        admin_id = %user.user_id,
        "order assigned"
    );
    record_order_event(
        &state.orm,
        user.user_id,
        "order_assigned",
        serde_json::json!({ "order_id": order.id, "staff_id": payload.staff_id }),
    )
    .await;

    let view = populate_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order assigned", view, Some(Meta::empty())))
}

pub async fn list_staff(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<StaffList>> {
    authorize(user, Operation::ListStaff)?;
    let items: Vec<_> = Users::find()
        .filter(UserCol::Role.eq(Role::Staff))
        .filter(UserCol::IsActive.eq(true))
        .order_by_asc(UserCol::Name)
        .all(&state.orm)
        .await?
        .iter()
        .map(user_summary)
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Staff", StaffList { items }, Some(meta)))
}
