use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::record_user_event,
    dto::users::{UpdateRoleRequest, UserList},
    entity::{
        Users,
        users::{ActiveModel as UserActive, Column as UserCol, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::{Role, UserAccount},
    response::{ApiResponse, Meta},
    routes::params::UserListQuery,
    state::AppState,
};

fn user_account(model: UserModel) -> UserAccount {
    UserAccount {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        role: model.role,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    authorize(user, Operation::ListUsers)?;

    let mut condition = Condition::all();
    if let Some(role) = query.role {
        condition = condition.add(UserCol::Role.eq(role));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(UserCol::IsActive.eq(is_active));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_asc(UserCol::Name)
        .order_by_asc(UserCol::Email);
    let total = finder.clone().count(&state.orm).await? as i64;

    let (users, meta) = match query.pagination().window() {
        Some((page, limit, offset)) => {
            let users = finder
                .limit(limit as u64)
                .offset(offset as u64)
                .all(&state.orm)
                .await?;
            (users, Meta::new(page, limit, total))
        }
        None => (finder.all(&state.orm).await?, Meta::total(total)),
    };

    let items = users.into_iter().map(user_account).collect();
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn update_user_role(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<UserAccount>> {
    authorize(admin, Operation::UpdateUserRole)?;
    if id == admin.user_id && payload.role != Role::Admin {
        return Err(AppError::Validation(
            "Admins cannot change their own role".into(),
        ));
    }

    let existing = find_user(state, id).await?;
    let previous = existing.role;

    let mut active: UserActive = existing.into();
    active.role = Set(payload.role);
    let updated = active.update(&state.orm).await?;

    tracing::info!(
        user_id = %updated.id,
        admin_id = %admin.user_id,
        from = %previous,
        to = %updated.role,
        "user role updated"
    );
    record_user_event(
        &state.orm,
        admin.user_id,
        "user_role_updated",
        serde_json::json!({
            "user_id": updated.id,
            "from": previous.as_str(),
            "to": updated.role.as_str(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "User role updated",
        user_account(updated),
        Some(Meta::empty()),
    ))
}

/// Flips `is_active`. A deactivated user's tokens stop authenticating on
/// their next request; orders already assigned to them stay assigned.
pub async fn toggle_user_status(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<UserAccount>> {
    authorize(admin, Operation::ToggleUserStatus)?;
    if id == admin.user_id {
        return Err(AppError::Validation(
            "Admins cannot deactivate themselves".into(),
        ));
    }

    let existing = find_user(state, id).await?;
    let is_active = !existing.is_active;

    let mut active: UserActive = existing.into();
    active.is_active = Set(is_active);
    let updated = active.update(&state.orm).await?;

    tracing::info!(user_id = %updated.id, admin_id = %admin.user_id, is_active, "user status toggled");
    record_user_event(
        &state.orm,
        admin.user_id,
        if is_active { "user_activated" } else { "user_deactivated" },
        serde_json::json!({ "user_id": updated.id }),
    )
    .await;

    let message = if is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    Ok(ApiResponse::success(
        message,
        user_account(updated),
        Some(Meta::empty()),
    ))
}
