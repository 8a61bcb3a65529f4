mod common;

use common::{create_user, create_user_with_status, sample_order, seed_catalog, setup_state};
use foodie_orders_api::{
    dto::{orders::AssignStaffRequest, users::UpdateRoleRequest},
    entity::{AuditLogs, audit_logs::Column as AuditCol},
    error::AppError,
    models::{OrderStatus, Role},
    routes::params::UserListQuery,
    services::{admin_order_service, admin_user_service, customer_order_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

#[tokio::test]
async fn list_users_filters_by_role_and_status() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, Role::Admin, "admin@example.com").await?;
    create_user(&state, Role::Customer, "casey@example.com").await?;
    create_user(&state, Role::Staff, "sam@example.com").await?;
    create_user_with_status(&state, Role::Staff, "retired@example.com", false).await?;

    let everyone = admin_user_service::list_users(&state, &admin, UserListQuery::default()).await?;
    assert_eq!(everyone.meta.as_ref().and_then(|m| m.total), Some(4));

    let staff = admin_user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            role: Some(Role::Staff),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("users");
    let emails: Vec<&str> = staff.items.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails, vec!["retired@example.com", "sam@example.com"]);

    let inactive = admin_user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("users");
    assert_eq!(inactive.items.len(), 1);
    assert!(!inactive.items[0].is_active);
    assert_eq!(inactive.items[0].role, Role::Staff);

    let page = admin_user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            page: Some(2),
            per_page: Some(3),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(page.data.expect("users").items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn only_admins_manage_users() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let staff = create_user(&state, Role::Staff, "sam@example.com").await?;
    let customer = create_user(&state, Role::Customer, "casey@example.com").await?;

    let list = admin_user_service::list_users(&state, &staff, UserListQuery::default()).await;
    assert!(matches!(list, Err(AppError::Forbidden)));

    let promote = admin_user_service::update_user_role(
        &state,
        &customer,
        customer.user_id,
        UpdateRoleRequest { role: Role::Admin },
    )
    .await;
    assert!(matches!(promote, Err(AppError::Forbidden)));

    let toggle = admin_user_service::toggle_user_status(&state, &staff, customer.user_id).await;
    assert!(matches!(toggle, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn promoted_customer_joins_the_staff_roster() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, Role::Admin, "admin@example.com").await?;
    let customer = create_user(&state, Role::Customer, "casey@example.com").await?;
    let newcomer = create_user(&state, Role::Customer, "jordan@example.com").await?;
    let catalog = seed_catalog(&state).await?;

    let updated = admin_user_service::update_user_role(
        &state,
        &admin,
        newcomer.user_id,
        UpdateRoleRequest { role: Role::Staff },
    )
    .await?;
    assert_eq!(updated.message, "User role updated");
    assert_eq!(updated.data.expect("user").role, Role::Staff);

    let roster = admin_order_service::list_staff(&state, &admin)
        .await?
        .data
        .expect("staff");
    assert_eq!(roster.items.len(), 1);
    assert_eq!(roster.items[0].id, newcomer.user_id);

    let order = customer_order_service::create_order(&state, &customer, sample_order(&catalog))
        .await?
        .data
        .expect("order");
    let assigned = admin_order_service::assign_order_to_staff(
        &state,
        &admin,
        order.id,
        AssignStaffRequest {
            staff_id: newcomer.user_id,
        },
    )
    .await?
    .data
    .expect("assigned");
    assert_eq!(assigned.status, OrderStatus::Confirmed);

    let audit_entries = AuditLogs::find()
        .filter(AuditCol::Action.eq("user_role_updated"))
        .filter(AuditCol::Resource.eq("users"))
        .count(&state.orm)
        .await?;
    assert_eq!(audit_entries, 1);
    Ok(())
}

#[tokio::test]
async fn role_update_rejects_unknown_users_and_self_demotion() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, Role::Admin, "admin@example.com").await?;

    let missing = admin_user_service::update_user_role(
        &state,
        &admin,
        Uuid::new_v4(),
        UpdateRoleRequest { role: Role::Staff },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let demote_self = admin_user_service::update_user_role(
        &state,
        &admin,
        admin.user_id,
        UpdateRoleRequest { role: Role::Customer },
    )
    .await;
    assert!(matches!(demote_self, Err(AppError::Validation(_))));

    let deactivate_self = admin_user_service::toggle_user_status(&state, &admin, admin.user_id).await;
    assert!(matches!(deactivate_self, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn deactivated_staff_leaves_roster_and_cannot_be_assigned() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, Role::Admin, "admin@example.com").await?;
    let customer = create_user(&state, Role::Customer, "casey@example.com").await?;
    let staff = create_user(&state, Role::Staff, "sam@example.com").await?;
    let catalog = seed_catalog(&state).await?;

    let off = admin_user_service::toggle_user_status(&state, &admin, staff.user_id).await?;
    assert_eq!(off.message, "User deactivated successfully");
    assert!(!off.data.expect("user").is_active);

    let roster = admin_order_service::list_staff(&state, &admin)
        .await?
        .data
        .expect("staff");
    assert!(roster.items.is_empty());

    let order = customer_order_service::create_order(&state, &customer, sample_order(&catalog))
        .await?
        .data
        .expect("order");
    let assign = admin_order_service::assign_order_to_staff(
        &state,
        &admin,
        order.id,
        AssignStaffRequest {
            staff_id: staff.user_id,
        },
    )
    .await;
    assert!(matches!(assign, Err(AppError::Validation(_))));

    let on = admin_user_service::toggle_user_status(&state, &admin, staff.user_id).await?;
    assert_eq!(on.message, "User activated successfully");
    assert!(on.data.expect("user").is_active);

    let missing = admin_user_service::toggle_user_status(&state, &admin, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}
