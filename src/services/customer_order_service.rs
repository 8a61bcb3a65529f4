use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record_order_event,
    dto::orders::{CreateOrderRequest, OrderItemInput, OrderList},
    entity::{
        MenuItems, Restaurants,
        menu_items::{Column as MenuCol, Model as MenuItemModel},
        order_items::ActiveModel as OrderItemActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::{DeliveryAddress, OrderStatus, OrderView, PaymentMethod},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_view::{apply_guarded, find_order, list_orders, populate_order},
    state::AppState,
};

fn owned_by(user: &AuthUser) -> Condition {
    Condition::all().add(OrderCol::CustomerId.eq(user.user_id))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    authorize(user, Operation::CreateOrder)?;

    let CreateOrderRequest {
        restaurant_id,
        items,
        delivery_address,
        notes,
    } = payload;

    let subtotal = order_subtotal(&items)?;
    let delivery_fee = state.config.delivery_fee;
    let total_amount = subtotal
        .checked_add(delivery_fee)
        .ok_or_else(|| AppError::Validation("Order total is too large".into()))?;
    let address = normalize_address(delivery_address)?;
    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    check_catalog(state, restaurant_id, &items).await?;

    let now = Utc::now();
    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        restaurant_id: Set(restaurant_id),
        assigned_staff_id: Set(None),
        subtotal: Set(subtotal),
        delivery_fee: Set(delivery_fee),
        total_amount: Set(total_amount),
        delivery_street: Set(address.street),
        delivery_city: Set(address.city),
        delivery_state: Set(address.state),
        delivery_zip_code: Set(address.zip_code),
        status: Set(OrderStatus::Pending),
        payment_method: Set(PaymentMethod::CashOnDelivery),
        notes: Set(notes),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for (position, item) in items.iter().enumerate() {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menu_item_id: Set(item.menu_item_id),
            position: Set(position as i32),
            quantity: Set(item.quantity),
            price: Set(item.price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        customer_id = %user.user_id,
        total_amount,
        "order created"
    );
    record_order_event(
        &state.orm,
        user.user_id,
        "order_created",
        serde_json::json!({ "order_id": order.id, "total_amount": total_amount }),
    )
    .await;

    let view = populate_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order created", view, Some(Meta::empty())))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Operation::ListOwnOrders)?;
    let (items, meta) = list_orders(&state.orm, owned_by(user), &query).await?;
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    authorize(user, Operation::GetOwnOrder)?;
    // Someone else's order is reported as missing, not forbidden.
    let order = find_order(&state.orm, owned_by(user).add(OrderCol::Id.eq(id))).await?;
    let view = populate_order(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    authorize(user, Operation::CancelOwnOrder)?;
    let order = find_order(&state.orm, owned_by(user).add(OrderCol::Id.eq(id))).await?;
    order.status.ensure_cancellable()?;

    let changes = OrderActive {
        status: Set(OrderStatus::Cancelled),
        ..Default::default()
    };
    let order = apply_guarded(&state.orm, &order, owned_by(user), changes).await?;

    tracing::info!(order_id = %order.id, customer_id = %user.user_id, "order cancelled");
    record_order_event(
        &state.orm,
        user.user_id,
        "order_cancelled",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    let view = populate_order(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Order cancelled successfully",
        view,
        Some(Meta::empty()),
    ))
}

/// Sum of `quantity * price` over the submitted lines.
pub fn order_subtotal(items: &[OrderItemInput]) -> AppResult<i64> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "Order must contain at least one item".into(),
        ));
    }

    let mut subtotal: i64 = 0;
    for item in items {
        if item.quantity < 1 {
            return Err(AppError::Validation(
                "Item quantity must be at least 1".into(),
            ));
        }
        if item.price < 0 {
            return Err(AppError::Validation(
                "Item price must not be negative".into(),
            ));
        }
        subtotal = item
            .price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| subtotal.checked_add(line))
            .ok_or_else(|| AppError::Validation("Order total is too large".into()))?;
    }
    Ok(subtotal)
}

fn normalize_address(address: DeliveryAddress) -> AppResult<DeliveryAddress> {
    let street = address.street.trim().to_string();
    let city = address.city.trim().to_string();
    if street.is_empty() || city.is_empty() {
        return Err(AppError::Validation(
            "Delivery street and city are required".into(),
        ));
    }
    let optional = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    Ok(DeliveryAddress {
        street,
        city,
        state: optional(address.state),
        zip_code: optional(address.zip_code),
    })
}

/// The restaurant must be open and every line must be an available item
/// on its menu.
async fn check_catalog(
    state: &AppState,
    restaurant_id: Uuid,
    items: &[OrderItemInput],
) -> AppResult<()> {
    let restaurant = Restaurants::find_by_id(restaurant_id).one(&state.orm).await?;
    if !restaurant.is_some_and(|r| r.is_active) {
        return Err(AppError::Validation(
            "Restaurant not found or inactive".into(),
        ));
    }

    let ids: BTreeSet<Uuid> = items.iter().map(|i| i.menu_item_id).collect();
    let menu: HashMap<Uuid, MenuItemModel> = MenuItems::find()
        .filter(MenuCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    for item in items {
        match menu.get(&item.menu_item_id) {
            Some(m) if m.restaurant_id == restaurant_id && m.is_available => {}
            _ => {
                return Err(AppError::Validation(format!(
                    "Menu item {} is not available from this restaurant",
                    item.menu_item_id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            menu_item_id: Uuid::new_v4(),
            quantity,
            price,
        }
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let total = order_subtotal(&[line(10, 2), line(5, 1)]).unwrap();
        assert_eq!(total, 25);
    }

    #[test]
    fn subtotal_rejects_empty_orders() {
        assert!(matches!(order_subtotal(&[]), Err(AppError::Validation(_))));
    }

    #[test]
    fn subtotal_rejects_zero_quantity_and_negative_price() {
        assert!(matches!(
            order_subtotal(&[line(10, 1), line(5, 0)]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            order_subtotal(&[line(-1, 1)]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn subtotal_reports_overflow_as_validation() {
        assert!(matches!(
            order_subtotal(&[line(i64::MAX, 2)]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn address_is_trimmed_and_blank_optionals_dropped() {
        let address = normalize_address(DeliveryAddress {
            street: "  1 Main St ".into(),
            city: "Springfield".into(),
            state: Some("  ".into()),
            zip_code: Some(" 12345 ".into()),
        })
        .unwrap();
        assert_eq!(address.street, "1 Main St");
        assert_eq!(address.state, None);
        assert_eq!(address.zip_code.as_deref(), Some("12345"));
    }

    #[test]
    fn address_requires_street_and_city() {
        let result = normalize_address(DeliveryAddress {
            street: "1 Main St".into(),
            city: " ".into(),
            state: None,
            zip_code: None,
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
