//! Loading orders together with the records they reference, and the
//! guarded read-modify-write shared by every order mutation.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    entity::{
        MenuItems, OrderItems, Orders, Restaurants, Users,
        menu_items::{Column as MenuCol, Model as MenuItemModel},
        order_items::{Column as OrderItemCol, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        restaurants::{Column as RestaurantCol, Model as RestaurantModel},
        users::{Column as UserCol, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::{DeliveryAddress, OrderItemView, OrderView, RestaurantSummary, UserSummary},
    response::Meta,
    routes::params::{OrderListQuery, SortOrder},
};

pub(crate) async fn find_order<C: ConnectionTrait>(conn: &C, scope: Condition) -> AppResult<OrderModel> {
    Orders::find()
        .filter(scope)
        .one(conn)
        .await?
        .ok_or_else(AppError::order_not_found)
}

pub(crate) async fn list_orders<C: ConnectionTrait>(
    conn: &C,
    scope: Condition,
    query: &OrderListQuery,
) -> AppResult<(Vec<OrderView>, Meta)> {
    let mut condition = scope;
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(conn).await? as i64;

    let (orders, meta) = match query.pagination().window() {
        Some((page, limit, offset)) => {
            let orders = finder
                .limit(limit as u64)
                .offset(offset as u64)
                .all(conn)
                .await?;
            (orders, Meta::new(page, limit, total))
        }
        None => (finder.all(conn).await?, Meta::total(total)),
    };

    Ok((populate_orders(conn, orders).await?, meta))
}

/// Applies `changes` only if the row still has the status that was read,
/// so a concurrent writer cannot be silently overwritten.
pub(crate) async fn apply_guarded<C: ConnectionTrait>(
    conn: &C,
    current: &OrderModel,
    guard: Condition,
    mut changes: OrderActive,
) -> AppResult<OrderModel> {
    changes.updated_at = sea_orm::Set(Utc::now().into());

    let result = Orders::update_many()
        .set(changes)
        .filter(
            guard
                .add(OrderCol::Id.eq(current.id))
                .add(OrderCol::Status.eq(current.status)),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::InvalidTransition(
            "Order was modified concurrently".into(),
        ));
    }

    Orders::find_by_id(current.id)
        .one(conn)
        .await?
        .ok_or_else(AppError::order_not_found)
}

pub(crate) async fn populate_order<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderView> {
    populate_orders(conn, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("populated order missing")))
}

pub(crate) async fn populate_orders<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderView>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::OrderId)
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;

    let menu_ids: BTreeSet<Uuid> = items.iter().map(|i| i.menu_item_id).collect();
    let restaurant_ids: BTreeSet<Uuid> = orders.iter().map(|o| o.restaurant_id).collect();
    let user_ids: BTreeSet<Uuid> = orders
        .iter()
        .flat_map(|o| std::iter::once(o.customer_id).chain(o.assigned_staff_id))
        .collect();

    let menu: HashMap<Uuid, MenuItemModel> = if menu_ids.is_empty() {
        HashMap::new()
    } else {
        MenuItems::find()
            .filter(MenuCol::Id.is_in(menu_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect()
    };
    let restaurants: HashMap<Uuid, RestaurantModel> = Restaurants::find()
        .filter(RestaurantCol::Id.is_in(restaurant_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();
    let users: HashMap<Uuid, UserModel> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    for item in items {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let views = orders
        .into_iter()
        .map(|order| {
            let lines = items_by_order.remove(&order.id).unwrap_or_default();
            build_view(order, lines, &menu, &restaurants, &users)
        })
        .collect();
    Ok(views)
}

fn build_view(
    order: OrderModel,
    lines: Vec<OrderItemModel>,
    menu: &HashMap<Uuid, MenuItemModel>,
    restaurants: &HashMap<Uuid, RestaurantModel>,
    users: &HashMap<Uuid, UserModel>,
) -> OrderView {
    let items = lines
        .into_iter()
        .map(|line| {
            let catalog = menu.get(&line.menu_item_id);
            OrderItemView {
                menu_item_id: line.menu_item_id,
                name: catalog.map(|m| m.name.clone()),
                image: catalog.and_then(|m| m.image.clone()),
                quantity: line.quantity,
                price: line.price,
                line_total: line.price * i64::from(line.quantity),
            }
        })
        .collect();

    OrderView {
        id: order.id,
        customer_id: order.customer_id,
        restaurant_id: order.restaurant_id,
        assigned_staff_id: order.assigned_staff_id,
        customer: users.get(&order.customer_id).map(user_summary),
        restaurant: restaurants.get(&order.restaurant_id).map(restaurant_summary),
        assigned_staff: order
            .assigned_staff_id
            .and_then(|id| users.get(&id))
            .map(user_summary),
        items,
        subtotal: order.subtotal,
        delivery_fee: order.delivery_fee,
        total_amount: order.total_amount,
        delivery_address: DeliveryAddress {
            street: order.delivery_street,
            city: order.delivery_city,
            state: order.delivery_state,
            zip_code: order.delivery_zip_code,
        },
        status: order.status,
        payment_method: order.payment_method,
        notes: order.notes,
        created_at: order.created_at.with_timezone(&Utc),
        updated_at: order.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn user_summary(model: &UserModel) -> UserSummary {
    UserSummary {
        id: model.id,
        name: model.name.clone(),
        email: model.email.clone(),
        phone: model.phone.clone(),
    }
}

fn restaurant_summary(model: &RestaurantModel) -> RestaurantSummary {
    RestaurantSummary {
        id: model.id,
        name: model.name.clone(),
        image: model.image.clone(),
        street: model.street.clone(),
        city: model.city.clone(),
        phone: model.phone.clone(),
    }
}
