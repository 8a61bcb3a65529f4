#![allow(dead_code)]

use chrono::{Duration, Utc};
use foodie_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::orders::{CreateOrderRequest, OrderItemInput},
    entity::{
        menu_items::ActiveModel as MenuItemActive, restaurants::ActiveModel as RestaurantActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::{AuthUser, issue_token},
    models::{DeliveryAddress, Role},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config(delivery_fee: i64) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        db_max_connections: 1,
        delivery_fee,
    }
}

/// A freshly migrated in-memory database. A single pooled connection keeps
/// every query on the same SQLite memory instance.
pub async fn setup_state() -> anyhow::Result<AppState> {
    setup_state_with_fee(0).await
}

pub async fn setup_state_with_fee(delivery_fee: i64) -> anyhow::Result<AppState> {
    let config = test_config(delivery_fee);
    let orm = create_orm_conn(&config.database_url, config.db_max_connections).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, config))
}

pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    create_user_with_status(state, role, email, true).await
}

pub async fn create_user_with_status(
    state: &AppState,
    role: Role,
    email: &str,
    is_active: bool,
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        phone: Set(None),
        role: Set(role),
        is_active: Set(is_active),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub fn bearer(user: &AuthUser) -> String {
    let token = issue_token(JWT_SECRET, user.user_id, user.role, Duration::hours(1))
        .expect("token");
    format!("Bearer {token}")
}

pub struct Catalog {
    pub restaurant_id: Uuid,
    /// Priced 10.
    pub burger_id: Uuid,
    /// Priced 5.
    pub fries_id: Uuid,
    /// On another restaurant's menu.
    pub foreign_item_id: Uuid,
}

pub async fn seed_catalog(state: &AppState) -> anyhow::Result<Catalog> {
    let restaurant_id = create_restaurant(state, "Ferris Kitchen").await?;
    let other_restaurant_id = create_restaurant(state, "Gopher Grill").await?;

    Ok(Catalog {
        restaurant_id,
        burger_id: create_menu_item(state, restaurant_id, "Burger", 10).await?,
        fries_id: create_menu_item(state, restaurant_id, "Fries", 5).await?,
        foreign_item_id: create_menu_item(state, other_restaurant_id, "Taco", 7).await?,
    })
}

async fn create_restaurant(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        image: Set(None),
        street: Set(Some("1 Crate Street".into())),
        city: Set(Some("Rustville".into())),
        phone: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(restaurant.id)
}

async fn create_menu_item(
    state: &AppState,
    restaurant_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(name.to_string()),
        price: Set(price),
        image: Set(None),
        is_available: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(item.id)
}

pub fn address() -> DeliveryAddress {
    DeliveryAddress {
        street: "42 Main Street".into(),
        city: "Springfield".into(),
        state: None,
        zip_code: Some("12345".into()),
    }
}

/// Two burgers at 10 and one fries at 5: total 25.
pub fn sample_order(catalog: &Catalog) -> CreateOrderRequest {
    CreateOrderRequest {
        restaurant_id: catalog.restaurant_id,
        items: vec![
            OrderItemInput {
                menu_item_id: catalog.burger_id,
                quantity: 2,
                price: 10,
            },
            OrderItemInput {
                menu_item_id: catalog.fries_id,
                quantity: 1,
                price: 5,
            },
        ],
        delivery_address: address(),
        notes: Some("Ring twice".into()),
    }
}
