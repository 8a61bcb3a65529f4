use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use foodie_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        MenuItems, Restaurants, Users,
        menu_items::{ActiveModel as MenuItemActive, Column as MenuCol},
        restaurants::{ActiveModel as RestaurantActive, Column as RestaurantCol},
        users::{ActiveModel as UserActive, Column as UserCol},
    },
    middleware::auth::issue_token,
    models::Role,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, 1).await?;
    run_migrations(&orm).await?;

    let users = [
        ("Admin", "admin@example.com", Role::Admin),
        ("Sam Staff", "staff@example.com", Role::Staff),
        ("Riley Rider", "rider@example.com", Role::Staff),
        ("Casey Customer", "customer@example.com", Role::Customer),
    ];
    for (name, email, role) in users {
        let id = ensure_user(&orm, name, email, role).await?;
        let token = issue_token(&config.jwt_secret, id, role, Duration::hours(24))?;
        println!("{role:<8} {email:<22} id={id}");
        println!("         Bearer {token}");
    }

    let restaurant_id = ensure_restaurant(&orm, "Ferris Kitchen").await?;
    seed_menu(&orm, restaurant_id).await?;

    println!("Seed completed. Restaurant ID: {restaurant_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        let mut active: UserActive = existing.into();
        active.role = Set(role);
        active.is_active = Set(true);
        let user = active.update(orm).await?;
        return Ok(user.id);
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(Some("555-0100".to_string())),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(user.id)
}

async fn ensure_restaurant(orm: &DatabaseConnection, name: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = Restaurants::find()
        .filter(RestaurantCol::Name.eq(name))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        image: Set(None),
        street: Set(Some("1 Crate Street".to_string())),
        city: Set(Some("Rustville".to_string())),
        phone: Set(Some("555-0199".to_string())),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(restaurant.id)
}

async fn seed_menu(orm: &DatabaseConnection, restaurant_id: Uuid) -> anyhow::Result<()> {
    let items = [
        ("Borrow Checker Burger", 1200),
        ("Lifetime Fries", 450),
        ("Async Iced Tea", 300),
    ];

    for (name, price) in items {
        let exists = MenuItems::find()
            .filter(MenuCol::RestaurantId.eq(restaurant_id))
            .filter(MenuCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        MenuItemActive {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(restaurant_id),
            name: Set(name.to_string()),
            price: Set(price),
            image: Set(None),
            is_available: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded menu");
    Ok(())
}
