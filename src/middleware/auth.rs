use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::Users,
    error::{AppError, AppResult},
    models::Role,
    state::AppState,
};

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Every operation exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateOrder,
    ListOwnOrders,
    GetOwnOrder,
    CancelOwnOrder,
    ListAllOrders,
    GetAnyOrder,
    AssignOrder,
    ListStaff,
    ListAssignedOrders,
    GetAssignedOrder,
    UpdateOrderStatus,
    ListUsers,
    UpdateUserRole,
    ToggleUserStatus,
}

const CUSTOMER_OPERATIONS: &[Operation] = &[
    Operation::CreateOrder,
    Operation::ListOwnOrders,
    Operation::GetOwnOrder,
    Operation::CancelOwnOrder,
];

const STAFF_OPERATIONS: &[Operation] = &[
    Operation::ListAssignedOrders,
    Operation::GetAssignedOrder,
    Operation::UpdateOrderStatus,
];

const ADMIN_OPERATIONS: &[Operation] = &[
    Operation::ListAllOrders,
    Operation::GetAnyOrder,
    Operation::AssignOrder,
    Operation::ListStaff,
    Operation::ListUsers,
    Operation::UpdateUserRole,
    Operation::ToggleUserStatus,
];

impl Role {
    pub fn operations(self) -> &'static [Operation] {
        match self {
            Role::Customer => CUSTOMER_OPERATIONS,
            Role::Staff => STAFF_OPERATIONS,
            Role::Admin => ADMIN_OPERATIONS,
        }
    }

    pub fn permits(self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }
}

pub fn authorize(user: &AuthUser, operation: Operation) -> AppResult<()> {
    if !user.role.permits(operation) {
        tracing::debug!(user_id = %user.user_id, role = %user.role, ?operation, "operation denied");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn issue_token(secret: &str, user_id: Uuid, role: Role, ttl: Duration) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let exp = usize::try_from(expiration.timestamp())
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Token expiration out of range")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthenticated("Invalid or expired token".into()))?;
    Ok(decoded.claims)
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Missing Authorization header".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Invalid Authorization scheme".into()))?;
    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = decode_token(token, &state.config.jwt_secret)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthenticated("Invalid user id in token".into()))?;

        let user = Users::find_by_id(user_id).one(&state.orm).await?;
        let user = match user {
            Some(u) if u.is_active => u,
            _ => return Err(AppError::Unauthenticated("User not found or inactive".into())),
        };

        Ok(AuthUser {
            user_id: user.id,
            role: user.role,
        })
    }
}
