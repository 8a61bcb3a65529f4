use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lifecycle of an order.
///
/// The forward pipeline is `pending -> confirmed -> preparing ->
/// out_for_delivery -> delivered`; `cancelled` is only reachable from
/// `pending`. `delivered` and `cancelled` are terminal.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "preparing")]
    Preparing,
    #[sea_orm(string_value = "out_for_delivery")]
    #[serde(alias = "on_the_way")]
    OutForDelivery,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Order is already {0}")]
    Terminal(OrderStatus),

    #[error("Cannot cancel order that is already being processed")]
    NotCancellable,

    #[error("Cannot assign order with status {0}")]
    NotAssignable(OrderStatus),

    #[error("Staff cannot set order status to {0}")]
    NotStaffSettable(OrderStatus),

    #[error("Cannot move order from {from} to {to}")]
    Backward { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position in the forward pipeline; `None` for `cancelled`.
    fn stage(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::OutForDelivery => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn is_staff_settable(self) -> bool {
        matches!(
            self,
            OrderStatus::Preparing | OrderStatus::OutForDelivery | OrderStatus::Delivered
        )
    }

    pub fn ensure_cancellable(self) -> Result<(), TransitionError> {
        match self {
            OrderStatus::Pending => Ok(()),
            _ => Err(TransitionError::NotCancellable),
        }
    }

    /// Reassigning a confirmed order is allowed and keeps it confirmed.
    pub fn ensure_assignable(self) -> Result<(), TransitionError> {
        match self {
            OrderStatus::Pending | OrderStatus::Confirmed => Ok(()),
            other => Err(TransitionError::NotAssignable(other)),
        }
    }

    /// Staff may only move an order forward, skipping stages if needed.
    pub fn ensure_staff_transition(self, next: OrderStatus) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        if !next.is_staff_settable() {
            return Err(TransitionError::NotStaffSettable(next));
        }
        match (self.stage(), next.stage()) {
            (Some(from), Some(to)) if to > from => Ok(()),
            _ => Err(TransitionError::Backward {
                from: self,
                to: next,
            }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    #[sea_orm(string_value = "cash_on_delivery")]
    CashOnDelivery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A user as seen by administrators.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RestaurantSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemView {
    pub menu_item_id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
    pub quantity: i32,
    pub price: i64,
    pub line_total: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub assigned_staff_id: Option<Uuid>,
    pub customer: Option<UserSummary>,
    pub restaurant: Option<RestaurantSummary>,
    pub assigned_staff: Option<UserSummary>,
    pub items: Vec<OrderItemView>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    pub delivery_address: DeliveryAddress,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_orders_can_be_cancelled() {
        assert!(OrderStatus::Pending.ensure_cancellable().is_ok());
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(
                status.ensure_cancellable(),
                Err(TransitionError::NotCancellable)
            );
        }
    }

    #[test]
    fn assignment_is_limited_to_pending_and_confirmed() {
        assert!(OrderStatus::Pending.ensure_assignable().is_ok());
        assert!(OrderStatus::Confirmed.ensure_assignable().is_ok());
        assert_eq!(
            OrderStatus::Preparing.ensure_assignable(),
            Err(TransitionError::NotAssignable(OrderStatus::Preparing))
        );
        assert!(OrderStatus::Cancelled.ensure_assignable().is_err());
    }

    #[test]
    fn staff_moves_forward_and_may_skip() {
        assert!(
            OrderStatus::Confirmed
                .ensure_staff_transition(OrderStatus::Preparing)
                .is_ok()
        );
        assert!(
            OrderStatus::Confirmed
                .ensure_staff_transition(OrderStatus::Delivered)
                .is_ok()
        );
        assert!(
            OrderStatus::Preparing
                .ensure_staff_transition(OrderStatus::OutForDelivery)
                .is_ok()
        );
    }

    #[test]
    fn staff_cannot_go_backward_or_repeat() {
        assert_eq!(
            OrderStatus::OutForDelivery.ensure_staff_transition(OrderStatus::Preparing),
            Err(TransitionError::Backward {
                from: OrderStatus::OutForDelivery,
                to: OrderStatus::Preparing,
            })
        );
        assert!(
            OrderStatus::Preparing
                .ensure_staff_transition(OrderStatus::Preparing)
                .is_err()
        );
    }

    #[test]
    fn staff_cannot_touch_terminal_orders_or_set_admin_statuses() {
        assert_eq!(
            OrderStatus::Delivered.ensure_staff_transition(OrderStatus::Delivered),
            Err(TransitionError::Terminal(OrderStatus::Delivered))
        );
        assert_eq!(
            OrderStatus::Cancelled.ensure_staff_transition(OrderStatus::Preparing),
            Err(TransitionError::Terminal(OrderStatus::Cancelled))
        );
        assert_eq!(
            OrderStatus::Confirmed.ensure_staff_transition(OrderStatus::Cancelled),
            Err(TransitionError::NotStaffSettable(OrderStatus::Cancelled))
        );
        assert_eq!(
            OrderStatus::Pending.ensure_staff_transition(OrderStatus::Confirmed),
            Err(TransitionError::NotStaffSettable(OrderStatus::Confirmed))
        );
    }

    #[test]
    fn on_the_way_is_read_as_out_for_delivery() {
        let status: OrderStatus = serde_json::from_str("\"on_the_way\"").unwrap();
        assert_eq!(status, OrderStatus::OutForDelivery);
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            "\"out_for_delivery\""
        );
    }

    #[test]
    fn role_serializes_in_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), "\"staff\"");
        assert_eq!(format!("{:<8}|", Role::Admin), "admin   |");
    }
}
