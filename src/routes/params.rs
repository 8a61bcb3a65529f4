use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::{OrderStatus, Role};

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        // A huge page saturates to an empty window.
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }

    /// `None` when the caller asked for neither a page nor a page size,
    /// meaning the whole list.
    pub fn window(&self) -> Option<(i64, i64, i64)> {
        if self.page.is_none() && self.per_page.is_none() {
            return None;
        }
        Some(self.normalize())
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

// Fields are listed inline: `serde(flatten)` breaks numeric parsing of
// query strings.
#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    /// Page number, starting at 1.
    pub page: Option<i64>,
    /// Items per page, 1..=100 (default 20 when `page` is given).
    pub per_page: Option<i64>,
    /// Only return orders with this status.
    pub status: Option<OrderStatus>,
    /// `desc` (newest first, default) or `asc`.
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Only return users with this role.
    pub role: Option<Role>,
    /// Only return active (`true`) or deactivated (`false`) users.
    pub is_active: Option<bool>,
}

impl UserListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
