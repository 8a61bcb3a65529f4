use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Role, UserAccount};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<UserAccount>,
}
