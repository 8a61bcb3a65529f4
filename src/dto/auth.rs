use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT payload. `sub` is the user id; `role` is informational, the stored
/// role on the user row is authoritative.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
