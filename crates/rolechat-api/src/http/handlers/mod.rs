//! REST API handlers grouped by resource.

pub mod message;
pub mod role;

use rolechat_types::error::RoleError;
use rolechat_types::role::RoleId;

use crate::http::error::AppError;

/// Parse a `{roleId}` path segment. A malformed id names no role.
pub(crate) fn parse_role_id(raw: &str) -> Result<RoleId, AppError> {
    raw.parse::<RoleId>()
        .map_err(|_| AppError::Role(RoleError::NotFound))
}
