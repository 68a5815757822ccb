//! Business logic services.

pub mod role;

pub use role::RoleService;
