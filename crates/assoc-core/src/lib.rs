//! # assoc-core
//!
//! Core types, traits, and the permission model for assoc-console.
//!
//! This crate provides the domain models mirrored from the association
//! backend, the [`ConsoleApi`] and [`TokenStore`] boundaries, and the
//! [`PermissionResolver`] that gates every view on `can(action, resource)`.

pub mod catalog;
pub mod defaults;
pub mod error;
pub mod models;
pub mod permissions;
pub mod traits;

// In-memory backend for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types at crate root
pub use catalog::{NotificationType, TypeInfo};
pub use error::{Error, Result};
pub use models::*;
pub use permissions::{
    Action, CapabilityMatrix, PermissionResolver, PermissionTable, Resource, Role,
    SessionPermissions,
};
pub use traits::*;
