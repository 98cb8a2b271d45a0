//! v1 API Data Transfer Objects.
//!
//! These types define the wire format for the v1 REST API. They are completely
//! separate from the internal domain models in `src/models/` and handle
//! serialization, deserialization, validation, and domain-model conversion.
//! Response types also deserialize so the API client can reuse them.

pub mod admin;
pub mod common;
pub mod conversations;
pub mod design_projects;
pub mod files;
pub mod memory_entries;
pub mod tasks;
pub mod usage;

// Re-export all public types for convenient access via `dto::*`.
pub use admin::*;
pub use common::DeletedResponse;
pub use conversations::*;
pub use design_projects::*;
pub use files::*;
pub use memory_entries::*;
pub use tasks::*;
pub use usage::*;
