pub mod admin;
pub mod conversations;
pub mod design_projects;
pub mod files;
pub(crate) mod health;
pub mod memory_entries;
pub mod tasks;
pub mod usage;

pub use health::health_check;

use crate::error::AideckError;

/// Fresh 21-character record id.
pub(crate) fn new_id() -> String {
    nanoid::nanoid!()
}

pub(crate) fn not_found(what: &str, id: &str) -> AideckError {
    AideckError::NotFound(format!("{what} {id} not found"))
}
