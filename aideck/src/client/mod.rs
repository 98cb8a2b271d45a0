//! HTTP client for the v1 API, as used by front ends and scripts.

mod api;
mod session;

#[cfg(test)]
mod tests;

pub use api::{ApiClient, ClientError, ClientResult};
pub use session::Session;
