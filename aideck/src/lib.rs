//! Aideck: multi-tenant backend for an AI assistant platform.
//!
//! Users own conversations, design projects, memory entries, file records
//! and tasks. Everything is served as a JSON REST API under `/api/v1`
//! (see [`api::create_router`]) and persisted in libSQL.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
