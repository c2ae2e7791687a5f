//! HTTP handler functions for all API endpoints.

pub mod admin;
pub mod chat;
