//! Request and response types for the HTTP API.
//!
//! - [`chat`]: session start, respond and transcript payloads
//! - [`admin`]: node and response editing payloads

pub mod admin;
pub mod chat;
