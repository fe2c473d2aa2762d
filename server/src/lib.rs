//! EventHub auth gateway
//!
//! Bearer-token authentication and role gating shared by the college events
//! services, plus a small axum server that mounts them.

pub mod api;
mod app;
pub mod core;
