//! Queue-number display service for a service counter.
//!
//! The server owns the shared queue record (current number, next number,
//! scrolling announcement). The public Display page and the staff Operator
//! page connect over WebSocket; every mutation is mirrored to durable
//! storage and pushed to every other connected view.

pub mod frame;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
