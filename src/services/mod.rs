//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own mutation and persistence concerns so route handlers
//! can stay focused on protocol translation.

pub mod queue;
pub mod sync;
