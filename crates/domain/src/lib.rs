//! Domain-level building blocks for the photo-rating admin core: shared
//! records and report types, the storage trait seams implemented by the
//! `ratedesk_storage` crate, environment-driven configuration, and the
//! telemetry/authorization services injected into operator tooling.

pub mod config;
pub mod model;
pub mod services;
pub mod storage;

pub use model::*;
pub use storage::*;
