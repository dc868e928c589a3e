//! Shared service helpers: the operator roster and telemetry wiring.

pub mod roster;
pub mod telemetry;

pub use roster::*;
pub use telemetry::*;
