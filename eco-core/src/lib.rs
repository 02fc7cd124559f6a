//! Core types and service wiring for the eco recycling-point client.

/// Account flows: login, registration, logout, and recycling reports.
pub mod account;
/// Channel for failures that were degraded to default results.
pub mod diagnostics;
/// Best-known-position lookup on top of the platform location port.
pub mod geolocation;
/// Domain models shared by all providers.
pub mod model;
/// Traits describing the provider interfaces.
pub mod ports;
/// Map view state: markers, route overlay, info window, and dialogs.
pub mod presentation;
/// Map orchestration: refresh and navigate.
pub mod service;
/// Session store implementations that live in the core.
pub mod session;

pub use account::*;
pub use diagnostics::*;
pub use geolocation::*;
pub use model::*;
pub use ports::*;
pub use presentation::*;
pub use service::*;
pub use session::*;
