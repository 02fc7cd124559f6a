//! Traits describing provider capabilities and the shared error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::model::{
    Coordinate, Credentials, LocationFix, RecyclingPoint, RecyclingReport, Registration, Route,
};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Response body could not be decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] JsonError),
    /// Response was valid JSON but not the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Backend answered with a non-success HTTP status.
    #[error("Unexpected status: {0}")]
    Status(u16),
    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Source of recycling points.
pub trait RecyclingPort: Send + Sync {
    /// Fetch every recycling point the backend knows about.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request or decoding fails.
    async fn recycling_points(&self) -> Result<Vec<RecyclingPoint>, PortError>;
}

#[async_trait]
/// Walking directions between two coordinates.
pub trait RoutingPort: Send + Sync {
    /// Compute a route from `start` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the service is unreachable or its answer
    /// does not contain a usable geometry.
    async fn route(&self, start: Coordinate, destination: Coordinate) -> Result<Route, PortError>;
}

/// Platform location services.
pub trait LocationPort: Send + Sync {
    /// Whether the app holds the location permission.
    fn has_permission(&self) -> bool;

    /// Whether the GPS source is switched on.
    fn is_location_enabled(&self) -> bool;

    /// Last known fix of every enabled positioning source, in registration order.
    fn last_known_fixes(&self) -> Vec<LocationFix>;
}

#[async_trait]
/// Account endpoints of the backend. Every call returns the raw response body.
pub trait AccountPort: Send + Sync {
    /// Ask the backend for the current session status.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails.
    async fn status(&self) -> Result<String, PortError>;

    /// Check credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails.
    async fn login(&self, credentials: &Credentials) -> Result<String, PortError>;

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails.
    async fn register(&self, registration: &Registration) -> Result<String, PortError>;

    /// End the backend session.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails.
    async fn logout(&self) -> Result<String, PortError>;

    /// Report recycled material.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails.
    async fn submit_recycling(&self, report: &RecyclingReport) -> Result<String, PortError>;
}

/// Persisted login state.
pub trait SessionStore: Send + Sync {
    /// Whether a user is logged in.
    fn is_logged_in(&self) -> bool;

    /// Username of the logged in user.
    fn username(&self) -> Option<String>;

    /// Mark `username` as logged in.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Storage`] when the state cannot be persisted.
    fn save(&self, username: &str) -> Result<(), PortError>;

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Storage`] when the state cannot be persisted.
    fn clear(&self) -> Result<(), PortError>;
}
