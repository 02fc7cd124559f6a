//! Map orchestration: refresh recycling markers, navigate to a point.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::geolocation::{GeolocationProvider, LocationIssue};
use crate::model::{Coordinate, RecyclingPoint, Route};
use crate::ports::{RecyclingPort, RoutingPort};
use crate::presentation::MapPresentation;

#[derive(Debug, Clone, PartialEq)]
/// Result of a background map operation, delivered once to the UI loop.
pub enum MapEvent {
    /// Fresh recycling points; replaces every marker.
    Points(Vec<RecyclingPoint>),
    /// Route to draw; replaces the route overlay.
    Route(Route),
    /// Navigation stopped before asking for a route.
    LocationUnavailable(LocationIssue),
}

#[derive(Debug, Clone, PartialEq)]
/// Result of [`MapOrchestrator::navigate`].
pub enum NavigateOutcome {
    /// A drawable route, possibly the straight-line fallback.
    Route(Route),
    /// No position; the routing service was not called.
    Unavailable(LocationIssue),
}

impl From<NavigateOutcome> for MapEvent {
    fn from(outcome: NavigateOutcome) -> Self {
        match outcome {
            NavigateOutcome::Route(route) => MapEvent::Route(route),
            NavigateOutcome::Unavailable(issue) => MapEvent::LocationUnavailable(issue),
        }
    }
}

/// Composes recycling data, routing, and geolocation for the map screen.
pub struct MapOrchestrator {
    recycling: Arc<dyn RecyclingPort>,
    routing: Arc<dyn RoutingPort>,
    geolocation: Arc<GeolocationProvider>,
    diagnostics: Diagnostics,
}

impl MapOrchestrator {
    /// Create an orchestrator over the given ports.
    #[must_use]
    pub fn new(
        recycling: Arc<dyn RecyclingPort>,
        routing: Arc<dyn RoutingPort>,
        geolocation: Arc<GeolocationProvider>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            recycling,
            routing,
            geolocation,
            diagnostics,
        }
    }

    /// Channel carrying every failure this orchestrator degraded.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Geolocation used by [`Self::navigate`].
    #[must_use]
    pub fn geolocation(&self) -> &GeolocationProvider {
        &self.geolocation
    }

    /// Recycling points, or an empty list when fetching or decoding fails.
    pub async fn fetch_points(&self) -> Vec<RecyclingPoint> {
        match self.recycling.recycling_points().await {
            Ok(points) => {
                tracing::debug!(count = points.len(), "fetched recycling points");
                points
            }
            Err(err) => {
                tracing::warn!(error = %err, "recycling points unavailable, showing empty map");
                self.diagnostics
                    .publish(DiagnosticKind::RecyclingFetch, err.to_string());
                Vec::new()
            }
        }
    }

    /// Walking route, or the straight line when the service fails.
    pub async fn route_between(&self, start: Coordinate, destination: Coordinate) -> Route {
        let message = match self.routing.route(start, destination).await {
            Ok(route) if !route.is_empty() => return route,
            Ok(_) => "directions service returned an empty route".to_owned(),
            Err(err) => err.to_string(),
        };
        tracing::warn!(%start, %destination, error = %message, "using straight-line route");
        self.diagnostics
            .publish(DiagnosticKind::RouteFallback, message);
        Route::fallback(start, destination)
    }

    /// Fetch points for a refresh. Apply the result with [`MapPresentation::show_points`].
    pub async fn refresh(&self) -> MapEvent {
        MapEvent::Points(self.fetch_points().await)
    }

    /// Locate the user and compute a route to `destination`.
    pub async fn navigate(&self, destination: Coordinate) -> NavigateOutcome {
        match self.geolocation.locate() {
            Ok(start) => NavigateOutcome::Route(self.route_between(start, destination).await),
            Err(issue) => {
                tracing::info!(%issue, "cannot navigate without a position");
                self.diagnostics
                    .publish(DiagnosticKind::LocationUnavailable, issue.to_string());
                NavigateOutcome::Unavailable(issue)
            }
        }
    }

    /// Refresh and apply in one go, for callers that already own the view.
    pub async fn refresh_into(&self, map: &mut MapPresentation) {
        map.apply(self.refresh().await);
    }

    /// Navigate and apply in one go, for callers that already own the view.
    pub async fn navigate_into(&self, destination: Coordinate, map: &mut MapPresentation) {
        map.apply(self.navigate(destination).await.into());
    }

    /// Run a refresh on a background task and send the result to the UI loop.
    pub fn spawn_refresh(self: &Arc<Self>, events: UnboundedSender<MapEvent>) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let event = orchestrator.refresh().await;
            deliver(&events, event);
        })
    }

    /// Run a navigation on a background task and send the result to the UI loop.
    pub fn spawn_navigate(
        self: &Arc<Self>,
        destination: Coordinate,
        events: UnboundedSender<MapEvent>,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = orchestrator.navigate(destination).await;
            deliver(&events, outcome.into());
        })
    }
}

fn deliver(events: &UnboundedSender<MapEvent>, event: MapEvent) {
    if events.send(event).is_err() {
        tracing::debug!("map screen closed before the result arrived");
    }
}
