//! Map view state owned by the UI loop.
//!
//! Nothing in here is synchronized. The front end keeps one [`MapPresentation`]
//! on its event loop and folds results from background tasks into it with
//! [`MapPresentation::apply`].

use crate::geolocation::LocationIssue;
use crate::model::{Coordinate, RecyclingPoint, Route};
use crate::service::MapEvent;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Action attached to a marker, reachable from its info window.
pub enum MarkerAction {
    /// Request a walking route to this position.
    NavigateTo(Coordinate),
}

#[derive(Debug, Clone, PartialEq)]
/// Pin on the map bound to one recycling point.
pub struct Marker {
    /// Where the pin is drawn.
    pub position: Coordinate,
    /// Address of the point.
    pub label: String,
    /// Action behind the info window button.
    pub action: MarkerAction,
}

impl Marker {
    /// Marker for a point, or `None` when the point lacks a coordinate.
    #[must_use]
    pub fn for_point(point: &RecyclingPoint) -> Option<Self> {
        let position = point.coordinate()?;
        Some(Self {
            position,
            label: point.address.clone(),
            action: MarkerAction::NavigateTo(position),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Modal message with a single "OK" dismissal.
pub struct Dialog {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Dialog {
    /// Dialog explaining a failed location precondition.
    ///
    /// [`LocationIssue::NoFix`] has no dialog: both preconditions hold and the
    /// user has nothing to fix.
    #[must_use]
    pub fn for_location_issue(issue: LocationIssue) -> Option<Self> {
        let (title, message) = match issue {
            LocationIssue::GpsDisabled => (
                "GPS not enabled",
                "GPS must be switched on so the path can be traced.",
            ),
            LocationIssue::PermissionMissing => (
                "Missing permission",
                "The location permission is required so the path can be traced.",
            ),
            LocationIssue::NoFix => return None,
        };
        Some(Self {
            title: title.to_owned(),
            message: message.to_owned(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Everything currently drawn on the map.
pub struct MapViewState {
    /// Point markers in server response order.
    pub markers: Vec<Marker>,
    /// The single route overlay, if any.
    pub route: Option<Route>,
    /// Index of the marker whose info window is open.
    pub info_window: Option<usize>,
    /// Modal dialog awaiting dismissal.
    pub dialog: Option<Dialog>,
    /// Incremented on every redraw request.
    pub revision: u64,
}

#[derive(Debug, Default)]
/// Owner of the map view state.
pub struct MapPresentation {
    state: MapViewState,
}

impl MapPresentation {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view for rendering.
    #[must_use]
    pub fn state(&self) -> &MapViewState {
        &self.state
    }

    /// Remove every marker and close the info window.
    pub fn clear_markers(&mut self) {
        self.state.markers.clear();
        self.state.info_window = None;
    }

    /// Add one marker on top of the existing ones.
    pub fn add_marker(&mut self, marker: Marker) {
        self.state.markers.push(marker);
    }

    /// Replace the route overlay.
    pub fn set_route(&mut self, route: Route) {
        self.state.route = Some(route);
    }

    /// Remove the route overlay.
    pub fn clear_route(&mut self) {
        self.state.route = None;
    }

    /// Request a redraw.
    pub fn invalidate(&mut self) {
        self.state.revision = self.state.revision.wrapping_add(1);
    }

    /// Replace all markers with one per mappable point, then redraw.
    pub fn show_points(&mut self, points: &[RecyclingPoint]) {
        self.clear_markers();
        for marker in points.iter().filter_map(Marker::for_point) {
            self.add_marker(marker);
        }
        self.invalidate();
    }

    /// Draw a route, replacing any previous one.
    pub fn show_route(&mut self, route: Route) {
        self.set_route(route);
        self.invalidate();
    }

    /// Open the info window of the marker at `index`.
    ///
    /// Returns `false` when there is no such marker.
    pub fn click_marker(&mut self, index: usize) -> bool {
        if index < self.state.markers.len() {
            self.state.info_window = Some(index);
            self.invalidate();
            true
        } else {
            false
        }
    }

    /// Marker whose info window is open.
    #[must_use]
    pub fn open_marker(&self) -> Option<&Marker> {
        self.state
            .info_window
            .and_then(|index| self.state.markers.get(index))
    }

    /// Close the info window.
    pub fn close_info_window(&mut self) {
        if self.state.info_window.take().is_some() {
            self.invalidate();
        }
    }

    /// Press the action button of the open info window.
    #[must_use]
    pub fn activate_info_window(&self) -> Option<MarkerAction> {
        self.open_marker().map(|marker| marker.action)
    }

    /// Show a modal dialog.
    pub fn show_dialog(&mut self, dialog: Dialog) {
        self.state.dialog = Some(dialog);
        self.invalidate();
    }

    /// Dismiss the modal dialog with "OK".
    pub fn dismiss_dialog(&mut self) {
        if self.state.dialog.take().is_some() {
            self.invalidate();
        }
    }

    /// Fold a result delivered by the orchestrator into the view.
    pub fn apply(&mut self, event: MapEvent) {
        match event {
            MapEvent::Points(points) => self.show_points(&points),
            MapEvent::Route(route) => self.show_route(route),
            MapEvent::LocationUnavailable(issue) => {
                if let Some(dialog) = Dialog::for_location_issue(issue) {
                    self.show_dialog(dialog);
                }
            }
        }
    }
}
