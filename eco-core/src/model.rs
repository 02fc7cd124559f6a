//! Domain data structures for recycling points, coordinates, and routes.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A latitude/longitude pair in degrees.
///
/// Values are not range checked; whatever the backend or the platform reports
/// is passed through unchanged.
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Construct a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format as `longitude,latitude`, the order used by directions APIs.
    #[must_use]
    pub fn lon_lat(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a recycling point on the backend.
pub struct RecyclingId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of the collector assigned to a recycling point.
pub struct CollectorId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A server-known location where recyclable material is collected.
pub struct RecyclingPoint {
    /// Backend identifier.
    pub id: RecyclingId,
    /// Street address, used as the marker label.
    pub address: String,
    /// Latitude, if the backend knows it.
    pub latitude: Option<f64>,
    /// Longitude, if the backend knows it.
    pub longitude: Option<f64>,
    /// Collector assigned to this point, if any.
    pub collector_id: Option<CollectorId>,
}

impl RecyclingPoint {
    /// Position of the point, or `None` when it is not mappable.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.latitude?, self.longitude?))
    }

    /// Whether both coordinates are present.
    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.coordinate().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Ordered path from a start position to a destination.
pub struct Route {
    points: Vec<Coordinate>,
}

impl Route {
    /// Build a route from ordered vertices.
    #[must_use]
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Straight line used when the directions service cannot be used.
    #[must_use]
    pub fn fallback(start: Coordinate, destination: Coordinate) -> Self {
        Self {
            points: vec![start, destination],
        }
    }

    /// Route vertices in travel order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the route has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First vertex.
    #[must_use]
    pub fn start(&self) -> Option<Coordinate> {
        self.points.first().copied()
    }

    /// Last vertex.
    #[must_use]
    pub fn destination(&self) -> Option<Coordinate> {
        self.points.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A last-known position reported by one positioning source.
pub struct LocationFix {
    /// Name of the source, e.g. `gps` or `network`.
    pub source: String,
    /// Reported position.
    pub coordinate: Coordinate,
    /// Accuracy radius in metres; lower is better.
    pub accuracy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Material kinds a recycler can report.
pub struct MaterialSelection {
    /// Glass.
    pub glass: bool,
    /// Metal.
    pub metal: bool,
    /// Plastic.
    pub plastic: bool,
    /// Cardboard.
    pub cardboard: bool,
}

impl MaterialSelection {
    /// Every kind selected.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            glass: true,
            metal: true,
            plastic: true,
            cardboard: true,
        }
    }

    /// Whether no kind is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.glass || self.metal || self.plastic || self.cardboard)
    }

    /// Whether every kind is selected.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        self.glass && self.metal && self.plastic && self.cardboard
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Body sent to the backend when a recycler reports material.
pub struct RecyclingReport {
    /// Glass was recycled.
    pub glass: bool,
    /// Metal was recycled.
    pub metal: bool,
    /// Plastic was recycled.
    pub plastic: bool,
    /// Cardboard was recycled.
    pub cardboard: bool,
    /// Username of the recycler, when logged in.
    pub recycler: Option<String>,
}

impl RecyclingReport {
    /// Combine a selection with the reporting user.
    #[must_use]
    pub fn new(selection: MaterialSelection, recycler: Option<String>) -> Self {
        Self {
            glass: selection.glass,
            metal: selection.metal,
            plastic: selection.plastic,
            cardboard: selection.cardboard,
            recycler,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Body of a login request.
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Plain password, sent over the backend connection.
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Body of a registration request.
pub struct Registration {
    /// Username, no whitespace allowed.
    pub username: String,
    /// Last name.
    pub lastname: String,
    /// E-mail address.
    pub email: String,
    /// Postal address.
    pub address: String,
    /// Password.
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: Option<f64>, longitude: Option<f64>) -> RecyclingPoint {
        RecyclingPoint {
            id: RecyclingId(1),
            address: "Calle 14 1234".to_owned(),
            latitude,
            longitude,
            collector_id: None,
        }
    }

    #[test]
    fn point_without_either_coordinate_is_not_mappable() {
        assert!(point(Some(-34.76), Some(-58.21)).is_mappable());
        assert!(!point(Some(-34.76), None).is_mappable());
        assert!(!point(None, Some(-58.21)).is_mappable());
        assert!(!point(None, None).is_mappable());
    }

    #[test]
    fn out_of_range_coordinates_pass_through() {
        let coordinate = point(Some(123.0), Some(-500.0)).coordinate();
        assert_eq!(coordinate, Some(Coordinate::new(123.0, -500.0)));
    }

    #[test]
    fn fallback_route_is_start_and_destination() {
        let start = Coordinate::new(-34.76, -58.21);
        let end = Coordinate::new(-34.77, -58.22);
        let route = Route::fallback(start, end);
        assert_eq!(route.points(), &[start, end]);
        assert_eq!(route.start(), Some(start));
        assert_eq!(route.destination(), Some(end));
    }

    #[test]
    fn lon_lat_puts_longitude_first() {
        assert_eq!(Coordinate::new(-34.5, -58.25).lon_lat(), "-58.25,-34.5");
    }

    #[test]
    fn material_selection_flags() {
        assert!(MaterialSelection::default().is_empty());
        assert!(MaterialSelection::all().is_all());
        let only_glass = MaterialSelection {
            glass: true,
            ..MaterialSelection::default()
        };
        assert!(!only_glass.is_empty());
        assert!(!only_glass.is_all());
    }
}
