//! Provider implementation for walking directions using OpenRouteService.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use eco_core::{
    model::{Coordinate, Route},
    ports::{PortError, RoutingPort},
};

/// Public OpenRouteService endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

const PROFILE: &str = "foot-walking";

/// Response from /v2/directions/{profile} (GeoJSON)
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    // absent on error payloads
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    // properties.summary / segments exist, the map only needs the line
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[lon, lat]` or `[lon, lat, elevation]`
    coordinates: Vec<Vec<f64>>,
}

/// Walking directions client.
pub struct OpenRouteClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenRouteClient {
    /// Create a client for `base_url` authenticated with `api_key`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl RoutingPort for OpenRouteClient {
    async fn route(&self, start: Coordinate, destination: Coordinate) -> Result<Route, PortError> {
        let start_param = start.lon_lat();
        let end_param = destination.lon_lat();

        let resp = self
            .client
            .get(format!("{}/v2/directions/{PROFILE}", self.base_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("start", &start_param),
                ("end", &end_param),
            ])
            .send()
            .await
            .map_err(PortError::from)?;

        let status = resp.status();
        tracing::debug!(%status, start = %start_param, end = %end_param, "directions response");
        if !status.is_success() {
            return Err(PortError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(PortError::from)?;
        parse_route(&body)
    }
}

/// Extract the first feature's line as `(lat, lon)` coordinates in order.
///
/// # Errors
///
/// Returns [`PortError::Json`] for invalid JSON and [`PortError::Decode`] when
/// there is no feature, the line is empty, or a vertex has fewer than two numbers.
pub fn parse_route(body: &str) -> Result<Route, PortError> {
    let resp: DirectionsResponse = serde_json::from_str(body)?;

    let feature = resp
        .features
        .into_iter()
        .next()
        .ok_or_else(|| PortError::Decode("directions response has no features".into()))?;

    let points = feature
        .geometry
        .coordinates
        .iter()
        .map(|vertex| match vertex.as_slice() {
            [lon, lat, ..] => Ok(Coordinate::new(*lat, *lon)),
            _ => Err(PortError::Decode(format!("malformed route vertex {vertex:?}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if points.is_empty() {
        return Err(PortError::Decode("route geometry is empty".into()));
    }
    Ok(Route::new(points))
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    const START: Coordinate = Coordinate::new(-34.7653, -58.2120);
    const END: Coordinate = Coordinate::new(-34.7700, -58.2200);

    // Serve one canned response and hand back the request head.
    async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/geo+json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _peer) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut chunk = [0_u8; 4096];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = socket.read(&mut chunk).await.expect("read");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            socket.write_all(response.as_bytes()).await.expect("write");
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn parses_vertices_in_order_swapping_to_lat_lon() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"summary": {"distance": 812.3, "duration": 584.9}},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-58.2120, -34.7653], [-58.2150, -34.7671], [-58.2200, -34.7700]]
                }
            }]
        }"#;

        let route = parse_route(body).expect("route");

        assert_eq!(route.len(), 3);
        assert_eq!(route.start(), Some(START));
        assert_eq!(route.points()[1], Coordinate::new(-34.7671, -58.2150));
        assert_eq!(route.destination(), Some(END));
    }

    #[test]
    fn elevation_is_ignored() {
        let body = r#"{"features": [{"geometry": {"coordinates": [[-58.2, -34.7, 12.5]]}}]}"#;
        let route = parse_route(body).expect("route");
        assert_eq!(route.points(), &[Coordinate::new(-34.7, -58.2)]);
    }

    #[test]
    fn malformed_payloads_are_decode_errors() {
        for body in [
            r#"{"features": []}"#,
            r#"{"error": {"code": 2010, "message": "Could not find routable point"}}"#,
            r#"{"features": [{"geometry": {"coordinates": []}}]}"#,
            r#"{"features": [{"geometry": {"coordinates": [[-58.2]]}}]}"#,
        ] {
            assert!(
                matches!(parse_route(body), Err(PortError::Decode(_))),
                "expected decode error for {body}"
            );
        }
        assert!(matches!(parse_route("not json"), Err(PortError::Json(_))));
        assert!(matches!(
            parse_route(r#"{"features": [{"geometry": {}}]}"#),
            Err(PortError::Json(_))
        ));
    }

    #[tokio::test]
    async fn sends_lon_lat_pairs_and_key() {
        let body = r#"{"features": [{"geometry": {"coordinates": [[-58.2120, -34.7653], [-58.2200, -34.7700]]}}]}"#;
        let (base, server) = serve_once("200 OK", body).await;
        let client = OpenRouteClient::new(Client::new(), base, "test-key");

        let route = client.route(START, END).await.expect("route");

        assert_eq!(route.points(), &[START, END]);
        let request = server.await.expect("server");
        let request_line = request.lines().next().unwrap_or_default();
        assert!(request_line.starts_with("GET /v2/directions/foot-walking?"));
        assert!(request_line.contains("api_key=test-key"));
        assert!(request_line.contains("start=-58.212%2C-34.7653"));
        assert!(request_line.contains("end=-58.22%2C-34.77"));
    }

    #[tokio::test]
    async fn rejected_key_is_a_status_error() {
        let (base, _server) = serve_once("403 Forbidden", r#"{"error": "Access to this API has been disallowed"}"#).await;
        let client = OpenRouteClient::new(Client::new(), base, "bad-key");
        assert!(matches!(client.route(START, END).await, Err(PortError::Status(403))));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let client = OpenRouteClient::new(Client::new(), format!("http://{addr}"), "key");
        assert!(matches!(client.route(START, END).await, Err(PortError::Network(_))));
    }
}
