//! Provider implementation for the Eco recycling backend.
//!
//! `/open_map` feeds the map. The account endpoints answer with free text
//! which is handed back unchanged for the core to interpret.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use eco_core::{
    model::{CollectorId, Credentials, RecyclingId, RecyclingPoint, RecyclingReport, Registration},
    ports::{AccountPort, PortError, RecyclingPort},
};

/// Response wrapper from /open_map
#[derive(Debug, Deserialize)]
struct MapDataResponse {
    map_data: Vec<MapEntry>,
}

/// Single recycling point from /open_map
#[derive(Debug, Deserialize)]
struct MapEntry {
    recycling_id: i64,
    address: String,
    // x is latitude, y is longitude
    coordinate_x: Option<f64>,
    coordinate_y: Option<f64>,
    collector_id: Option<i64>,
}

impl From<MapEntry> for RecyclingPoint {
    fn from(entry: MapEntry) -> Self {
        RecyclingPoint {
            id: RecyclingId(entry.recycling_id),
            address: entry.address,
            latitude: entry.coordinate_x,
            longitude: entry.coordinate_y,
            collector_id: entry.collector_id.map(CollectorId),
        }
    }
}

/// Recycling point source backed by `GET /open_map`.
pub struct RecyclingDataClient {
    client: Client,
    base_url: String,
}

impl RecyclingDataClient {
    /// Create a client for the backend at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_base(base_url.into()),
        }
    }
}

#[async_trait]
impl RecyclingPort for RecyclingDataClient {
    async fn recycling_points(&self) -> Result<Vec<RecyclingPoint>, PortError> {
        let req = self
            .client
            .get(format!("{}/open_map", self.base_url))
            .header(header::CONTENT_TYPE, "application/json");

        let resp = fetch_json::<MapDataResponse>(req).await?;
        Ok(resp.map_data.into_iter().map(RecyclingPoint::from).collect())
    }
}

/// Account endpoints of the backend.
pub struct AccountClient {
    client: Client,
    base_url: String,
}

impl AccountClient {
    /// Create a client for the backend at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_base(base_url.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl AccountPort for AccountClient {
    async fn status(&self) -> Result<String, PortError> {
        let req = self
            .client
            .get(self.url("status"))
            .header(header::CONTENT_TYPE, "application/json");
        fetch_text(req).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<String, PortError> {
        fetch_text(self.client.post(self.url("login")).json(credentials)).await
    }

    async fn register(&self, registration: &Registration) -> Result<String, PortError> {
        fetch_text(self.client.post(self.url("register")).json(registration)).await
    }

    async fn logout(&self) -> Result<String, PortError> {
        let req = self
            .client
            .post(self.url("logout"))
            .header(header::CONTENT_TYPE, "application/json")
            .body("");
        fetch_text(req).await
    }

    async fn submit_recycling(&self, report: &RecyclingReport) -> Result<String, PortError> {
        fetch_text(self.client.post(self.url("recycling")).json(report)).await
    }
}

/// Both backend ports, sharing one HTTP client.
pub struct BackendPorts {
    /// Map data.
    pub recycling: Arc<dyn RecyclingPort>,
    /// Account endpoints.
    pub account: Arc<dyn AccountPort>,
}

/// Build the port bundle for the backend at `base_url`.
#[must_use]
pub fn ports(client: Client, base_url: &str) -> BackendPorts {
    BackendPorts {
        recycling: Arc::new(RecyclingDataClient::new(client.clone(), base_url)),
        account: Arc::new(AccountClient::new(client, base_url)),
    }
}

fn trim_base(base_url: String) -> String {
    base_url.trim_end_matches('/').to_owned()
}

// Fetch and decode JSON, rejecting non-success statuses.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    let resp = req.send().await.map_err(PortError::from)?;
    let status = resp.status();
    tracing::debug!(url = %resp.url(), %status, "backend response");
    if !status.is_success() {
        return Err(PortError::Status(status.as_u16()));
    }
    let body = resp.text().await.map_err(PortError::from)?;
    serde_json::from_str(&body).map_err(PortError::from)
}

// The account endpoints are judged by body content, whatever the status.
async fn fetch_text(req: RequestBuilder) -> Result<String, PortError> {
    let resp = req.send().await.map_err(PortError::from)?;
    tracing::debug!(url = %resp.url(), status = %resp.status(), "backend response");
    resp.text().await.map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use reqwest::redirect::Policy;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    // Serve one canned response and hand back the raw request.
    async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _peer) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.expect("write");
            request
        });
        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut request = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.expect("read");
            if read == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..read]);
            if let Some(end) = request.windows(4).position(|window| window == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&request).into_owned()
    }

    fn client() -> Client {
        Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("client")
    }

    #[tokio::test]
    async fn decodes_map_data_permissively() {
        let body = r#"{
            "map_data": [
                {"recycling_id": 1, "address": "Calle 148 1550", "coordinate_x": -34.7653,
                 "coordinate_y": -58.2120, "collector_id": 7, "extra": "ignored"},
                {"recycling_id": 2, "address": "Calle 14 2100", "coordinate_x": -34.76,
                 "coordinate_y": null, "collector_id": null},
                {"recycling_id": 3, "address": "Av. Mitre 800"}
            ],
            "generated": "2024-06-01"
        }"#;
        let (base, server) = serve_once("200 OK", body).await;

        let points = RecyclingDataClient::new(client(), base)
            .recycling_points()
            .await
            .expect("points");

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].latitude, Some(-34.7653));
        assert_eq!(points[0].longitude, Some(-58.2120));
        assert_eq!(points[0].collector_id, Some(CollectorId(7)));
        assert!(!points[1].is_mappable());
        assert_eq!(points[2].latitude, None);
        assert_eq!(points[2].collector_id, None);

        let request = server.await.expect("server");
        assert!(request.starts_with("GET /open_map "));
        assert!(request.to_lowercase().contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn unexpected_shape_is_an_error() {
        let (base, _server) = serve_once("200 OK", r#"{"points": []}"#).await;
        let result = RecyclingDataClient::new(client(), base).recycling_points().await;
        assert!(matches!(result, Err(PortError::Json(_))));
    }

    #[tokio::test]
    async fn server_error_status_is_an_error() {
        let (base, _server) = serve_once("500 Internal Server Error", "{}").await;
        let result = RecyclingDataClient::new(client(), base).recycling_points().await;
        assert!(matches!(result, Err(PortError::Status(500))));
    }

    #[tokio::test]
    async fn redirects_are_not_followed() {
        let (base, _server) = serve_once("302 Found", "").await;
        let result = RecyclingDataClient::new(client(), base).recycling_points().await;
        assert!(matches!(result, Err(PortError::Status(302))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let result = RecyclingDataClient::new(client(), format!("http://{addr}"))
            .recycling_points()
            .await;
        assert!(matches!(result, Err(PortError::Network(_))));
    }

    #[tokio::test]
    async fn login_posts_credentials_and_returns_body() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"error": "Invalid credentials"}"#).await;
        let account = AccountClient::new(client(), format!("{base}/"));

        let body = account
            .login(&Credentials {
                username: "lucia".to_owned(),
                password: "secret".to_owned(),
            })
            .await
            .expect("login");

        assert!(body.contains("Invalid credentials"));
        let request = server.await.expect("server");
        assert!(request.starts_with("POST /login "));
        assert!(request.contains(r#""username":"lucia""#));
        assert!(request.contains(r#""password":"secret""#));
    }

    #[tokio::test]
    async fn recycling_report_is_posted_as_json() {
        let (base, server) = serve_once("200 OK", r#"{"status": "success"}"#).await;
        let report = RecyclingReport {
            glass: true,
            metal: false,
            plastic: true,
            cardboard: false,
            recycler: Some("lucia".to_owned()),
        };

        let body = AccountClient::new(client(), base)
            .submit_recycling(&report)
            .await
            .expect("submit");

        assert!(body.contains("success"));
        let request = server.await.expect("server");
        assert!(request.starts_with("POST /recycling "));
        assert!(request.contains(r#""glass":true"#));
        assert!(request.contains(r#""recycler":"lucia""#));
    }

    #[tokio::test]
    async fn logout_sends_empty_post() {
        let (base, server) = serve_once("200 OK", "Logged out successfully").await;

        let body = AccountClient::new(client(), base).logout().await.expect("logout");

        assert_eq!(body, "Logged out successfully");
        let request = server.await.expect("server");
        assert!(request.starts_with("POST /logout "));
        // nothing follows the header block
        assert!(request.ends_with("\r\n\r\n"));
        assert!(!request.to_lowercase().contains("transfer-encoding"));
    }
}
