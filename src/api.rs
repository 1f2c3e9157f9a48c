use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::alerts::{
    AlertResponse, EMAIL_NOT_FOUND, Notice, SUBSCRIBE_FAILED, SubscriptionForm, UNSUBSCRIBE_FAILED,
    UnsubscribeRequest, subscribe_notice, unsubscribe_notice,
};
use crate::constants::{FALLBACK_LOCATIONS, HTTP_TIMEOUT_SECS};
use crate::geo::Coordinate;
use crate::hospitals::{OverpassElement, OverpassResponse, RankedPoint, overpass_query, rank};
use crate::latest::LatestRequest;
use crate::prediction::{PredictRequest, Prediction};

pub(crate) fn http_client() -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .context("build HTTP client")
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    locations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the prediction and alert service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

#[derive(Debug)]
pub enum Unsubscribed {
    Done(AlertResponse),
    NotFound,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self::with_client(http_client()?, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Known locations; the fallback list when the service is unavailable.
    pub async fn locations(&self) -> Vec<String> {
        match self.try_locations().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Error fetching locations, using defaults: {e:#}");
                FALLBACK_LOCATIONS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    async fn try_locations(&self) -> anyhow::Result<Vec<String>> {
        let url = self.url("locations");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        if !resp.status().is_success() {
            return Err(anyhow!("GET {url} returned {}", resp.status()));
        }
        let body: LocationsResponse = resp.json().await.context("decode locations")?;
        Ok(body.locations)
    }

    pub async fn predict(&self, req: &PredictRequest) -> anyhow::Result<Prediction> {
        let url = self.url("predict");
        let resp = self
            .http
            .post(&url)
            .json(req)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_default();
            return Err(anyhow!("prediction service returned {status}: {detail}"));
        }
        resp.json().await.context("decode prediction")
    }

    /// The service answers rejected subscriptions with a JSON body too, so any status
    /// with a decodable body is returned as-is.
    pub async fn subscribe(&self, form: &SubscriptionForm) -> anyhow::Result<AlertResponse> {
        let url = self.url("subscribe");
        let resp = self
            .http
            .post(&url)
            .json(form)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        let status = resp.status();
        resp.json()
            .await
            .with_context(|| format!("decode subscribe response ({status})"))
    }

    pub async fn unsubscribe(&self, email: &str) -> anyhow::Result<Unsubscribed> {
        let url = self.url("unsubscribe");
        let resp = self
            .http
            .post(&url)
            .json(&UnsubscribeRequest {
                email: email.to_string(),
            })
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Unsubscribed::NotFound),
            s if s.is_success() => Ok(Unsubscribed::Done(
                resp.json().await.context("decode unsubscribe response")?,
            )),
            s => Err(anyhow!("POST {url} returned {s}")),
        }
    }

    /// Validate, send, and turn the outcome into a message for the user.
    pub async fn submit_subscription(&self, form: &SubscriptionForm) -> Notice {
        if let Err(msg) = form.validate() {
            return Notice::error(msg);
        }
        match self.subscribe(form).await {
            Ok(resp) => subscribe_notice(&resp),
            Err(e) => {
                tracing::warn!("Error subscribing: {e:#}");
                Notice::error(SUBSCRIBE_FAILED)
            }
        }
    }

    pub async fn submit_unsubscribe(&self, req: &UnsubscribeRequest) -> Notice {
        if let Err(msg) = req.validate() {
            return Notice::error(msg);
        }
        match self.unsubscribe(&req.email).await {
            Ok(Unsubscribed::Done(resp)) => unsubscribe_notice(&resp),
            Ok(Unsubscribed::NotFound) => Notice::error(EMAIL_NOT_FOUND),
            Err(e) => {
                tracing::warn!("Error unsubscribing: {e:#}");
                Notice::error(UNSUBSCRIBE_FAILED)
            }
        }
    }
}

/// Fetches hospital nodes from an Overpass interpreter.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: Client,
    url: String,
    radius_m: u32,
}

impl OverpassClient {
    pub fn new(url: &str, radius_m: u32) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client()?,
            url: url.to_string(),
            radius_m,
        })
    }

    pub async fn hospitals_near(&self, origin: Coordinate) -> anyhow::Result<Vec<OverpassElement>> {
        let query = overpass_query(origin, self.radius_m);
        tracing::debug!("Overpass query: {query}");
        let resp = self
            .http
            .get(&self.url)
            .query(&[("data", query.as_str())])
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;
        if !resp.status().is_success() {
            return Err(anyhow!("Overpass returned {}", resp.status()));
        }
        let body: OverpassResponse = resp.json().await.context("decode Overpass response")?;
        Ok(body.elements)
    }

    pub async fn ranked_near(&self, origin: Coordinate) -> anyhow::Result<Vec<RankedPoint>> {
        let raw = self.hospitals_near(origin).await?;
        let ranked = rank(origin, &raw);
        tracing::info!(
            "{} hospitals within {} m ({} without a position)",
            ranked.len(),
            self.radius_m,
            raw.len() - ranked.len()
        );
        Ok(ranked)
    }
}

#[derive(Debug)]
pub enum Search {
    Ranked(Vec<RankedPoint>),
    /// A newer search started before this one finished.
    Superseded,
}

/// One user's hospital search: only the latest request's result is kept.
#[derive(Debug)]
pub struct HospitalFinder {
    overpass: OverpassClient,
    latest: LatestRequest,
}

impl HospitalFinder {
    pub fn new(overpass: OverpassClient) -> Self {
        Self {
            overpass,
            latest: LatestRequest::new(),
        }
    }

    pub async fn search(&self, origin: Coordinate) -> anyhow::Result<Search> {
        let ticket = self.latest.begin();
        let result = self.overpass.ranked_near(origin).await;
        if !self.latest.is_current(&ticket) {
            tracing::debug!("Discarding superseded hospital search");
            return Ok(Search::Superseded);
        }
        result.map(Search::Ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertFrequency, NoticeKind};
    use crate::prediction::Month;
    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn alert_service() -> String {
        let app = Router::new()
            .route(
                "/api/locations",
                get(|| async { Json(json!({"locations": ["Bangalore", "Mysore"]})) }),
            )
            .route(
                "/api/predict",
                post(|Json(body): Json<Value>| async move {
                    if body["location"] == "Nowhere" {
                        return (AxumStatus::NOT_FOUND, Json(json!({"error": "Location not found"})));
                    }
                    (AxumStatus::OK, Json(json!({"prediction": 42, "type": "actual"})))
                }),
            )
            .route(
                "/api/subscribe",
                post(|Json(body): Json<Value>| async move {
                    if body["email"] == "dup@example.com" {
                        return (
                            AxumStatus::OK,
                            Json(json!({"success": false, "message": "You are already subscribed!", "already_subscribed": true})),
                        );
                    }
                    if body["alert_frequency"] != "daily" {
                        return (AxumStatus::BAD_REQUEST, Json(json!({"error": "Invalid alert frequency"})));
                    }
                    (
                        AxumStatus::CREATED,
                        Json(json!({"success": true, "message": "Successfully subscribed to DengueWatch alerts!", "already_subscribed": false, "sms_sent": true})),
                    )
                }),
            )
            .route(
                "/api/unsubscribe",
                post(|Json(body): Json<Value>| async move {
                    match body["email"].as_str() {
                        Some("gone@example.com") => {
                            (AxumStatus::NOT_FOUND, Json(json!({"error": "Email not found"})))
                        }
                        Some("boom@example.com") => {
                            (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({"error": "db"})))
                        }
                        _ => (
                            AxumStatus::OK,
                            Json(json!({"success": true, "message": "Successfully unsubscribed from DengueWatch alerts.", "sms_sent": false})),
                        ),
                    }
                }),
            );
        format!("{}/api", spawn(app).await)
    }

    fn form(email: &str, freq: AlertFrequency) -> SubscriptionForm {
        SubscriptionForm {
            name: "Ravi".into(),
            email: email.into(),
            mobile: "9876543210".into(),
            location: "Bangalore".into(),
            alert_frequency: freq,
        }
    }

    #[tokio::test]
    async fn locations_and_fallback() {
        let api = ApiClient::new(&alert_service().await).unwrap();
        assert_eq!(api.locations().await, vec!["Bangalore", "Mysore"]);

        let dead = ApiClient::new("http://127.0.0.1:9/api").unwrap();
        assert_eq!(dead.locations().await, FALLBACK_LOCATIONS.to_vec());
    }

    #[tokio::test]
    async fn predict_roundtrip_and_error() {
        let api = ApiClient::new(&alert_service().await).unwrap();
        let req = PredictRequest {
            location: "Bangalore".into(),
            month: Month::June,
            year: 2024,
        };
        assert_eq!(api.predict(&req).await.unwrap().prediction, 42.0);

        let err = api
            .predict(&PredictRequest {
                location: "Nowhere".into(),
                ..req
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Location not found"));
    }

    #[tokio::test]
    async fn subscription_notices() {
        let api = ApiClient::new(&alert_service().await).unwrap();

        let n = api
            .submit_subscription(&form("new@example.com", AlertFrequency::Daily))
            .await;
        assert_eq!(n.kind, NoticeKind::Success);
        assert!(n.text.ends_with("Welcome SMS sent to your mobile number."));

        let n = api
            .submit_subscription(&form("dup@example.com", AlertFrequency::Daily))
            .await;
        assert_eq!(n, Notice::info("You are already subscribed!"));

        // 400 bodies are still decoded.
        let n = api
            .submit_subscription(&form("new@example.com", AlertFrequency::Weekly))
            .await;
        assert_eq!(n, Notice::error("Invalid alert frequency"));

        let n = api
            .submit_subscription(&form("not-an-email", AlertFrequency::Daily))
            .await;
        assert_eq!(n, Notice::error(crate::alerts::INVALID_EMAIL));

        let dead = ApiClient::new("http://127.0.0.1:9/api").unwrap();
        let n = dead
            .submit_subscription(&form("new@example.com", AlertFrequency::Daily))
            .await;
        assert_eq!(n, Notice::error(SUBSCRIBE_FAILED));
    }

    #[tokio::test]
    async fn unsubscribe_notices() {
        let api = ApiClient::new(&alert_service().await).unwrap();
        let req = |e: &str| UnsubscribeRequest { email: e.into() };

        let n = api.submit_unsubscribe(&req("me@example.com")).await;
        assert_eq!(n.kind, NoticeKind::Success);
        assert!(n.text.ends_with("(Note: Goodbye SMS could not be sent)"));

        assert_eq!(
            api.submit_unsubscribe(&req("gone@example.com")).await,
            Notice::error(EMAIL_NOT_FOUND)
        );
        assert_eq!(
            api.submit_unsubscribe(&req("boom@example.com")).await,
            Notice::error(UNSUBSCRIBE_FAILED)
        );
        assert_eq!(
            api.submit_unsubscribe(&req("")).await,
            Notice::error(crate::alerts::EMAIL_REQUIRED)
        );
    }

    async fn overpass_stub(delay_for_lat: Option<f64>) -> String {
        let app = Router::new().route(
            "/interpreter",
            get(move |Query(q): Query<HashMap<String, String>>| async move {
                let data = q.get("data").cloned().unwrap_or_default();
                if let Some(lat) = delay_for_lat {
                    if data.contains(&format!(",{lat},")) {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                    }
                }
                Json(json!({"elements": [
                    {"id": 1, "lat": 13.00, "lon": 77.60, "tags": {"name": "Far"}},
                    {"id": 2, "lat": 12.972, "lon": 77.642, "tags": {}},
                    {"id": 3, "tags": {"name": "Ghost"}},
                    {"id": 4, "lat": 12.95, "lon": 77.63, "tags": {"name": "Mid", "addr:street": "80 Ft Rd"}}
                ]}))
            }),
        );
        format!("{}/interpreter", spawn(app).await)
    }

    #[tokio::test]
    async fn overpass_results_are_ranked() {
        let client = OverpassClient::new(&overpass_stub(None).await, 5000).unwrap();
        let ranked = client
            .ranked_near(Coordinate::new(12.9716, 77.6412))
            .await
            .unwrap();
        let names: Vec<_> = ranked.iter().map(|r| r.poi.name.as_str()).collect();
        assert_eq!(names, vec!["Unnamed Hospital", "Mid", "Far"]);
        assert_eq!(ranked[1].poi.address, "80 Ft Rd");
    }

    #[tokio::test]
    async fn stale_search_is_superseded() {
        let finder = std::sync::Arc::new(HospitalFinder::new(
            OverpassClient::new(&overpass_stub(Some(1.5)).await, 5000).unwrap(),
        ));

        let slow = {
            let finder = finder.clone();
            tokio::spawn(async move { finder.search(Coordinate::new(1.5, 2.5)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = finder.search(Coordinate::new(12.97, 77.64)).await.unwrap();

        assert!(matches!(fresh, Search::Ranked(ref v) if v.len() == 3));
        assert!(matches!(slow.await.unwrap().unwrap(), Search::Superseded));
    }
}
