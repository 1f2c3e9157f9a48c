use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::alerts::{Notice, SubscriptionForm, UnsubscribeRequest};
use crate::api::{ApiClient, HospitalFinder, OverpassClient, Search};
use crate::cases::CaseDataset;
use crate::cli::ServeArgs;
use crate::constants::DEFAULT_HOSPITAL_LIMIT;
use crate::download::load_cases;
use crate::gazetteer::Gazetteer;
use crate::geo::Coordinate;
use crate::heatmap::{DEFAULT_YEAR, HeatmapPolicy, HeatmapView};
use crate::hospitals::RankedPoint;
use crate::prediction::{Assessment, Month, PREDICTION_FAILED, PredictRequest};

const MAX_SESSIONS: usize = 10_000;

#[derive(Clone)]
pub struct AppState {
    dataset: Arc<CaseDataset>,
    gazetteer: Gazetteer,
    policy: HeatmapPolicy,
    api: ApiClient,
    overpass: OverpassClient,
    sessions: Arc<Mutex<HashMap<String, Arc<HospitalFinder>>>>,
}

impl AppState {
    pub fn new(dataset: CaseDataset, api: ApiClient, overpass: OverpassClient) -> Self {
        Self {
            dataset: Arc::new(dataset),
            gazetteer: Gazetteer::bangalore(),
            policy: HeatmapPolicy::default(),
            api,
            overpass,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn finder(&self, session: &str) -> Arc<HospitalFinder> {
        let mut sessions = self.sessions.lock().await;
        if sessions.len() >= MAX_SESSIONS && !sessions.contains_key(session) {
            // A finder with a search in flight is also held by its handler.
            sessions.retain(|_, f| Arc::strong_count(f) > 1);
            tracing::warn!(
                "Session table full ({MAX_SESSIONS}); evicted idle sessions, {} busy remain",
                sessions.len()
            );
        }
        sessions
            .entry(session.to_string())
            .or_insert_with(|| Arc::new(HospitalFinder::new(self.overpass.clone())))
            .clone()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/years", get(api_years))
        .route("/api/heatmap", get(api_heatmap))
        .route("/api/hospitals", get(api_hospitals))
        .route("/api/locations", get(api_locations))
        .route("/api/predict", post(api_predict))
        .route("/api/subscribe", post(api_subscribe))
        .route("/api/unsubscribe", post(api_unsubscribe))
        .layer(cors)
        .with_state(state)
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let dataset = load_cases(&opts.dataset).await.context("load case data")?;
    let api = ApiClient::new(&opts.api.api_base)?;
    let overpass = OverpassClient::new(&opts.overpass.overpass_url, opts.overpass.radius_m)?;
    let app = router(AppState::new(dataset, api, overpass));

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct YearsResponse {
    years: Vec<i32>,
}

async fn api_years(State(st): State<AppState>) -> impl IntoResponse {
    Json(YearsResponse {
        years: st.dataset.years(),
    })
}

#[derive(Debug, Deserialize)]
struct HeatmapParams {
    year: Option<i32>,
}

async fn api_heatmap(
    State(st): State<AppState>,
    Query(p): Query<HeatmapParams>,
) -> impl IntoResponse {
    let year = p.year.unwrap_or(DEFAULT_YEAR);
    Json(HeatmapView::build(&st.policy, &st.dataset, &st.gazetteer, year))
}

#[derive(Debug, Deserialize)]
struct HospitalParams {
    lat: f64,
    lon: f64,
    limit: Option<usize>,
    session: Option<String>,
}

#[derive(Debug, Serialize)]
struct HospitalCard {
    #[serde(flatten)]
    point: RankedPoint,
    distance_label: String,
    maps_url: String,
}

#[derive(Debug, Serialize)]
struct HospitalsResponse {
    origin: Coordinate,
    total: usize,
    hospitals: Vec<HospitalCard>,
}

fn valid_origin(lat: f64, lon: f64) -> Option<Coordinate> {
    let ok = lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon);
    ok.then_some(Coordinate::new(lat, lon))
}

async fn api_hospitals(
    State(st): State<AppState>,
    Query(p): Query<HospitalParams>,
) -> impl IntoResponse {
    let Some(origin) = valid_origin(p.lat, p.lon) else {
        return (
            StatusCode::BAD_REQUEST,
            "lat must be in [-90, 90] and lon in [-180, 180]".to_string(),
        )
            .into_response();
    };
    let limit = p.limit.unwrap_or(DEFAULT_HOSPITAL_LIMIT);

    let result = match p.session.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(session) => st.finder(session).await.search(origin).await,
        None => st.overpass.ranked_near(origin).await.map(Search::Ranked),
    };

    let ranked = match result {
        Ok(Search::Ranked(v)) => v,
        Ok(Search::Superseded) => {
            return (
                StatusCode::CONFLICT,
                "superseded by a newer search".to_string(),
            )
                .into_response();
        }
        Err(e) => {
            tracing::warn!("Error fetching hospital data: {e:#}");
            return (StatusCode::BAD_GATEWAY, e.to_string()).into_response();
        }
    };

    let total = ranked.len();
    let hospitals = ranked
        .into_iter()
        .take(limit)
        .map(|point| HospitalCard {
            distance_label: point.distance_label(),
            maps_url: point.maps_url(),
            point,
        })
        .collect();

    Json(HospitalsResponse {
        origin,
        total,
        hospitals,
    })
    .into_response()
}

#[derive(Debug, Serialize)]
struct LocationsResponse {
    locations: Vec<String>,
}

async fn api_locations(State(st): State<AppState>) -> impl IntoResponse {
    Json(LocationsResponse {
        locations: st.api.locations().await,
    })
}

#[derive(Debug, Deserialize)]
struct PredictBody {
    #[serde(default)]
    location: String,
    #[serde(default)]
    month: String,
    year: i32,
}

async fn api_predict(
    State(st): State<AppState>,
    Json(body): Json<PredictBody>,
) -> impl IntoResponse {
    let month: Month = match body.month.parse() {
        Ok(m) => m,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let location = body.location.trim();
    if location.is_empty() {
        return (StatusCode::BAD_REQUEST, "Location is required".to_string()).into_response();
    }

    let req = PredictRequest {
        location: location.to_string(),
        month,
        year: body.year,
    };
    match st.api.predict(&req).await {
        Ok(p) => Json(Assessment::new(&req, &p)).into_response(),
        Err(e) => {
            tracing::warn!("Error making prediction: {e:#}");
            (StatusCode::BAD_GATEWAY, PREDICTION_FAILED.to_string()).into_response()
        }
    }
}

fn rejected(rejection: JsonRejection) -> axum::response::Response {
    tracing::debug!("Rejected form body: {}", rejection.body_text());
    (rejection.status(), Json(Notice::error(rejection.body_text()))).into_response()
}

async fn api_subscribe(
    State(st): State<AppState>,
    form: Result<Json<SubscriptionForm>, JsonRejection>,
) -> impl IntoResponse {
    match form {
        Ok(Json(form)) => Json(st.api.submit_subscription(&form).await).into_response(),
        Err(rejection) => rejected(rejection),
    }
}

async fn api_unsubscribe(
    State(st): State<AppState>,
    req: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> impl IntoResponse {
    match req {
        Ok(Json(req)) => Json(st.api.submit_unsubscribe(&req).await).into_response(),
        Err(rejection) => rejected(rejection),
    }
}
