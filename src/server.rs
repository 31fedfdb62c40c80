use crate::config::AppConfig;
use crate::data;
use crate::error::DashboardError;
use crate::lookup::{AreaLookup, LocatedArea};
use crate::pipeline::{self, DashboardRequest, DashboardUpdate};
use crate::projection::{HoverField, TableColumn, TABLE_COLUMNS};
use crate::types::{FilterSelection, Nativity, ALL, INDUSTRIES};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

/// Application context, built once at startup and shared read-only.
pub struct AppState {
    pub config: AppConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    industry: Option<String>,
    nativity: Option<String>,
    /// Comma separated hover keys. Absent means the configured defaults.
    hover: Option<String>,
    /// Comma separated table row indices.
    selected: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocateParams {
    industry: Option<String>,
    nativity: Option<String>,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct OptionsDocument {
    pub industries: Vec<DropdownOption>,
    pub nativity: Vec<DropdownOption>,
    pub hover_fields: Vec<DropdownOption>,
    pub default_hover_fields: Vec<&'static str>,
    pub table_columns: Vec<TableColumn>,
}

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(err) => {
                error!("Request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn options_document(config: &AppConfig) -> OptionsDocument {
    let option = |label: &str, value: &str| DropdownOption {
        label: label.to_string(),
        value: value.to_string(),
    };

    OptionsDocument {
        industries: std::iter::once(ALL)
            .chain(INDUSTRIES)
            .map(|industry| option(industry, industry))
            .collect(),
        nativity: [Nativity::All, Nativity::Domestic, Nativity::ForeignBorn]
            .iter()
            .map(|n| option(n.label(), n.code()))
            .collect(),
        hover_fields: HoverField::ALL
            .iter()
            .map(|field| option(field.checklist_label(), field.key()))
            .collect(),
        default_hover_fields: config
            .display
            .default_hover_fields
            .iter()
            .map(HoverField::key)
            .collect(),
        table_columns: TABLE_COLUMNS.to_vec(),
    }
}

fn parse_selection(industry: Option<String>, nativity: Option<String>) -> Result<FilterSelection, ApiError> {
    let nativity = match nativity {
        Some(value) => value.parse::<Nativity>().map_err(ApiError::BadRequest)?,
        None => Nativity::All,
    };
    Ok(FilterSelection::new(industry.unwrap_or_else(|| ALL.to_string()), nativity))
}

fn parse_request(params: DashboardParams, config: &AppConfig) -> Result<DashboardRequest, ApiError> {
    let selection = parse_selection(params.industry, params.nativity)?;

    let hover_fields = match params.hover {
        None => config.display.default_hover_fields.clone(),
        Some(list) => list
            .split(',')
            .filter(|key| !key.trim().is_empty())
            .map(|key| key.parse::<HoverField>().map_err(ApiError::BadRequest))
            .collect::<Result<Vec<_>, _>>()?,
    };

    let selected = params
        .selected
        .unwrap_or_default()
        .split(',')
        .filter(|index| !index.trim().is_empty())
        .map(|index| {
            index
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid row index '{}'", index)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DashboardRequest::new(selection, hover_fields).with_selected_rows(selected))
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    let app = Router::new()
        .route("/api/options", get(options_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/locate", get(locate_handler));

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!(dataset_dir = ?config.input.dataset_dir, "Serving datasets");
    let app = router(Arc::new(AppState { config }));

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn options_handler(State(state): State<Arc<AppState>>) -> Json<OptionsDocument> {
    Json(options_document(&state.config))
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardUpdate>, ApiError> {
    let request = parse_request(params, &state.config)?;

    // Dataset reads block; keep them off the async workers.
    let update = tokio::task::spawn_blocking(move || pipeline::run(&state.config, &request))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(ApiError::Internal)?;

    Ok(Json(update))
}

async fn locate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocateParams>,
) -> Result<Json<Option<LocatedArea>>, ApiError> {
    let selection = parse_selection(params.industry, params.nativity)?;
    let (lat, lon) = (params.lat, params.lon);

    let located = tokio::task::spawn_blocking(move || -> Result<Option<LocatedArea>, ApiError> {
        let config = &state.config;
        let handle = data::resolve(&config.input.dataset_dir, &config.input.extension, &selection)
            .map_err(|e: DashboardError| ApiError::NotFound(e.diagnostic_title()))?;
        let dataset = data::load_dataset(&handle).map_err(ApiError::Internal)?;
        Ok(AreaLookup::build(&dataset).locate(lon, lat))
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(Json(located))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayConfig, InputConfig, ServerConfig};
    use crate::test_support::{feature, write_dataset};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::path::Path;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn app(dir: &Path) -> Router {
        router(Arc::new(AppState {
            config: AppConfig {
                input: InputConfig {
                    dataset_dir: dir.to_path_buf(),
                    extension: "geojson".to_string(),
                },
                display: DisplayConfig::default(),
                server: ServerConfig {
                    port: 0,
                    static_dir: None,
                },
            },
        }))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn dashboard_ready() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_dataset(
            dir.path(),
            "Construction All.geojson",
            vec![feature(0, 0.5), feature(1, 1.0), feature(2, 1.5)],
        );

        let (status, body) = get_json(
            app(dir.path()),
            "/api/dashboard?industry=Construction&nativity=All&hover=ID,Mean%20Wage&selected=1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "ready");
        assert_eq!(body["table"].as_array().unwrap().len(), 3);
        assert_eq!(body["updating_note"]["visible"], false);
        assert_eq!(body["figure"]["data"][0]["marker"]["line"]["width"], serde_json::json!([0, 2, 0]));
        assert_eq!(
            body["figure"]["data"][0]["text"][1],
            "<b>Underemployment Level: 1.00</b><br>ID: G1<br>Mean Wage: $41,235"
        );
    }

    #[tokio::test]
    async fn negative_row_index_is_ignored() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_dataset(dir.path(), "All All.geojson", vec![feature(0, 0.5), feature(1, 1.0)]);

        let (status, body) = get_json(app(dir.path()), "/api/dashboard?selected=-1,1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "ready");
        assert_eq!(body["figure"]["data"][0]["marker"]["line"]["width"], serde_json::json!([0, 2]));
    }

    #[tokio::test]
    async fn dashboard_not_found() {
        let dir = tempdir().expect("Failed to create temp dir");
        let (status, body) =
            get_json(app(dir.path()), "/api/dashboard?industry=Utilities&nativity=Domestic").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "not_found_error");
        assert_eq!(body["figure"]["layout"]["title"]["text"], "File 'Utilities 1.geojson' not found!");
        assert_eq!(body["table"], serde_json::json!([]));
        assert_eq!(body["updating_note"]["visible"], false);
    }

    #[tokio::test]
    async fn dashboard_rejects_bad_input() {
        let dir = tempdir().expect("Failed to create temp dir");
        let (status, _) = get_json(app(dir.path()), "/api/dashboard?nativity=7").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(app(dir.path()), "/api/dashboard?hover=Shoe%20Size").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(app(dir.path()), "/api/dashboard?selected=a").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_malformed_dataset_is_server_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("All All.geojson"), "[]").unwrap();
        let (status, body) = get_json(app(dir.path()), "/api/dashboard").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("All All.geojson"));
    }

    #[tokio::test]
    async fn options_lists_controls() {
        let dir = tempdir().expect("Failed to create temp dir");
        let (status, body) = get_json(app(dir.path()), "/api/options").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["industries"].as_array().unwrap().len(), 21);
        assert_eq!(body["industries"][0]["value"], "All");
        assert_eq!(body["nativity"][2], serde_json::json!({ "label": "Foreign-Born", "value": "0" }));
        assert_eq!(body["hover_fields"][0], serde_json::json!({ "label": "ID", "value": "GISMATCH_COMBINED" }));
        assert_eq!(body["default_hover_fields"].as_array().unwrap().len(), 9);
        assert_eq!(body["table_columns"][9]["id"], "COUNTIES");
    }

    #[tokio::test]
    async fn locate_returns_row_under_point() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_dataset(dir.path(), "All 0.geojson", vec![feature(0, 0.5), feature(1, 1.0)]);

        let (status, body) =
            get_json(app(dir.path()), "/api/locate?nativity=0&lat=0.5&lon=1.5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "index": 1, "id": "G1" }));

        let (_, body) = get_json(app(dir.path()), "/api/locate?nativity=0&lat=9&lon=9").await;
        assert!(body.is_null());

        let (status, _) = get_json(app(dir.path()), "/api/locate?lat=0&lon=0").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
