use crate::category::Category;
use crate::config::AppConfig;
use crate::data::Dataset;
use crate::export::{export, ExportFormat};
use crate::geocode::{Geocoder, NominatimGeocoder};
use crate::inspect::{inspect, HoverHit, Inspection};
use crate::map::{render_scene, MapScene};
use crate::search::{table, SearchFilter, TableView};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
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

/// Everything a handler may read. Nothing in here is mutated after startup.
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub geocoder: Arc<dyn Geocoder>,
    pub config: AppConfig,
}

// Query values are kept as strings and read leniently below, so a malformed
// value degrades the response instead of rejecting the request.
#[derive(Deserialize)]
pub struct MapParams {
    category: Option<String>,
    address: Option<String>,
    center: Option<String>,
}

#[derive(Deserialize)]
pub struct InspectParams {
    category: Option<String>,
    curve: Option<String>,
    point: Option<String>,
}

/// `true`, `1`, `yes` and `on` (any case) switch a flag on; anything else,
/// including a missing value, leaves it off.
fn flag_param(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )
    })
}

fn index_param(value: Option<&str>) -> Option<usize> {
    value.and_then(|v| v.trim().parse().ok())
}

#[derive(Serialize)]
pub struct CategoryOption {
    key: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    options: Vec<CategoryOption>,
    selected: &'static str,
}

pub async fn start_server(config: AppConfig, dataset: Dataset) -> Result<()> {
    let geocoder = NominatimGeocoder::new(&config.geocoder)?;
    let state = Arc::new(AppState {
        dataset: Arc::new(dataset),
        geocoder: Arc::new(geocoder),
        config: config.clone(),
    });

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/api/categories", get(categories_handler))
        .route("/api/map", get(map_handler))
        .route("/api/inspect", get(inspect_handler))
        .route("/api/search", get(search_handler))
        .route("/api/export/csv", get(export_csv_handler))
        .route("/api/export/xlsx", get(export_xlsx_handler));

    if let Some(dir) = &state.config.server.static_dir {
        info!("Serving static files from {:?}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

async fn categories_handler() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        options: Category::ALL
            .iter()
            .map(|c| CategoryOption {
                key: c.key(),
                label: c.option_label(),
            })
            .collect(),
        selected: Category::INITIAL.key(),
    })
}

async fn map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Json<MapScene> {
    let resolution = Category::resolve_param(params.category.as_deref());
    let recenter_on = if flag_param(params.center.as_deref()) {
        params.address.as_deref()
    } else {
        None
    };

    let mut scene = render_scene(
        &state.dataset,
        resolution.category,
        recenter_on,
        state.geocoder.as_ref(),
        &state.config.map,
    )
    .await;
    scene.category_fallback = resolution.fell_back;
    Json(scene)
}

async fn inspect_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InspectParams>,
) -> Json<Inspection> {
    let category = Category::resolve_param(params.category.as_deref()).category;
    let curve = index_param(params.curve.as_deref());
    let point = index_param(params.point.as_deref());
    let hit = match (curve, point) {
        (Some(curve), Some(point)) => Some(HoverHit { curve, point }),
        _ => None,
    };
    Json(inspect(&state.dataset, category, hit))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SearchFilter>,
) -> Json<TableView> {
    let rows = filter.apply(&state.dataset);
    Json(table(&rows))
}

async fn export_csv_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SearchFilter>,
) -> Response {
    export_response(&state, &filter, ExportFormat::Csv)
}

async fn export_xlsx_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SearchFilter>,
) -> Response {
    export_response(&state, &filter, ExportFormat::Xlsx)
}

fn export_response(state: &AppState, filter: &SearchFilter, format: ExportFormat) -> Response {
    let rows = filter.apply(&state.dataset);
    match export(&rows, format) {
        Ok(bytes) => {
            info!(rows = rows.len(), file = format.file_name(), "Exported selection");
            let headers = [
                (header::CONTENT_TYPE, format.content_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", format.file_name()),
                ),
            ];
            (headers, bytes).into_response()
        }
        Err(e) => {
            error!(error = %e, "Export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Export failed").into_response()
        }
    }
}
