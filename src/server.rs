use crate::config::AppConfig;
use crate::error::LoadError;
use crate::pages::{Dashboard, Page, WidgetQuery};
use crate::view::PageView;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

pub struct AppState {
    pub dashboard: Dashboard,
}

#[derive(Serialize)]
pub struct NavEntry {
    name: &'static str,
    slug: String,
}

pub fn router(state: Arc<AppState>, asset_dir: &std::path::Path) -> Router {
    Router::new()
        .route("/api/pages", get(navigation_handler))
        .route("/api/pages/:page", get(page_handler))
        .nest_service("/assets", ServeDir::new(asset_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, dashboard: Dashboard) -> Result<()> {
    let state = Arc::new(AppState { dashboard });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let app = router(state, &config.server.asset_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn navigation_handler() -> Json<Vec<NavEntry>> {
    Json(
        Page::ALL
            .into_iter()
            .map(|p| NavEntry {
                name: p.name(),
                slug: p.slug(),
            })
            .collect(),
    )
}

async fn page_handler(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
    Query(query): Query<WidgetQuery>,
) -> Result<Json<PageView>, ApiError> {
    let page: Page = page.parse().map_err(|e| ApiError::NotFound(format!("{}", e)))?;
    let view = state.dashboard.render(page, &query)?;
    Ok(Json(view))
}

pub enum ApiError {
    NotFound(String),
    Load(LoadError),
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        ApiError::Load(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Load(e) => {
                error!(error = ?e, "Registry unavailable");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;
    use crate::pages::LandingImage;
    use crate::types::fixtures::columns;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::io::Write;
    use tower::ServiceExt;

    fn app(csv: &tempfile::NamedTempFile) -> Router {
        let dashboard = Dashboard::new(
            DataLoader::new(csv.path(), columns(), true),
            Default::default(),
            LandingImage {
                src: "/assets/landing.jpeg".into(),
                caption: "caption".into(),
                dimensions: None,
            },
        );
        router(Arc::new(AppState { dashboard }), std::path::Path::new("assets"))
    }

    fn registry() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id_name_first,app_license_status,app_license_category,facility_zip_code,latitude,longitude").unwrap();
        writeln!(file, "Ann,Active,Retailer,2118,42.33,-71.07").unwrap();
        writeln!(file, "Bo,Pending,Delivery,2115,42.34,-71.09").unwrap();
        file.flush().unwrap();
        file
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn navigation_lists_pages_in_order() {
        let csv = registry();
        let (status, json) = get_json(app(&csv), "/api/pages").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[1]["name"], "Data Overview");
        assert_eq!(json[1]["slug"], "data-overview");
        assert_eq!(json.as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn page_query_drives_filters() {
        let csv = registry();
        let (status, json) = get_json(app(&csv), "/api/pages/data-overview?status=Pending&categories=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["page"], "Data Overview");

        let sections = json["sections"].as_array().unwrap();
        let last = sections.last().unwrap();
        assert_eq!(last["type"], "no_data");
        assert_eq!(last["message"], "No data available for selected categories.");
    }

    #[tokio::test]
    async fn out_of_range_widget_numbers_are_clamped_not_rejected() {
        let csv = registry();
        let (status, json) = get_json(app(&csv), "/api/pages/visualizations?zoom=300&pitch=-5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["controls"][2]["value"], 20);
        assert_eq!(json["controls"][3]["value"], 0);

        let (status, json) = get_json(app(&csv), "/api/pages/data-overview?zip_min=-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["controls"][1]["selected"][0], 0);
        assert_eq!(json["controls"][1]["selected"][1], 2118);
    }

    #[tokio::test]
    async fn unknown_page_is_not_found() {
        let csv = registry();
        let (status, _) = get_json(app(&csv), "/api/pages/settings").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
