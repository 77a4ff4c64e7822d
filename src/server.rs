/// HTTP surface
///
/// Routes:
/// - `GET  /health`          liveness, configured text providers, image search on/off
/// - `POST /api/query`       `{ "query": string, "difficulty"?: string }` -> `QueryResponse`
/// - `POST /api/export/pdf`  `QueryResponse` -> `application/pdf`
///
/// Validation failures answer 400 with `{ "error": message }`. Anything else the
/// service could not absorb answers 500 with a generic message.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::errors::AppError;
use crate::export::render_pdf;
use crate::generation::Difficulty;
use crate::service::{QueryResponse, QueryService};

pub const GENERIC_FAILURE: &str = "Failed to process query. Please try again.";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

/// Error wrapper mapping `AppError` onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Validation { message, .. } => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": GENERIC_FAILURE }))).into_response()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: Option<Value>,
    #[serde(default)]
    difficulty: Option<Value>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    providers: Vec<String>,
    images: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        providers: state.service.provider_names(),
        images: state.service.images_enabled(),
    })
}

/// A body that is not a JSON object, or a non-string query, counts as a missing query.
async fn query_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<QueryResponse>, ApiError> {
    let request: QueryRequest = serde_json::from_slice(&body).unwrap_or_default();

    let query = request.query.as_ref().and_then(Value::as_str);
    let difficulty = Difficulty::coerce(request.difficulty.as_ref().and_then(Value::as_str));

    let response = state.service.answer(query, difficulty).await?;
    tracing::info!(
        query = %response.query,
        difficulty = %response.difficulty,
        resources = response.resources.len(),
        images = response.images.len(),
        "Query answered"
    );
    Ok(Json(response))
}

async fn export_pdf_handler(body: Bytes) -> Result<Response, ApiError> {
    let response: QueryResponse = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation("body", &format!("Invalid export payload: {}", e)))?;

    let pdf = render_pdf(&response, chrono::Utc::now().date_naive());
    let disposition = format!("attachment; filename=\"{}\"", export_filename(&response.query));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// `infoquest-<slug>.pdf`, where the slug keeps ASCII alphanumerics and joins the rest with dashes.
pub fn export_filename(query: &str) -> String {
    let slug = query
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "infoquest.pdf".to_string()
    } else {
        format!("infoquest-{}.pdf", slug)
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the application router.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/query", post(query_handler))
        .route("/api/export/pdf", post(export_pdf_handler))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C.
pub async fn serve(config: &Config) -> Result<(), AppError> {
    let service = QueryService::from_config(config)?;
    let app = build_router(
        AppState {
            service: Arc::new(service),
        },
        &config.server.allowed_origins,
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", config.server.bind_addr, e)))?;

    tracing::info!(addr = %config.server.bind_addr, "InfoQuest server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("InfoQuest server stopped");
    Ok(())
}
