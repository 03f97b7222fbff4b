use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};
use inference::LocateRequest;
use locator::{FocalLength, LocationReport};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    tracing::info!("HTTP server listening on {}", config.addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "Server is running" }))
}

/// Fields of a `/predict` upload.
#[derive(Debug)]
struct PredictUpload {
    image: Bytes,
    request: LocateRequest,
}

impl PredictUpload {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut image = None;
        let mut request = LocateRequest::default();

        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some("image") => {
                    let has_filename = field.file_name().is_some_and(|name| !name.is_empty());
                    if !has_filename {
                        return Err(ApiError::InvalidInput("No selected file".into()));
                    }
                    image = Some(field.bytes().await?);
                }
                Some("focal_length_px") => {
                    let px = parse_number("focal_length_px", &field.text().await?)?;
                    let focal = FocalLength::new(px)
                        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
                    request.focal_length = Some(focal);
                }
                Some("bearing_deg") => {
                    request.bearing_deg = Some(parse_number("bearing_deg", &field.text().await?)?);
                }
                other => {
                    tracing::debug!(field = ?other, "Ignoring unknown multipart field");
                }
            }
        }

        let image = image.ok_or_else(|| ApiError::InvalidInput("No image uploaded".into()))?;
        if image.is_empty() {
            return Err(ApiError::InvalidInput("Uploaded file is empty".into()));
        }

        Ok(Self { image, request })
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, ApiError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::InvalidInput(format!("{} must be a finite number", field)))
}

async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LocationReport>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Upload is not multipart");
        ApiError::InvalidInput("No image uploaded".into())
    })?;
    let upload = PredictUpload::from_multipart(multipart).await?;
    tracing::debug!(bytes = upload.image.len(), "Photo received");

    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&upload.image)
            .map_err(|e| ApiError::InvalidInput(format!("Could not decode image: {}", e)))?
            .to_rgb8();

        service
            .locate(&image, &upload.request)
            .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Inference task failed: {}", e)))??;

    Ok(Json(report))
}
