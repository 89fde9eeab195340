//! HTTP surface of the catalog backend.
//!
//! # Endpoints
//!
//! - `GET /health` - readiness and catalog size
//! - `POST /tattoos/` - multipart upload (`name`, `description`, `file`)
//! - `GET /tattoos` - list the catalog
//! - `GET /tattoos/:id` - fetch one record
//! - `POST /recommend` - semantic recommendations for `user_input`
//! - `POST /llm_idea` - tattoo idea from the local LLM
//! - `POST /generate_image` - prompt for an external image service
//! - `POST /generate_image_local` - placeholder artwork as a data URL
//! - `GET /uploads/*` - uploaded images

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path,
        State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info, warn};

use crate::{
    application::{
        CatalogService, HealthStatusResponse, IdeaResponse, ImageDataResponse,
        ImagePromptResponse, PromptRequest, RecommendRequest, RecommendationDto, StudioService,
        TattooDto,
    },
    domain::{DomainError, NewTattoo},
    settings::ServerSettings,
};

/// Prefix under which uploaded images are served.
pub const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub studio: Arc<StudioService>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// `DomainError` rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_)
            | DomainError::LimitExceeded(_)
            | DomainError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::EmbeddingUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Upstream(_) => StatusCode::BAD_GATEWAY,
            DomainError::Storage(_) | DomainError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.0.code(), "request failed: {}", self.0);
        } else {
            warn!(code = self.0.code(), "request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Prefixes `image` with `/uploads/` unless it already carries it.
pub fn servable_image_path(image: &str) -> String {
    if image.starts_with(UPLOADS_PREFIX) {
        image.to_string()
    } else {
        format!("{UPLOADS_PREFIX}{image}")
    }
}

/// Runs synchronous service code on the blocking pool.
async fn blocking<T, F>(task: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> std::result::Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| DomainError::other(format!("blocking task failed: {err}")))?
        .map_err(ApiError::from)
}

fn prompt_body(
    payload: std::result::Result<Json<PromptRequest>, JsonRejection>,
) -> std::result::Result<PromptRequest, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| DomainError::validation(rejection.body_text()).into())
}

async fn health_check(State(state): State<AppState>) -> ApiResult<HealthStatusResponse> {
    let catalog = Arc::clone(&state.catalog);
    blocking(move || catalog.health()).await.map(Json)
}

async fn upload_tattoo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<TattooDto> {
    let mut name = None;
    let mut description = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "description" => description = Some(field.text().await.map_err(multipart_error)?),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| DomainError::validation("name is required"))?;
    let description =
        description.ok_or_else(|| DomainError::validation("description is required"))?;
    let (file_name, bytes) = file.ok_or_else(|| DomainError::validation("file is required"))?;

    let catalog = Arc::clone(&state.catalog);
    let record = blocking(move || {
        catalog.upload(NewTattoo {
            name,
            description,
            file_name,
            bytes,
        })
    })
    .await?;

    info!(id = record.id, "tattoo saved");
    Ok(Json(record.into()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::limit(format!("upload too large: {}", err.body_text())).into()
    } else {
        DomainError::validation(format!("malformed upload: {}", err.body_text())).into()
    }
}

async fn list_tattoos(State(state): State<AppState>) -> ApiResult<Vec<TattooDto>> {
    let catalog = Arc::clone(&state.catalog);
    let records = blocking(move || catalog.list()).await?;
    Ok(Json(records.into_iter().map(TattooDto::from).collect()))
}

async fn get_tattoo(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<TattooDto> {
    let catalog = Arc::clone(&state.catalog);
    let record = blocking(move || catalog.get(id)).await?;
    Ok(Json(record.into()))
}

async fn recommend(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RecommendRequest>, JsonRejection>,
) -> ApiResult<Vec<RecommendationDto>> {
    let Json(request) =
        payload.map_err(|rejection| DomainError::invalid_query(rejection.body_text()))?;

    let catalog = Arc::clone(&state.catalog);
    let results = blocking(move || match request.top_k {
        Some(top_k) => catalog.recommend_top(&request.user_input, top_k),
        None => catalog.recommend(&request.user_input),
    })
    .await?;

    Ok(Json(
        results
            .into_iter()
            .map(|result| {
                let mut dto = RecommendationDto::from(result);
                dto.image = servable_image_path(&dto.image);
                dto
            })
            .collect(),
    ))
}

async fn llm_idea(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PromptRequest>, JsonRejection>,
) -> ApiResult<IdeaResponse> {
    let request = prompt_body(payload)?;
    let studio = Arc::clone(&state.studio);
    blocking(move || studio.generate_idea(&request.user_input))
        .await
        .map(Json)
}

async fn generate_image(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PromptRequest>, JsonRejection>,
) -> ApiResult<ImagePromptResponse> {
    let request = prompt_body(payload)?;
    state
        .studio
        .describe_image_request(&request.user_input)
        .map(Json)
        .map_err(ApiError::from)
}

async fn generate_image_local(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PromptRequest>, JsonRejection>,
) -> ApiResult<ImageDataResponse> {
    let request = prompt_body(payload)?;
    let studio = Arc::clone(&state.studio);
    blocking(move || studio.render_placeholder(&request.user_input))
        .await
        .map(Json)
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid CORS origin `{origin}`"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn router(state: AppState, settings: &ServerSettings) -> Result<Router> {
    let uploads = ServeDir::new(state.catalog.uploads_root());

    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/tattoos", post(upload_tattoo).get(list_tattoos))
        .route("/tattoos/", post(upload_tattoo).get(list_tattoos))
        .route("/tattoos/:id", get(get_tattoo))
        .route("/recommend", post(recommend))
        .route("/llm_idea", post(llm_idea))
        .route("/generate_image", post(generate_image))
        .route("/generate_image_local", post(generate_image_local))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(settings.max_upload_bytes))
        .layer(cors_layer(&settings.cors_origin)?)
        .with_state(state))
}
