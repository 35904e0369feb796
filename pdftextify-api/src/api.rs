use crate::config::ServerConfig;
use crate::error::AppError;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Json, Multipart, Request, State},
    handler::HandlerWithoutStateExt,
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use pdftextify::{is_pdf_filename, ocr_output_filename, OcrRunner};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceExt;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

/// Usage hint returned by `GET /ocrpdf`
pub const OCRPDF_USAGE: &str = "Use POST multipart form-data with 'file' field containing PDF.";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    runner: Arc<OcrRunner>,
    static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(runner: OcrRunner, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner: Arc::new(runner),
            static_dir: Arc::new(static_dir.into()),
        }
    }
}

/// Build the application router with all routes configured
pub fn app(config: &ServerConfig) -> Router {
    let routes = routes(config);

    routes
        .clone()
        .layer(config.cors_layer())
        .layer(middleware::from_fn_with_state(routes, skip_cors_for_plain_options))
        .layer(TraceLayer::new_for_http())
}

/// Routes without CORS handling
fn routes(config: &ServerConfig) -> Router {
    let state = AppState::new(config.ocr_runner(), config.static_dir.clone());
    let static_files =
        ServeDir::new(config.static_dir.as_path()).not_found_service(not_found.into_service());

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        // Both spellings are served so clients need not care about the slash
        .route("/ocrpdf", ocrpdf_routes())
        .route("/ocrpdf/", ocrpdf_routes())
        .nest_service("/static", static_files)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .with_state(state)
}

/// `CorsLayer` answers every OPTIONS request. Only real preflights (those
/// carrying `Access-Control-Request-Method`) go to it; plain OPTIONS
/// requests are routed to the handlers.
async fn skip_cors_for_plain_options(
    State(routes): State<Router>,
    request: Request,
    next: Next,
) -> Response {
    let preflight = request
        .headers()
        .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);
    if request.method() != Method::OPTIONS || preflight {
        return next.run(request).await;
    }

    match routes.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn ocrpdf_routes() -> MethodRouter<AppState> {
    get(ocrpdf_info).options(ocrpdf_options).post(ocrpdf)
}

/// Serve `index.html` from the static directory
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(AppError::NotFound("index.html not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "PDFTextify API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn ocrpdf_options() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn ocrpdf_info() -> impl IntoResponse {
    Json(serde_json::json!({ "detail": OCRPDF_USAGE }))
}

/// OCR an uploaded PDF and return the searchable PDF/A as an attachment
pub async fn ocrpdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart.map_err(AppError::InvalidForm)?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        // Reject by name before pulling the body
        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_pdf_filename(&filename) {
            return Err(AppError::NotPdf);
        }

        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or(AppError::MissingFile)?;
    info!(%filename, bytes = data.len(), "received upload");

    let started = Instant::now();
    let searchable = state.runner.process(&data).await?;
    let output_name = ocr_output_filename(&filename);

    info!(
        %filename,
        output = %output_name,
        bytes = searchable.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "OCR complete"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&output_name)),
        ],
        searchable,
    )
        .into_response())
}

/// `attachment` disposition for `filename`. Header values must be visible
/// ASCII, so other characters are replaced in `filename` and the exact name
/// is carried in `filename*` (RFC 6266).
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition("scan_ocr.pdf"),
            "attachment; filename=\"scan_ocr.pdf\""
        );
        assert_eq!(
            content_disposition("my scan_ocr.pdf"),
            "attachment; filename=\"my scan_ocr.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        assert_eq!(
            content_disposition("café_ocr.pdf"),
            "attachment; filename=\"caf__ocr.pdf\"; filename*=UTF-8''caf%C3%A9_ocr.pdf"
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("a\"b_ocr.pdf"),
            "attachment; filename=\"a_b_ocr.pdf\"; filename*=UTF-8''a%22b_ocr.pdf"
        );
    }
}
