//! # pdftextify-api
//!
//! HTTP service that OCRs uploaded PDFs into searchable PDF/A
//!

mod api;
mod config;
mod error;

pub use api::{
    app, health_check, index, ocrpdf, ocrpdf_info, ocrpdf_options, AppState, OCRPDF_USAGE,
};
pub use config::ServerConfig;
pub use error::{AppError, ErrorResponse};
