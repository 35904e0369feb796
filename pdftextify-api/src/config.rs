//! Server configuration
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! service can be configured from a `.env` file, the process environment or
//! the command line.

use axum::http::HeaderValue;
use clap::Parser;
use pdftextify::{OcrOptions, OcrRunner, OutputType, ToolEnvironment, DEFAULT_LANGUAGE};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_TOOLS_DIR: &str = "tools/jbig2enc";
const DEFAULT_OCRMYPDF: &str = "ocrmypdf";
const DEFAULT_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:1100", "http://127.0.0.1:1100"];
const DEFAULT_MAX_UPLOAD_MB: usize = 512;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "pdftextify-api",
    about = "OCR uploaded PDFs into searchable PDF/A",
    version
)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "PDFTEXTIFY_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Directory served under /static; its index.html is served at /
    #[arg(long, env = "PDFTEXTIFY_STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    pub static_dir: PathBuf,

    /// Directory holding a local jbig2enc build, added to PATH and LD_LIBRARY_PATH
    #[arg(long, env = "PDFTEXTIFY_TOOLS_DIR", default_value = DEFAULT_TOOLS_DIR)]
    pub tools_dir: PathBuf,

    /// Directory for per-request scratch files; defaults to the system temp directory
    #[arg(long, env = "PDFTEXTIFY_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// ocrmypdf executable name or path
    #[arg(long, env = "PDFTEXTIFY_OCRMYPDF", default_value = DEFAULT_OCRMYPDF)]
    pub ocrmypdf: String,

    /// OCR languages, `+`-separated
    #[arg(long, env = "PDFTEXTIFY_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// ocrmypdf --output-type (pdf, pdfa, pdfa-1, pdfa-2, pdfa-3)
    #[arg(long, env = "PDFTEXTIFY_OUTPUT_TYPE", default_value = "pdfa-2")]
    pub output_type: OutputType,

    /// Seconds before a running OCR job is killed
    #[arg(long, env = "PDFTEXTIFY_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Allowed CORS origins, comma separated; `*` mirrors any origin
    #[arg(
        long,
        env = "PDFTEXTIFY_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:1100,http://127.0.0.1:1100"
    )]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in MiB
    #[arg(long, env = "PDFTEXTIFY_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            tools_dir: PathBuf::from(DEFAULT_TOOLS_DIR),
            scratch_dir: None,
            ocrmypdf: DEFAULT_OCRMYPDF.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            output_type: OutputType::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl ServerConfig {
    /// OCR options with the fixed argument set and the configured overrides
    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions {
            language: self.language.clone(),
            output_type: self.output_type,
            timeout: Duration::from_secs(self.timeout_secs),
            ..OcrOptions::default()
        }
    }

    /// Runner over the process environment, extended with the tools directory
    pub fn ocr_runner(&self) -> OcrRunner {
        let env = ToolEnvironment::from_process().with_helper_dir(&self.tools_dir);
        let runner = OcrRunner::new(self.ocrmypdf.clone(), self.ocr_options(), env);
        match &self.scratch_dir {
            Some(dir) => runner.with_scratch_dir(dir),
            None => runner,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// CORS policy: listed origins with credentials, methods and headers
    /// mirrored from the request. Unparseable origins are skipped.
    pub fn cors_layer(&self) -> CorsLayer {
        let origin = if self.cors_origins.iter().any(|o| o.trim() == "*") {
            AllowOrigin::mirror_request()
        } else {
            let origins: Vec<HeaderValue> = self
                .cors_origins
                .iter()
                .map(|o| o.trim())
                .filter(|o| !o.is_empty())
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = o, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_matches_cli_defaults() {
        let parsed = ServerConfig::try_parse_from(["pdftextify-api"]).unwrap();
        let default = ServerConfig::default();

        // Environment fallbacks can override parsed values; only compare
        // fields when the corresponding variable is unset.
        if std::env::var_os("PDFTEXTIFY_BIND").is_none() {
            assert_eq!(parsed.bind, default.bind);
        }
        if std::env::var_os("PDFTEXTIFY_CORS_ORIGINS").is_none() {
            assert_eq!(parsed.cors_origins, default.cors_origins);
        }
        if std::env::var_os("PDFTEXTIFY_OUTPUT_TYPE").is_none() {
            assert_eq!(parsed.output_type, default.output_type);
        }
        if std::env::var_os("PDFTEXTIFY_TIMEOUT_SECS").is_none() {
            assert_eq!(parsed.timeout_secs, default.timeout_secs);
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "pdftextify-api",
            "--bind",
            "127.0.0.1:9000",
            "--language",
            "eng",
            "--output-type",
            "pdfa-3",
            "--timeout-secs",
            "60",
            "--cors-origins",
            "https://a.example,https://b.example",
        ])
        .unwrap();

        assert_eq!(config.bind, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.output_type, OutputType::PdfA3);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );

        let options = config.ocr_options();
        assert_eq!(options.language, "eng");
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.output_type, OutputType::PdfA3);
        assert_eq!(options.oversample, Some(300));
        assert!(options.force_ocr);
    }

    #[test]
    fn test_invalid_output_type_rejected() {
        let result = ServerConfig::try_parse_from(["pdftextify-api", "--output-type", "tiff"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_ocr_options_match_fixed_set() {
        assert_eq!(ServerConfig::default().ocr_options(), OcrOptions::default());
    }

    #[test]
    fn test_ocr_runner_uses_tools_and_scratch_dirs() {
        let tools = tempfile::TempDir::new().unwrap();
        let config = ServerConfig {
            tools_dir: tools.path().to_path_buf(),
            scratch_dir: Some(PathBuf::from("/srv/pdftextify/scratch")),
            ocrmypdf: "/opt/ocrmypdf/bin/ocrmypdf".to_string(),
            language: "eng".to_string(),
            ..ServerConfig::default()
        };

        let runner = config.ocr_runner();
        assert_eq!(runner.program(), "/opt/ocrmypdf/bin/ocrmypdf");
        assert_eq!(runner.options().language, "eng");
        assert_eq!(
            runner.scratch_dir(),
            Some(std::path::Path::new("/srv/pdftextify/scratch"))
        );

        let path = runner.environment().path().unwrap().to_string_lossy().into_owned();
        assert!(path.starts_with(&*tools.path().to_string_lossy()), "{path}");
        let ld = runner
            .environment()
            .ld_library_path()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(ld.starts_with(&*tools.path().to_string_lossy()), "{ld}");
    }

    #[test]
    fn test_max_upload_bytes() {
        let config = ServerConfig {
            max_upload_mb: 2,
            ..ServerConfig::default()
        };
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }
}
