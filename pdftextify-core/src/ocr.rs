//! ocrmypdf invocation
//!
//! Builds the fixed argument set, stages the upload in a scratch directory,
//! runs the tool under a timeout and collects the searchable PDF.

use crate::error::{OcrError, Result};
use crate::tools::{find_executable, ToolEnvironment};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Default OCR languages (Indonesian and English)
pub const DEFAULT_LANGUAGE: &str = "ind+eng";

/// Upper bound for a single ocrmypdf run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Maximum number of characters of tool output carried in an error
pub const MAX_ERROR_DETAIL: usize = 4000;

const SCRATCH_PREFIX: &str = "pdftextify";
const INPUT_FILE: &str = "input.pdf";
const OUTPUT_FILE: &str = "output.pdf";

/// Output flavour requested from ocrmypdf (`--output-type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    /// Plain PDF
    Pdf,
    /// PDF/A with the tool's default part
    PdfA,
    /// PDF/A-1b
    PdfA1,
    /// PDF/A-2b
    #[default]
    PdfA2,
    /// PDF/A-3b
    PdfA3,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputType::Pdf => "pdf",
            OutputType::PdfA => "pdfa",
            OutputType::PdfA1 => "pdfa-1",
            OutputType::PdfA2 => "pdfa-2",
            OutputType::PdfA3 => "pdfa-3",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pdf" => Ok(OutputType::Pdf),
            "pdfa" => Ok(OutputType::PdfA),
            "pdfa-1" => Ok(OutputType::PdfA1),
            "pdfa-2" => Ok(OutputType::PdfA2),
            "pdfa-3" => Ok(OutputType::PdfA3),
            other => Err(OcrError::InvalidOutputType(other.to_string())),
        }
    }
}

/// Options for an OCR run
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOptions {
    /// Tesseract language spec, `+`-separated
    pub language: String,
    /// Fix page orientation
    pub rotate_pages: bool,
    /// Straighten skewed scans
    pub deskew: bool,
    /// Resample images to this DPI before OCR
    pub oversample: Option<u32>,
    /// Optimization level (0-3)
    pub optimize: u8,
    /// Output flavour
    pub output_type: OutputType,
    /// Rasterize and OCR every page, even those that already carry text
    pub force_ocr: bool,
    /// Maximum wall-clock time for the subprocess
    pub timeout: Duration,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            rotate_pages: true,
            deskew: true,
            oversample: Some(300),
            optimize: 3,
            output_type: OutputType::PdfA2,
            force_ocr: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OcrOptions {
    /// Command-line arguments for converting `input` into `output`
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--language".into(), self.language.clone().into()];
        if self.rotate_pages {
            args.push("--rotate-pages".into());
        }
        if self.deskew {
            args.push("--deskew".into());
        }
        if let Some(dpi) = self.oversample {
            args.push("--oversample".into());
            args.push(dpi.to_string().into());
        }
        args.push("--optimize".into());
        args.push(self.optimize.to_string().into());
        args.push("--output-type".into());
        args.push(self.output_type.as_str().into());
        if self.force_ocr {
            args.push("--force-ocr".into());
        }
        args.push(input.into());
        args.push(output.into());
        args
    }
}

/// Runs ocrmypdf with a fixed option set
#[derive(Debug, Clone)]
pub struct OcrRunner {
    program: String,
    options: OcrOptions,
    env: ToolEnvironment,
    scratch_dir: Option<PathBuf>,
}

impl OcrRunner {
    /// Create a runner. `program` is either a bare name looked up in the
    /// environment's PATH or a path to the executable.
    pub fn new(program: impl Into<String>, options: OcrOptions, env: ToolEnvironment) -> Self {
        Self {
            program: program.into(),
            options,
            env,
            scratch_dir: None,
        }
    }

    /// Stage uploads under `dir` instead of the system temp directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn options(&self) -> &OcrOptions {
        &self.options
    }

    pub fn environment(&self) -> &ToolEnvironment {
        &self.env
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    /// Locate the executable using the runner's PATH
    pub fn resolve_executable(&self) -> Result<PathBuf> {
        find_executable(&self.program, self.env.path())
            .ok_or_else(|| OcrError::ExecutableNotFound(self.program.clone()))
    }

    /// OCR a PDF held in memory and return the searchable result.
    ///
    /// The executable is resolved before anything is written to disk. The
    /// scratch directory is removed when this returns, on every path.
    pub async fn process(&self, pdf: &[u8]) -> Result<Vec<u8>> {
        let executable = self.resolve_executable()?;

        let workdir = match &self.scratch_dir {
            Some(dir) => TempDir::with_prefix_in(SCRATCH_PREFIX, dir)?,
            None => TempDir::with_prefix(SCRATCH_PREFIX)?,
        };
        let input = workdir.path().join(INPUT_FILE);
        let output = workdir.path().join(OUTPUT_FILE);

        tokio::fs::write(&input, pdf).await?;
        self.run_with(&executable, &input, &output).await?;
        let searchable = tokio::fs::read(&output).await?;

        Ok(searchable)
    }

    /// Run the tool on files already on disk
    pub async fn run(&self, input: &Path, output: &Path) -> Result<()> {
        let executable = self.resolve_executable()?;
        self.run_with(&executable, input, output).await
    }

    async fn run_with(&self, executable: &Path, input: &Path, output: &Path) -> Result<()> {
        let args = self.options.args(input, output);
        debug!(executable = %executable.display(), ?args, "running ocrmypdf");

        let mut command = Command::new(executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.env.apply(&mut command);

        let started = Instant::now();
        let child = command.spawn().map_err(OcrError::Spawn)?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let finished = tokio::time::timeout(self.options.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(timeout_secs = self.options.timeout.as_secs(), "ocrmypdf timed out");
                OcrError::Timeout(self.options.timeout)
            })?
            .map_err(OcrError::Spawn)?;

        let produced = tokio::fs::try_exists(output).await.unwrap_or(false);
        if !finished.status.success() || !produced {
            let detail = failure_detail(&finished.stderr, &finished.stdout);
            warn!(
                code = ?finished.status.code(),
                produced,
                %detail,
                "ocrmypdf failed"
            );
            return Err(OcrError::Failed {
                code: finished.status.code(),
                detail,
            });
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "ocrmypdf finished");
        Ok(())
    }
}

/// Error text from a failed run: stderr if anything was written there,
/// stdout otherwise, trimmed and capped at [`MAX_ERROR_DETAIL`] characters.
pub fn failure_detail(stderr: &[u8], stdout: &[u8]) -> String {
    let raw = if stderr.is_empty() { stdout } else { stderr };
    String::from_utf8_lossy(raw)
        .trim()
        .chars()
        .take(MAX_ERROR_DETAIL)
        .collect()
}
