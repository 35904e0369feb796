//! # pdftextify
//!
//! Turns scanned PDFs into searchable PDF/A documents by delegating to the
//! [`ocrmypdf`](https://ocrmypdf.readthedocs.io) command-line tool.
//!
//! The crate does no OCR itself. It owns the glue around the external tool:
//!
//! - **Argument set**: a fixed, reproducible `ocrmypdf` invocation ([`OcrOptions`])
//! - **Tool environment**: PATH / LD_LIBRARY_PATH augmentation for a bundled
//!   `jbig2enc` encoder ([`ToolEnvironment`])
//! - **Execution**: staging, subprocess with timeout, exit status checks ([`OcrRunner`])
//! - **Naming**: upload validation and output file names
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdftextify::{OcrOptions, OcrRunner, ToolEnvironment};
//!
//! # async fn demo() -> pdftextify::Result<()> {
//! let env = ToolEnvironment::from_process().with_helper_dir("tools/jbig2enc");
//! let runner = OcrRunner::new("ocrmypdf", OcrOptions::default(), env);
//!
//! let scanned = std::fs::read("scan.pdf")?;
//! let searchable = runner.process(&scanned).await?;
//! std::fs::write("scan_ocr.pdf", searchable)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod naming;
pub mod ocr;
pub mod tools;

pub use error::{OcrError, Result};
pub use naming::{is_pdf_filename, ocr_output_filename};
pub use ocr::{OcrOptions, OcrRunner, OutputType, DEFAULT_LANGUAGE, DEFAULT_TIMEOUT};
pub use tools::{find_executable, ToolEnvironment};
