//! Upload file name handling

/// Whether an uploaded file name looks like a PDF (case-insensitive `.pdf` suffix).
pub fn is_pdf_filename(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// Name of the OCR result for an uploaded file.
///
/// Directory components are dropped, then the last extension is replaced
/// by `_ocr.pdf`. A name without an extension keeps its full stem.
pub fn ocr_output_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    format!("{stem}_ocr.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_pdf_filename() {
        assert!(is_pdf_filename("scan.pdf"));
        assert!(is_pdf_filename("SCAN.PDF"));
        assert!(is_pdf_filename("report.final.Pdf"));
        assert!(!is_pdf_filename("scan.png"));
        assert!(!is_pdf_filename("pdf"));
        assert!(!is_pdf_filename("scan.pdf.zip"));
        assert!(!is_pdf_filename(""));
    }

    #[test]
    fn test_ocr_output_filename() {
        assert_eq!(ocr_output_filename("scan.pdf"), "scan_ocr.pdf");
        assert_eq!(ocr_output_filename("scan.PDF"), "scan_ocr.pdf");
        assert_eq!(ocr_output_filename("a.b.pdf"), "a.b_ocr.pdf");
        assert_eq!(ocr_output_filename("noext"), "noext_ocr.pdf");
    }

    #[test]
    fn test_ocr_output_filename_strips_directories() {
        assert_eq!(ocr_output_filename("dir/sub/scan.pdf"), "scan_ocr.pdf");
        assert_eq!(ocr_output_filename("C:\\Users\\me\\scan.pdf"), "scan_ocr.pdf");
    }

    #[test]
    fn test_ocr_output_filename_keeps_unicode() {
        assert_eq!(ocr_output_filename("dokumen café.pdf"), "dokumen café_ocr.pdf");
    }
}
