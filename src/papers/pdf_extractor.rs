//! PDF text extraction wrapper
//!
//! Wraps pdf-extract crate with error handling for:
//! - Non-PDF uploads
//! - Encrypted or corrupted PDFs (reported as decode errors, never panics)

use crate::error::{LabError, LabResult};

pub trait DocumentDecoder: Send + Sync {
    /// Text of every page, in page order. Pages without text yield "".
    fn page_texts(&self, document: &[u8]) -> LabResult<Vec<String>>;
}

/// Decoder backed by pdf-extract
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractDecoder;

impl DocumentDecoder for PdfExtractDecoder {
    fn page_texts(&self, document: &[u8]) -> LabResult<Vec<String>> {
        // Validate PDF magic bytes
        if document.len() < 4 || &document[0..4] != b"%PDF" {
            return Err(LabError::Decode("upload is not a PDF document".to_string()));
        }

        // pdf-extract panics on some malformed streams
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(document))
            .map_err(|_| LabError::Decode("PDF parser crashed on malformed input".to_string()))?;

        let pages = extracted.map_err(|e| LabError::Decode(format!("{:?}", e)))?;
        tracing::debug!(pages = pages.len(), "Extracted PDF pages");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = PdfExtractDecoder.page_texts(b"hello, not a pdf").unwrap_err();
        assert!(matches!(err, LabError::Decode(_)));
    }

    #[test]
    fn test_rejects_empty_upload() {
        assert!(matches!(PdfExtractDecoder.page_texts(b""), Err(LabError::Decode(_))));
    }

    #[test]
    fn test_truncated_pdf_is_decode_error() {
        let err = PdfExtractDecoder.page_texts(b"%PDF-1.4\n1 0 obj\n<<").unwrap_err();
        assert!(matches!(err, LabError::Decode(_)));
    }
}
