// Document text extraction (path -> text).

use std::path::{Path, PathBuf};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to extract text from {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Turns a reference document into plain text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// PDF text extraction via `pdf-extract`, run on a blocking worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl DocumentExtractor for PdfTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&owned).map_err(|e| ExtractError::Extraction {
                path: owned.clone(),
                message: e.to_string(),
            })
        })
        .await
        .map_err(|e| ExtractError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_pdf_input_is_an_extraction_error() {
        let tmp = std::env::temp_dir().join("hoopcast_extractor_not_pdf.pdf");
        std::fs::write(&tmp, b"plain text pretending to be a pdf").unwrap();

        let result = PdfTextExtractor.extract_text(&tmp).await;
        assert!(result.is_err(), "garbage input should not extract: {result:?}");

        let _ = std::fs::remove_file(&tmp);
    }
}
