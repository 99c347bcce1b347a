// Reference context composition.
//
// Builds the text block that precedes every recommendation prompt: the
// extracted scouting documents followed by the draft-strategy and league-rules
// text. Nothing is cached; every call re-reads and re-extracts.

pub mod extractor;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use extractor::{DocumentExtractor, ExtractError};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Asset {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Composes the reference context from documents and prompt assets.
pub struct ContextAggregator {
    resources_dir: PathBuf,
    strategy_path: PathBuf,
    rules_path: PathBuf,
    extractor: Arc<dyn DocumentExtractor>,
}

impl ContextAggregator {
    pub fn new(
        resources_dir: impl Into<PathBuf>,
        strategy_path: impl Into<PathBuf>,
        rules_path: impl Into<PathBuf>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Self {
        ContextAggregator {
            resources_dir: resources_dir.into(),
            strategy_path: strategy_path.into(),
            rules_path: rules_path.into(),
            extractor,
        }
    }

    pub fn from_config(config: &Config, extractor: Arc<dyn DocumentExtractor>) -> Self {
        Self::new(
            &config.paths.resources_dir,
            &config.paths.strategy_path,
            &config.paths.rules_path,
            extractor,
        )
    }

    /// Extracted text of every PDF in the resources directory, each block
    /// headed by its file name. Files are visited in name order.
    pub async fn reference_documents(&self) -> Result<String, ContextError> {
        let documents = list_pdfs(&self.resources_dir).await?;
        let mut blocks = Vec::with_capacity(documents.len());

        for path in documents {
            let text = self.extractor.extract_text(&path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!(document = %file_name, chars = text.len(), "extracted reference document");
            blocks.push(format!("--- {file_name} ---\n{text}\n"));
        }

        Ok(blocks.join("\n"))
    }

    /// Team-building strategy text followed by the league rules, separated
    /// by a newline.
    pub async fn draft_strategy(&self) -> Result<String, ContextError> {
        let strategy = read_asset(&self.strategy_path).await?;
        let rules = read_asset(&self.rules_path).await?;
        Ok(format!("{strategy}\n{rules}"))
    }

    /// The full reference context. Each section is attempted independently;
    /// a failing section is replaced by an inline error marker.
    pub async fn build_context(&self) -> String {
        let resources = match self.reference_documents().await {
            Ok(text) => format!("Resources:\n{text}"),
            Err(e) => {
                warn!("reference documents unavailable: {}", e);
                format!("Resources: Error fetching: {e}")
            }
        };
        let prompts = match self.draft_strategy().await {
            Ok(text) => format!("Prompts:\n{text}"),
            Err(e) => {
                warn!("draft strategy text unavailable: {}", e);
                format!("Prompts: Error fetching: {e}")
            }
        };
        format!("{resources}\n\n{prompts}")
    }
}

async fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, ContextError> {
    let read_dir_err = |source| ContextError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;
    let mut pdfs = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    Ok(pdfs)
}

async fn read_asset(path: &Path) -> Result<String, ContextError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ContextError::Asset {
            path: path.to_path_buf(),
            source,
        })
}
