// Read-only tool operations exposed to the transports.
//
// None of these touch a session's draft state; they can be served from any
// connection at any time.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::context::{ContextAggregator, ContextError};
use crate::protocol::ToolCall;
use crate::stats::source::{StatsError, StatsSource};
use crate::stats::SeasonStatsRecord;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct DraftTools {
    stats: Arc<dyn StatsSource>,
    context: Arc<ContextAggregator>,
}

impl DraftTools {
    pub fn new(stats: Arc<dyn StatsSource>, context: Arc<ContextAggregator>) -> Self {
        DraftTools { stats, context }
    }

    /// Recent-season stats for a player; empty when the name does not
    /// resolve.
    pub async fn fetch_player_stats(
        &self,
        player_name: &str,
    ) -> Result<SeasonStatsRecord, StatsError> {
        self.stats.season_stats(player_name).await
    }

    /// Team-building strategy followed by the league rules.
    pub async fn draft_strategy(&self) -> Result<String, ContextError> {
        self.context.draft_strategy().await
    }

    /// Extracted text of the scouting documents.
    pub async fn reference_context(&self) -> Result<String, ContextError> {
        self.context.reference_documents().await
    }

    /// Run a tool call and encode its result as JSON.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Value, ToolError> {
        info!(?call, "tool call");
        let value = match call {
            ToolCall::FetchPlayerStats { player_name } => {
                serde_json::to_value(self.fetch_player_stats(player_name).await?)?
            }
            ToolCall::DraftStrategy => Value::String(self.draft_strategy().await?),
            ToolCall::ReferenceContext => Value::String(self.reference_context().await?),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::extractor::PdfTextExtractor;
    use crate::stats::source::CsvStatsSource;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct BrokenStats;

    #[async_trait]
    impl StatsSource for BrokenStats {
        async fn season_stats(&self, _player_name: &str) -> Result<SeasonStatsRecord, StatsError> {
            Err(StatsError::Worker("worker panicked".into()))
        }
    }

    fn fixture_stats() -> Arc<dyn StatsSource> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/career_stats.csv");
        Arc::new(CsvStatsSource::new(path))
    }

    fn context_in(name: &str) -> (PathBuf, Arc<ContextAggregator>) {
        let tmp = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(tmp.join("resources")).unwrap();
        std::fs::write(tmp.join("strategy.txt"), "Build around bigs.").unwrap();
        std::fs::write(tmp.join("rules.txt"), "Nine categories.").unwrap();
        let agg = ContextAggregator::new(
            tmp.join("resources"),
            tmp.join("strategy.txt"),
            tmp.join("rules.txt"),
            Arc::new(PdfTextExtractor),
        );
        (tmp, Arc::new(agg))
    }

    #[tokio::test]
    async fn fetch_player_stats_returns_category_json() {
        let (tmp, context) = context_in("hoopcast_tools_stats");
        let tools = DraftTools::new(fixture_stats(), context);

        let value = tools
            .dispatch(&ToolCall::FetchPlayerStats {
                player_name: "test center".into(),
            })
            .await
            .unwrap();

        assert_eq!(value["2022-23"]["G"], 80.0);
        assert_eq!(value["2022-23"]["TRB"], 12.0);
        assert_eq!(value["2022-23"]["BLK"], 2.5);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn unknown_player_is_an_empty_object() {
        let (tmp, context) = context_in("hoopcast_tools_unknown");
        let tools = DraftTools::new(fixture_stats(), context);

        let record = tools.fetch_player_stats("Nobody Special").await.unwrap();
        assert!(record.is_empty());

        let value = tools
            .dispatch(&ToolCall::FetchPlayerStats {
                player_name: "Nobody Special".into(),
            })
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({}));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn strategy_and_reference_text() {
        let (tmp, context) = context_in("hoopcast_tools_text");
        let tools = DraftTools::new(fixture_stats(), context);

        assert_eq!(
            tools.dispatch(&ToolCall::DraftStrategy).await.unwrap(),
            Value::String("Build around bigs.\nNine categories.".into())
        );
        assert_eq!(
            tools.dispatch(&ToolCall::ReferenceContext).await.unwrap(),
            Value::String(String::new())
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn source_failures_surface_as_errors() {
        let (tmp, context) = context_in("hoopcast_tools_errors");
        std::fs::remove_file(tmp.join("rules.txt")).unwrap();
        let tools = DraftTools::new(Arc::new(BrokenStats), context);

        let err = tools
            .dispatch(&ToolCall::FetchPlayerStats {
                player_name: "Test Guard".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Stats(_)));
        assert_eq!(err.to_string(), "stats worker failed: worker panicked");

        let err = tools.dispatch(&ToolCall::DraftStrategy).await.unwrap_err();
        assert!(matches!(err, ToolError::Context(ContextError::Asset { .. })));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
