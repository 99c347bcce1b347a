// Statistics lookup: player name -> recent season record.
//
// The CSV source reads a career-stats table with one row per player season
// (nba_api `PlayerCareerStats` column names). The file is re-read on every
// lookup, on a blocking worker.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{recent_seasons, RawSeasonLine, SeasonStatsRecord};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("stats worker failed: {0}")]
    Worker(String),
}

// ---------------------------------------------------------------------------
// Source seam
// ---------------------------------------------------------------------------

/// Anything that can produce a player's recent season record.
///
/// An unknown player is not an error: implementations return an empty
/// record.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn season_stats(&self, player_name: &str) -> Result<SeasonStatsRecord, StatsError>;
}

// ---------------------------------------------------------------------------
// CSV-backed source
// ---------------------------------------------------------------------------

/// Career-stats CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawCareerRow {
    PLAYER_NAME: String,
    SEASON_ID: String,
    #[serde(default)]
    GP: Option<f64>,
    #[serde(default)]
    FG_PCT: Option<f64>,
    #[serde(default)]
    FT_PCT: Option<f64>,
    #[serde(default)]
    FG3M: Option<f64>,
    #[serde(default)]
    REB: Option<f64>,
    #[serde(default)]
    AST: Option<f64>,
    #[serde(default)]
    STL: Option<f64>,
    #[serde(default)]
    BLK: Option<f64>,
    #[serde(default)]
    TOV: Option<f64>,
    #[serde(default)]
    PTS: Option<f64>,
}

impl RawCareerRow {
    fn into_line(self) -> RawSeasonLine {
        let gp = self.GP.unwrap_or(0.0);
        RawSeasonLine {
            season: self.SEASON_ID.trim().to_string(),
            games_played: if gp.is_finite() && gp > 0.0 {
                gp.round() as u32
            } else {
                0
            },
            fg_pct: self.FG_PCT.unwrap_or(0.0),
            ft_pct: self.FT_PCT.unwrap_or(0.0),
            threes_made: self.FG3M.unwrap_or(0.0),
            rebounds: self.REB.unwrap_or(0.0),
            assists: self.AST.unwrap_or(0.0),
            steals: self.STL.unwrap_or(0.0),
            blocks: self.BLK.unwrap_or(0.0),
            turnovers: self.TOV.unwrap_or(0.0),
            points: self.PTS.unwrap_or(0.0),
        }
    }
}

/// Statistics source backed by a career-stats CSV file.
#[derive(Debug, Clone)]
pub struct CsvStatsSource {
    path: PathBuf,
}

impl CsvStatsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvStatsSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StatsSource for CsvStatsSource {
    async fn season_stats(&self, player_name: &str) -> Result<SeasonStatsRecord, StatsError> {
        let path = self.path.clone();
        let name = player_name.to_string();
        tokio::task::spawn_blocking(move || lookup_from_file(&path, &name))
            .await
            .map_err(|e| StatsError::Worker(e.to_string()))?
    }
}

fn lookup_from_file(path: &Path, player_name: &str) -> Result<SeasonStatsRecord, StatsError> {
    let path_str = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| StatsError::Io {
        path: path_str.clone(),
        source: e,
    })?;
    lookup_from_reader(file, player_name).map_err(|e| StatsError::Csv {
        path: path_str,
        source: e,
    })
}

/// Resolve `player_name` against the rows in `rdr` and normalize that
/// player's most recent seasons.
///
/// Resolution is a case-insensitive match on the trimmed full name; the
/// first matching row fixes the canonical name. Malformed rows are skipped.
pub(crate) fn lookup_from_reader<R: Read>(
    rdr: R,
    player_name: &str,
) -> Result<SeasonStatsRecord, csv::Error> {
    let wanted = player_name.trim().to_lowercase();
    if wanted.is_empty() {
        return Ok(SeasonStatsRecord::new());
    }

    let mut reader = csv::Reader::from_reader(rdr);
    let mut canonical: Option<String> = None;
    let mut lines = Vec::new();

    for result in reader.deserialize::<RawCareerRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping malformed stats row: {}", e);
                continue;
            }
        };
        let row_name = row.PLAYER_NAME.trim();
        let is_match = match &canonical {
            Some(name) => row_name == name,
            None => row_name.to_lowercase() == wanted,
        };
        if !is_match {
            continue;
        }
        if canonical.is_none() {
            canonical = Some(row_name.to_string());
        }
        lines.push(row.into_line());
    }

    match canonical {
        Some(name) => {
            debug!(player = %name, seasons = lines.len(), "resolved player stats");
            Ok(recent_seasons(&lines))
        }
        None => {
            debug!(player = player_name, "player not found in stats table");
            Ok(SeasonStatsRecord::new())
        }
    }
}
