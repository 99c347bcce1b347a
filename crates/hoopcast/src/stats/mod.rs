// Per-season player statistics in the fixed fantasy category layout.
//
// Raw season lines carry season totals; the normalizer converts counting
// stats to per-game rates and rounds everything to two decimals.

pub mod source;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category keys in their fixed order.
pub const CATEGORIES: [&str; 10] = [
    "G", "FG%", "3P", "FT%", "TRB", "AST", "STL", "BLK", "TOV", "PTS",
];

/// How many of a player's most recent seasons are reported.
pub const MAX_SEASONS: usize = 3;

/// One season of a player's numbers, keyed by category.
///
/// `G` is games played and the two percentages are season rates; every
/// other category is a per-game average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatCategoryVector {
    #[serde(rename = "G")]
    pub games: f64,
    #[serde(rename = "FG%")]
    pub fg_pct: f64,
    #[serde(rename = "3P")]
    pub threes: f64,
    #[serde(rename = "FT%")]
    pub ft_pct: f64,
    #[serde(rename = "TRB")]
    pub rebounds: f64,
    #[serde(rename = "AST")]
    pub assists: f64,
    #[serde(rename = "STL")]
    pub steals: f64,
    #[serde(rename = "BLK")]
    pub blocks: f64,
    #[serde(rename = "TOV")]
    pub turnovers: f64,
    #[serde(rename = "PTS")]
    pub points: f64,
}

impl StatCategoryVector {
    /// Look a value up by its category key.
    pub fn get(&self, category: &str) -> Option<f64> {
        let value = match category {
            "G" => self.games,
            "FG%" => self.fg_pct,
            "3P" => self.threes,
            "FT%" => self.ft_pct,
            "TRB" => self.rebounds,
            "AST" => self.assists,
            "STL" => self.steals,
            "BLK" => self.blocks,
            "TOV" => self.turnovers,
            "PTS" => self.points,
            _ => return None,
        };
        Some(value)
    }
}

/// Season identifier (e.g. "2023-24") to that season's categories.
pub type SeasonStatsRecord = BTreeMap<String, StatCategoryVector>;

/// A season of raw totals as reported by the statistics source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeasonLine {
    pub season: String,
    pub games_played: u32,
    pub fg_pct: f64,
    pub ft_pct: f64,
    pub threes_made: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub points: f64,
}

/// Convert raw season totals into the category vector.
///
/// A season with zero games reports `G = 1` and divides by one.
pub fn normalize(line: &RawSeasonLine) -> StatCategoryVector {
    let denom = f64::from(line.games_played.max(1));
    let per_game = |total: f64| round2(total / denom);

    StatCategoryVector {
        games: denom,
        fg_pct: round2(line.fg_pct),
        threes: per_game(line.threes_made),
        ft_pct: round2(line.ft_pct),
        rebounds: per_game(line.rebounds),
        assists: per_game(line.assists),
        steals: per_game(line.steals),
        blocks: per_game(line.blocks),
        turnovers: per_game(line.turnovers),
        points: per_game(line.points),
    }
}

/// Build a record from a player's season lines in chronological order,
/// keeping only the most recent `MAX_SEASONS`.
pub fn recent_seasons(lines: &[RawSeasonLine]) -> SeasonStatsRecord {
    let start = lines.len().saturating_sub(MAX_SEASONS);
    lines[start..]
        .iter()
        .map(|line| (line.season.clone(), normalize(line)))
        .collect()
}

fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}
