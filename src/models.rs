//! Core data models used throughout the archive pipeline.
//!
//! These types are the records that flow from the extractor through the
//! scheduler into the corpus file, and back out again through the query
//! surface. Their serde layout *is* the corpus wire format: field order,
//! key names, and the `YYYY-MM-DDTHH:MM:SS` date encoding are all fixed
//! here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for `game_date` in the corpus. Games carry no time of
/// day, so the time component is always midnight.
pub const GAME_DATE_FORMAT: &str = "%Y-%m-%dT00:00:00";

/// One entry of the corpus: either a fully extracted game or a marker
/// recording why no game could be extracted for an id.
///
/// On the wire both variants share `game_id` and differ by the presence
/// of `error`, so the enum is untagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorpusEntry {
    Game(GameRecord),
    Missing(MissingGame),
}

impl CorpusEntry {
    pub fn game_id(&self) -> u32 {
        match self {
            CorpusEntry::Game(game) => game.game_id,
            CorpusEntry::Missing(missing) => missing.game_id,
        }
    }

    pub fn as_game(&self) -> Option<&GameRecord> {
        match self {
            CorpusEntry::Game(game) => Some(game),
            CorpusEntry::Missing(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CorpusEntry::Missing(_))
    }

    /// The parsed air date, if this is a game whose title carried one.
    pub fn game_date(&self) -> Option<NaiveDate> {
        self.as_game().and_then(|g| g.game_date)
    }
}

impl From<GameRecord> for CorpusEntry {
    fn from(game: GameRecord) -> Self {
        CorpusEntry::Game(game)
    }
}

impl From<MissingGame> for CorpusEntry {
    fn from(missing: MissingGame) -> Self {
        CorpusEntry::Missing(missing)
    }
}

/// A successfully extracted game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameRecord {
    pub game_id: u32,
    pub game_title: String,
    #[serde(with = "game_date_format")]
    pub game_date: Option<NaiveDate>,
    pub game_comments: String,
    pub categories: Vec<String>,
    pub category_comments: Vec<String>,
    pub jeopardy_round: Round,
    pub double_jeopardy_round: Round,
    pub final_jeopardy: FinalRound,
}

impl GameRecord {
    /// `game_date` rendered exactly as it appears in the corpus file.
    pub fn game_date_iso(&self) -> Option<String> {
        self.game_date
            .map(|d| d.format(GAME_DATE_FORMAT).to_string())
    }
}

/// One board of clues. `clues`, `cells` are parallel; `responses` is a
/// prefix-aligned sequence that may be shorter when clues went unrevealed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Round {
    pub clues: Vec<String>,
    pub responses: Vec<String>,
    pub cells: Vec<String>,
}

impl Round {
    pub fn is_empty(&self) -> bool {
        self.clues.is_empty()
    }
}

/// The single closing clue of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalRound {
    pub clue: String,
    pub response: String,
}

/// Marker for an id that produced no game: the upstream reported it
/// absent, it returned a client error, or every fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissingGame {
    pub game_id: u32,
    pub error: String,
}

impl MissingGame {
    pub fn new(game_id: u32, error: impl Into<String>) -> Self {
        Self {
            game_id,
            error: error.into(),
        }
    }
}

mod game_date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::GAME_DATE_FORMAT;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(GAME_DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    // Accepts a bare date as well as the full timestamp; only the date part is kept.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => {
                let date_part = s.split('T').next().unwrap_or_default();
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> GameRecord {
        GameRecord {
            game_id: 7,
            game_title: "Show #1234 - Thursday, September 8, 2011".to_string(),
            game_date: NaiveDate::from_ymd_opt(2011, 9, 8),
            game_comments: "Comments not found".to_string(),
            categories: vec!["HISTORY".to_string()],
            category_comments: vec![String::new()],
            jeopardy_round: Round {
                clues: vec!["clue".to_string()],
                responses: vec!["response".to_string()],
                cells: vec!["J_1_1".to_string()],
            },
            double_jeopardy_round: Round::default(),
            final_jeopardy: FinalRound {
                clue: "final clue".to_string(),
                response: "final response".to_string(),
            },
        }
    }

    #[test]
    fn game_serializes_with_fixed_key_order_and_iso_date() {
        let json = serde_json::to_string(&CorpusEntry::from(sample_game())).unwrap();
        let keys = [
            "\"game_id\"",
            "\"game_title\"",
            "\"game_date\"",
            "\"game_comments\"",
            "\"categories\"",
            "\"category_comments\"",
            "\"jeopardy_round\"",
            "\"double_jeopardy_round\"",
            "\"final_jeopardy\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", json);
        assert!(json.contains("\"game_date\":\"2011-09-08T00:00:00\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn missing_game_has_only_id_and_error() {
        let value = serde_json::to_value(CorpusEntry::from(MissingGame::new(42, "gone"))).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["game_id"], 42);
        assert_eq!(obj["error"], "gone");
    }

    #[test]
    fn null_date_round_trips() {
        let mut game = sample_game();
        game.game_date = None;
        let json = serde_json::to_string(&CorpusEntry::from(game.clone())).unwrap();
        assert!(json.contains("\"game_date\":null"));
        let back: CorpusEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CorpusEntry::Game(game));
    }

    #[test]
    fn untagged_entries_deserialize_to_the_right_variant() {
        let missing: CorpusEntry =
            serde_json::from_str(r#"{"game_id": 3, "error": "No game 3 in database"}"#).unwrap();
        assert!(missing.is_missing());
        assert_eq!(missing.game_id(), 3);

        let json = serde_json::to_string(&CorpusEntry::from(sample_game())).unwrap();
        let game: CorpusEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(game.game_date(), NaiveDate::from_ymd_opt(2011, 9, 8));
        assert!(!game.is_missing());
    }

    #[test]
    fn entry_with_both_title_and_error_is_rejected() {
        let mut value = serde_json::to_value(sample_game()).unwrap();
        value["error"] = serde_json::json!("boom");
        assert!(serde_json::from_value::<CorpusEntry>(value).is_err());
    }
}
