use super::game::{GameKey, GameRecord};
use super::source::Source;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fields of a tournament that only one site publishes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFields {
    pub id: Option<String>,
    pub name: Option<String>,
    pub delta: Option<Decimal>,
}

impl SourceFields {
    /// Whether the site gave this tournament a non-blank name
    pub fn is_named(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Copy every field the incoming record actually carries
    pub fn overwrite_from(&mut self, incoming: &SourceFields) {
        if incoming.id.is_some() {
            self.id = incoming.id.clone();
        }
        if incoming.name.is_some() {
            self.name = incoming.name.clone();
        }
        if incoming.delta.is_some() {
            self.delta = incoming.delta;
        }
    }
}

/// Treat an explicit `null` game list like a missing one
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<GameRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<GameRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One tournament in a player's history, as reported by one or both sites
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentRecord {
    pub date: Option<NaiveDate>,
    pub place: Option<u32>,
    pub rttf: SourceFields,
    pub ttw: SourceFields,
    #[serde(deserialize_with = "null_as_empty")]
    pub games: Vec<GameRecord>,

    /// Site identifier of the player this history belongs to
    pub owner: Option<String>,
}

impl TournamentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_place(mut self, place: u32) -> Self {
        self.place = Some(place);
        self
    }

    pub fn with_source(mut self, source: Source, id: &str, name: &str) -> Self {
        let fields = self.fields_mut(source);
        fields.id = Some(id.to_string());
        fields.name = Some(name.to_string());
        self
    }

    pub fn with_delta(mut self, source: Source, delta: Decimal) -> Self {
        self.fields_mut(source).delta = Some(delta);
        self
    }

    pub fn with_games(mut self, games: Vec<GameRecord>) -> Self {
        for game in games {
            self.add_game(game);
        }
        self
    }

    pub fn fields(&self, source: Source) -> &SourceFields {
        match source {
            Source::Rttf => &self.rttf,
            Source::Ttw => &self.ttw,
        }
    }

    pub fn fields_mut(&mut self, source: Source) -> &mut SourceFields {
        match source {
            Source::Rttf => &mut self.rttf,
            Source::Ttw => &mut self.ttw,
        }
    }

    pub fn delta(&self, source: Source) -> Option<Decimal> {
        self.fields(source).delta
    }

    pub fn has_source(&self, source: Source) -> bool {
        self.fields(source).is_named()
    }

    /// At least one site named this tournament
    pub fn is_identified(&self) -> bool {
        Source::ALL.iter().any(|s| self.has_source(*s))
    }

    /// Finished on the podium (places 1 to 3)
    pub fn has_medal(&self) -> bool {
        matches!(self.place, Some(1..=3))
    }

    /// Append a game unless one with the same order and opponent is already present.
    /// Returns whether the game was added.
    pub fn add_game(&mut self, game: GameRecord) -> bool {
        let key = game.key();
        if self.contains_game(&key) {
            return false;
        }
        self.games.push(game);
        true
    }

    pub fn contains_game(&self, key: &GameKey) -> bool {
        self.games.iter().any(|g| &g.key() == key)
    }

    /// Display name, preferring the first site that named the tournament
    pub fn title(&self) -> String {
        Source::ALL
            .iter()
            .filter_map(|s| self.fields(*s).name.as_deref())
            .find(|n| !n.trim().is_empty())
            .unwrap_or("?")
            .to_string()
    }
}

impl fmt::Display for TournamentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "????-??-??".to_string());
        write!(f, "{} {} ({} games)", date, self.title(), self.games.len())
    }
}
