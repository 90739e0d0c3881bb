use super::source::Source;
use super::tournament::TournamentRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A player known to one or both sites, with the merged tournament history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub name: Option<String>,
    pub rttf_id: Option<String>,
    pub ttw_id: Option<String>,
    pub rttf_rating: Option<i32>,
    pub ttw_rating: Option<i32>,
    pub tournaments: Vec<TournamentRecord>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, source: Source, id: &str) -> Self {
        match source {
            Source::Rttf => self.rttf_id = Some(id.trim().to_string()),
            Source::Ttw => self.ttw_id = Some(id.trim().to_string()),
        }
        self
    }

    pub fn with_rating(mut self, source: Source, rating: i32) -> Self {
        self.set_rating(source, Some(rating));
        self
    }

    pub fn id(&self, source: Source) -> Option<&str> {
        match source {
            Source::Rttf => self.rttf_id.as_deref(),
            Source::Ttw => self.ttw_id.as_deref(),
        }
    }

    pub fn rating(&self, source: Source) -> Option<i32> {
        match source {
            Source::Rttf => self.rttf_rating,
            Source::Ttw => self.ttw_rating,
        }
    }

    pub fn set_rating(&mut self, source: Source, rating: Option<i32>) {
        match source {
            Source::Rttf => self.rttf_rating = rating,
            Source::Ttw => self.ttw_rating = rating,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rating = |r: Option<i32>| r.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}, RTTF={}, TTW={}",
            self.name.as_deref().unwrap_or("?").to_uppercase(),
            rating(self.rttf_rating),
            rating(self.ttw_rating)
        )
    }
}
