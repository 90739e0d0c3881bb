use super::source::Source;
use crate::normalize::normalize_name;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Result of a single game from the player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// Identity of a game inside one tournament, used to avoid adding it twice
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey {
    pub order: u32,
    pub opponent: String,
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} vs {}", self.order, self.opponent)
    }
}

/// One game played against one opponent inside a tournament
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRecord {
    // Position within the tournament
    pub order: u32,
    pub natural_order: Option<u32>,

    // Opponent
    pub opponent_name: String,
    pub opponent_rttf_rating: Option<i32>,
    pub opponent_ttw_rating: Option<i32>,

    // Result
    pub score: Option<i32>,
    pub opponent_score: Option<i32>,
    pub rttf_delta: Option<Decimal>,
    pub ttw_delta: Option<Decimal>,
}

impl GameRecord {
    pub fn new(opponent_name: impl Into<String>, score: i32, opponent_score: i32) -> Self {
        Self {
            opponent_name: opponent_name.into(),
            score: Some(score),
            opponent_score: Some(opponent_score),
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_natural_order(mut self, order: u32) -> Self {
        self.natural_order = Some(order);
        self
    }

    pub fn with_opponent_rating(mut self, source: Source, rating: i32) -> Self {
        self.set_opponent_rating(source, Some(rating));
        self
    }

    pub fn with_delta(mut self, source: Source, delta: Decimal) -> Self {
        self.set_delta(source, Some(delta));
        self
    }

    pub fn opponent_rating(&self, source: Source) -> Option<i32> {
        match source {
            Source::Rttf => self.opponent_rttf_rating,
            Source::Ttw => self.opponent_ttw_rating,
        }
    }

    pub fn set_opponent_rating(&mut self, source: Source, rating: Option<i32>) {
        match source {
            Source::Rttf => self.opponent_rttf_rating = rating,
            Source::Ttw => self.opponent_ttw_rating = rating,
        }
    }

    pub fn delta(&self, source: Source) -> Option<Decimal> {
        match source {
            Source::Rttf => self.rttf_delta,
            Source::Ttw => self.ttw_delta,
        }
    }

    pub fn set_delta(&mut self, source: Source, delta: Option<Decimal>) {
        match source {
            Source::Rttf => self.rttf_delta = delta,
            Source::Ttw => self.ttw_delta = delta,
        }
    }

    /// Opponent name in the short cross-site form
    pub fn normalized_opponent(&self) -> String {
        normalize_name(&self.opponent_name)
    }

    pub fn key(&self) -> GameKey {
        GameKey {
            order: self.order,
            opponent: self.normalized_opponent(),
        }
    }

    /// Win, loss or draw; `None` when either score is missing
    pub fn outcome(&self) -> Option<Outcome> {
        let (own, theirs) = (self.score?, self.opponent_score?);
        Some(match own.cmp(&theirs) {
            Ordering::Greater => Outcome::Win,
            Ordering::Less => Outcome::Loss,
            Ordering::Equal => Outcome::Draw,
        })
    }
}

fn fmt_opt<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. {} {}:{} rttf: {} ttw: {}",
            self.order,
            self.opponent_name,
            fmt_opt(&self.score),
            fmt_opt(&self.opponent_score),
            fmt_opt(&self.rttf_delta),
            fmt_opt(&self.ttw_delta),
        )
    }
}
