//! Flat, index-linked form of a tournament history
//!
//! Games live in one contiguous vector and every tournament refers to its
//! games by index range. Each game row carries the index of its tournament
//! instead of a pointer, which is the shape a relational store expects.

use super::game::GameRecord;
use super::tournament::{SourceFields, TournamentRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Tournament row; `games_start..games_end` indexes [`FlatHistory::games`].
/// Deltas are written as decimal strings so CSV readers never see a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRow {
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub place: Option<u32>,
    pub rttf_id: Option<String>,
    pub rttf_name: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub rttf_delta: Option<Decimal>,
    pub ttw_id: Option<String>,
    pub ttw_name: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub ttw_delta: Option<Decimal>,
    pub owner: Option<String>,
    pub games_start: usize,
    pub games_end: usize,
}

impl TournamentRow {
    pub fn games(&self) -> Range<usize> {
        self.games_start..self.games_end
    }
}

/// Game row linked to its tournament by index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRow {
    pub tournament: usize,
    pub order: u32,
    pub natural_order: Option<u32>,
    pub opponent_name: String,
    pub opponent_rttf_rating: Option<i32>,
    pub opponent_ttw_rating: Option<i32>,
    pub score: Option<i32>,
    pub opponent_score: Option<i32>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub rttf_delta: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub ttw_delta: Option<Decimal>,
}

impl GameRow {
    fn from_record(tournament: usize, game: &GameRecord) -> Self {
        Self {
            tournament,
            order: game.order,
            natural_order: game.natural_order,
            opponent_name: game.opponent_name.clone(),
            opponent_rttf_rating: game.opponent_rttf_rating,
            opponent_ttw_rating: game.opponent_ttw_rating,
            score: game.score,
            opponent_score: game.opponent_score,
            rttf_delta: game.rttf_delta,
            ttw_delta: game.ttw_delta,
        }
    }

    fn to_record(&self) -> GameRecord {
        GameRecord {
            order: self.order,
            natural_order: self.natural_order,
            opponent_name: self.opponent_name.clone(),
            opponent_rttf_rating: self.opponent_rttf_rating,
            opponent_ttw_rating: self.opponent_ttw_rating,
            score: self.score,
            opponent_score: self.opponent_score,
            rttf_delta: self.rttf_delta,
            ttw_delta: self.ttw_delta,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatHistory {
    pub tournaments: Vec<TournamentRow>,
    pub games: Vec<GameRow>,
}

impl FlatHistory {
    pub fn from_records(records: &[TournamentRecord]) -> Self {
        let mut history = FlatHistory::default();

        for (index, record) in records.iter().enumerate() {
            let games_start = history.games.len();
            history
                .games
                .extend(record.games.iter().map(|g| GameRow::from_record(index, g)));

            history.tournaments.push(TournamentRow {
                index,
                date: record.date,
                place: record.place,
                rttf_id: record.rttf.id.clone(),
                rttf_name: record.rttf.name.clone(),
                rttf_delta: record.rttf.delta,
                ttw_id: record.ttw.id.clone(),
                ttw_name: record.ttw.name.clone(),
                ttw_delta: record.ttw.delta,
                owner: record.owner.clone(),
                games_start,
                games_end: history.games.len(),
            });
        }

        history
    }

    /// Games of the tournament at `index`; empty for an unknown index or a bad range
    pub fn games_of(&self, index: usize) -> &[GameRow] {
        self.tournaments
            .get(index)
            .and_then(|t| self.games.get(t.games()))
            .unwrap_or(&[])
    }

    pub fn to_records(&self) -> Vec<TournamentRecord> {
        self.tournaments
            .iter()
            .map(|row| TournamentRecord {
                date: row.date,
                place: row.place,
                rttf: SourceFields {
                    id: row.rttf_id.clone(),
                    name: row.rttf_name.clone(),
                    delta: row.rttf_delta,
                },
                ttw: SourceFields {
                    id: row.ttw_id.clone(),
                    name: row.ttw_name.clone(),
                    delta: row.ttw_delta,
                },
                games: self
                    .games_of(row.index)
                    .iter()
                    .map(GameRow::to_record)
                    .collect(),
                owner: row.owner.clone(),
            })
            .collect()
    }
}
