//! Rating history rebuilt from the current rating and per-tournament deltas
//!
//! The sites only publish the current rating and the change each tournament
//! caused, so the curve is recovered by walking the deltas backwards.

use crate::model::{Player, Source, TournamentRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Baseline date placed before any recorded tournament
pub fn anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Highest rating reached and the first date it was reached on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingPeak {
    pub rating: Decimal,
    pub date: NaiveDate,
}

/// Per-date sum of one site's tournament deltas.
/// Tournaments without a date or without a delta from that site are ignored.
pub fn delta_map(tournaments: &[TournamentRecord], source: Source) -> BTreeMap<NaiveDate, Decimal> {
    let mut deltas = BTreeMap::new();
    for t in tournaments {
        if let (Some(date), Some(delta)) = (t.date, t.delta(source)) {
            *deltas.entry(date).or_insert(Decimal::ZERO) += delta;
        }
    }
    deltas
}

/// Sorted union of the given dates plus the anchor date
pub fn date_axis<'a, I>(delta_maps: I) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a BTreeMap<NaiveDate, Decimal>>,
{
    let mut dates: BTreeSet<NaiveDate> = delta_maps
        .into_iter()
        .flat_map(|m| m.keys().copied())
        .collect();
    dates.insert(anchor_date());
    dates.into_iter().collect()
}

/// Rating at every date of `dates` (ascending), ending at `current`.
///
/// The value just before date D is the value at D minus the delta at D.
/// Returns an empty list when the current rating is missing or zero.
pub fn reconstruct(
    dates: &[NaiveDate],
    current: Option<i32>,
    deltas: &BTreeMap<NaiveDate, Decimal>,
) -> Vec<Decimal> {
    let current = match current {
        Some(r) if r != 0 => Decimal::from(r),
        _ => return Vec::new(),
    };
    if dates.is_empty() {
        return Vec::new();
    }

    let mut ratings = Vec::with_capacity(dates.len());
    let mut rating = current;
    ratings.push(rating);

    for date in dates.iter().skip(1).rev() {
        rating -= deltas.get(date).copied().unwrap_or(Decimal::ZERO);
        ratings.push(rating);
    }

    ratings.reverse();
    ratings
}

/// Maximum of `ratings`; ties keep the earliest date
pub fn find_peak(dates: &[NaiveDate], ratings: &[Decimal]) -> Option<RatingPeak> {
    let mut peak: Option<RatingPeak> = None;
    for (date, rating) in dates.iter().zip(ratings) {
        if peak.map_or(true, |p| *rating > p.rating) {
            peak = Some(RatingPeak {
                rating: *rating,
                date: *date,
            });
        }
    }
    peak
}

/// One site's rating curve
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingSeries {
    pub points: Vec<(NaiveDate, Decimal)>,
    pub peak: Option<RatingPeak>,
}

impl RatingSeries {
    fn from_axis(dates: &[NaiveDate], ratings: Vec<Decimal>) -> Self {
        let peak = find_peak(dates, &ratings);
        Self {
            points: dates.iter().copied().zip(ratings).collect(),
            peak,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Rating curve of one site on its own date axis
pub fn rating_history(
    tournaments: &[TournamentRecord],
    source: Source,
    current: Option<i32>,
) -> RatingSeries {
    let deltas = delta_map(tournaments, source);
    let dates = date_axis([&deltas]);
    RatingSeries::from_axis(&dates, reconstruct(&dates, current, &deltas))
}

/// Both sites' curves on a shared date axis, ready for plotting
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingChart {
    pub dates: Vec<NaiveDate>,
    pub rttf: Vec<Decimal>,
    pub ttw: Vec<Decimal>,
    pub max_rttf: Option<RatingPeak>,
    pub max_ttw: Option<RatingPeak>,
}

impl RatingChart {
    pub fn build(tournaments: &[TournamentRecord], rttf_rating: Option<i32>, ttw_rating: Option<i32>) -> Self {
        let rttf_deltas = delta_map(tournaments, Source::Rttf);
        let ttw_deltas = delta_map(tournaments, Source::Ttw);
        let dates = date_axis([&rttf_deltas, &ttw_deltas]);

        let rttf = reconstruct(&dates, rttf_rating, &rttf_deltas);
        let ttw = reconstruct(&dates, ttw_rating, &ttw_deltas);

        Self {
            max_rttf: find_peak(&dates, &rttf),
            max_ttw: find_peak(&dates, &ttw),
            dates,
            rttf,
            ttw,
        }
    }

    pub fn for_player(player: &Player) -> Self {
        Self::build(&player.tournaments, player.rttf_rating, player.ttw_rating)
    }

    pub fn series(&self, source: Source) -> &[Decimal] {
        match source {
            Source::Rttf => &self.rttf,
            Source::Ttw => &self.ttw,
        }
    }

    pub fn peak(&self, source: Source) -> Option<RatingPeak> {
        match source {
            Source::Rttf => self.max_rttf,
            Source::Ttw => self.max_ttw,
        }
    }
}
