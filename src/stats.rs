//! Summary counters over a player's merged history

use crate::model::{Outcome, Source, TournamentRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Wins and losses counted for one site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinLoss {
    pub wins: u32,
    pub losses: u32,
}

impl WinLoss {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }

    /// Share of wins in percent, 0 when no games were counted
    pub fn win_rate(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(games) * 100.0
        }
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub total_tournaments: u32,
    pub rttf_tournaments: u32,
    pub ttw_tournaments: u32,
    pub total: WinLoss,
    pub rttf: WinLoss,
    pub ttw: WinLoss,
    pub first_places: u32,
    pub second_places: u32,
    pub third_places: u32,
    pub last_activity: NaiveDate,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            total_tournaments: 0,
            rttf_tournaments: 0,
            ttw_tournaments: 0,
            total: WinLoss::default(),
            rttf: WinLoss::default(),
            ttw: WinLoss::default(),
            first_places: 0,
            second_places: 0,
            third_places: 0,
            last_activity: NaiveDate::MIN,
        }
    }
}

impl PlayerStats {
    /// Single pass over the merged tournament list
    pub fn calculate(tournaments: &[TournamentRecord]) -> Self {
        let mut stats = PlayerStats::default();

        for tournament in tournaments {
            stats.total_tournaments += 1;
            if tournament.has_source(Source::Rttf) {
                stats.rttf_tournaments += 1;
            }
            if tournament.has_source(Source::Ttw) {
                stats.ttw_tournaments += 1;
            }

            if let Some(date) = tournament.date {
                stats.last_activity = stats.last_activity.max(date);
            }

            if tournament.has_medal() {
                match tournament.place {
                    Some(1) => stats.first_places += 1,
                    Some(2) => stats.second_places += 1,
                    _ => stats.third_places += 1,
                }
            }

            for game in &tournament.games {
                // A game without both scores says nothing about the result
                let Some(outcome) = game.outcome() else {
                    continue;
                };
                stats.total.record(outcome);
                for source in Source::ALL {
                    if game.delta(source).is_some() {
                        stats.by_source_mut(source).record(outcome);
                    }
                }
            }
        }

        stats
    }

    pub fn by_source(&self, source: Source) -> WinLoss {
        match source {
            Source::Rttf => self.rttf,
            Source::Ttw => self.ttw,
        }
    }

    fn by_source_mut(&mut self, source: Source) -> &mut WinLoss {
        match source {
            Source::Rttf => &mut self.rttf,
            Source::Ttw => &mut self.ttw,
        }
    }

    pub fn tournaments(&self, source: Source) -> u32 {
        match source {
            Source::Rttf => self.rttf_tournaments,
            Source::Ttw => self.ttw_tournaments,
        }
    }

    pub fn medals(&self) -> u32 {
        self.first_places + self.second_places + self.third_places
    }

    pub fn last_activity(&self) -> Option<NaiveDate> {
        (self.last_activity != NaiveDate::MIN).then_some(self.last_activity)
    }
}

impl fmt::Display for PlayerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tournaments: {} | Games: {} (+{} -{}) | RTTF: +{} -{} | TTW: +{} -{}",
            self.total_tournaments,
            self.total.games(),
            self.total.wins,
            self.total.losses,
            self.rttf.wins,
            self.rttf.losses,
            self.ttw.wins,
            self.ttw.losses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameRecord;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_wins_and_losses() {
        let t = TournamentRecord::new()
            .with_date(date(1))
            .with_source(Source::Rttf, "1", "Лига")
            .with_games(vec![
                GameRecord::new("А", 3, 1).with_order(1).with_delta(Source::Rttf, dec!(2)),
                GameRecord::new("Б", 2, 3).with_order(2).with_delta(Source::Rttf, dec!(-2)),
            ]);
        let stats = PlayerStats::calculate(&[t]);

        assert_eq!(stats.rttf, WinLoss { wins: 1, losses: 1 });
        assert_eq!(stats.total, WinLoss { wins: 1, losses: 1 });
        assert_eq!(stats.ttw, WinLoss::default());
        assert_eq!(stats.rttf_tournaments, 1);
        assert_eq!(stats.ttw_tournaments, 0);
        assert!((stats.rttf.win_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_site_tally_needs_site_delta() {
        let t = TournamentRecord::new()
            .with_date(date(2))
            .with_source(Source::Rttf, "1", "Лига")
            .with_source(Source::Ttw, "2", "Liga")
            .with_games(vec![
                GameRecord::new("А", 3, 0).with_order(1).with_delta(Source::Ttw, dec!(0)),
                GameRecord::new("Б", 0, 3).with_order(2),
                GameRecord::new("В", 2, 2).with_order(3).with_delta(Source::Rttf, dec!(0)),
            ]);
        let stats = PlayerStats::calculate(&[t]);

        assert_eq!(stats.total, WinLoss { wins: 1, losses: 1 });
        assert_eq!(stats.ttw, WinLoss { wins: 1, losses: 0 });
        assert_eq!(stats.rttf, WinLoss::default());
        assert_eq!(stats.total_tournaments, 1);
        assert_eq!(stats.tournaments(Source::Ttw), 1);
    }

    #[test]
    fn test_places_and_last_activity() {
        let tournaments = vec![
            TournamentRecord::new().with_date(date(3)).with_place(1),
            TournamentRecord::new().with_date(date(9)).with_place(3),
            TournamentRecord::new().with_place(2),
            TournamentRecord::new().with_date(date(5)).with_place(7),
            TournamentRecord::new().with_date(date(6)).with_place(0),
        ];
        let stats = PlayerStats::calculate(&tournaments);

        assert_eq!((stats.first_places, stats.second_places, stats.third_places), (1, 1, 1));
        assert_eq!(stats.medals(), 3);
        assert_eq!(
            stats.medals() as usize,
            tournaments.iter().filter(|t| t.has_medal()).count()
        );
        assert_eq!(stats.last_activity, date(9));
        assert_eq!(stats.total_tournaments, 5);
    }

    #[test]
    fn test_missing_scores_and_empty_input() {
        let t = TournamentRecord::new().with_games(vec![GameRecord {
            opponent_name: "Г".to_string(),
            score: Some(3),
            rttf_delta: Some(dec!(1)),
            ..GameRecord::default()
        }]);
        let stats = PlayerStats::calculate(&[t]);
        assert_eq!(stats.total.games(), 0);
        assert_eq!(stats.rttf.games(), 0);

        let empty = PlayerStats::calculate(&[]);
        assert_eq!(empty, PlayerStats::default());
        assert_eq!(empty.last_activity, NaiveDate::MIN);
        assert_eq!(empty.last_activity(), None);
        assert_eq!(empty.total.win_rate(), 0.0);
    }

    #[test]
    fn test_summary_line() {
        let stats = PlayerStats::calculate(&[]);
        assert_eq!(
            stats.to_string(),
            "Tournaments: 0 | Games: 0 (+0 -0) | RTTF: +0 -0 | TTW: +0 -0"
        );
    }
}
