//! Refreshing a player's history from both sites
//!
//! Both profiles are downloaded concurrently; nothing is merged until both
//! downloads are done. The RTTF tournaments serve as the base list and the TTW
//! tournaments are merged into them. The result replaces every stored
//! tournament newer than the cutoff date.

use crate::enrich::{fill_places, EnrichConfig, EnrichReport, PlaceLookup};
use crate::error::Result;
use crate::matcher::{merge_tournaments_counted, MatchConfig};
use crate::model::{Player, Source};
use crate::sites::{SourceParser, SourceReport};
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    pub matching: MatchConfig,
    pub enrich: EnrichConfig,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Stored tournaments newer than the cutoff that were replaced
    pub removed: usize,
    pub added: usize,
    /// Merged records no site had named
    pub dropped: usize,
    pub enrich: EnrichReport,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tournaments added, {} replaced, {} dropped, {}/{} places found",
            self.added, self.removed, self.dropped, self.enrich.filled, self.enrich.attempted
        )
    }
}

/// Fold freshly fetched reports into the player.
///
/// Returns the outcome and the index where the new tournaments start.
pub fn apply_reports(
    player: &mut Player,
    since: NaiveDate,
    rttf: Option<SourceReport>,
    ttw: Option<SourceReport>,
    config: &MatchConfig,
) -> (SyncOutcome, usize) {
    let mut lists = Vec::with_capacity(2);
    for (source, report) in [(Source::Rttf, rttf), (Source::Ttw, ttw)] {
        let Some(report) = report else {
            lists.push(Vec::new());
            continue;
        };
        if report.rating.is_some() {
            player.set_rating(source, report.rating);
        }
        if player.name.is_none() {
            player.name = report.name;
        }
        lists.push(report.tournaments);
    }
    let ttw_list = lists.pop().unwrap_or_default();
    let rttf_list = lists.pop().unwrap_or_default();

    let (merged, dropped) = merge_tournaments_counted(rttf_list, ttw_list, Source::Ttw, config);

    let stored = player.tournaments.len();
    player.tournaments.retain(|t| !t.date.is_some_and(|d| d > since));
    let removed = stored - player.tournaments.len();

    let start = player.tournaments.len();
    let added = merged.len();
    player.tournaments.extend(merged);

    let outcome = SyncOutcome {
        removed,
        added,
        dropped,
        enrich: EnrichReport::default(),
    };
    (outcome, start)
}

/// Fetch both sites, merge, replace history newer than `since`, then look up
/// missing places of the new tournaments.
pub fn sync_player(
    player: &mut Player,
    since: NaiveDate,
    rttf: &dyn SourceParser,
    ttw: &dyn SourceParser,
    lookup: &dyn PlaceLookup,
    config: &SyncConfig,
) -> Result<SyncOutcome> {
    let snapshot: &Player = player;
    let (rttf_report, ttw_report) = rayon::join(|| rttf.fetch(snapshot, since), || ttw.fetch(snapshot, since));
    let (rttf_report, ttw_report) = (rttf_report?, ttw_report?);

    let (mut outcome, start) = apply_reports(player, since, rttf_report, ttw_report, &config.matching);

    match player.name.clone() {
        Some(name) => {
            outcome.enrich = fill_places(&mut player.tournaments[start..], &name, lookup, &config.enrich)?;
        }
        None => log::warn!("Player has no name; skipping place lookup"),
    }

    log::info!("Sync of {}: {}", player, outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameRecord, TournamentRecord};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn games() -> Vec<GameRecord> {
        ["Орлов Олег", "Лисин Иван", "Волков Ян", "Зайцев Петр", "Медведев Илья"]
            .iter()
            .enumerate()
            .map(|(i, n)| GameRecord::new(*n, 3, i as i32 % 3).with_order(i as u32 + 1))
            .collect()
    }

    fn report(source: Source, rating: i32, tournaments: Vec<TournamentRecord>) -> SourceReport {
        SourceReport {
            rating: Some(rating),
            name: Some(format!("Иванов Иван ({})", source)),
            tournaments,
        }
    }

    #[test]
    fn test_replaces_history_after_cutoff() {
        let mut player = Player::new().with_id(Source::Rttf, "1").with_id(Source::Ttw, "a");
        player.tournaments = vec![
            TournamentRecord::new().with_date(date(2023, 1, 10)).with_source(Source::Rttf, "old", "Старый"),
            TournamentRecord::new().with_date(date(2024, 2, 1)).with_source(Source::Rttf, "stale", "Устаревший"),
        ];

        let day = date(2024, 3, 2);
        let rttf = vec![TournamentRecord::new()
            .with_date(day)
            .with_source(Source::Rttf, "r1", "Лига")
            .with_games(games())];
        let ttw = vec![
            TournamentRecord::new()
                .with_date(day)
                .with_source(Source::Ttw, "t1", "Кубок")
                .with_games(games()),
            TournamentRecord::new().with_date(date(2024, 3, 9)).with_source(Source::Ttw, "t2", "Другой"),
        ];

        let (outcome, start) = apply_reports(
            &mut player,
            date(2024, 1, 1),
            Some(report(Source::Rttf, 510, rttf)),
            Some(report(Source::Ttw, 1400, ttw)),
            &MatchConfig::default(),
        );

        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.added, 2);
        assert_eq!(start, 1);
        assert_eq!(player.rttf_rating, Some(510));
        assert_eq!(player.ttw_rating, Some(1400));
        assert_eq!(player.name.as_deref(), Some("Иванов Иван (RTTF)"));

        assert_eq!(player.tournaments.len(), 3);
        assert_eq!(player.tournaments[0].rttf.id.as_deref(), Some("old"));
        let fused = &player.tournaments[1];
        assert_eq!(fused.rttf.id.as_deref(), Some("r1"));
        assert_eq!(fused.ttw.id.as_deref(), Some("t1"));
        assert_eq!(player.tournaments[2].ttw.id.as_deref(), Some("t2"));
    }

    #[test]
    fn test_drops_unnamed_records() {
        let mut player = Player::new();
        let unnamed = TournamentRecord::new().with_date(date(2024, 3, 2));

        let (outcome, _) = apply_reports(
            &mut player,
            date(2024, 1, 1),
            None,
            Some(report(Source::Ttw, 1400, vec![unnamed])),
            &MatchConfig::default(),
        );

        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.added, 0);
        assert!(player.tournaments.is_empty());
        assert_eq!(player.rttf_rating, None);
    }

    #[test]
    fn test_missing_report_keeps_rating() {
        let mut player = Player::new().with_rating(Source::Ttw, 1300);
        let (_, _) = apply_reports(&mut player, date(2024, 1, 1), None, None, &MatchConfig::default());
        assert_eq!(player.ttw_rating, Some(1300));
    }
}
