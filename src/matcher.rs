//! Detection of the same tournament reported by both sites
//!
//! The sites share no identifiers, so two records are considered the same
//! event when they fall on the same calendar date and enough of their games
//! agree on opponent and score.

use crate::merge::merge_tournament;
use crate::model::{GameRecord, Source, TournamentRecord};
use crate::normalize::normalize_name;
use std::collections::HashSet;

/// Default number of identical games two same-day records must share
pub const DEFAULT_MIN_SHARED_GAMES: usize = 5;

#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Minimum number of shared game fingerprints to treat two records as one event
    pub min_shared_games: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_shared_games: DEFAULT_MIN_SHARED_GAMES,
        }
    }
}

impl MatchConfig {
    pub fn with_min_shared_games(min_shared_games: usize) -> Self {
        Self { min_shared_games }
    }
}

/// (short opponent name, score, opponent score) of one game
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub opponent: String,
    pub score: i32,
    pub opponent_score: i32,
}

impl Fingerprint {
    /// `None` for a game with a missing score, which cannot vouch for a match
    pub fn of(game: &GameRecord) -> Option<Self> {
        Some(Self {
            opponent: normalize_name(&game.opponent_name),
            score: game.score?,
            opponent_score: game.opponent_score?,
        })
    }
}

fn fingerprints(games: &[GameRecord]) -> HashSet<Fingerprint> {
    games.iter().filter_map(Fingerprint::of).collect()
}

/// Number of the incoming record's fingerprints also present in the existing one
pub fn shared_games(existing: &TournamentRecord, incoming: &TournamentRecord) -> usize {
    if existing.games.is_empty() || incoming.games.is_empty() {
        return 0;
    }
    let known = fingerprints(&existing.games);
    fingerprints(&incoming.games)
        .iter()
        .filter(|fp| known.contains(fp))
        .count()
}

/// Whether two records describe the same real-world tournament
pub fn is_same_tournament(
    existing: &TournamentRecord,
    incoming: &TournamentRecord,
    config: &MatchConfig,
) -> bool {
    if existing.games.is_empty() || incoming.games.is_empty() {
        return false;
    }
    match (existing.date, incoming.date) {
        (Some(a), Some(b)) if a == b => {
            shared_games(existing, incoming) >= config.min_shared_games
        }
        _ => false,
    }
}

/// What to do with one incoming record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// No existing record matches; add it as a new tournament
    Append,
    /// Fold it into the existing record at this index
    MergeInto(usize),
}

/// One action per incoming record, in incoming order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub actions: Vec<MergeAction>,
}

impl MergePlan {
    pub fn appended(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, MergeAction::Append))
            .count()
    }

    pub fn merged(&self) -> usize {
        self.actions.len() - self.appended()
    }
}

/// Pair every incoming record with the first matching existing record.
///
/// Candidates are scanned in existing-list order and the first one reaching
/// the threshold wins; there is no search for a better match further on.
pub fn plan_merge(
    existing: &[TournamentRecord],
    incoming: &[TournamentRecord],
    config: &MatchConfig,
) -> MergePlan {
    let actions = incoming
        .iter()
        .map(|candidate| {
            existing
                .iter()
                .position(|known| is_same_tournament(known, candidate, config))
                .map_or(MergeAction::Append, MergeAction::MergeInto)
        })
        .collect();

    MergePlan { actions }
}

/// Merge `incoming` (all reported by `source`) into `existing`.
///
/// Matched records are fused into their existing counterpart, the rest are
/// appended after the existing records in incoming order. Records no site
/// has named are dropped.
pub fn merge_tournaments(
    existing: Vec<TournamentRecord>,
    incoming: Vec<TournamentRecord>,
    source: Source,
    config: &MatchConfig,
) -> Vec<TournamentRecord> {
    merge_tournaments_counted(existing, incoming, source, config).0
}

/// [`merge_tournaments`], also returning how many unnamed records were dropped
pub fn merge_tournaments_counted(
    existing: Vec<TournamentRecord>,
    incoming: Vec<TournamentRecord>,
    source: Source,
    config: &MatchConfig,
) -> (Vec<TournamentRecord>, usize) {
    let plan = plan_merge(&existing, &incoming, config);
    log::debug!(
        "{}: {} tournaments matched, {} new",
        source,
        plan.merged(),
        plan.appended()
    );

    let mut result = existing;
    let mut appended = Vec::new();

    for (record, action) in incoming.into_iter().zip(plan.actions) {
        match action {
            MergeAction::MergeInto(index) => {
                log::debug!("Merging {} into {}", record, result[index]);
                result[index] = merge_tournament(&result[index], &record, source);
            }
            MergeAction::Append => appended.push(record),
        }
    }

    result.extend(appended);

    let before = result.len();
    result.retain(|t| {
        if t.is_identified() {
            true
        } else {
            log::warn!("Dropping tournament without a name: {}", t);
            false
        }
    });
    let dropped = before - result.len();
    (result, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn games(n: usize) -> Vec<GameRecord> {
        let opponents = ["Орлов Олег", "Лисин Иван", "Волков Ян", "Зайцев Петр", "Медведев Илья", "Соколов Ан"];
        opponents
            .iter()
            .take(n)
            .enumerate()
            .map(|(i, name)| GameRecord::new(*name, 3, i as i32).with_order(i as u32 + 1))
            .collect()
    }

    fn rttf(d: u32, n: usize) -> TournamentRecord {
        TournamentRecord::new()
            .with_date(date(d))
            .with_source(Source::Rttf, "r1", "Лига")
            .with_games(games(n))
    }

    fn ttw(d: u32, n: usize) -> TournamentRecord {
        TournamentRecord::new()
            .with_date(date(d))
            .with_source(Source::Ttw, "t1", "Лига TTW")
            .with_games(games(n))
    }

    #[test]
    fn test_five_shared_games_merge() {
        let merged = merge_tournaments(vec![rttf(3, 6)], vec![ttw(3, 5)], Source::Ttw, &MatchConfig::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rttf.name.as_deref(), Some("Лига"));
        assert_eq!(merged[0].ttw.name.as_deref(), Some("Лига TTW"));
    }

    #[test]
    fn test_four_shared_games_stay_separate() {
        let merged = merge_tournaments(vec![rttf(3, 6)], vec![ttw(3, 4)], Source::Ttw, &MatchConfig::default());
        assert_eq!(merged.len(), 2);
        assert!(merged[1].rttf.name.is_none());
    }

    #[test]
    fn test_different_dates_never_match() {
        let plan = plan_merge(&[rttf(3, 6)], &[ttw(4, 6)], &MatchConfig::default());
        assert_eq!(plan.actions, vec![MergeAction::Append]);
    }

    #[test]
    fn test_short_names_match_full_names() {
        let mut incoming = ttw(3, 5);
        for game in &mut incoming.games {
            game.opponent_name = normalize_name(&game.opponent_name);
        }
        assert_eq!(shared_games(&rttf(3, 5), &incoming), 5);
    }

    #[test]
    fn test_score_must_match_exactly() {
        let mut incoming = ttw(3, 5);
        incoming.games[0].opponent_score = Some(2);
        assert_eq!(shared_games(&rttf(3, 5), &incoming), 4);
    }

    #[test]
    fn test_missing_dates_and_games() {
        let config = MatchConfig::default();
        let mut dateless = ttw(3, 6);
        dateless.date = None;
        assert!(!is_same_tournament(&rttf(3, 6), &dateless, &config));

        let empty = TournamentRecord::new().with_date(date(3));
        assert_eq!(shared_games(&rttf(3, 6), &empty), 0);
        assert_eq!(shared_games(&empty, &rttf(3, 6)), 0);
        assert!(!is_same_tournament(&empty, &empty, &MatchConfig::with_min_shared_games(0)));
    }

    #[test]
    fn test_first_matching_candidate_wins() {
        let existing = vec![rttf(1, 6), rttf(3, 5), rttf(3, 6)];
        let plan = plan_merge(&existing, &[ttw(3, 6)], &MatchConfig::default());
        assert_eq!(plan.actions, vec![MergeAction::MergeInto(1)]);
    }

    #[test]
    fn test_threshold_is_tunable() {
        let plan = plan_merge(&[rttf(3, 6)], &[ttw(3, 4)], &MatchConfig::with_min_shared_games(4));
        assert_eq!(plan.actions, vec![MergeAction::MergeInto(0)]);
        assert_eq!(plan.merged(), 1);
        assert_eq!(plan.appended(), 0);
    }

    #[test]
    fn test_unmatched_are_appended_in_order() {
        let merged = merge_tournaments(
            vec![rttf(3, 6)],
            vec![ttw(10, 2), ttw(3, 6), ttw(11, 2)],
            Source::Ttw,
            &MatchConfig::default(),
        );
        let dates: Vec<_> = merged.iter().map(|t| t.date.unwrap()).collect();
        assert_eq!(dates, vec![date(3), date(10), date(11)]);
    }

    #[test]
    fn test_unnamed_records_are_dropped() {
        let unnamed = TournamentRecord::new().with_date(date(5));
        let merged = merge_tournaments(vec![], vec![unnamed.clone()], Source::Ttw, &MatchConfig::default());
        assert!(merged.is_empty());

        let (merged, dropped) =
            merge_tournaments_counted(vec![rttf(3, 6), unnamed], vec![ttw(9, 2)], Source::Ttw, &MatchConfig::default());
        assert_eq!(dropped, 1);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|t| t.is_identified()));
    }
}
