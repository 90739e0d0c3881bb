//! Fusion of two records of the same tournament
//!
//! The merge is directional: the incoming record was reported by one site,
//! and only that site's fields are taken from it. Everything else, including
//! opponent names and scores, stays as the existing record has it.

use crate::model::{GameRecord, Source, TournamentRecord};
use std::collections::{BTreeMap, BTreeSet};

/// Fold `incoming`, reported by `source`, into `existing`
pub fn merge_tournament(
    existing: &TournamentRecord,
    incoming: &TournamentRecord,
    source: Source,
) -> TournamentRecord {
    let mut merged = existing.clone();

    merged.fields_mut(source).overwrite_from(incoming.fields(source));
    if merged.place.is_none() {
        merged.place = incoming.place;
    }
    if merged.owner.is_none() {
        merged.owner = incoming.owner.clone();
    }

    merged.games = merge_games(&existing.games, &incoming.games, source);
    merged
}

/// Games grouped by short opponent name, each group renumbered 1..K
/// in original order
fn group_by_opponent(games: &[GameRecord]) -> BTreeMap<String, Vec<GameRecord>> {
    let mut groups: BTreeMap<String, Vec<GameRecord>> = BTreeMap::new();
    for game in games {
        groups
            .entry(game.normalized_opponent())
            .or_default()
            .push(game.clone());
    }

    for group in groups.values_mut() {
        group.sort_by_key(|g| g.order);
        for (i, game) in group.iter_mut().enumerate() {
            game.order = i as u32 + 1;
        }
    }

    groups
}

/// Combine two reports of the same game
fn fuse(existing: &GameRecord, incoming: &GameRecord, source: Source) -> GameRecord {
    let mut game = existing.clone();
    game.natural_order = existing.natural_order.or(incoming.natural_order);
    game.set_opponent_rating(source, incoming.opponent_rating(source));
    game.set_delta(source, incoming.delta(source));
    game
}

/// Merge two game lists of the same tournament.
///
/// Games are paired per opponent by their position among games against that
/// opponent, so the sites may list the tournament in different orders. The
/// result is sorted by (short opponent name, position) and numbered 1..N.
pub fn merge_games(existing: &[GameRecord], incoming: &[GameRecord], source: Source) -> Vec<GameRecord> {
    let existing_groups = group_by_opponent(existing);
    let incoming_groups = group_by_opponent(incoming);

    let opponents: BTreeSet<&String> = existing_groups.keys().chain(incoming_groups.keys()).collect();

    let mut merged = Vec::with_capacity(existing.len().max(incoming.len()));
    for opponent in opponents {
        let ours = existing_groups.get(opponent).map(Vec::as_slice).unwrap_or(&[]);
        let theirs = incoming_groups.get(opponent).map(Vec::as_slice).unwrap_or(&[]);

        for i in 0..ours.len().max(theirs.len()) {
            let game = match (ours.get(i), theirs.get(i)) {
                (Some(e), Some(u)) => fuse(e, u, source),
                (Some(e), None) => e.clone(),
                (None, Some(u)) => u.clone(),
                (None, None) => continue,
            };
            merged.push((opponent.clone(), game));
        }
    }

    renumber(merged)
}

/// Sort by (short opponent name, local order) and assign orders 1..N
fn renumber(mut games: Vec<(String, GameRecord)>) -> Vec<GameRecord> {
    games.sort_by(|(a_name, a), (b_name, b)| a_name.cmp(b_name).then(a.order.cmp(&b.order)));
    games
        .into_iter()
        .enumerate()
        .map(|(i, (_, mut game))| {
            game.order = i as u32 + 1;
            game
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{merge_tournaments, MatchConfig};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, 18).unwrap()
    }

    fn rttf_record() -> TournamentRecord {
        TournamentRecord::new()
            .with_date(day())
            .with_place(2)
            .with_source(Source::Rttf, "900", "Турнир Б")
            .with_delta(Source::Rttf, dec!(12.4))
            .with_games(vec![
                GameRecord::new("Орлов Олег", 3, 1)
                    .with_order(1)
                    .with_natural_order(1)
                    .with_opponent_rating(Source::Rttf, 410)
                    .with_delta(Source::Rttf, dec!(2.1)),
                GameRecord::new("Лисин Иван", 1, 3)
                    .with_order(2)
                    .with_natural_order(2)
                    .with_opponent_rating(Source::Rttf, 450)
                    .with_delta(Source::Rttf, dec!(-3.0)),
                GameRecord::new("Орлов Олег", 3, 2)
                    .with_order(3)
                    .with_natural_order(3)
                    .with_opponent_rating(Source::Rttf, 410)
                    .with_delta(Source::Rttf, dec!(1.7)),
            ])
    }

    fn ttw_record() -> TournamentRecord {
        // Same games, listed in a different order and with short names
        TournamentRecord::new()
            .with_date(day())
            .with_source(Source::Ttw, "abc", "Турнир Б (TTW)")
            .with_delta(Source::Ttw, dec!(8))
            .with_games(vec![
                GameRecord::new("Лисин И.", 1, 3)
                    .with_order(1)
                    .with_natural_order(1)
                    .with_opponent_rating(Source::Ttw, 1330)
                    .with_delta(Source::Ttw, dec!(-4)),
                GameRecord::new("Орлов О.", 3, 1)
                    .with_order(2)
                    .with_natural_order(2)
                    .with_opponent_rating(Source::Ttw, 1290)
                    .with_delta(Source::Ttw, dec!(6)),
                GameRecord::new("Орлов О.", 3, 2)
                    .with_order(3)
                    .with_natural_order(3)
                    .with_opponent_rating(Source::Ttw, 1290)
                    .with_delta(Source::Ttw, dec!(6)),
                GameRecord::new("Котов К.", 3, 0)
                    .with_order(4)
                    .with_natural_order(4)
                    .with_delta(Source::Ttw, dec!(1)),
            ])
    }

    #[test]
    fn test_fuses_matching_games() {
        let merged = merge_tournament(&rttf_record(), &ttw_record(), Source::Ttw);

        assert_eq!(merged.games.len(), 4);
        let orders: Vec<u32> = merged.games.iter().map(|g| g.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);

        // Sorted by short name: Котов К., Лисин И., Орлов О. (twice)
        assert_eq!(merged.games[0].opponent_name, "Котов К.");
        assert_eq!(merged.games[0].rttf_delta, None);
        assert_eq!(merged.games[0].ttw_delta, Some(dec!(1)));

        let lisin = &merged.games[1];
        assert_eq!(lisin.opponent_name, "Лисин Иван");
        assert_eq!(lisin.opponent_rttf_rating, Some(450));
        assert_eq!(lisin.opponent_ttw_rating, Some(1330));
        assert_eq!(lisin.rttf_delta, Some(dec!(-3.0)));
        assert_eq!(lisin.ttw_delta, Some(dec!(-4)));
        assert_eq!(lisin.natural_order, Some(2));

        let first_orlov = &merged.games[2];
        assert_eq!(first_orlov.opponent_name, "Орлов Олег");
        assert_eq!((first_orlov.score, first_orlov.opponent_score), (Some(3), Some(1)));
        assert_eq!(first_orlov.rttf_delta, Some(dec!(2.1)));
        assert_eq!(first_orlov.ttw_delta, Some(dec!(6)));
        assert_eq!(first_orlov.natural_order, Some(1));

        let second_orlov = &merged.games[3];
        assert_eq!((second_orlov.score, second_orlov.opponent_score), (Some(3), Some(2)));
        assert_eq!(second_orlov.rttf_delta, Some(dec!(1.7)));
    }

    #[test]
    fn test_scalar_fields_are_directional() {
        let merged = merge_tournament(&rttf_record(), &ttw_record(), Source::Ttw);
        assert_eq!(merged.rttf.id.as_deref(), Some("900"));
        assert_eq!(merged.rttf.name.as_deref(), Some("Турнир Б"));
        assert_eq!(merged.rttf.delta, Some(dec!(12.4)));
        assert_eq!(merged.ttw.id.as_deref(), Some("abc"));
        assert_eq!(merged.ttw.name.as_deref(), Some("Турнир Б (TTW)"));
        assert_eq!(merged.ttw.delta, Some(dec!(8)));
        assert_eq!(merged.place, Some(2));

        // An incoming TTW record never touches RTTF fields, even when it carries them
        let mut intruder = ttw_record();
        intruder.rttf.name = Some("Чужое имя".to_string());
        intruder.rttf.delta = Some(dec!(-100));
        intruder.games[0].rttf_delta = Some(dec!(-100));
        let merged = merge_tournament(&rttf_record(), &intruder, Source::Ttw);
        assert_eq!(merged.rttf.name.as_deref(), Some("Турнир Б"));
        assert_eq!(merged.rttf.delta, Some(dec!(12.4)));
        assert_eq!(merged.games[1].rttf_delta, Some(dec!(-3.0)));
    }

    #[test]
    fn test_direction_matters() {
        let forward = merge_tournament(&rttf_record(), &ttw_record(), Source::Ttw);
        let backward = merge_tournament(&ttw_record(), &rttf_record(), Source::Rttf);

        // Display names and scores come from the existing side
        assert_eq!(forward.games[1].opponent_name, "Лисин Иван");
        assert_eq!(backward.games[1].opponent_name, "Лисин И.");
        assert_ne!(forward, backward);

        // Per-site numbers agree either way
        for (f, b) in forward.games.iter().zip(&backward.games) {
            assert_eq!(f.rttf_delta, b.rttf_delta);
            assert_eq!(f.ttw_delta, b.ttw_delta);
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merge_tournament(&rttf_record(), &ttw_record(), Source::Ttw);
        let twice = merge_tournament(&once, &once, Source::Ttw);
        assert_eq!(once, twice);

        let again = merge_tournament(&twice, &ttw_record(), Source::Ttw);
        assert_eq!(once, again);
    }

    #[test]
    fn test_list_merged_with_itself_is_unchanged() {
        let list = vec![merge_tournament(&rttf_record(), &ttw_record(), Source::Ttw)];
        let config = MatchConfig::with_min_shared_games(2);
        let merged = merge_tournaments(list.clone(), list.clone(), Source::Rttf, &config);
        assert_eq!(merged, list);
    }

    #[test]
    fn test_empty_sides() {
        let only_existing = merge_games(&rttf_record().games, &[], Source::Ttw);
        assert_eq!(only_existing.len(), 3);
        assert!(only_existing.iter().all(|g| g.ttw_delta.is_none()));

        let only_incoming = merge_games(&[], &ttw_record().games, Source::Ttw);
        assert_eq!(only_incoming.len(), 4);

        assert!(merge_games(&[], &[], Source::Rttf).is_empty());
    }

    #[test]
    fn test_extra_game_against_same_opponent_is_copied() {
        let mut incoming = ttw_record();
        incoming.add_game(
            GameRecord::new("Лисин И.", 3, 2)
                .with_order(5)
                .with_delta(Source::Ttw, dec!(5)),
        );
        let merged = merge_tournament(&rttf_record(), &incoming, Source::Ttw);
        assert_eq!(merged.games.len(), 5);
        assert_eq!(merged.games[2].opponent_name, "Лисин И.");
        assert_eq!(merged.games[2].rttf_delta, None);
        assert_eq!(merged.games[2].order, 3);
    }
}
