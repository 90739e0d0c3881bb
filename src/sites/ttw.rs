//! TTW player pages
//!
//! The results table alternates a tournament header row with one row per
//! game. Header rows carry a `game-tournament-name-cell`; the game rows that
//! follow carry a `game-score-cell`.

use super::score::parse_score;
use super::{element_text, fetch_page, parse_date, parse_delta, selector, select_text, SiteConfig, SourceParser};
use crate::error::{Result, TtError};
use crate::model::{GameRecord, Source, TournamentRecord};
use crate::normalize::normalize_name;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

lazy_static! {
    /// `Surname Name (1234.5)` in the opponent cell
    static ref OPPONENT_PATTERN: Regex = Regex::new(r"^(.+?)\s*\(([^)]+)\)\s*$").unwrap();
}

pub struct TtwParser {
    client: reqwest::blocking::Client,
    config: SiteConfig,
    tournament_config: SiteConfig,
}

impl TtwParser {
    pub fn new() -> Result<Self> {
        Self::with_config(SiteConfig::TTW, SiteConfig::TTW_TOURNAMENT)
    }

    pub fn with_config(config: SiteConfig, tournament_config: SiteConfig) -> Result<Self> {
        Ok(Self {
            client: config.client()?,
            config,
            tournament_config,
        })
    }

    /// Finishing place of `player_name` on the tournament's standings page
    pub fn tournament_place(&self, tournament_id: &str, player_name: &str) -> Result<Option<u32>> {
        let url = self.tournament_config.build_url(tournament_id);
        let html = fetch_page(&self.client, &url)?;
        parse_standings_place(&Html::parse_document(&html), player_name)
    }
}

/// Header row: date as the cell's own text, tournament link, delta in the next cell
fn parse_tournament_header(info_cell: ElementRef<'_>, delta_text: Option<&str>) -> Result<TournamentRecord> {
    let own_text: String = info_cell
        .children()
        .filter_map(|n| n.value().as_text())
        .map(|t| &**t)
        .collect();
    let date = parse_date(&own_text.replace(',', ""))?;

    let link_sel = selector("a")?;
    let link = info_cell
        .select(&link_sel)
        .next()
        .ok_or_else(|| TtError::Parse("Tournament cell without link".to_string()))?;
    let id = link
        .value()
        .attr("href")
        .and_then(|href| href.rsplit('=').next())
        .map(|s| s.to_string());
    let name = element_text(link);

    let mut tournament = TournamentRecord::new().with_date(date);
    tournament.ttw.id = id;
    tournament.ttw.name = Some(name);
    tournament.ttw.delta = Some(parse_delta(delta_text.unwrap_or(""))?);
    Ok(tournament)
}

/// One game row; `None` when the row holds no played score
fn parse_game_row(row: ElementRef<'_>) -> Option<GameRecord> {
    let (score, opponent_score) = parse_score(&select_text(row, "td.game-score-cell")?)?;

    let info = select_text(row, "td.game-name-cell").unwrap_or_default();
    let (name, rating) = match OPPONENT_PATTERN.captures(&info) {
        Some(caps) => (
            normalize_name(&caps[1]),
            caps[2].trim().parse::<f64>().ok().map(|r| r.round() as i32),
        ),
        None => (normalize_name(&info), None),
    };

    let delta_text = select_text(row, "td.game-delta-cell").unwrap_or_default();
    let delta = match parse_delta(&delta_text) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("TTW: skipping game against {}: {}", name, e);
            return None;
        }
    };

    let mut game = GameRecord::new(name, score, opponent_score).with_delta(Source::Ttw, delta);
    game.opponent_ttw_rating = rating;
    Some(game)
}

fn has_cell(row: ElementRef<'_>, css: &str) -> bool {
    select_text(row, css).is_some()
}

/// Place of the named player in a standings table; compares short names
pub(crate) fn parse_standings_place(doc: &Html, player_name: &str) -> Result<Option<u32>> {
    let wanted = normalize_name(player_name);
    let row_sel = selector("div.tournament-players > table > tbody > tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    for row in doc.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let name = cells[1]
            .select(&link_sel)
            .next()
            .map(element_text)
            .unwrap_or_else(|| element_text(cells[1]));
        if normalize_name(&name) == wanted {
            return Ok(element_text(cells[0]).parse::<u32>().ok());
        }
    }
    Ok(None)
}

impl SourceParser for TtwParser {
    fn source(&self) -> Source {
        Source::Ttw
    }

    fn connect_to_profile(&self, player_id: &str) -> Result<Html> {
        let html = fetch_page(&self.client, &self.config.build_url(player_id))?;
        Ok(Html::parse_document(&html))
    }

    fn extract_profile_section<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&selector("div.layout-row.player-page").ok()?).next()
    }

    fn extract_results_section<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&selector("div.player-all-games > table > tbody").ok()?).next()
    }

    fn parse_rating(&self, profile: ElementRef<'_>) -> Option<i32> {
        select_text(profile, "div.header-rating")?.parse().ok()
    }

    fn parse_name(&self, profile: ElementRef<'_>) -> Option<String> {
        select_text(profile, "h1").filter(|n| !n.is_empty())
    }

    fn parse_tournament_rows(
        &self,
        results: ElementRef<'_>,
        player_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<TournamentRecord>> {
        let row_sel = selector("tr")?;
        let info_sel = selector("td.game-tournament-name-cell")?;
        let rows: Vec<ElementRef<'_>> = results.select(&row_sel).collect();
        let mut tournaments = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let Some(info_cell) = row.select(&info_sel).next() else {
                continue;
            };
            let delta_text = info_cell
                .next_siblings()
                .find_map(ElementRef::wrap)
                .map(element_text);

            let mut tournament = match parse_tournament_header(info_cell, delta_text.as_deref()) {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("TTW: skipping tournament row for player {}: {}", player_id, e);
                    continue;
                }
            };

            // Rows are newest first
            if tournament.date.is_some_and(|d| d <= since) {
                break;
            }

            let games = rows[i + 1..]
                .iter()
                .take_while(|r| has_cell(**r, "td.game-score-cell"))
                .filter_map(|r| parse_game_row(*r));
            for (n, game) in games.enumerate() {
                let order = n as u32 + 1;
                tournament.add_game(game.with_order(order).with_natural_order(order));
            }
            tournament.owner = Some(player_id.to_string());
            tournaments.push(tournament);
        }

        Ok(tournaments)
    }
}
