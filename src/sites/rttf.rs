//! RTTF player pages
//!
//! The profile lists one row per tournament; the games of a tournament are
//! loaded separately through the site's ajax endpoint, which answers with a
//! JSON object wrapping an HTML fragment.

use super::score::parse_score;
use super::{fetch_page, parse_date, parse_delta, row_cells, selector, select_text, SiteConfig, SourceParser};
use crate::error::{Result, TtError};
use crate::model::{GameRecord, Source, TournamentRecord};
use crate::normalize::normalize_name;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Deserialize;

const GAMES_ENDPOINT: &str = "https://rttf.ru/?ajax=";

lazy_static! {
    static ref SHOW_TOUR: Regex = Regex::new(r"showTour\((\d+)").unwrap();
}

#[derive(Debug, Deserialize)]
struct AjaxResponse {
    #[serde(default)]
    html: Option<String>,
}

pub struct RttfParser {
    client: reqwest::blocking::Client,
    config: SiteConfig,
}

impl RttfParser {
    pub fn new() -> Result<Self> {
        Self::with_config(SiteConfig::RTTF)
    }

    pub fn with_config(config: SiteConfig) -> Result<Self> {
        Ok(Self {
            client: config.client()?,
            config,
        })
    }

    /// Games of one tournament as an HTML fragment
    fn fetch_games_html(&self, player_id: &str, tournament_id: &str) -> Result<String> {
        let response = self
            .client
            .post(GAMES_ENDPOINT)
            .form(&[("showTour", tournament_id), ("userID", player_id)])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtError::Fetch(format!(
                "RTTF games of tournament {}: HTTP {}",
                tournament_id,
                status.as_u16()
            )));
        }

        let body: AjaxResponse = serde_json::from_str(&response.text()?)?;
        Ok(body.html.unwrap_or_default())
    }
}

/// Tournament row: id from `onclick`, date, name from two cells, delta, place
fn parse_tournament_row(row: ElementRef<'_>) -> Result<TournamentRecord> {
    let cells = row_cells(row, &selector("td")?);
    if cells.len() < 7 {
        return Err(TtError::Parse(format!("Tournament row with {} cells", cells.len())));
    }

    let date_text = cells[0].split_whitespace().next().unwrap_or("");
    let mut tournament = TournamentRecord::new().with_date(parse_date(date_text)?);

    tournament.rttf.id = row
        .value()
        .attr("onclick")
        .and_then(|js| SHOW_TOUR.captures(js))
        .map(|caps| caps[1].to_string());
    tournament.rttf.name = Some(format!("{}-{}", cells[2], cells[1]));
    tournament.rttf.delta = Some(parse_delta(&cells[6])?);
    tournament.place = cells.get(7).and_then(|p| p.trim().parse::<u32>().ok());

    Ok(tournament)
}

/// Games from the ajax fragment, numbered in page order
pub(crate) fn parse_games(fragment: &str) -> Result<Vec<GameRecord>> {
    let doc = Html::parse_fragment(fragment);
    let row_sel = selector("table.tablesort > tbody > tr")?;
    let cell_sel = selector("td")?;
    let mut games = Vec::new();

    for row in doc.select(&row_sel) {
        let cells = row_cells(row, &cell_sel);
        if cells.len() < 6 {
            continue;
        }
        let opponent = normalize_name(&cells[2]);
        if opponent.is_empty() {
            continue;
        }
        let Some((score, opponent_score)) = parse_score(&cells[4]) else {
            log::warn!("RTTF: skipping game against {} with score '{}'", opponent, cells[4]);
            continue;
        };
        let delta = match parse_delta(&cells[5]) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("RTTF: skipping game against {}: {}", opponent, e);
                continue;
            }
        };

        let order = games.len() as u32 + 1;
        let mut game = GameRecord::new(opponent, score, opponent_score)
            .with_order(order)
            .with_natural_order(order)
            .with_delta(Source::Rttf, delta);
        game.opponent_rttf_rating = cells[3].trim().parse().ok();
        games.push(game);
    }

    Ok(games)
}

/// Tournament rows newer than `since`, each filled with the games `load_games`
/// returns for its id. A failed load keeps the tournament without games.
fn collect_tournaments(
    results: ElementRef<'_>,
    player_id: &str,
    since: NaiveDate,
    mut load_games: impl FnMut(&str) -> Result<Vec<GameRecord>>,
) -> Result<Vec<TournamentRecord>> {
    let row_sel = selector("table.tablesort > tbody > tr")?;
    let mut tournaments = Vec::new();

    for row in results.select(&row_sel) {
        let mut tournament = match parse_tournament_row(row) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("RTTF: skipping tournament row for player {}: {}", player_id, e);
                continue;
            }
        };

        // Rows are newest first
        if tournament.date.is_some_and(|d| d <= since) {
            break;
        }

        if let Some(tournament_id) = tournament.rttf.id.clone() {
            match load_games(&tournament_id) {
                Ok(games) => {
                    for game in games {
                        tournament.add_game(game);
                    }
                }
                Err(e) => log::error!(
                    "RTTF: failed to load games of tournament {} for player {}: {}",
                    tournament_id,
                    player_id,
                    e
                ),
            }
        }

        tournament.owner = Some(player_id.to_string());
        tournaments.push(tournament);
    }

    Ok(tournaments)
}

impl SourceParser for RttfParser {
    fn source(&self) -> Source {
        Source::Rttf
    }

    fn connect_to_profile(&self, player_id: &str) -> Result<Html> {
        let html = fetch_page(&self.client, &self.config.build_url(player_id))?;
        Ok(Html::parse_document(&html))
    }

    fn extract_profile_section<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&selector("section.player-info").ok()?).next()
    }

    fn extract_results_section<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&selector("section.player-results-all").ok()?).next()
    }

    fn parse_rating(&self, profile: ElementRef<'_>) -> Option<i32> {
        select_text(profile, "dfn")?.parse().ok()
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
        collect_tournaments(results, player_id, since, |tournament_id| {
            self.fetch_games_html(player_id, tournament_id)
                .and_then(|html| parse_games(&html))
        })
    }
}
