//! Fetching and parsing player profiles from the two rating sites
//!
//! Each site gets a [`SourceParser`] implementation; everything downstream
//! only sees [`TournamentRecord`]s and never knows which page layout they
//! came from.

pub mod rttf;
pub mod score;
pub mod search;
pub mod ttw;

use crate::error::{Result, TtError};
use crate::model::{Player, Source, TournamentRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

pub use rttf::RttfParser;
pub use search::{search_players, PlayerMatch};
pub use ttw::TtwParser;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Where a site lives and how patient to be with it
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub url_template: &'static str,
    pub user_agent: &'static str,
    pub timeout: Duration,
}

impl SiteConfig {
    pub const RTTF: SiteConfig = SiteConfig {
        url_template: "https://rttf.ru/results/{}",
        user_agent: USER_AGENT,
        timeout: Duration::from_secs(10),
    };

    pub const TTW: SiteConfig = SiteConfig {
        url_template: "https://r.ttw.ru/players/?id={}",
        user_agent: USER_AGENT,
        timeout: Duration::from_secs(30),
    };

    pub const TTW_TOURNAMENT: SiteConfig = SiteConfig {
        url_template: "https://r.ttw.ru/tournaments/?id={}",
        user_agent: USER_AGENT,
        timeout: Duration::from_secs(30),
    };

    pub fn build_url(&self, id: &str) -> String {
        self.url_template.replace("{}", id.trim())
    }

    pub fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .user_agent(self.user_agent)
            .timeout(self.timeout)
            .build()
            .map_err(|e| TtError::Fetch(format!("Failed to create HTTP client: {}", e)))
    }
}

/// GET a page and return its body, failing on non-success statuses
pub fn fetch_page(client: &reqwest::blocking::Client, url: &str) -> Result<String> {
    log::debug!("GET {}", url);
    let response = client
        .get(url)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "ru-RU,ru;q=0.9,en;q=0.8")
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(TtError::Fetch(format!(
            "{}: HTTP {} {}",
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    Ok(response.text()?)
}

/// Everything one site reports about a player in one fetch
#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    pub rating: Option<i32>,
    pub name: Option<String>,
    pub tournaments: Vec<TournamentRecord>,
}

/// Per-site page layout knowledge.
///
/// Implementations supply the four site-specific steps; [`SourceParser::fetch`]
/// and [`SourceParser::read_profile`] chain them the same way for every site.
pub trait SourceParser: Send + Sync {
    fn source(&self) -> Source;

    /// Download the profile page of the player with this site id
    fn connect_to_profile(&self, player_id: &str) -> Result<Html>;

    /// Block of the profile page holding the player's name and rating
    fn extract_profile_section<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>>;

    /// Block of the profile page listing tournament results
    fn extract_results_section<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>>;

    fn parse_rating(&self, profile: ElementRef<'_>) -> Option<i32>;

    fn parse_name(&self, profile: ElementRef<'_>) -> Option<String>;

    /// Tournaments strictly newer than `since`, newest first, with their games
    fn parse_tournament_rows(
        &self,
        results: ElementRef<'_>,
        player_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<TournamentRecord>>;

    /// Parse an already downloaded profile page
    fn read_profile(&self, doc: &Html, player_id: &str, since: NaiveDate) -> Result<SourceReport> {
        let profile = self
            .extract_profile_section(doc)
            .ok_or_else(|| TtError::MissingSection {
                site: self.source().to_string(),
                selector: "player profile".to_string(),
            })?;

        let tournaments = match self.extract_results_section(doc) {
            Some(results) => self.parse_tournament_rows(results, player_id, since)?,
            None => {
                log::warn!("{}: no results section for player {}", self.source(), player_id);
                Vec::new()
            }
        };

        Ok(SourceReport {
            rating: self.parse_rating(profile),
            name: self.parse_name(profile),
            tournaments,
        })
    }

    /// Fetch the player's results from this site; `None` when the player
    /// has no id here
    fn fetch(&self, player: &Player, since: NaiveDate) -> Result<Option<SourceReport>> {
        let Some(player_id) = player.id(self.source()) else {
            return Ok(None);
        };
        let doc = self.connect_to_profile(player_id)?;
        let report = self.read_profile(&doc, player_id, since)?;
        log::info!(
            "{}: player {} rating {:?}, {} tournaments after {}",
            self.source(),
            player_id,
            report.rating,
            report.tournaments.len(),
            since
        );
        Ok(Some(report))
    }
}

/// Parse a CSS selector known at compile time
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TtError::Parse(format!("Invalid selector {}: {:?}", css, e)))
}

/// Text of the first element matching `css` under `root`, trimmed
pub(crate) fn select_text(root: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let el = root.select(&sel).next()?;
    Some(element_text(el))
}

pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text of all cells of a table row
pub(crate) fn row_cells(row: ElementRef<'_>, cell: &Selector) -> Vec<String> {
    row.select(cell).map(element_text).collect()
}

/// Dates on both sites look like `31.12.2024`
pub(crate) fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim().trim_end_matches(',');
    NaiveDate::parse_from_str(text, "%d.%m.%Y").map_err(|_| TtError::InvalidDate(text.to_string()))
}

/// Rating delta cell; an empty cell means no change
pub(crate) fn parse_delta(text: &str) -> Result<Decimal> {
    let cleaned = text.trim().replace('−', "-").replace('+', "").replace(',', ".");
    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }
    cleaned
        .parse::<Decimal>()
        .map_err(|e| TtError::Parse(format!("Invalid delta '{}': {}", text, e)))
}
