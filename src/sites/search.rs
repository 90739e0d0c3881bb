//! Looking up a player's site id by name

use super::{element_text, fetch_page, selector, SiteConfig};
use crate::error::{Result, TtError};
use crate::model::Source;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::fmt;
use std::thread;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;

lazy_static! {
    static ref ID_PATTERN: Regex = Regex::new(r"id=([a-f0-9]+)").unwrap();
    static ref INVISIBLE: Regex = Regex::new(r"[\u{2060}\u{00a0}\s]+").unwrap();
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerMatch {
    pub source: Source,
    pub full_name: String,
    pub city: String,
    pub rating: Option<i32>,
    pub player_id: String,
}

impl fmt::Display for PlayerMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rating = self.rating.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "[{}] {} ({}) rating: {} | {}",
            self.source, self.full_name, self.city, rating, self.player_id
        )
    }
}

fn search_url(source: Source, name: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
    match source {
        Source::Rttf => format!("https://rttf.ru/players/?type=s&name={}", encoded),
        Source::Ttw => format!("https://r.ttw.ru/players/?player-name={}", encoded),
    }
}

fn parse_rating(text: &str) -> Option<i32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Id from a profile link: `?id=ab12` or the last path segment
fn extract_player_id(href: &str) -> Option<String> {
    if href.contains("id=") {
        return ID_PATTERN.captures(href).map(|caps| caps[1].to_string());
    }
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn attr_or_text(cell: ElementRef<'_>, attr: &str) -> String {
    cell.value()
        .attr(attr)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| element_text(cell))
}

/// Hits from a search results page
pub(crate) fn parse_search_results(source: Source, html: &str) -> Result<Vec<PlayerMatch>> {
    let doc = Html::parse_document(html);
    let link_sel = selector("a")?;
    let mut matches = Vec::new();

    match source {
        Source::Rttf => {
            let row_sel = selector("section.players-list table tbody tr")?;
            let cell_sel = selector("td")?;
            for row in doc.select(&row_sel) {
                let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
                if cells.len() < 5 {
                    continue;
                }
                let id = cells[1]
                    .select(&link_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(extract_player_id);
                if let Some(player_id) = id {
                    matches.push(PlayerMatch {
                        source,
                        full_name: element_text(cells[1]),
                        city: element_text(cells[3]),
                        rating: parse_rating(&element_text(cells[4])),
                        player_id,
                    });
                }
            }
        }
        Source::Ttw => {
            let row_sel = selector("div.player-list table tbody tr")?;
            let name_sel = selector("td.player-name-cell")?;
            let city_sel = selector("td.player-city-cell")?;
            let rating_sel = selector("td.player-rating-cell")?;
            for row in doc.select(&row_sel) {
                let Some(name_cell) = row.select(&name_sel).next() else {
                    continue;
                };
                let id = name_cell
                    .select(&link_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(extract_player_id);
                if let Some(player_id) = id {
                    matches.push(PlayerMatch {
                        source,
                        full_name: attr_or_text(name_cell, "title"),
                        city: row
                            .select(&city_sel)
                            .next()
                            .map(|c| attr_or_text(c, "title"))
                            .unwrap_or_default(),
                        rating: row
                            .select(&rating_sel)
                            .next()
                            .and_then(|c| parse_rating(&attr_or_text(c, "title"))),
                        player_id,
                    });
                }
            }
        }
    }

    Ok(matches)
}

/// Search a site for players by name, retrying transient failures
pub fn search_players(source: Source, raw_name: &str) -> Result<Vec<PlayerMatch>> {
    let name = INVISIBLE.replace_all(raw_name, " ").trim().to_string();
    if name.is_empty() {
        return Ok(Vec::new());
    }

    let config = match source {
        Source::Rttf => SiteConfig::RTTF,
        Source::Ttw => SiteConfig::TTW,
    };
    let client = config.client()?;
    let url = search_url(source, &name);

    with_retries(source, || fetch_page(&client, &url), thread::sleep)
        .and_then(|html| parse_search_results(source, &html))
}

/// Pause before the attempt following `attempt` (0-based)
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(1000 * u64::from(attempt + 1))
}

/// Run `fetch` up to [`MAX_ATTEMPTS`] times, pausing between attempts but not
/// after the last one
fn with_retries<T>(
    source: Source,
    mut fetch: impl FnMut() -> Result<T>,
    mut pause: impl FnMut(Duration),
) -> Result<T> {
    let mut last_error = None;
    for attempt in 0..MAX_ATTEMPTS {
        match fetch() {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("{} search attempt {} failed: {}", source, attempt + 1, e);
                last_error = Some(e);
                if attempt + 1 < MAX_ATTEMPTS {
                    pause(backoff(attempt));
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| TtError::Fetch(format!("{} search failed", source))))
}
