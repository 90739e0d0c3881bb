//! Filling in missing finishing places
//!
//! The TTW profile does not show where the player finished, only the
//! tournament's standings page does. Every tournament still lacking a place
//! gets one lookup; lookups run on a bounded thread pool and the call returns
//! only after all of them have finished.

use crate::error::Result;
use crate::model::TournamentRecord;
use crate::sites::TtwParser;
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DEFAULT_MAX_THREADS: usize = 4;

/// Source of finishing places, keyed by TTW tournament id
pub trait PlaceLookup: Send + Sync {
    fn lookup_place(&self, tournament_id: &str, player_name: &str) -> Result<Option<u32>>;
}

impl PlaceLookup for TtwParser {
    fn lookup_place(&self, tournament_id: &str, player_name: &str) -> Result<Option<u32>> {
        self.tournament_place(tournament_id, player_name)
    }
}

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Upper bound on concurrent lookups
    pub max_threads: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            max_threads: DEFAULT_MAX_THREADS,
        }
    }
}

impl EnrichConfig {
    pub fn with_max_threads(max_threads: usize) -> Self {
        Self {
            max_threads: max_threads.max(1),
        }
    }
}

/// A lookup that failed; the tournament keeps its empty place
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichFailure {
    pub index: usize,
    pub tournament_id: String,
    pub message: String,
}

impl fmt::Display for EnrichFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tournament {} (#{}): {}", self.tournament_id, self.index, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrichReport {
    pub attempted: usize,
    pub filled: usize,
    pub failures: Vec<EnrichFailure>,
}

fn needs_place(tournament: &TournamentRecord) -> bool {
    tournament.place.is_none() && tournament.ttw.id.is_some()
}

/// Look up the place of every tournament that has a TTW id but no place.
///
/// A failed lookup is recorded in the report and never affects the others.
pub fn fill_places(
    tournaments: &mut [TournamentRecord],
    player_name: &str,
    lookup: &dyn PlaceLookup,
    config: &EnrichConfig,
) -> Result<EnrichReport> {
    let attempted = tournaments.iter().filter(|t| needs_place(t)).count();
    if attempted == 0 {
        return Ok(EnrichReport::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_threads.max(1))
        .build()?;

    let filled = AtomicUsize::new(0);
    let failures: Mutex<Vec<EnrichFailure>> = Mutex::new(Vec::new());

    pool.install(|| {
        tournaments
            .par_iter_mut()
            .enumerate()
            .filter(|(_, t)| needs_place(t))
            .for_each(|(index, tournament)| {
                let Some(tournament_id) = tournament.ttw.id.clone() else {
                    return;
                };
                match lookup.lookup_place(&tournament_id, player_name) {
                    Ok(Some(place)) => {
                        tournament.place = Some(place);
                        filled.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(None) => {
                        log::debug!("No place for {} in tournament {}", player_name, tournament_id);
                    }
                    Err(e) => {
                        log::warn!("Place lookup for tournament {} failed: {}", tournament_id, e);
                        if let Ok(mut list) = failures.lock() {
                            list.push(EnrichFailure {
                                index,
                                tournament_id,
                                message: e.to_string(),
                            });
                        }
                    }
                }
            });
    });

    let mut failures = failures.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    failures.sort_by_key(|f| f.index);

    Ok(EnrichReport {
        attempted,
        filled: filled.into_inner(),
        failures,
    })
}
