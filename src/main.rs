use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ttrating::enrich::EnrichConfig;
use ttrating::io;
use ttrating::matcher::{self, MatchConfig, DEFAULT_MIN_SHARED_GAMES};
use ttrating::rating::{anchor_date, RatingChart};
use ttrating::sites::{self, RttfParser, TtwParser};
use ttrating::stats::PlayerStats;
use ttrating::sync::{self, SyncConfig};
use ttrating::{FlatHistory, Player, Source, TournamentRecord};

#[derive(Parser)]
#[command(name = "ttrating")]
#[command(about = "Merge RTTF and TTW tournament results and rebuild rating history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a list of tournaments reported by one site into a player document
    Merge {
        /// Player document (JSON)
        player: PathBuf,

        /// Tournaments to merge (JSON array)
        incoming: PathBuf,

        /// Site that reported the incoming tournaments (rttf or ttw)
        #[arg(long, value_parser = parse_source)]
        source: Source,

        /// Output file (defaults to overwriting the player document)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Games two same-day records must share to be merged
        #[arg(long, env = "TTRATING_MATCH_THRESHOLD", default_value_t = DEFAULT_MIN_SHARED_GAMES)]
        match_threshold: usize,
    },

    /// Rebuild rating history and write it as CSV
    Chart {
        /// Player document (JSON)
        player: PathBuf,

        /// Output CSV file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display summary statistics of a player
    Stats {
        /// Player document (JSON)
        player: PathBuf,
    },

    /// Export the tournament history as tournaments.csv and games.csv
    Export {
        /// Player document (JSON)
        player: PathBuf,

        /// Output directory
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// Download fresh results from both sites and merge them into a player document
    Sync {
        /// Player document (JSON); created when missing
        player: PathBuf,

        /// RTTF player id
        #[arg(long)]
        rttf_id: Option<String>,

        /// TTW player id
        #[arg(long)]
        ttw_id: Option<String>,

        /// Only take tournaments strictly after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Games two same-day records must share to be merged
        #[arg(long, env = "TTRATING_MATCH_THRESHOLD", default_value_t = DEFAULT_MIN_SHARED_GAMES)]
        match_threshold: usize,

        /// Concurrent place lookups
        #[arg(long, env = "TTRATING_ENRICH_THREADS")]
        threads: Option<usize>,
    },

    /// Search both sites for a player by name
    Search {
        name: String,

        /// Restrict the search to one site (rttf or ttw)
        #[arg(long, value_parser = parse_source)]
        source: Option<Source>,
    },
}

fn parse_source(s: &str) -> std::result::Result<Source, String> {
    Source::from_str(s).ok_or_else(|| format!("Unknown site '{}', expected rttf or ttw", s))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge { player, incoming, source, output, match_threshold } => {
            merge(&player, &incoming, source, output.as_ref(), match_threshold)?;
        }
        Commands::Chart { player, output } => {
            chart(&player, output.as_ref())?;
        }
        Commands::Stats { player } => {
            stats(&player)?;
        }
        Commands::Export { player, dir } => {
            export(&player, &dir)?;
        }
        Commands::Sync { player, rttf_id, ttw_id, since, match_threshold, threads } => {
            let mut config = SyncConfig {
                matching: MatchConfig::with_min_shared_games(match_threshold),
                enrich: EnrichConfig::default(),
            };
            if let Some(n) = threads {
                config.enrich = EnrichConfig::with_max_threads(n);
            }
            sync_player(&player, rttf_id.as_deref(), ttw_id.as_deref(), since, &config)?;
        }
        Commands::Search { name, source } => {
            search(&name, source)?;
        }
    }

    Ok(())
}

fn load_player(path: &PathBuf) -> Result<Player> {
    io::read_player(path).with_context(|| format!("Failed to read player document {}", path.display()))
}

fn merge(
    player_path: &PathBuf,
    incoming_path: &PathBuf,
    source: Source,
    output: Option<&PathBuf>,
    match_threshold: usize,
) -> Result<()> {
    let mut player = load_player(player_path)?;
    println!("Player: {}", player);

    let file = std::fs::File::open(incoming_path).context("Failed to open incoming tournaments")?;
    let incoming: Vec<TournamentRecord> =
        serde_json::from_reader(std::io::BufReader::new(file)).context("Failed to parse incoming tournaments")?;
    println!("Read {} {} tournaments", incoming.len(), source);

    let config = MatchConfig::with_min_shared_games(match_threshold);
    let plan = matcher::plan_merge(&player.tournaments, &incoming, &config);
    println!("{} matched, {} new", plan.merged(), plan.appended());

    let existing = std::mem::take(&mut player.tournaments);
    player.tournaments = matcher::merge_tournaments(existing, incoming, source, &config);

    let output = output.unwrap_or(player_path);
    println!("Writing player document: {}", output.display());
    io::write_player(output, &player).context("Failed to write player document")?;

    println!("Done!");
    Ok(())
}

fn chart(player_path: &PathBuf, output: Option<&PathBuf>) -> Result<()> {
    let player = load_player(player_path)?;
    let chart = RatingChart::for_player(&player);

    match output {
        Some(path) => {
            let file = std::fs::File::create(path).context("Failed to create chart CSV")?;
            io::write_chart_csv(file, &chart).context("Failed to write chart CSV")?;
            println!("Wrote {} points to {}", chart.dates.len(), path.display());
            for source in Source::ALL {
                if let Some(peak) = chart.peak(source) {
                    println!("  {} peak: {} on {}", source, peak.rating, peak.date);
                }
            }
        }
        None => {
            io::write_chart_csv(std::io::stdout(), &chart).context("Failed to write chart CSV")?;
        }
    }

    Ok(())
}

fn stats(player_path: &PathBuf) -> Result<()> {
    let player = load_player(player_path)?;
    let stats = PlayerStats::calculate(&player.tournaments);

    println!("{}", player);
    println!("{}", stats);
    println!();

    for source in Source::ALL {
        let record = stats.by_source(source);
        println!(
            "{}: {} tournaments, {} games, win rate {:.1}%",
            source,
            stats.tournaments(source),
            record.games(),
            record.win_rate()
        );
    }
    println!(
        "Medals: {} (gold {}, silver {}, bronze {})",
        stats.medals(),
        stats.first_places,
        stats.second_places,
        stats.third_places
    );
    match stats.last_activity() {
        Some(date) => println!("Last activity: {}", date),
        None => println!("Last activity: none"),
    }

    Ok(())
}

fn export(player_path: &PathBuf, dir: &PathBuf) -> Result<()> {
    let player = load_player(player_path)?;
    let history = FlatHistory::from_records(&player.tournaments);

    println!("Writing {} tournaments and {} games to {}", history.tournaments.len(), history.games.len(), dir.display());
    io::write_flat_history(dir, &history).context("Failed to export history")?;

    println!("Done!");
    Ok(())
}

fn sync_player(
    player_path: &PathBuf,
    rttf_id: Option<&str>,
    ttw_id: Option<&str>,
    since: Option<NaiveDate>,
    config: &SyncConfig,
) -> Result<()> {
    let mut player = if player_path.exists() {
        load_player(player_path)?
    } else {
        println!("Creating new player document: {}", player_path.display());
        Player::new()
    };
    if let Some(id) = rttf_id {
        player = player.with_id(Source::Rttf, id);
    }
    if let Some(id) = ttw_id {
        player = player.with_id(Source::Ttw, id);
    }
    if player.rttf_id.is_none() && player.ttw_id.is_none() {
        anyhow::bail!("Player has neither an RTTF nor a TTW id");
    }

    let since = since.unwrap_or_else(anchor_date);
    println!("Fetching results after {}", since);

    let rttf = RttfParser::new().context("Failed to create RTTF client")?;
    let ttw = TtwParser::new().context("Failed to create TTW client")?;
    let outcome = sync::sync_player(&mut player, since, &rttf, &ttw, &ttw, config).context("Sync failed")?;

    println!("{}", player);
    println!("{}", outcome);
    for failure in &outcome.enrich.failures {
        println!("  Warning: place lookup failed for {}", failure);
    }

    println!("Writing player document: {}", player_path.display());
    io::write_player(player_path, &player).context("Failed to write player document")?;

    println!("Done!");
    Ok(())
}

fn search(name: &str, source: Option<Source>) -> Result<()> {
    let sources = match source {
        Some(s) => vec![s],
        None => Source::ALL.to_vec(),
    };

    for source in sources {
        match sites::search_players(source, name) {
            Ok(hits) => {
                println!("{}: {} players found", source, hits.len());
                for hit in hits {
                    println!("  {}", hit);
                }
            }
            Err(e) => {
                println!("Warning: {} search failed: {}", source, e);
            }
        }
    }

    Ok(())
}
