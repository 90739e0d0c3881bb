//! Reading and writing player documents and CSV exports

use crate::error::Result;
use crate::model::{FlatHistory, GameRow, Player, TournamentRow};
use crate::rating::RatingChart;
use csv::{Reader, Writer};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const TOURNAMENTS_FILE: &str = "tournaments.csv";
pub const GAMES_FILE: &str = "games.csv";

/// Load a player document (JSON)
pub fn read_player(path: &Path) -> Result<Player> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Save a player document as pretty-printed JSON
pub fn write_player(path: &Path, player: &Player) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, player)?;
    writer.flush()?;
    Ok(())
}

/// Rating chart as `date,rttf,ttw`; a site without a curve leaves its column empty
pub fn write_chart_csv<W: Write>(out: W, chart: &RatingChart) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["date", "rttf", "ttw"])?;

    for (i, date) in chart.dates.iter().enumerate() {
        let value = |series: &[Decimal]| series.get(i).map(|v| v.to_string()).unwrap_or_default();
        writer.write_record([date.to_string(), value(chart.rttf.as_slice()), value(chart.ttw.as_slice())])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write `tournaments.csv` and `games.csv` into `dir`
pub fn write_flat_history(dir: &Path, history: &FlatHistory) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut writer = Writer::from_path(dir.join(TOURNAMENTS_FILE))?;
    for row in &history.tournaments {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let mut writer = Writer::from_path(dir.join(GAMES_FILE))?;
    for row in &history.games {
        writer.serialize(row)?;
    }
    writer.flush()?;

    log::info!(
        "Wrote {} tournaments and {} games to {}",
        history.tournaments.len(),
        history.games.len(),
        dir.display()
    );
    Ok(())
}

pub fn read_flat_history(dir: &Path) -> Result<FlatHistory> {
    let mut reader = Reader::from_path(dir.join(TOURNAMENTS_FILE))?;
    let tournaments = reader.deserialize::<TournamentRow>().collect::<std::result::Result<Vec<_>, _>>()?;

    let mut reader = Reader::from_path(dir.join(GAMES_FILE))?;
    let games = reader.deserialize::<GameRow>().collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(FlatHistory { tournaments, games })
}
