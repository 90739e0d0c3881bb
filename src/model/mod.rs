pub mod game;
pub mod history;
pub mod player;
pub mod source;
pub mod tournament;

pub use game::{GameKey, GameRecord, Outcome};
pub use history::{FlatHistory, GameRow, TournamentRow};
pub use player::Player;
pub use source::Source;
pub use tournament::{SourceFields, TournamentRecord};
