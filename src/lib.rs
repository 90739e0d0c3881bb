pub mod enrich;
pub mod error;
pub mod io;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod rating;
pub mod sites;
pub mod stats;
pub mod sync;

pub use error::{Result, TtError};
pub use model::*;
