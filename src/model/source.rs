use serde::{Deserialize, Serialize};
use std::fmt;

/// A ranking federation that publishes tournament results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Rttf,
    Ttw,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Rttf, Source::Ttw];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RTTF" => Some(Source::Rttf),
            "TTW" => Some(Source::Ttw),
            _ => None,
        }
    }

    pub fn other(&self) -> Source {
        match self {
            Source::Rttf => Source::Ttw,
            Source::Ttw => Source::Rttf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Rttf => "RTTF",
            Source::Ttw => "TTW",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
