use std::fmt;

use crate::codec::CodecError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The step of a restore that a host write failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStage {
    Armor,
    Extra,
    Main,
    Progression,
}

impl fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestoreStage::Armor => "armor slots",
            RestoreStage::Extra => "extra slots",
            RestoreStage::Main => "main slots",
            RestoreStage::Progression => "progression",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("snapshot {id} has corrupt {field}: {reason}")]
    CorruptData {
        id: i64,
        field: &'static str,
        reason: String,
    },

    #[error("a snapshot with timestamp {timestamp} already exists")]
    Conflict { timestamp: i64 },

    #[error("invalid snapshot selector '{0}': expected 'latest' or a numeric id")]
    InvalidSelector(String),

    #[error("invalid snapshot id {0}: ids are positive")]
    InvalidId(i64),

    #[error("{field} has {actual} slots, layout declares {expected}")]
    LayoutMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("point total {points} is above the supported maximum of {max}")]
    PointsOutOfRange { points: i64, max: i64 },

    #[error("restore stopped while writing {stage}: {reason} (earlier writes were kept)")]
    PartialRestore { stage: RestoreStage, reason: String },

    #[error("could not encode slots: {0}")]
    Codec(#[from] CodecError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("could not determine {0} directory")]
    DataDir(&'static str),
}

impl Error {
    pub(crate) fn corrupt(id: i64, field: &'static str, source: CodecError) -> Self {
        Error::CorruptData {
            id,
            field,
            reason: source.to_string(),
        }
    }
}
