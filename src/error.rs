//! Error enum
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    /// A required corpus file or store is not there.
    MissingRequiredFile(PathBuf),
    /// Clobber guard for stores and corpus directories.
    TargetAlreadyExists(PathBuf),
    InvalidField {
        entity: String,
        field: String,
    },
    InvalidEntityKind(String),
    InvalidRatio(String),
    InvalidSplitKey(String),
    InvalidValue {
        field: String,
        value: String,
    },
    /// A line does not hold enough fields for its file.
    Malformed {
        path: PathBuf,
        line: usize,
    },
    /// A record references an identifier defined nowhere else.
    UnknownIdentifier {
        path: PathBuf,
        id: String,
    },
    UnsupportedProvider(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Sqlite(e) => write!(f, "store error: {}", e),
            Error::Serde(e) => write!(f, "json error: {}", e),
            Error::MissingRequiredFile(p) => write!(f, "required file {:?} does not exist", p),
            Error::TargetAlreadyExists(p) => write!(
                f,
                "{:?} already exists. Remove or rename it before proceeding",
                p
            ),
            Error::InvalidField { entity, field } => {
                write!(f, "entity {} cannot update field {}", entity, field)
            }
            Error::InvalidEntityKind(k) => write!(f, "unknown entity kind {}", k),
            Error::InvalidRatio(r) => write!(f, "invalid ratio: {}", r),
            Error::InvalidSplitKey(k) => write!(
                f,
                "split key can be either 'utt', 'spk' or 'sent', got {}",
                k
            ),
            Error::InvalidValue { field, value } => {
                write!(f, "invalid value {:?} for field {}", value, field)
            }
            Error::Malformed { path, line } => write!(f, "malformed line {} in {:?}", line, path),
            Error::UnknownIdentifier { path, id } => {
                write!(f, "unknown identifier {} referenced in {:?}", id, path)
            }
            Error::UnsupportedProvider(p) => write!(f, "unsupported store provider {}", p),
            Error::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        Error::Sqlite(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
