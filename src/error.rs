//! Error types for coursekit operations.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that abort the unit currently being converted.
///
/// Unresolvable asset ids and unrecognized question or tag types are not
/// errors; they are logged and recovered from where they occur.
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport failure: {0}")]
    Transport(#[from] FetchError),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures reported by the [`PageFetcher`](crate::PageFetcher).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True when the input itself could not be parsed.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::Json(_) | Error::Xml(_) | Error::MalformedMarkup(_) | Error::MalformedInput(_)
        )
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::MalformedMarkup(e.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(e: quick_xml::escape::EscapeError) -> Self {
        Error::MalformedMarkup(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
