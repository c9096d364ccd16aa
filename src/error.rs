//! All error types for the bundlesync crate.
//!
//! These are returned from all fallible operations (parsing, writing, merging,
//! filter lookup and the sync passes).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown filter type `{0}`")]
    UnknownFilterType(String),

    #[error("illegal resource format: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("resource filter error: {0}")]
    Filter(String),

    #[error("translation service error: {0}")]
    Service(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new format error.
    pub fn format_error(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    /// Creates a new service error.
    pub fn service_error(message: impl Into<String>) -> Self {
        Error::Service(message.into())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Error::Io(io),
                other => Error::Format(format!("{:?}", other)),
            }
        } else {
            Error::Format(format!("CSV: {}", err))
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Error::Format(format!("XML: {}", other)),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Format(format!("XML attribute: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.into())
        } else {
            Error::Format(format!("JSON: {}", err))
        }
    }
}
