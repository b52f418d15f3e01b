//! Error taxonomy for the back office
//!
//! Import/export errors carry enough context (sheet, row, field) to be
//! surfaced directly as a user-facing message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A spreadsheet row failed to decode (missing or invalid field)
    #[error("sheet '{sheet}', row {row}: invalid or missing field '{field}'")]
    MalformedRow {
        sheet: &'static str,
        row: usize,
        field: &'static str,
    },

    /// A required sheet is absent from the uploaded workbook
    #[error("sheet '{sheet}' is missing from the workbook")]
    MissingSheet { sheet: &'static str },

    /// No event is currently flagged active
    #[error("no active event")]
    MissingActiveEvent,

    /// A stored record is missing a field the caller relies on
    #[error("{kind} record {id} has no usable '{field}' field")]
    CorruptRecord {
        kind: &'static str,
        id: i64,
        field: &'static str,
    },

    /// Opaque failure from the storage layer
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Workbook file could not be read or written
    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Error::Unauthorized(message.into())
    }
}
