use thiserror::Error;

use crate::identifiers::IdentifierError;

#[derive(Error, Debug)]
pub enum DepotError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown legacy booking type: {0}")]
    UnknownLegacyType(i64),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Backup failed integrity validation ({} problems)", .0.len())]
    Integrity(Vec<String>),

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid {field}: {source}")]
    Identifier {
        field: &'static str,
        source: IdentifierError,
    },

    #[error("An account with IBAN {0} already exists")]
    DuplicateIban(String),

    #[error("Booking type already exists: {0}")]
    DuplicateBookingType(String),

    #[error("Booking type {id} is used by {count} bookings")]
    BookingTypeInUse { id: i64, count: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DepotError>;
