//! # Pantry Error Types Module
//!
//! This module defines the error taxonomy shared by every pantry operation.
//! Store and network failures arrive as `anyhow::Error` and are folded into
//! [`PantryError::Upstream`]; everything else is a domain outcome that the
//! tool layer turns into a plain reply.

/// Custom error types for pantry operations
#[derive(Debug, Clone, PartialEq)]
pub enum PantryError {
    /// A referenced recipe, item or record does not exist
    NotFound {
        /// What was looked up (e.g. "recipe", "want-list item")
        kind: &'static str,
        /// The id or name used for the lookup
        key: String,
    },
    /// No conversion path exists between two units
    NotConvertible {
        /// Canonical source unit
        from: String,
        /// Canonical target unit
        to: String,
    },
    /// A required argument combination was not supplied
    MissingInput(String),
    /// Arguments were supplied but could not be understood
    InvalidArguments(String),
    /// The remote document store call failed
    Upstream(String),
}

impl PantryError {
    /// Shorthand for a not-found error
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        PantryError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Whether the failure came from the remote store rather than the request
    pub fn is_upstream(&self) -> bool {
        matches!(self, PantryError::Upstream(_))
    }
}

impl std::fmt::Display for PantryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PantryError::NotFound { kind, key } => write!(f, "Not found: {kind} '{key}'"),
            PantryError::NotConvertible { from, to } => {
                write!(f, "Cannot convert from '{from}' to '{to}'")
            }
            PantryError::MissingInput(msg) => write!(f, "Missing input: {msg}"),
            PantryError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            PantryError::Upstream(msg) => write!(f, "Upstream error: {msg}"),
        }
    }
}

impl std::error::Error for PantryError {}

impl From<anyhow::Error> for PantryError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line
        PantryError::Upstream(format!("{err:#}"))
    }
}
