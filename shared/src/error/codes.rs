//! Unified error codes for the catalog view
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Category tree errors
//! - 2xxx: Product fetch errors
//! - 3xxx: Filter/sort criteria errors
//! - 4xxx: Catalog load lifecycle errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so a presentation layer
/// can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,

    // ==================== 1xxx: Category tree ====================
    /// A tree node has no id
    CategoryIdMissing = 1002,
    /// A category appears inside its own subtree
    CategoryCycle = 1003,

    // ==================== 2xxx: Product fetch ====================
    /// Retrieval call itself failed
    FetchFailed = 2002,
    /// Load finished with failed product fetches
    PartialLoad = 2003,
    /// Tree or product source is unavailable
    SourceUnavailable = 2004,

    // ==================== 3xxx: Criteria ====================
    /// Filter or sort criteria rejected
    InvalidCriteria = 3001,
    /// Price bounds with min > max
    InvalidPriceRange = 3002,
    /// Volume bounds with min > max
    InvalidVolumeRange = 3003,
    /// Sort key not recognised
    UnknownSortKey = 3004,
    /// Sort order not recognised
    UnknownSortOrder = 3005,

    // ==================== 4xxx: Load lifecycle ====================
    /// A newer load started before this one committed
    LoadSuperseded = 4001,
    /// Load was cancelled
    LoadCancelled = 4002,
    /// No catalog has been committed yet
    CatalogNotLoaded = 4003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",

            // Tree
            ErrorCode::CategoryIdMissing => "Category tree node has no id",
            ErrorCode::CategoryCycle => "Category appears inside its own subtree",

            // Fetch
            ErrorCode::FetchFailed => "Product fetch failed",
            ErrorCode::PartialLoad => "Catalog load finished with failed fetches",
            ErrorCode::SourceUnavailable => "Catalog source is unavailable",

            // Criteria
            ErrorCode::InvalidCriteria => "Invalid filter or sort criteria",
            ErrorCode::InvalidPriceRange => "Minimum price exceeds maximum price",
            ErrorCode::InvalidVolumeRange => "Minimum volume exceeds maximum volume",
            ErrorCode::UnknownSortKey => "Unknown sort key",
            ErrorCode::UnknownSortOrder => "Unknown sort order",

            // Load
            ErrorCode::LoadSuperseded => "Catalog load was superseded by a newer load",
            ErrorCode::LoadCancelled => "Catalog load was cancelled",
            ErrorCode::CatalogNotLoaded => "Catalog has not been loaded",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),

            1002 => Ok(ErrorCode::CategoryIdMissing),
            1003 => Ok(ErrorCode::CategoryCycle),

            2002 => Ok(ErrorCode::FetchFailed),
            2003 => Ok(ErrorCode::PartialLoad),
            2004 => Ok(ErrorCode::SourceUnavailable),

            3001 => Ok(ErrorCode::InvalidCriteria),
            3002 => Ok(ErrorCode::InvalidPriceRange),
            3003 => Ok(ErrorCode::InvalidVolumeRange),
            3004 => Ok(ErrorCode::UnknownSortKey),
            3005 => Ok(ErrorCode::UnknownSortOrder),

            4001 => Ok(ErrorCode::LoadSuperseded),
            4002 => Ok(ErrorCode::LoadCancelled),
            4003 => Ok(ErrorCode::CatalogNotLoaded),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
