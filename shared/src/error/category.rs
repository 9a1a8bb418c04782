//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// - 0xxx: General errors
/// - 1xxx: Category tree errors
/// - 2xxx: Product fetch errors
/// - 3xxx: Criteria errors
/// - 4xxx: Load lifecycle errors
/// - anything else: System
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Category tree errors (1xxx)
    Tree,
    /// Product fetch errors (2xxx)
    Fetch,
    /// Filter/sort criteria errors (3xxx)
    Criteria,
    /// Load lifecycle errors (4xxx)
    Load,
    /// Codes outside the known ranges
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Tree,
            2000..3000 => Self::Fetch,
            3000..4000 => Self::Criteria,
            4000..5000 => Self::Load,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Tree => "tree",
            Self::Fetch => "fetch",
            Self::Criteria => "criteria",
            Self::Load => "load",
            Self::System => "system",
        }
    }

    /// Whether errors in this category are reported back to whoever
    /// supplied the input, rather than the operator
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Criteria | Self::Tree)
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
