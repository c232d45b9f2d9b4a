//! Content subsystem errors.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tenant::slug::SlugError;

/// Machine-readable category of a schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    TooSmall,
    TooBig,
    InvalidString,
    InvalidEnumValue,
    UnrecognizedKeys,
    Custom,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::TooSmall => "too_small",
            IssueCode::TooBig => "too_big",
            IssueCode::InvalidString => "invalid_string",
            IssueCode::InvalidEnumValue => "invalid_enum_value",
            IssueCode::UnrecognizedKeys => "unrecognized_keys",
            IssueCode::Custom => "custom",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violation, located by a dotted path (`contact.address.coordinates.latitude`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
    pub code: IssueCode,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(f, "{}: {} ({})", self.path, self.message, self.code)
        }
    }
}

/// A document failed validation. Always carries at least one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    issues: Vec<Issue>,
}

impl SchemaViolation {
    pub(crate) fn new(issues: Vec<Issue>) -> Self {
        debug_assert!(!issues.is_empty(), "a violation needs at least one issue");
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// True if some issue points exactly at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema violation(s): ", self.issues.len())?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolation {}

/// Errors returned by the config loader.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No document exists at `{base}/{slug}/config.json`.
    #[error("configuration not found for tenant: {slug}")]
    TenantNotFound { slug: String, path: PathBuf },

    /// The document exists but is not a valid client configuration.
    #[error("invalid configuration for tenant {slug}: {source}")]
    InvalidConfiguration {
        slug: String,
        #[source]
        source: SchemaViolation,
    },

    /// The document is not well-formed JSON.
    #[error("failed to parse configuration for tenant {slug}: {source}")]
    Parse {
        slug: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid tenant slug: {0}")]
    InvalidSlug(#[from] SlugError),

    /// Storage failure other than "not found". Never wrapped into a data error.
    #[error("failed to read configuration for tenant {slug}: {source}")]
    Io {
        slug: String,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// Stable identifier used in API responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            ContentError::TenantNotFound { .. } => "tenant_not_found",
            ContentError::InvalidConfiguration { .. } => "invalid_configuration",
            ContentError::Parse { .. } => "invalid_json",
            ContentError::InvalidSlug(_) => "invalid_slug",
            ContentError::Io { .. } => "io_error",
        }
    }
}

/// Result type for content operations.
pub type ContentResult<T> = Result<T, ContentError>;
