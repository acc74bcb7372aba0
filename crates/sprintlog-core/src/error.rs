use std::fmt;

use crate::model::item_key::ItemKey;

/// Machine-readable error codes for scripts and dashboards consuming `sprintlog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidConfiguration,
    NotFoundInCache,
    MalformedRecord,
    UnparsableTimestamp,
    InvalidItemKey,
    CacheReadFailed,
    SinkWriteFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidConfiguration => "E1002",
            Self::NotFoundInCache => "E2001",
            Self::MalformedRecord => "E2002",
            Self::UnparsableTimestamp => "E2003",
            Self::InvalidItemKey => "E2004",
            Self::CacheReadFailed => "E3001",
            Self::SinkWriteFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::NotFoundInCache => "Item not found in cache",
            Self::MalformedRecord => "Malformed cache record",
            Self::UnparsableTimestamp => "Unparsable history timestamp",
            Self::InvalidItemKey => "Invalid item key",
            Self::CacheReadFailed => "Cache read failed",
            Self::SinkWriteFailed => "Report write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in sprintlog.toml and retry."),
            Self::InvalidConfiguration => {
                Some("Use one of the documented values, e.g. --interval daily|hourly|minutely.")
            }
            Self::NotFoundInCache => Some("Refetch the item into the cache directory."),
            Self::MalformedRecord => Some("Delete the cached file and refetch the item."),
            Self::UnparsableTimestamp | Self::InvalidItemKey => None,
            Self::CacheReadFailed => Some("Check that --dir points at a readable cache directory."),
            Self::SinkWriteFailed => Some("Check disk space and write permissions for --out."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while resolving, replaying, aggregating, or emitting sprint
/// timelines.
///
/// Per-item variants (`NotFoundInCache`, `MalformedRecord`,
/// `UnparsableTimestamp`) are handled locally by the run loop. The rest abort
/// the run.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("item {0} not found in cache")]
    NotFoundInCache(ItemKey),

    #[error("malformed {what} for {key}: {details}")]
    MalformedRecord {
        key: String,
        what: &'static str,
        details: String,
    },

    #[error("unparsable history timestamp '{0}'")]
    UnparsableTimestamp(String),

    #[error("invalid item key '{0}': expected <PROJECT>-<number>")]
    InvalidItemKey(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to read cache at {path}: {source}")]
    CacheRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report: {0}")]
    SinkWrite(#[source] std::io::Error),
}

impl TrackError {
    /// Build a [`TrackError::MalformedRecord`] from any displayable cause.
    pub fn malformed(key: impl Into<String>, what: &'static str, details: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            key: key.into(),
            what,
            details: details.to_string(),
        }
    }

    /// The stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFoundInCache(_) => ErrorCode::NotFoundInCache,
            Self::MalformedRecord { .. } => ErrorCode::MalformedRecord,
            Self::UnparsableTimestamp(_) => ErrorCode::UnparsableTimestamp,
            Self::InvalidItemKey(_) => ErrorCode::InvalidItemKey,
            Self::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            Self::CacheRead { .. } => ErrorCode::CacheReadFailed,
            Self::SinkWrite(_) => ErrorCode::SinkWriteFailed,
        }
    }

    /// Whether this error only affects a single item and the run may continue.
    #[must_use]
    pub const fn is_item_local(&self) -> bool {
        matches!(
            self,
            Self::NotFoundInCache(_) | Self::MalformedRecord { .. } | Self::UnparsableTimestamp(_)
        )
    }

    /// Remediation text for terminal and JSON error output.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code()
            .hint()
            .unwrap_or_else(|| self.error_code().message())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, TrackError};
    use crate::model::item_key::ItemKey;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidConfiguration,
            ErrorCode::NotFoundInCache,
            ErrorCode::MalformedRecord,
            ErrorCode::UnparsableTimestamp,
            ErrorCode::InvalidItemKey,
            ErrorCode::CacheReadFailed,
            ErrorCode::SinkWriteFailed,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::MalformedRecord.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn item_local_errors_do_not_abort() {
        let key = ItemKey::parse("ABC-1").expect("valid key");
        assert!(TrackError::NotFoundInCache(key).is_item_local());
        assert!(TrackError::malformed("ABC-1", "issue", "bad json").is_item_local());
        assert!(!TrackError::InvalidConfiguration("interval".into()).is_item_local());
        let sink = std::io::Error::other("disk full");
        assert!(!TrackError::SinkWrite(sink).is_item_local());
    }

    #[test]
    fn malformed_message_names_key_and_record() {
        let err = TrackError::malformed("ABC-7", "changelog", "expected object");
        assert_eq!(
            err.to_string(),
            "malformed changelog for ABC-7: expected object"
        );
        assert_eq!(err.error_code(), ErrorCode::MalformedRecord);
    }
}
