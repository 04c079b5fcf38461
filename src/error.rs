//! # Error Handling
//!
//! The error type used across the compression library: one variant per failure
//! domain, each carrying an [`ErrorContext`], plus classification helpers.
//!
//! ## What Is Not An Error
//!
//! Two conditions look like failures but are documented behavior:
//!
//! - An out-of-range rank `k` is clamped into `[1, min(height, width)]`
//! - An encoder search that cannot get below the original size still returns a result,
//!   flagged through [`CompressionResult::size_reduced`](crate::report::CompressionResult::size_reduced)
//!
//! ## Usage
//!
//! ```rust
//! use svd_image_compress::error::{classify, CompressError, HasRecoverySuggestion};
//!
//! let error = CompressError::invalid_input("image has zero width")
//!     .with_operation("decode")
//!     .with_recovery_suggestion("Provide a non-empty PNG or JPEG image");
//!
//! assert!(classify::is_fatal(&error));
//! assert_eq!(error.to_string(), "Invalid input image: image has zero width [decode]");
//! assert_eq!(error.recovery_suggestion(), Some("Provide a non-empty PNG or JPEG image"));
//! ```

use std::{error::Error as StdError, fmt};

/// How far an error reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Fails the current image
    Error,
    /// Bad input or configuration; retrying the same call cannot succeed
    Fatal,
}

/// Where an error happened and what the caller can do about it
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Pipeline step that failed
    pub operation: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    pub severity: ErrorSeverity,
}

impl ErrorContext {
    fn with_severity(severity: ErrorSeverity) -> Self {
        Self {
            operation: None,
            recovery_suggestion: None,
            severity,
        }
    }

    fn error() -> Self {
        Self::with_severity(ErrorSeverity::Error)
    }

    fn fatal() -> Self {
        Self::with_severity(ErrorSeverity::Fatal)
    }
}

/// Base error type for the compression library
#[derive(Debug)]
pub enum CompressError {
    /// Run configuration that cannot be used
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// Input that cannot be decoded or has zero height/width
    InvalidInput {
        reason: String,
        context: ErrorContext,
    },
    /// Failures inside the rank-truncated decomposition
    Decomposition {
        reason: String,
        context: ErrorContext,
    },
    /// Encoder failures while serializing the reconstruction
    Encode {
        quality: u8,
        reason: String,
        context: ErrorContext,
    },
    /// Reading inputs or writing outputs
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// Out-of-range search limits
    Validation {
        field: String,
        constraint: String,
        value: String,
        context: ErrorContext,
    },
    /// Errors from codec and serialization libraries
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl CompressError {
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::fatal(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
            context: ErrorContext::fatal(),
        }
    }

    pub fn decomposition(reason: impl Into<String>) -> Self {
        Self::Decomposition {
            reason: reason.into(),
            context: ErrorContext::error(),
        }
    }

    pub fn encode(quality: u8, reason: impl Into<String>) -> Self {
        Self::Encode {
            quality,
            reason: reason.into(),
            context: ErrorContext::error(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::error(),
        }
    }

    /// I/O error tied to a path
    pub fn io_at(
        operation: impl Into<String>,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.into()),
            source,
            context: ErrorContext::error(),
        }
    }

    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            context: ErrorContext::fatal(),
        }
    }

    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::error(),
        }
    }

    /// Name the pipeline step that failed; shown in `Display`
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::Decomposition { context, .. }
            | Self::Encode { context, .. }
            | Self::Io { context, .. }
            | Self::Validation { context, .. }
            | Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::Decomposition { context, .. }
            | Self::Encode { context, .. }
            | Self::Io { context, .. }
            | Self::Validation { context, .. }
            | Self::External { context, .. } => context,
        }
    }

    /// Stable short name of the variant
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Decomposition { .. } => "decomposition",
            Self::Encode { .. } => "encode",
            Self::Io { .. } => "io",
            Self::Validation { .. } => "validation",
            Self::External { .. } => "external",
        }
    }
}

impl fmt::Display for CompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressError::Config {
                field,
                value,
                reason,
                ..
            } => write!(f, "Invalid setting '{}' = {}: {}", field, value, reason)?,
            CompressError::InvalidInput { reason, .. } => {
                write!(f, "Invalid input image: {}", reason)?
            }
            CompressError::Decomposition { reason, .. } => {
                write!(f, "Rank-truncated decomposition failed: {}", reason)?
            }
            CompressError::Encode {
                quality, reason, ..
            } => write!(f, "JPEG encoding at quality {} failed: {}", quality, reason)?,
            CompressError::Io {
                operation,
                path: Some(path),
                source,
                ..
            } => write!(f, "I/O error during {} on '{}': {}", operation, path, source)?,
            CompressError::Io {
                operation, source, ..
            } => write!(f, "I/O error during {}: {}", operation, source)?,
            CompressError::Validation {
                field,
                constraint,
                value,
                ..
            } => write!(f, "'{}' {} (got {})", field, constraint, value)?,
            CompressError::External {
                library, source, ..
            } => write!(f, "{} error: {}", library, source)?,
        }

        if let Some(operation) = &self.context().operation {
            write!(f, " [{}]", operation)?;
        }
        Ok(())
    }
}

impl StdError for CompressError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type CompressResult<T> = Result<T, CompressError>;

pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for CompressError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for CompressError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Propagate immediately, never retry
    pub fn is_fatal(error: &CompressError) -> bool {
        error.severity() == ErrorSeverity::Fatal
    }

    /// The caller supplied something unusable
    pub fn is_input_error(error: &CompressError) -> bool {
        matches!(
            error,
            CompressError::InvalidInput { .. }
                | CompressError::Config { .. }
                | CompressError::Validation { .. }
        )
    }
}

impl From<std::io::Error> for CompressError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<image::ImageError> for CompressError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(source) => Self::io("image codec", source),
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                Self::invalid_input(error.to_string())
                    .with_recovery_suggestion("Provide a valid PNG or JPEG image")
            }
            other => Self::external("image", other),
        }
    }
}

impl From<serde_json::Error> for CompressError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error).with_operation("serialize report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal_input_errors() {
        let error = CompressError::config("rate", "140", "must be between 0 and 100");
        assert_eq!(error.category(), "config");
        assert!(classify::is_fatal(&error));
        assert!(classify::is_input_error(&error));
        assert_eq!(
            error.to_string(),
            "Invalid setting 'rate' = 140: must be between 0 and 100"
        );
    }

    #[test]
    fn operation_and_suggestion_are_attached() {
        let error = CompressError::encode(45, "writer closed")
            .with_operation("encode_under_budget")
            .with_recovery_suggestion("retry with a lower quality");

        assert_eq!(error.category(), "encode");
        assert!(!classify::is_fatal(&error));
        assert_eq!(error.severity(), ErrorSeverity::Error);
        assert_eq!(
            error.to_string(),
            "JPEG encoding at quality 45 failed: writer closed [encode_under_budget]"
        );
        assert_eq!(error.recovery_suggestion(), Some("retry with a lower quality"));
    }

    #[test]
    fn invalid_input_is_fatal() {
        let error = CompressError::invalid_input("zero height");
        assert!(classify::is_fatal(&error));
        assert!(classify::is_input_error(&error));
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
        assert_eq!(error.recovery_suggestion(), None);
    }

    #[test]
    fn io_source_is_exposed() {
        let error = CompressError::io_at(
            "read input",
            "missing.png",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(error.source().is_some());
        assert!(error.to_string().contains("missing.png"));
        assert!(!classify::is_input_error(&error));
    }

    #[test]
    fn decode_failure_maps_to_invalid_input() {
        let decode = image::load_from_memory(b"definitely not an image").unwrap_err();
        let error = CompressError::from(decode);
        assert_eq!(error.category(), "invalid_input");
        assert!(error.recovery_suggestion().is_some());
    }

    #[test]
    fn json_failure_maps_to_external() {
        let json = serde_json::from_str::<u8>("not json").unwrap_err();
        let error = CompressError::from(json);
        assert_eq!(error.category(), "external");
        assert!(error.source().is_some());
        assert!(error.to_string().ends_with("[serialize report]"));
    }
}
