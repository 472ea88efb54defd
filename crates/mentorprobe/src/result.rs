//! Result and error types for mentorprobe.
//!
//! Errors form a closed taxonomy: [`ProbeError::kind`] returns an
//! [`ErrorKind`] so callers can branch on *what* failed without matching
//! message strings. Driver failures never escape raw; the page facade wraps
//! them in [`ProbeError::Driver`] together with a [`FailureContext`].

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::readiness::ReadinessPhase;

/// Result type for mentorprobe operations
pub type Result<T, E = ProbeError> = std::result::Result<T, E>;

/// Result type for raw driver calls
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Errors reported by a [`crate::PageDriver`] implementation.
///
/// These are low-level and carry no page context. They are always wrapped
/// before reaching scenario code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    Launch {
        /// Error message
        message: String,
    },

    /// A page-level protocol call failed
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Script evaluation failed or returned an unexpected shape
    #[error("Evaluation failed: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// The strategy matched nothing at the moment of the call
    #[error("No element matches {strategy}")]
    NoMatch {
        /// Strategy description
        strategy: String,
    },

    /// A `<select>` matched but has no such option
    #[error("{strategy} has no option {option:?}")]
    NoSuchOption {
        /// Strategy description
        strategy: String,
        /// Requested option
        option: String,
    },
}

impl DriverError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }
}

/// Diagnostic metadata attached to every facade failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureContext {
    /// What the operation was acting on (concept name or URL)
    pub target: String,
    /// Time spent in the operation before it failed
    pub elapsed: Duration,
    /// Page URL at the time of failure, if known
    pub url: Option<String>,
}

impl FailureContext {
    /// Create a context for a target
    #[must_use]
    pub fn new(target: impl Into<String>, elapsed: Duration, url: Option<String>) -> Self {
        Self {
            target: target.into(),
            elapsed,
            url,
        }
    }
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target '{}' after {}ms at {}",
            self.target,
            self.elapsed.as_millis(),
            self.url.as_deref().unwrap_or("<unknown url>")
        )
    }
}

/// Closed set of failure kinds, inspectable without string matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No candidate strategy matched within the probe timeout
    ElementNotAvailable,
    /// Navigation did not settle in time
    NavigationTimeout,
    /// The driver reported a navigation failure
    NavigationError,
    /// The page rendered below the minimum content threshold
    InsufficientContent,
    /// A write's read-back did not match the written value
    VerificationMismatch,
    /// The composite readiness gate did not close in time
    ReadinessTimeout,
    /// Page title did not contain the expected text
    TitleMismatch,
    /// Caller passed an invalid argument
    InvalidInput,
    /// A scenario expectation did not hold
    Assertion,
    /// A scenario exceeded its run timeout
    ScenarioTimeout,
    /// A wrapped driver failure
    Driver,
    /// Screenshot capture or persistence failed
    Screenshot,
    /// Configuration could not be resolved
    Config,
    /// I/O failure
    Io,
    /// JSON failure
    Json,
}

impl ErrorKind {
    /// Stable name for logs and reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElementNotAvailable => "element_not_available",
            Self::NavigationTimeout => "navigation_timeout",
            Self::NavigationError => "navigation_error",
            Self::InsufficientContent => "insufficient_content",
            Self::VerificationMismatch => "verification_mismatch",
            Self::ReadinessTimeout => "readiness_timeout",
            Self::TitleMismatch => "title_mismatch",
            Self::InvalidInput => "invalid_input",
            Self::Assertion => "assertion",
            Self::ScenarioTimeout => "scenario_timeout",
            Self::Driver => "driver",
            Self::Screenshot => "screenshot",
            Self::Config => "config",
            Self::Io => "io",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in mentorprobe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No candidate strategy matched
    #[error("Element '{concept}' not available ({tried} candidate(s) tried): {context}")]
    ElementNotAvailable {
        /// Logical UI concept that was looked up
        concept: String,
        /// Number of candidate strategies tried
        tried: usize,
        /// Failure context
        context: FailureContext,
    },

    /// Navigation did not settle within the page-load timeout
    #[error("Navigation to {url} did not settle within {ms}ms")]
    NavigationTimeout {
        /// URL being loaded
        url: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {source}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Underlying driver failure
        #[source]
        source: DriverError,
    },

    /// Rendered content below the minimum word threshold
    #[error("Insufficient content at {url}: {words} word(s), expected at least {min}")]
    InsufficientContent {
        /// Page URL
        url: String,
        /// Words found
        words: usize,
        /// Required minimum
        min: usize,
    },

    /// Read-back after a write diverged from the input
    #[error("Verification mismatch on '{target}': expected {expected:?}, read back {actual:?}")]
    VerificationMismatch {
        /// Target concept
        target: String,
        /// Value written
        expected: String,
        /// Value read back
        actual: String,
    },

    /// The readiness gate did not close in time
    #[error("Page not ready: {phase} exceeded {ms}ms at {url}")]
    ReadinessTimeout {
        /// Phase that exceeded its bound
        phase: ReadinessPhase,
        /// Bound in milliseconds
        ms: u64,
        /// Page URL
        url: String,
    },

    /// Title did not contain the expected text
    #[error("Title mismatch: expected title containing {expected:?}, got {actual:?}")]
    TitleMismatch {
        /// Expected fragment
        expected: String,
        /// Actual title
        actual: String,
    },

    /// Invalid caller input
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message
        message: String,
    },

    /// Scenario expectation failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Scenario ran past its timeout
    #[error("Scenario '{scenario}' exceeded {ms}ms")]
    ScenarioTimeout {
        /// Scenario name
        scenario: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Driver failure with page context
    #[error("{action} failed for {context}: {source}")]
    Driver {
        /// Facade action that was running
        action: &'static str,
        /// Failure context
        context: FailureContext,
        /// Underlying driver failure
        #[source]
        source: DriverError,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// The closed kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ElementNotAvailable { .. } => ErrorKind::ElementNotAvailable,
            Self::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            Self::NavigationError { .. } => ErrorKind::NavigationError,
            Self::InsufficientContent { .. } => ErrorKind::InsufficientContent,
            Self::VerificationMismatch { .. } => ErrorKind::VerificationMismatch,
            Self::ReadinessTimeout { .. } => ErrorKind::ReadinessTimeout,
            Self::TitleMismatch { .. } => ErrorKind::TitleMismatch,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::AssertionFailed { .. } => ErrorKind::Assertion,
            Self::ScenarioTimeout { .. } => ErrorKind::ScenarioTimeout,
            Self::Driver { .. } => ErrorKind::Driver,
            Self::Screenshot { .. } => ErrorKind::Screenshot,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
        }
    }

    /// True when an optional affordance was simply absent
    #[must_use]
    pub fn is_element_unavailable(&self) -> bool {
        matches!(self.kind(), ErrorKind::ElementNotAvailable)
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
