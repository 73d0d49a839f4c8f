use std::fmt;

/// Errors that can occur while building a sanitization policy.
///
/// Sanitizing itself never fails: malformed markup is recovered by the
/// parser and misbehaving attribute filters are isolated per attribute.
/// Only an invalid policy is reported, and always before any input is
/// touched.
#[derive(Debug)]
pub enum Error {
    /// The policy configuration is invalid
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Invalid policy: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// A configuration error with details about what was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The kind of configuration error
    pub kind: ConfigErrorKind,
    /// Human-readable message explaining the error
    pub message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// The kind of configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// An attribute filter was named that is not registered
    UnknownAttributeFilter,
    /// A tag, attribute, prefix or property name was empty
    EmptyName,
    /// A URL scheme contains characters a scheme cannot have
    InvalidUrlScheme,
    /// The configuration document could not be decoded
    MalformedConfig,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::UnknownAttributeFilter => write!(f, "unknown attribute filter"),
            ConfigErrorKind::EmptyName => write!(f, "empty name"),
            ConfigErrorKind::InvalidUrlScheme => write!(f, "invalid url scheme"),
            ConfigErrorKind::MalformedConfig => write!(f, "malformed config"),
        }
    }
}

/// Error returned by an attribute filter hook.
///
/// A failing hook never aborts sanitization. The attribute keeps the value it
/// had before the hook ran and the failure is logged and recorded in the
/// report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    message: String,
}

impl FilterError {
    /// Creates a new filter error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attribute filter failed: {}", self.message)
    }
}

impl std::error::Error for FilterError {}
