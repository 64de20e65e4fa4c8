//! Unified error handling for Upshat
//!
//! This crate provides a single error type used across all Upshat components.
//! It uses thiserror for ergonomic error definitions with proper Display and Error trait impls.
//!
//! Hosts never match on variants to build user-facing text. They ask for the
//! [`ErrorKind`] and render its [`ErrorKind::message_key`].

use std::io;
use std::path::PathBuf;

/// Result type alias using UpsHatError
pub type Result<T> = std::result::Result<T, UpsHatError>;

/// Unified error type for all Upshat operations
#[derive(thiserror::Error, Debug)]
pub enum UpsHatError {
    // ============================================================================
    // Calibration Errors
    // ============================================================================
    #[error("Malformed calibration point {point:?} (expected \"measured,true\")")]
    MalformedPoint {
        point: String,
    },

    #[error("Not enough calibration points: {count} given, degree {degree} needs more than {degree}")]
    InsufficientDataPoints {
        count: usize,
        degree: u8,
    },

    #[error("Calibration points do not determine a degree {degree} polynomial")]
    SingularFit {
        degree: u8,
    },

    // ============================================================================
    // Bus and Device Errors
    // ============================================================================
    #[error("Bus communication failed on bus {bus} at address {address:#04x}")]
    BusCommunication {
        bus: u8,
        address: u8,
    },

    #[error("Unexpected reading during connection test: battery level {level}")]
    UnexpectedReading {
        level: i32,
    },

    #[error("Address is not a hex number: {0:?}")]
    AddressNotHex(String),

    #[error("Address {address} out of bounds (must be between 0x00 and 0x80)")]
    AddressOutOfBounds {
        address: i64,
    },

    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Configuration and Settings Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

/// Symbolic error taxonomy exposed to hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedPoint,
    InsufficientDataPoints,
    SingularFit,
    BusCommunication,
    UnexpectedReading,
    AddressNotHex,
    AddressOutOfBounds,
    InvalidConfig,
    Other,
}

impl ErrorKind {
    /// Message key the host translates into a localized form error
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::MalformedPoint => "incorrect_datapoints",
            Self::InsufficientDataPoints => "not_enough_datapoints",
            Self::BusCommunication => "cannot_connect",
            Self::AddressNotHex => "address_not_hex",
            Self::AddressOutOfBounds => "address_out_of_bounds",
            Self::InvalidConfig => "invalid_config",
            Self::SingularFit | Self::UnexpectedReading | Self::Other => "unknown",
        }
    }
}

impl UpsHatError {
    /// Classify this error for host-side rendering
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedPoint { .. } => ErrorKind::MalformedPoint,
            Self::InsufficientDataPoints { .. } => ErrorKind::InsufficientDataPoints,
            Self::SingularFit { .. } => ErrorKind::SingularFit,
            Self::BusCommunication { .. } => ErrorKind::BusCommunication,
            Self::UnexpectedReading { .. } => ErrorKind::UnexpectedReading,
            Self::AddressNotHex(_) => ErrorKind::AddressNotHex,
            Self::AddressOutOfBounds { .. } => ErrorKind::AddressOutOfBounds,
            Self::InvalidConfig { .. } | Self::MissingConfig(_) => ErrorKind::InvalidConfig,
            Self::Io(_)
            | Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::Config(_)
            | Self::JsonParse(_) => ErrorKind::Other,
        }
    }

    /// Create a malformed point error
    pub fn malformed_point(point: impl Into<String>) -> Self {
        Self::MalformedPoint {
            point: point.into(),
        }
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
