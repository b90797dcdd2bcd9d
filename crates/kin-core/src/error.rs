//! Sensor error values.
//!
//! Errors surface to applications through `error` events, so they carry
//! a stable name from the DOMException vocabulary plus a free-form
//! message rather than a deep source chain.

use thiserror::Error;

/// Stable error name, matching the DOMException vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorErrorName {
    NotReadable,
    NotAllowed,
    NotSupported,
    Security,
}

impl SensorErrorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReadable => "NotReadableError",
            Self::NotAllowed => "NotAllowedError",
            Self::NotSupported => "NotSupportedError",
            Self::Security => "SecurityError",
        }
    }
}

/// A named sensor failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {message}", .name.as_str())]
pub struct SensorError {
    pub name: SensorErrorName,
    pub message: String,
}

impl SensorError {
    pub fn new(name: SensorErrorName, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }

    pub fn not_readable(message: impl Into<String>) -> Self {
        Self::new(SensorErrorName::NotReadable, message)
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new(SensorErrorName::NotAllowed, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(SensorErrorName::NotSupported, message)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(SensorErrorName::Security, message)
    }
}
