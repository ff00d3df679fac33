//! Error types for the authorization gate

use std::fmt;
use thiserror::Error;

/// Which write path asked for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent {
    Create,
    Update,
}

impl WriteIntent {
    fn verb(&self) -> &'static str {
        match self {
            WriteIntent::Create => "create",
            WriteIntent::Update => "update to",
        }
    }
}

impl fmt::Display for WriteIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Gate failures. Each kind maps to exactly one client-facing status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Partner answered with something other than the permitted sentinel
    #[error("Not authorized to {0} ads type events")]
    NotAuthorized(WriteIntent),

    /// Geolocation lookup could not be completed
    #[error("Failed to get location information: {0}")]
    LocationUnavailable(String),

    /// Partner rejected our credentials (HTTP 401)
    #[error("Unauthorized")]
    PartnerUnauthorized,

    /// Partner rejected the request shape (HTTP 400)
    #[error("Bad Request")]
    PartnerBadRequest,

    /// Any other partner failure, including transport errors and timeouts
    #[error("Ad partner service unavailable: {0}")]
    PartnerUnavailable(String),
}

impl GateError {
    /// HTTP status the transport layer should surface for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::NotAuthorized(_) => 403,
            GateError::PartnerUnauthorized => 401,
            GateError::PartnerBadRequest => 400,
            GateError::LocationUnavailable(_) | GateError::PartnerUnavailable(_) => 500,
        }
    }

    /// Stable machine-readable code for error bodies
    pub fn code(&self) -> &'static str {
        match self {
            GateError::NotAuthorized(_) => "NOT_AUTHORIZED",
            GateError::LocationUnavailable(_) => "LOCATION_UNAVAILABLE",
            GateError::PartnerUnauthorized => "PARTNER_UNAUTHORIZED",
            GateError::PartnerBadRequest => "PARTNER_BAD_REQUEST",
            GateError::PartnerUnavailable(_) => "PARTNER_UNAVAILABLE",
        }
    }
}

/// Result type alias for gate operations
pub type GateResult<T> = Result<T, GateError>;
