use std::fmt::{self, Display, Formatter};
use std::result;

use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = result::Result<T, Error>;

/// Everything that can go wrong during one authenticated operation.
///
/// Network-level failures, protocol-level failures (no challenge, incomplete
/// challenge), and HTTP-level rejections are kept apart so callers can tell
/// "check your network" from "check your credentials" from "check your
/// request parameters".
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure in either round trip; never retried internally
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The probe response carried no `WWW-Authenticate` header, so the
    /// server never asked for digest auth
    #[error("server did not offer a digest challenge")]
    NoChallengeOffered,

    /// Challenge parsed but a directive the response hash needs is absent
    /// or empty
    #[error("challenge is missing required directive \"{0}\"")]
    MissingChallengeField(&'static str),

    /// The server answered the computed credential with another 401
    #[error("credentials rejected by server (status {status})")]
    AuthenticationFailed { status: u16 },

    /// The authenticated request was rejected for a non-auth reason
    #[error("{kind} (status {status})")]
    RequestRejected { status: u16, kind: RejectionKind },

    /// Challenge or credential text that does not form a valid header value
    #[error("invalid header syntax: {0}")]
    InvalidHeaderSyntax(String),

    /// The `algorithm` directive named something the client cannot compute
    #[error("unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The `qop` directive offered no variant the client understands
    #[error("no usable qop option in challenge: {0}")]
    BadQop(String),
}

impl Error {
    /// True only for the rate-limit rejection; the caller owns any backoff
    /// policy, this just tells it whether waiting could help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RequestRejected {
                kind: RejectionKind::RateLimited,
                ..
            }
        )
    }
}

/// Structured classification of a rejected request
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RejectionKind {
    BadRequest,
    NotFound,
    Conflict,
    Unauthorized,
    RateLimited,
    Other,
}

impl RejectionKind {
    /// Pure status-code classification; no table, no global state
    pub fn classify(status: u16) -> Self {
        match status {
            400 => RejectionKind::BadRequest,
            401 => RejectionKind::Unauthorized,
            404 => RejectionKind::NotFound,
            409 => RejectionKind::Conflict,
            429 => RejectionKind::RateLimited,
            _ => RejectionKind::Other,
        }
    }
}

impl Display for RejectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectionKind::BadRequest => "bad request",
            RejectionKind::NotFound => "resource does not exist",
            RejectionKind::Conflict => "resource already exists",
            RejectionKind::Unauthorized => "unauthorized access",
            RejectionKind::RateLimited => "too many requests",
            RejectionKind::Other => "request rejected",
        })
    }
}
