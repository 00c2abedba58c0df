//! The two-round-trip authorization flow: probe for a challenge, compute
//! the credential, retry the request exactly once.

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::{debug, warn};

use crate::challenge::Challenge;
use crate::error::{Error, RejectionKind, Result};
use crate::header::{AuthContext, AuthorizationHeader};
use crate::nonce::NonceState;
use crate::transport::{HttpResponse, Transport};

/// Run one authenticated operation against `transport`.
///
/// Sends the probe (no body, no credential) to learn the server's challenge
/// parameters, computes the credential from the caller's identity and the
/// same method/URI, and resends the request once with the `Authorization`
/// header and the caller's body attached. The probe response body is
/// discarded; the server chooses nonce and realm per session, so the probe
/// round trip cannot be skipped.
///
/// The flow never loops: a second 401 is terminal, as is any other
/// non-success status on the retry.
///
/// # Errors
///
/// [`Error::NoChallengeOffered`] when the probe response has no
/// `WWW-Authenticate` header, [`Error::MissingChallengeField`] /
/// [`Error::BadQop`] / [`Error::InvalidHeaderSyntax`] when the challenge
/// cannot be turned into a credential, [`Error::AuthenticationFailed`] when
/// the server rejects the credential, [`Error::RequestRejected`] for any
/// other non-success status, and [`Error::Transport`] for network-level
/// failures in either round trip.
pub fn authorize<T: Transport>(context: &AuthContext<'_>, transport: &T) -> Result<HttpResponse> {
    let empty = HeaderMap::new();
    let headers = context.headers.unwrap_or(&empty);

    debug!(method = %context.method, uri = context.uri, "sending unauthenticated probe");
    let probe = transport.send(&context.method, context.uri, headers, None)?;

    let challenge_value = match probe.challenge_header() {
        Some(value) => value.to_owned(),
        None => {
            warn!(status = %probe.status, "probe response carried no digest challenge");
            return Err(Error::NoChallengeOffered);
        }
    };

    let challenge = Challenge::parse(&challenge_value)?;
    debug!(realm = %challenge.realm, stale = challenge.stale, "parsed digest challenge");

    let mut nonces = NonceState::new(context.cnonce);
    let credential = AuthorizationHeader::from_challenge(&challenge, context, &mut nonces)?;

    let mut authed_headers = headers.clone();
    let credential_value = HeaderValue::from_str(&credential.to_string()).map_err(|_| {
        Error::InvalidHeaderSyntax("credential contains non-header-safe characters".into())
    })?;
    authed_headers.insert(AUTHORIZATION, credential_value);

    debug!(method = %context.method, uri = context.uri, "resending with credential");
    let response = transport.send(&context.method, context.uri, &authed_headers, context.body)?;
    classify_outcome(response)
}

/// Map the authenticated attempt's status to the terminal outcome
fn classify_outcome(response: HttpResponse) -> Result<HttpResponse> {
    let status = response.status;
    if status.is_success() || status.is_redirection() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        warn!(%status, "server rejected the computed credential");
        return Err(Error::AuthenticationFailed {
            status: status.as_u16(),
        });
    }

    let kind = RejectionKind::classify(status.as_u16());
    warn!(%status, %kind, "request rejected");
    Err(Error::RequestRejected {
        status: status.as_u16(),
        kind,
    })
}
