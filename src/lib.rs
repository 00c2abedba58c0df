//! Client-side HTTP Digest Authentication as specified by IETF RFCs 2617
//! and 7616, for REST APIs that protect their endpoints behind a
//! challenge/response handshake.
//!
//! The crate has two layers:
//!
//! * the pure engine: parse a `WWW-Authenticate` challenge into a
//!   [`Challenge`], compute the response hash, render the `Authorization`
//!   credential ([`AuthorizationHeader`]);
//! * the flow: [`authorize`] drives the unauthenticated probe, the
//!   challenge, and the single authenticated retry over a caller-supplied
//!   [`Transport`]. Enable the `reqwest` feature for a ready-made blocking
//!   transport ([`ReqwestTransport`]).
//!
//! Every operation is self-contained: no shared nonce cache, no global
//! state, no internal retry loops beyond the mandated probe/retry pair.
//! Whether an error is worth retrying later is exposed through
//! [`Error::is_retryable`]; backoff policy belongs to the caller.
//!
//! # Examples
//!
//! Computing a credential from a raw challenge (the RFC 2617 example
//! vector):
//!
//! ```
//! use digest_client::AuthContext;
//!
//! // Value of the WWW-Authenticate header from a 401 response
//! let www_authenticate = r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;
//!
//! let mut context = AuthContext::new("Mufasa", "Circle Of Life", "/dir/index.html");
//! // Pinned so the example is reproducible; leave it out in real code and
//! // a random client nonce is generated for you.
//! context.set_custom_cnonce("0a4f113b");
//!
//! let header = digest_client::build_authorization_header(&context, www_authenticate)?;
//! assert_eq!(
//!     header.to_string(),
//!     r#"Digest username="Mufasa", realm="testrealm@host.com", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", uri="/dir/index.html", cnonce="0a4f113b", nc=00000001, qop="auth", response="6629fae49393a05397450978507c4ef1", opaque="5ccc069c403ebaf9f0171e9517f40e41""#
//! );
//! # Ok::<(), digest_client::Error>(())
//! ```
//!
//! Driving a whole operation needs a transport; with the `reqwest` feature:
//!
//! ```ignore
//! use digest_client::{authorize, AuthContext, ReqwestTransport};
//!
//! let transport = ReqwestTransport::new()?;
//! let context = AuthContext::new(
//!     "apiuser",
//!     "s3cr3t",
//!     "https://cloud.example.com/api/v1.0/users/byName/jane",
//! );
//! let response = authorize(&context, &transport)?;
//! println!("{}", String::from_utf8_lossy(&response.body));
//! ```

mod challenge;
mod client;
mod enums;
mod error;
mod header;
mod nonce;
mod transport;
mod utils;

pub use crate::challenge::Challenge;
pub use crate::client::authorize;
pub use crate::enums::{Algorithm, AlgorithmType, Qop};
pub use crate::error::{Error, RejectionKind, Result};
pub use crate::header::{AuthContext, AuthorizationHeader};
pub use crate::nonce::{generate_cnonce, NonceState};
#[cfg(feature = "reqwest")]
pub use crate::transport::ReqwestTransport;
pub use crate::transport::{HttpResponse, Transport, TransportError};

/// Parse a `WWW-Authenticate` header value.
/// Convenience wrapper around [`Challenge::parse()`].
pub fn parse(www_authenticate: &str) -> Result<Challenge> {
    Challenge::parse(www_authenticate)
}

/// Compute the `Authorization` credential for one request from a raw
/// challenge value, without driving any transport.
///
/// Uses the context's pinned client nonce when set, a generated one
/// otherwise.
///
/// # Errors
/// [`Error::MissingChallengeField`] when the challenge or the context lacks
/// a field the response hash needs; see [`Challenge::parse()`] for the other
/// parse failures.
pub fn build_authorization_header(
    context: &AuthContext<'_>,
    www_authenticate: &str,
) -> Result<AuthorizationHeader> {
    let challenge = Challenge::parse(www_authenticate)?;
    let mut nonces = NonceState::new(context.cnonce);
    AuthorizationHeader::from_challenge(&challenge, context, &mut nonces)
}

#[test]
fn test_parse_and_build() {
    let src = r#"
    Digest
       realm="test",
       qop="auth",
       nonce="n1"
    "#;

    let mut context = AuthContext::new("user", "pass", "/x");
    context.set_custom_cnonce("c1");

    let header = build_authorization_header(&context, src).unwrap();

    assert_eq!(
        header.to_string(),
        "Digest username=\"user\", realm=\"test\", nonce=\"n1\", uri=\"/x\", \
         cnonce=\"c1\", nc=00000001, qop=\"auth\", \
         response=\"33098037beb1603656dc13f7fbf00e48\""
    );
}
