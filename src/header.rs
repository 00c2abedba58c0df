use std::fmt::{self, Display, Formatter};

use http::{HeaderMap, Method};

use crate::challenge::Challenge;
use crate::enums::{Algorithm, Qop};
use crate::error::{Error, Result};
use crate::nonce::NonceState;
use crate::utils::EscapeDirective;

/// Identity and request context for one authenticated operation.
///
/// All fields are borrowed; build one per request and drop it afterwards.
/// The method/URI pair is the canonical identity of the request: the probe
/// and the authenticated retry must use the same pair, since a mismatch
/// hashes into a response the server silently rejects rather than a
/// detectable error.
#[derive(Debug)]
pub struct AuthContext<'a> {
    /// Login username
    pub username: &'a str,
    /// Login password (plain; hashed into HA1, never transmitted)
    pub password: &'a str,
    /// Requested URI, exactly as sent to the transport
    pub uri: &'a str,
    /// Request payload body, sent only on the authenticated retry.
    /// Also hashed into HA2 when the server asks for auth-int.
    pub body: Option<&'a [u8]>,
    /// HTTP method (defaults to GET)
    pub method: Method,
    /// Extra headers applied to both round trips (e.g. `Content-Type`)
    pub headers: Option<&'a HeaderMap>,
    /// Pinned client nonce (use only for tests; generated otherwise)
    pub cnonce: Option<&'a str>,
}

impl<'a> AuthContext<'a> {
    /// Context for a GET request with no payload body
    pub fn new(username: &'a str, password: &'a str, uri: &'a str) -> Self {
        Self::new_with_method(username, password, uri, None, Method::GET)
    }

    /// Context for a POST request with an optional payload body
    pub fn new_post(
        username: &'a str,
        password: &'a str,
        uri: &'a str,
        body: Option<&'a [u8]>,
    ) -> Self {
        Self::new_with_method(username, password, uri, body, Method::POST)
    }

    /// Context with an arbitrary method and, optionally, a payload body
    pub fn new_with_method(
        username: &'a str,
        password: &'a str,
        uri: &'a str,
        body: Option<&'a [u8]>,
        method: Method,
    ) -> Self {
        AuthContext {
            username,
            password,
            uri,
            body,
            method,
            headers: None,
            cnonce: None,
        }
    }

    /// Headers to send on both the probe and the authenticated retry
    pub fn set_headers(&mut self, headers: &'a HeaderMap) {
        self.headers = Some(headers);
    }

    /// Pin the client nonce; only useful for reproducible tests
    pub fn set_custom_cnonce(&mut self, cnonce: &'a str) {
        self.cnonce = Some(cnonce);
    }
}

/// Computed `Authorization` credential, rendered through [`Display`].
///
/// Fully derived from its inputs: the same challenge, context, and nonce
/// state always produce the identical response hash.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationHeader {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    pub uri: String,
    pub cnonce: String,
    pub nc: u32,
    pub qop: Qop,
    /// The response hash proving knowledge of the password
    pub response: String,
    /// Echoed from the challenge when the server sent one
    pub opaque: Option<String>,
    pub algorithm: Algorithm,
}

impl AuthorizationHeader {
    /// Compose the credential for `context` from a parsed challenge,
    /// consuming one count from `nonces`.
    ///
    /// # Errors
    /// [`Error::MissingChallengeField`] naming the offending field when any
    /// input the response hash needs is empty. An incomplete credential is
    /// never rendered.
    pub fn from_challenge(
        challenge: &Challenge,
        context: &AuthContext<'_>,
        nonces: &mut NonceState,
    ) -> Result<AuthorizationHeader> {
        require("username", context.username)?;
        require("password", context.password)?;
        require("uri", context.uri)?;
        require("realm", &challenge.realm)?;
        require("nonce", &challenge.nonce)?;

        // Challenge::parse guarantees a non-empty qop list, but a hand-built
        // Challenge must not slip through either
        let qop = if challenge.qop.contains(&Qop::AuthInt) && context.body.is_some() {
            Qop::AuthInt
        } else if challenge.qop.contains(&Qop::Auth) {
            Qop::Auth
        } else if challenge.qop.contains(&Qop::AuthInt) {
            Qop::AuthInt
        } else {
            return Err(Error::MissingChallengeField("qop"));
        };

        let h = challenge.algorithm;
        let cnonce = nonces.cnonce().to_owned();
        let nc = nonces.next_count();

        let a1 = {
            let joined = format!(
                "{}:{}:{}",
                context.username, challenge.realm, context.password
            );
            if h.sess {
                format!("{}:{}:{}", h.hash_str(&joined), challenge.nonce, cnonce)
            } else {
                joined
            }
        };

        let a2 = match qop {
            Qop::Auth => format!("{}:{}", context.method, context.uri),
            Qop::AuthInt => format!(
                "{}:{}:{}",
                context.method,
                context.uri,
                h.hash(context.body.unwrap_or_default())
            ),
        };

        let ha1 = h.hash_str(&a1);
        let ha2 = h.hash_str(&a2);

        let response = h.hash_str(&format!(
            "{ha1}:{nonce}:{nc:08x}:{cnonce}:{qop}:{ha2}",
            nonce = challenge.nonce,
        ));

        Ok(AuthorizationHeader {
            username: context.username.to_owned(),
            realm: challenge.realm.clone(),
            nonce: challenge.nonce.clone(),
            uri: context.uri.to_owned(),
            cnonce,
            nc,
            qop,
            response,
            opaque: challenge.opaque.clone(),
            algorithm: h,
        })
    }
}

impl Display for AuthorizationHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Digest username=\"{}\"", self.username.escape_directive())?;
        write!(f, ", realm=\"{}\"", self.realm.escape_directive())?;
        write!(f, ", nonce=\"{}\"", self.nonce.escape_directive())?;
        write!(f, ", uri=\"{}\"", self.uri)?;
        write!(f, ", cnonce=\"{}\"", self.cnonce.escape_directive())?;
        write!(f, ", nc={:08x}", self.nc)?;
        write!(f, ", qop=\"{}\"", self.qop)?;
        write!(f, ", response=\"{}\"", self.response)?;

        if let Some(opaque) = &self.opaque {
            write!(f, ", opaque=\"{}\"", opaque.escape_directive())?;
        }

        // omitted for the protocol default so the common rendering stays
        // exactly the eight canonical directives
        if self.algorithm != Algorithm::default() {
            write!(f, ", algorithm={}", self.algorithm)?;
        }

        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::MissingChallengeField(field))
    } else {
        Ok(())
    }
}
