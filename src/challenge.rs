use std::collections::HashMap;
use std::str::FromStr;

use tracing::warn;

use crate::enums::{Algorithm, Qop};
use crate::error::{Error, Result};

/// Server challenge parsed from a `WWW-Authenticate` header value.
///
/// Immutable once parsed, and only meaningful paired with the request it was
/// issued for: the server picks `realm` and `nonce` per session, so a
/// challenge cannot be precomputed or carried over to another operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    /// Authorization realm (hostname, API name, ...)
    pub realm: String,
    /// Server nonce
    pub nonce: String,
    /// Understood qop variants offered by the server, in offer order
    pub qop: Vec<Qop>,
    /// Hashing algorithm, MD5 unless the server says otherwise
    pub algorithm: Algorithm,
    /// Set when the server rejected an older digest only because its nonce
    /// expired
    pub stale: bool,
    /// Server opaque string, echoed back verbatim when present
    pub opaque: Option<String>,
}

impl Challenge {
    /// Construct from the raw `WWW-Authenticate` header value.
    ///
    /// # Errors
    /// [`Error::MissingChallengeField`] when `realm`, `nonce`, or `qop` is
    /// absent or empty; [`Error::BadQop`] when `qop` offers nothing the
    /// client understands; [`Error::InvalidHeaderSyntax`] when the directive
    /// list itself is malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let mut input = input.trim();
        if input.len() >= 6 && input.as_bytes()[..6].eq_ignore_ascii_case(b"digest") {
            let boundary = input[6..].chars().next();
            if boundary.map_or(true, |c| c.is_whitespace()) {
                input = input[6..].trim_start();
            }
        }

        let mut directives = parse_directives(input)?;

        let realm = match directives.remove("realm") {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::MissingChallengeField("realm")),
        };
        let nonce = match directives.remove("nonce") {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::MissingChallengeField("nonce")),
        };
        let qop = match directives.remove("qop") {
            Some(raw) if !raw.trim().is_empty() => {
                let mut options = Vec::new();
                for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    match Qop::from_str(token) {
                        Ok(q) => {
                            if !options.contains(&q) {
                                options.push(q);
                            }
                        }
                        Err(_) => warn!(qop = token, "skipping unsupported qop option"),
                    }
                }
                if options.is_empty() {
                    return Err(Error::BadQop(raw));
                }
                options
            }
            _ => return Err(Error::MissingChallengeField("qop")),
        };
        let algorithm = match directives.get("algorithm") {
            Some(a) => Algorithm::from_str(a)?,
            None => Algorithm::default(),
        };

        Ok(Challenge {
            realm,
            nonce,
            qop,
            algorithm,
            stale: directives
                .get("stale")
                .map_or(false, |v| v.eq_ignore_ascii_case("true")),
            opaque: directives.remove("opaque"),
        })
    }
}

impl FromStr for Challenge {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        Self::parse(input)
    }
}

/// Split a comma-separated directive list into name -> value.
///
/// Values may be bare tokens or double-quoted with backslash escapes; a
/// quoted value can therefore contain commas and other directive names
/// without being misread. Directive names are lower-cased. Empty input
/// yields an empty map.
pub(crate) fn parse_directives(input: &str) -> Result<HashMap<String, String>> {
    #[derive(Debug)]
    enum State {
        Leading,
        Name(usize),
        ValueStart,
        Plain,
        Quoted,
        QuotedEscape,
    }

    let mut state = State::Leading;
    let mut directives = HashMap::new();
    let mut name: Option<&str> = None;
    let mut value = String::new();

    for (i, c) in input.char_indices() {
        state = match state {
            State::Leading => {
                if c.is_alphabetic() {
                    State::Name(i)
                } else {
                    State::Leading
                }
            }
            State::Name(start) => {
                if c == '=' {
                    name = Some(&input[start..i]);
                    value.clear();
                    State::ValueStart
                } else {
                    State::Name(start)
                }
            }
            State::ValueStart => {
                if c == '"' {
                    State::Quoted
                } else {
                    value.push(c);
                    State::Plain
                }
            }
            State::Quoted => match c {
                '"' => {
                    if let Some(n) = name.take() {
                        directives.insert(n.trim().to_ascii_lowercase(), value.clone());
                    }
                    value.clear();
                    State::Leading
                }
                '\\' => State::QuotedEscape,
                _ => {
                    value.push(c);
                    State::Quoted
                }
            },
            State::QuotedEscape => {
                value.push(c);
                State::Quoted
            }
            State::Plain => {
                if c == ',' || c.is_ascii_whitespace() {
                    if let Some(n) = name.take() {
                        directives.insert(n.trim().to_ascii_lowercase(), value.clone());
                    }
                    value.clear();
                    State::Leading
                } else {
                    value.push(c);
                    State::Plain
                }
            }
        };
    }

    match state {
        State::Plain => {
            if let Some(n) = name.take() {
                directives.insert(n.trim().to_ascii_lowercase(), value);
            }
        }
        State::Leading => {}
        _ => return Err(Error::InvalidHeaderSyntax(input.trim().to_string())),
    }

    Ok(directives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::AlgorithmType;

    #[test]
    fn directive_list_with_mixed_quoting() {
        let src = r#"
           realm="api@example.org",
           qop="auth",
           algorithm=SHA-512-256,
           nonce="5TsQWLVdgBdmrQ0XsxbDODV+57QdFR34I9HAbC/RVvkK",
           opaque="HRPCssKJSGjCrkzDg8OhwpzCiGPChXYjwrI2QmXDnsOS",
           stale=false
        "#;

        let map = parse_directives(src).unwrap();

        assert_eq!(map.get("realm").unwrap(), "api@example.org");
        assert_eq!(map.get("qop").unwrap(), "auth");
        assert_eq!(map.get("algorithm").unwrap(), "SHA-512-256");
        assert_eq!(
            map.get("nonce").unwrap(),
            "5TsQWLVdgBdmrQ0XsxbDODV+57QdFR34I9HAbC/RVvkK"
        );
        assert_eq!(
            map.get("opaque").unwrap(),
            "HRPCssKJSGjCrkzDg8OhwpzCiGPChXYjwrI2QmXDnsOS"
        );
        assert_eq!(map.get("stale").unwrap(), "false");
    }

    #[test]
    fn directive_values_may_contain_escapes_and_commas() {
        let src = r#"realm="a long realm with\\, weird \" characters", nonce=plain"#;
        let map = parse_directives(src).unwrap();
        assert_eq!(
            map.get("realm").unwrap(),
            "a long realm with\\, weird \" characters"
        );
        assert_eq!(map.get("nonce").unwrap(), "plain");
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(parse_directives("").unwrap().is_empty());
        assert!(parse_directives("   ").unwrap().is_empty());
    }

    #[test]
    fn unterminated_quote_is_a_syntax_error() {
        assert!(matches!(
            parse_directives(r#"realm="unterminated"#),
            Err(Error::InvalidHeaderSyntax(_))
        ));
    }

    #[test]
    fn extracts_the_three_mandatory_directives() {
        let parsed =
            Challenge::parse(r#"realm="example.com", qop="auth", nonce="abc123", stale=false"#)
                .unwrap();

        assert_eq!(parsed.realm, "example.com");
        assert_eq!(parsed.nonce, "abc123");
        assert_eq!(parsed.qop, vec![Qop::Auth]);
        assert!(!parsed.stale);
        assert_eq!(parsed.algorithm, Algorithm::default());
        assert_eq!(parsed.opaque, None);
    }

    #[test]
    fn scheme_prefix_is_ignored_case_insensitively() {
        for src in [
            r#"Digest realm="r", nonce="n", qop="auth""#,
            r#"digest realm="r", nonce="n", qop="auth""#,
            r#"
            Digest
               realm="r",
               nonce="n",
               qop="auth"
            "#,
        ] {
            let parsed = Challenge::parse(src).unwrap();
            assert_eq!(parsed.realm, "r");
            assert_eq!(parsed.nonce, "n");
        }
    }

    #[test]
    fn directive_name_inside_a_quoted_value_does_not_cross_match() {
        let parsed =
            Challenge::parse(r#"realm="r", nonce="the qop is \"auth\", not", qop="auth""#).unwrap();
        assert_eq!(parsed.nonce, r#"the qop is "auth", not"#);
        assert_eq!(parsed.qop, vec![Qop::Auth]);
    }

    #[test]
    fn missing_mandatory_directives_are_reported_by_name() {
        assert!(matches!(
            Challenge::parse(r#"nonce="n", qop="auth""#),
            Err(Error::MissingChallengeField("realm"))
        ));
        assert!(matches!(
            Challenge::parse(r#"realm="r", qop="auth""#),
            Err(Error::MissingChallengeField("nonce"))
        ));
        assert!(matches!(
            Challenge::parse(r#"realm="r", nonce="n""#),
            Err(Error::MissingChallengeField("qop"))
        ));
        assert!(matches!(
            Challenge::parse(r#"realm="r", nonce="n", qop="""#),
            Err(Error::MissingChallengeField("qop"))
        ));
        assert!(matches!(
            Challenge::parse(""),
            Err(Error::MissingChallengeField("realm"))
        ));
    }

    #[test]
    fn qop_list_keeps_understood_variants_in_offer_order() {
        let parsed = Challenge::parse(r#"realm="r", nonce="n", qop="auth-int, auth""#).unwrap();
        assert_eq!(parsed.qop, vec![Qop::AuthInt, Qop::Auth]);

        let parsed = Challenge::parse(r#"realm="r", nonce="n", qop="auth, token""#).unwrap();
        assert_eq!(parsed.qop, vec![Qop::Auth]);

        assert!(matches!(
            Challenge::parse(r#"realm="r", nonce="n", qop="token""#),
            Err(Error::BadQop(_))
        ));
    }

    #[test]
    fn optional_directives_round_out_the_challenge() {
        let parsed = Challenge::parse(
            r#"Digest realm="r", nonce="n", qop="auth", algorithm=SHA-256, stale=TRUE, opaque="xyz""#,
        )
        .unwrap();
        assert_eq!(parsed.algorithm, Algorithm::new(AlgorithmType::Sha256, false));
        assert!(parsed.stale);
        assert_eq!(parsed.opaque.as_deref(), Some("xyz"));
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        assert!(matches!(
            Challenge::parse(r#"realm="r", nonce="n", qop="auth", algorithm=MD4"#),
            Err(Error::UnknownAlgorithm(_))
        ));
    }
}
