use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use digest::{Digest, DynDigest};
use md5::Md5;
use sha2::{Sha256, Sha512_256};

use crate::error::{Error, Result};

/// Digest algorithm family
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AlgorithmType {
    Md5,
    Sha256,
    Sha512_256,
}

/// Algorithm and the -sess flag pair
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Algorithm {
    pub algo: AlgorithmType,
    pub sess: bool,
}

impl Algorithm {
    /// Compose from algorithm type and the -sess flag
    pub fn new(algo: AlgorithmType, sess: bool) -> Algorithm {
        Algorithm { algo, sess }
    }

    /// Hash bytes with the selected algorithm, lower-case hex output
    pub fn hash(self, bytes: &[u8]) -> String {
        let mut hasher: Box<dyn DynDigest> = match self.algo {
            AlgorithmType::Md5 => Box::new(Md5::new()),
            AlgorithmType::Sha256 => Box::new(Sha256::new()),
            AlgorithmType::Sha512_256 => Box::new(Sha512_256::new()),
        };

        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Hash a string's bytes with the selected algorithm
    pub fn hash_str(self, value: &str) -> String {
        self.hash(value.as_bytes())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Parse from the form used in the `algorithm` challenge directive
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MD5" => Ok(Algorithm::new(AlgorithmType::Md5, false)),
            "MD5-sess" => Ok(Algorithm::new(AlgorithmType::Md5, true)),
            "SHA-256" => Ok(Algorithm::new(AlgorithmType::Sha256, false)),
            "SHA-256-sess" => Ok(Algorithm::new(AlgorithmType::Sha256, true)),
            "SHA-512-256" => Ok(Algorithm::new(AlgorithmType::Sha512_256, false)),
            "SHA-512-256-sess" => Ok(Algorithm::new(AlgorithmType::Sha512_256, true)),
            _ => Err(Error::UnknownAlgorithm(s.into())),
        }
    }
}

impl Default for Algorithm {
    /// MD5 is the protocol default when the server names no algorithm
    fn default() -> Self {
        Algorithm::new(AlgorithmType::Md5, false)
    }
}

impl Display for Algorithm {
    /// Format to the form used in HTTP headers
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self.algo {
            AlgorithmType::Md5 => "MD5",
            AlgorithmType::Sha256 => "SHA-256",
            AlgorithmType::Sha512_256 => "SHA-512-256",
        })?;

        if self.sess {
            f.write_str("-sess")?;
        }

        Ok(())
    }
}

/// Quality-of-protection variants the client understands
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Qop {
    Auth,
    AuthInt,
}

impl FromStr for Qop {
    type Err = Error;

    /// Parse from "auth" or "auth-int" as used in the `qop` directive
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auth" => Ok(Qop::Auth),
            "auth-int" => Ok(Qop::AuthInt),
            _ => Err(Error::BadQop(s.into())),
        }
    }
}

impl Display for Qop {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_wire_format_round_trip() {
        for name in [
            "MD5",
            "MD5-sess",
            "SHA-256",
            "SHA-256-sess",
            "SHA-512-256",
            "SHA-512-256-sess",
        ] {
            let algo = Algorithm::from_str(name).unwrap();
            assert_eq!(algo.to_string(), name);
        }

        assert!(matches!(
            Algorithm::from_str("MD4"),
            Err(Error::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn default_is_plain_md5() {
        let algo = Algorithm::default();
        assert_eq!(algo.algo, AlgorithmType::Md5);
        assert!(!algo.sess);
    }

    #[test]
    fn md5_hex_digest_of_colon_joined_input() {
        let algo = Algorithm::default();
        assert_eq!(
            algo.hash_str("user:test:pass"),
            "0f1cafcb677261987de453fb58ea335f"
        );
        assert_eq!(algo.hash_str("GET:/x"), "39703b9244f1eabf92f738ac2f185993");
    }

    #[test]
    fn sha256_digest_is_lowercase_hex() {
        let algo = Algorithm::new(AlgorithmType::Sha256, false);
        let out = algo.hash_str("GET:/dir/index.html");
        assert_eq!(out.len(), 64);
        assert!(out
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn qop_wire_format() {
        assert_eq!(Qop::from_str("auth").unwrap(), Qop::Auth);
        assert_eq!(Qop::from_str("auth-int").unwrap(), Qop::AuthInt);
        assert_eq!(Qop::Auth.to_string(), "auth");
        assert_eq!(Qop::AuthInt.to_string(), "auth-int");
        assert!(Qop::from_str("token").is_err());
    }
}
