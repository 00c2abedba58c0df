use rand::Rng;

/// Generate a fresh client nonce: 8 bytes from a CSPRNG, hex-encoded to
/// exactly 16 lower-case characters.
pub fn generate_cnonce() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Client nonce plus the count of responses composed against one server
/// nonce.
///
/// A fresh state per operation puts `nc=00000001` on the wire, which is only
/// safe for one-shot clients. A caller that keeps a session open against the
/// same server nonce must keep reusing the same state so the count stays
/// strictly increasing; the server tracks it for replay detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceState {
    cnonce: String,
    nc: u32,
}

impl NonceState {
    /// Fresh state with a generated client nonce
    pub fn fresh() -> Self {
        Self::new(None)
    }

    /// `custom` pins the client nonce instead of generating one; meant for
    /// reproducible tests
    pub fn new(custom: Option<&str>) -> Self {
        NonceState {
            cnonce: custom.map_or_else(generate_cnonce, str::to_owned),
            nc: 0,
        }
    }

    pub fn cnonce(&self) -> &str {
        &self.cnonce
    }

    /// Count to use for the next response; first use is 1
    pub fn next_count(&mut self) -> u32 {
        self.nc += 1;
        self.nc
    }
}

impl Default for NonceState {
    fn default() -> Self {
        Self::fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cnonce_is_16_lowercase_hex_chars() {
        for _ in 0..32 {
            let cnonce = generate_cnonce();
            assert_eq!(cnonce.len(), 16);
            assert!(cnonce
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn consecutive_cnonces_differ() {
        assert_ne!(generate_cnonce(), generate_cnonce());
    }

    #[test]
    fn count_is_strictly_increasing_from_one() {
        let mut state = NonceState::new(Some("c1"));
        assert_eq!(state.cnonce(), "c1");
        assert_eq!(state.next_count(), 1);
        assert_eq!(state.next_count(), 2);
        assert_eq!(state.next_count(), 3);
    }

    #[test]
    fn fresh_state_generates_a_cnonce() {
        let state = NonceState::fresh();
        assert_eq!(state.cnonce().len(), 16);
    }
}
