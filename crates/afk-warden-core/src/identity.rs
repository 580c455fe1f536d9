//! Occupant identities.
//!
//! An identity is the display name a session connects under. Every session
//! attempt gets a fresh one: a fixed base label followed by an underscore and
//! eight random alphanumeric characters, e.g. `afkbot_x7Qm2LpA`.

use lazy_static::lazy_static;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of random characters appended to the base label.
pub const SUFFIX_LEN: usize = 8;

lazy_static! {
    static ref BASE_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
    static ref IDENTITY_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_]+_[A-Za-z0-9]{8}$").unwrap();
}

/// Immutable occupant identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Generate a new identity from `base` using the given random source.
    pub fn generate<R: Rng + ?Sized>(base: &str, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect();
        Self(format!("{base}_{suffix}"))
    }

    /// Parse an existing identity string, checking its shape.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if IDENTITY_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidIdentity(value))
        }
    }

    /// Check that `base` can be used as an identity label.
    pub fn validate_base(base: &str) -> Result<()> {
        if BASE_PATTERN.is_match(base) {
            Ok(())
        } else {
            Err(Error::InvalidIdentityBase(base.to_string()))
        }
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base label this identity was generated from.
    pub fn base(&self) -> &str {
        let split = self.0.len().saturating_sub(SUFFIX_LEN + 1);
        &self.0[..split]
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_generate_shape() {
        let mut rng = rand::thread_rng();
        let identity = Identity::generate("afkbot", &mut rng);
        let pattern = Regex::new(r"^afkbot_[A-Za-z0-9]{8}$").unwrap();
        assert!(pattern.is_match(identity.as_str()), "got {identity}");
        assert_eq!(identity.base(), "afkbot");
    }

    #[test]
    fn test_generate_variety() {
        let mut rng = rand::thread_rng();
        let identities: HashSet<Identity> = (0..200)
            .map(|_| Identity::generate("afkbot", &mut rng))
            .collect();
        assert_eq!(identities.len(), 200);
    }

    #[test]
    fn test_generate_is_seedable() {
        let a = Identity::generate("bot", &mut StdRng::seed_from_u64(7));
        let b = Identity::generate("bot", &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_roundtrips_generated() {
        let identity = Identity::generate("afk_bot", &mut rand::thread_rng());
        let parsed = Identity::parse(identity.to_string()).unwrap();
        assert_eq!(parsed, identity);
        assert_eq!(parsed.base(), "afk_bot");
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        assert!(Identity::parse("afkbot").is_err());
        assert!(Identity::parse("afkbot_short").is_err());
        assert!(Identity::parse("afk bot_abcdefgh").is_err());
        assert!(matches!(
            Identity::parse("afkbot_abc!efgh"),
            Err(Error::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_validate_base() {
        assert!(Identity::validate_base("afkbot").is_ok());
        assert!(Identity::validate_base("AFK_bot2").is_ok());
        assert!(Identity::validate_base("").is_err());
        assert!(Identity::validate_base("afk bot").is_err());
    }
}
