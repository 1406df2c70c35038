//! Encoded password-hash credentials.
//!
//! The commerce platform hands credentials over as base64 of a `:`-separated
//! composite. The segment after the first separator is the secret the profile
//! platform stores; the first segment is the salt and never leaves the bridge.

use core::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Separator between the composite segments once decoded.
const SEGMENT_SEPARATOR: char = ':';

/// Errors that can occur when decoding an [`EncodedCredential`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The value is not valid standard base64.
    #[error("credential is not valid base64")]
    Base64,
    /// The decoded bytes are not UTF-8.
    #[error("decoded credential is not valid UTF-8")]
    Utf8,
    /// The decoded value has no secret segment.
    #[error("decoded credential has no secret segment")]
    MissingSecret,
}

/// Decoded credential segments.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialParts {
    /// Salt segment. Only used for comparison, never transmitted.
    pub salt: String,
    /// Secret segment, the only part the profile platform receives.
    pub secret: String,
}

impl fmt::Debug for CredentialParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialParts")
            .field("salt", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// A credential exactly as the commerce platform encoded it.
///
/// Implements `Debug` manually to redact the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedCredential(String);

impl EncodedCredential {
    /// Wrap an encoded credential.
    ///
    /// Returns `None` for an empty (or all-whitespace) value, which callers
    /// treat the same as no credential at all.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The encoded value as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode and split into salt and secret.
    ///
    /// Segments beyond the second are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if the value is not base64, not UTF-8, or
    /// has no second segment.
    pub fn decode(&self) -> Result<CredentialParts, CredentialError> {
        let bytes = STANDARD
            .decode(self.0.trim())
            .map_err(|_| CredentialError::Base64)?;
        let decoded = String::from_utf8(bytes).map_err(|_| CredentialError::Utf8)?;

        let mut segments = decoded.split(SEGMENT_SEPARATOR);
        let salt = segments.next().unwrap_or_default().to_owned();
        let secret = segments
            .next()
            .ok_or(CredentialError::MissingSecret)?
            .to_owned();

        Ok(CredentialParts { salt, secret })
    }
}

impl fmt::Debug for EncodedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncodedCredential([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> EncodedCredential {
        EncodedCredential::new(STANDARD.encode(raw)).unwrap()
    }

    #[test]
    fn test_decode_splits_salt_and_secret() {
        let parts = encode("s1:old").decode().unwrap();
        assert_eq!(parts.salt, "s1");
        assert_eq!(parts.secret, "old");
    }

    #[test]
    fn test_decode_takes_second_segment_of_longer_composites() {
        let parts = encode("a1b2:c3d4:1").decode().unwrap();
        assert_eq!(parts.secret, "c3d4");
    }

    #[test]
    fn test_decode_failures() {
        assert_eq!(
            EncodedCredential::new("not base64!").unwrap().decode(),
            Err(CredentialError::Base64)
        );
        assert_eq!(
            encode("no-separator").decode(),
            Err(CredentialError::MissingSecret)
        );
    }

    #[test]
    fn test_empty_is_no_credential() {
        assert!(EncodedCredential::new("").is_none());
        assert!(EncodedCredential::new("   ").is_none());
    }

    #[test]
    fn test_debug_redacts() {
        let credential = encode("s1:topsecret");
        let debug = format!("{credential:?} {:?}", credential.decode().unwrap());
        assert!(!debug.contains(credential.as_str()));
        assert!(!debug.contains("topsecret"));
    }
}
