//! RS256 codec for session credentials.
//!
//! Each credential kind (access, refresh) owns its own key pair. Key material arrives
//! as base64-encoded PEM and is decoded once, at startup, into [`CredentialKeys`].

use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::claims::SessionClaims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid key material: {0}")]
    KeyDecode(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("credential is malformed")]
    MalformedCredential,

    #[error("credential signature is invalid")]
    SignatureInvalid,

    #[error("credential has expired")]
    Expired,

    #[error("credential is not valid yet")]
    NotYetValid,
}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidSignature => Self::SignatureInvalid,
            ErrorKind::InvalidRsaKey(msg) => Self::KeyDecode(msg.clone()),
            ErrorKind::InvalidKeyFormat => Self::KeyDecode("unsupported key format".into()),
            ErrorKind::RsaFailedSigning | ErrorKind::Crypto(_) => Self::Signing(err.to_string()),
            _ => Self::MalformedCredential,
        }
    }
}

/// Decoded key pair for one credential kind.
#[derive(Clone)]
pub struct CredentialKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for CredentialKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialKeys").field("algorithm", &Algorithm::RS256).finish_non_exhaustive()
    }
}

impl CredentialKeys {
    /// Build from base64-encoded PEM strings, the form the environment supplies them in.
    pub fn from_base64_pem(private_b64: &str, public_b64: &str) -> Result<Self, CodecError> {
        let private_pem = decode_b64(private_b64.trim(), "private")?;
        let public_pem = decode_b64(public_b64.trim(), "public")?;
        Self::from_pem(&private_pem, &public_pem)
    }

    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, CodecError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| CodecError::KeyDecode(format!("private key: {}", e)))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| CodecError::KeyDecode(format!("public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Ok(Self { encoding, decoding, validation })
    }

    /// Sign claims into a compact credential string.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, CodecError> {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding).map_err(|e| match CodecError::from(e) {
            CodecError::KeyDecode(msg) => CodecError::KeyDecode(msg),
            other => CodecError::Signing(other.to_string()),
        })
    }

    /// Verify signature and validity window, returning the claims.
    pub fn verify(&self, credential: &str) -> Result<SessionClaims, CodecError> {
        let data = decode::<SessionClaims>(credential, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

fn decode_b64(input: &str, which: &str) -> Result<Vec<u8>, CodecError> {
    base64::engine::general_purpose::STANDARD
        .decode(input)
        .map_err(|e| CodecError::KeyDecode(format!("could not decode {} key: {}", which, e)))
}
