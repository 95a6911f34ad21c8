//! Verification method lookup and public key decoding.

use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use log::debug;

use crate::did::{Document, VerificationMethodMap};
use crate::error::{Error, ResolutionError};
use crate::jwk::JWK;
use crate::resolver::DocumentResolver;

/// Multicodec prefix of an Ed25519 public key.
const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterialError {
    #[error("verification method has more than one public key property")]
    MultipleKeyMaterial,
    #[error("verification method has no public key")]
    MissingKeyMaterial,
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),
    #[error("invalid base58 key: {0}")]
    Base58(String),
    #[error("invalid multibase key: {0}")]
    Multibase(String),
    #[error("expected base58btc multibase encoding")]
    ExpectedBase58btc,
    #[error("expected {PUBLIC_KEY_LENGTH} byte Ed25519 key, found {0} bytes")]
    InvalidLength(usize),
    #[error("invalid Ed25519 key")]
    InvalidKey,
}

/// A verification method together with the document it was found in.
#[derive(Debug, Clone)]
pub struct LocatedKey {
    pub document: Document,
    pub method: VerificationMethodMap,
}

impl LocatedKey {
    /// Absolute id of the verification method.
    pub fn id(&self) -> String {
        self.document.absolute_id(&self.method.id)
    }

    /// Controller of the method, defaulting to the containing document.
    pub fn controller(&self) -> &str {
        self.method.controller.as_deref().unwrap_or(&self.document.id)
    }
}

/// Fetch the document a verification method URI points into and select the
/// single method with that id.
pub async fn locate_key(
    verification_method: &str,
    resolver: &DocumentResolver,
) -> Result<LocatedKey, Error> {
    let (base, fragment) = verification_method.split_once('#').ok_or_else(|| {
        Error::Malformed(format!(
            "verification method has no fragment: {verification_method}"
        ))
    })?;
    if base.is_empty() || fragment.is_empty() {
        return Err(Error::Malformed(format!(
            "invalid verification method: {verification_method}"
        )));
    }
    let value = resolver.resolve(base).await?;
    let document: Document =
        serde_json::from_value(value).map_err(|source| ResolutionError::Malformed {
            url: base.to_string(),
            source,
        })?;
    let method = document
        .select_verification_method(verification_method)?
        .clone();
    debug!("located {} ({})", verification_method, method.type_);
    Ok(LocatedKey { document, method })
}

pub(crate) fn ed25519_from_bytes(bytes: &[u8]) -> Result<VerifyingKey, KeyMaterialError> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| KeyMaterialError::InvalidLength(bytes.len()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| KeyMaterialError::InvalidKey)
}

impl VerificationMethodMap {
    /// Decode the Ed25519 public key from whichever key property is present.
    pub fn ed25519_public_key(&self) -> Result<VerifyingKey, KeyMaterialError> {
        match self.type_.as_str() {
            "Ed25519VerificationKey2018"
            | "Ed25519VerificationKey2020"
            | "JsonWebKey2020"
            | "Multikey" => {}
            other => return Err(KeyMaterialError::UnsupportedKeyType(other.to_string())),
        }
        match (
            &self.public_key_base58,
            &self.public_key_jwk,
            &self.public_key_multibase,
        ) {
            (Some(base58), None, None) => {
                let bytes = bs58::decode(base58)
                    .into_vec()
                    .map_err(|e| KeyMaterialError::Base58(e.to_string()))?;
                ed25519_from_bytes(&bytes)
            }
            (None, Some(jwk), None) => JWK::from_value(jwk)?.ed25519_public_key(),
            (None, None, Some(multibase)) => {
                let (base, bytes) = multibase::decode(multibase)
                    .map_err(|e| KeyMaterialError::Multibase(e.to_string()))?;
                if base != multibase::Base::Base58Btc {
                    return Err(KeyMaterialError::ExpectedBase58btc);
                }
                match bytes.strip_prefix(&ED25519_PUB_MULTICODEC[..]) {
                    Some(key) if key.len() == PUBLIC_KEY_LENGTH => ed25519_from_bytes(key),
                    _ => ed25519_from_bytes(&bytes),
                }
            }
            (None, None, None) => Err(KeyMaterialError::MissingKeyMaterial),
            _ => Err(KeyMaterialError::MultipleKeyMaterial),
        }
    }
}
