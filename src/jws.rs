use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// RFC 7515 - JSON Web Signature (JWS)
// RFC 7797 - JSON Web Signature (JWS) Unencoded Payload Option

pub const ALG_EDDSA: &str = "EdDSA";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid JWS")]
    InvalidJWS,
    #[error("invalid base64 in JWS: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid JWS header: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid critical header")]
    InvalidCriticalHeader,
    #[error("unknown critical header")]
    UnknownCriticalHeader,
    #[error("expected unencoded payload")]
    ExpectedUnencodedPayload,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("expected 64 byte signature, found {0} bytes")]
    UnexpectedSignatureLength(usize),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Header {
    #[serde(rename = "alg")]
    pub algorithm: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "b64")]
    pub base64urlencode_payload: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "crit")]
    pub critical: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(flatten)]
    pub additional_parameters: BTreeMap<String, serde_json::Value>,
}

fn base64_encode_json<T: Serialize>(object: &T) -> Result<String, Error> {
    let json = serde_json::to_string(&object)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Sign `payload` as an EdDSA JWS with unencoded, detached payload.
pub fn detached_sign_unencoded_payload(
    payload: &[u8],
    key: &SigningKey,
    key_id: Option<String>,
) -> Result<String, Error> {
    let header = Header {
        algorithm: ALG_EDDSA.to_string(),
        base64urlencode_payload: Some(false),
        critical: Some(vec!["b64".to_string()]),
        key_id,
        ..Default::default()
    };
    let header_b64 = base64_encode_json(&header)?;
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    let signature = key.sign(&signing_input);
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());
    Ok(header_b64 + ".." + &sig_b64)
}

pub fn split_jws(jws: &str) -> Result<(&str, &str, &str), Error> {
    let mut parts = jws.splitn(3, '.');
    Ok(match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c)) if !c.contains('.') => (a, b, c),
        _ => return Err(Error::InvalidJWS),
    })
}

pub fn split_detached_jws(jws: &str) -> Result<(&str, &str), Error> {
    let (header_b64, omitted_payload, signature_b64) = split_jws(jws)?;
    if !omitted_payload.is_empty() {
        return Err(Error::InvalidJWS);
    }
    Ok((header_b64, signature_b64))
}

pub struct DecodedJWS {
    pub header: Header,
    pub signing_input: Vec<u8>,
    pub signature: Signature,
}

/// Decode a detached EdDSA JWS over an unencoded payload.
///
/// Only `b64` may be listed as a critical header, and it must be `false`.
pub fn decode_detached_unencoded(jws: &str, payload: &[u8]) -> Result<DecodedJWS, Error> {
    let (header_b64, signature_b64) = split_detached_jws(jws)?;
    let header_json = URL_SAFE_NO_PAD.decode(header_b64)?;
    let header: Header = serde_json::from_slice(&header_json)?;
    if header.algorithm != ALG_EDDSA {
        return Err(Error::UnsupportedAlgorithm(header.algorithm));
    }
    let mut b64_critical = false;
    for name in header.critical.iter().flatten() {
        match name.as_str() {
            "alg" | "jku" | "jwk" | "kid" | "x5u" | "x5c" | "x5t" | "x5t#S256" | "typ" | "cty"
            | "crit" => return Err(Error::InvalidCriticalHeader),
            "b64" => b64_critical = true,
            _ => return Err(Error::UnknownCriticalHeader),
        }
    }
    if header.base64urlencode_payload != Some(false) || !b64_critical {
        return Err(Error::ExpectedUnencodedPayload);
    }
    let signature_bytes = URL_SAFE_NO_PAD.decode(signature_b64)?;
    let signature = Signature::from_slice(&signature_bytes)
        .map_err(|_| Error::UnexpectedSignatureLength(signature_bytes.len()))?;
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    Ok(DecodedJWS {
        header,
        signing_input,
        signature,
    })
}
