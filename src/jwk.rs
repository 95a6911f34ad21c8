use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::key::KeyMaterialError;

// RFC 7517 - JSON Web Key (JWK)
// RFC 8037 - CFRG Elliptic Curve Diffie-Hellman (ECDH) and Signatures in JOSE

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JWK {
    #[serde(rename = "alg", skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kty")]
pub enum Params {
    OKP(OctetParams),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OctetParams {
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(rename = "x")]
    pub public_key: Base64urlUInt,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "String", into = "String")]
pub struct Base64urlUInt(pub Vec<u8>);

impl TryFrom<String> for Base64urlUInt {
    type Error = base64::DecodeError;
    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(URL_SAFE_NO_PAD.decode(data)?))
    }
}

impl From<Base64urlUInt> for String {
    fn from(data: Base64urlUInt) -> String {
        URL_SAFE_NO_PAD.encode(data.0)
    }
}

impl JWK {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, KeyMaterialError> {
        serde_json::from_value(value.clone())
            .map_err(|err| KeyMaterialError::UnsupportedKeyType(format!("JWK: {err}")))
    }

    pub fn ed25519_public_key(&self) -> Result<VerifyingKey, KeyMaterialError> {
        match &self.params {
            Params::OKP(okp) if okp.curve == "Ed25519" => {
                crate::key::ed25519_from_bytes(&okp.public_key.0)
            }
            Params::OKP(okp) => Err(KeyMaterialError::UnsupportedCurve(okp.curve.clone())),
        }
    }
}

impl From<&VerifyingKey> for JWK {
    fn from(key: &VerifyingKey) -> Self {
        JWK {
            algorithm: None,
            key_id: None,
            params: Params::OKP(OctetParams {
                curve: "Ed25519".to_string(),
                public_key: Base64urlUInt(key.to_bytes().to_vec()),
            }),
        }
    }
}
