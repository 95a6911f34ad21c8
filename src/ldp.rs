//! Linked Data Proof suites.

use std::collections::BTreeMap as Map;
use std::str::FromStr;

use ed25519_dalek::{SigningKey, VerifyingKey};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::did::{Document, VerificationRelationship};
use crate::error::{AuthorizationError, Error, ResolutionError};
use crate::hash::sha256;
use crate::jsonld::{ContextMap, AT_CONTEXT};
use crate::jws;
use crate::key::LocatedKey;
use crate::resolver::DocumentResolver;
use crate::urdna2015::Canonicalizer;

/// Proof members holding the signature, left out of the signed proof options.
const SIGNATURE_MEMBERS: [&str; 3] = ["jws", "proofValue", "signatureValue"];

/// <https://w3c-ccg.github.io/ld-proofs/#linked-data-proof-overview>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "@context", default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<VerificationRelationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

impl Proof {
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        serde_json::from_value(value.clone()).map_err(|e| Error::Malformed(format!("proof: {e}")))
    }
}

/// Supported proof types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofSuiteType {
    Ed25519Signature2018,
}

impl FromStr for ProofSuiteType {
    type Err = Error;
    fn from_str(type_: &str) -> Result<Self, Self::Err> {
        match type_ {
            "Ed25519Signature2018" => Ok(Self::Ed25519Signature2018),
            _ => Err(Error::Malformed(format!("unsupported proof type: {type_}"))),
        }
    }
}

impl ProofSuiteType {
    pub fn suite(&self) -> &'static dyn ProofSuite {
        match self {
            Self::Ed25519Signature2018 => &Ed25519Signature2018,
        }
    }
}

pub trait ProofSuite: Send + Sync {
    /// Hashes of the canonical proof options and document, concatenated.
    fn signing_input(
        &self,
        document: &Value,
        proof: &Value,
        contexts: &ContextMap,
        canonicalizer: &dyn Canonicalizer,
    ) -> Result<Vec<u8>, Error>;

    /// Add a signature to `proof` (proof options without signature).
    fn sign(
        &self,
        document: &Value,
        proof: &Value,
        contexts: &ContextMap,
        canonicalizer: &dyn Canonicalizer,
        key: &SigningKey,
    ) -> Result<Value, Error>;

    /// Check the proof signature against the located verification method.
    fn verify(
        &self,
        document: &Value,
        proof: &Value,
        key: &LocatedKey,
        contexts: &ContextMap,
        canonicalizer: &dyn Canonicalizer,
    ) -> Result<(), Error>;
}

/// <https://w3c-ccg.github.io/lds-ed25519-2018/>
pub struct Ed25519Signature2018;

impl ProofSuite for Ed25519Signature2018 {
    fn signing_input(
        &self,
        document: &Value,
        proof: &Value,
        contexts: &ContextMap,
        canonicalizer: &dyn Canonicalizer,
    ) -> Result<Vec<u8>, Error> {
        let document = document_without_proof(document)?;
        let proof_options = proof_options(&document, proof)?;
        let sigopts_normalized = canonicalizer.canonicalize(&proof_options, contexts)?;
        let doc_normalized = canonicalizer.canonicalize(&document, contexts)?;
        let sigopts_digest = sha256(sigopts_normalized.as_bytes());
        let doc_digest = sha256(doc_normalized.as_bytes());
        debug!(
            "proof options digest {}, document digest {}",
            hex::encode(sigopts_digest),
            hex::encode(doc_digest)
        );
        Ok([sigopts_digest, doc_digest].concat())
    }

    fn sign(
        &self,
        document: &Value,
        proof: &Value,
        contexts: &ContextMap,
        canonicalizer: &dyn Canonicalizer,
        key: &SigningKey,
    ) -> Result<Value, Error> {
        let message = self.signing_input(document, proof, contexts, canonicalizer)?;
        let jws = jws::detached_sign_unencoded_payload(&message, key, None)?;
        let mut proof = proof.clone();
        match proof.as_object_mut() {
            Some(members) => {
                members.insert("jws".to_string(), Value::String(jws));
            }
            None => return Err(Error::Malformed("proof is not an object".to_string())),
        }
        Ok(proof)
    }

    fn verify(
        &self,
        document: &Value,
        proof: &Value,
        key: &LocatedKey,
        contexts: &ContextMap,
        canonicalizer: &dyn Canonicalizer,
    ) -> Result<(), Error> {
        let parsed = Proof::from_value(proof)?;
        let jws = parsed
            .jws
            .as_deref()
            .ok_or_else(|| Error::Malformed("proof has no jws".to_string()))?;
        let verifying_key = public_key(key)?;
        let message = self.signing_input(document, proof, contexts, canonicalizer)?;
        let decoded = jws::decode_detached_unencoded(jws, &message)?;
        let method_id = key.id();
        if let Some(kid) = &decoded.header.key_id {
            if *kid != method_id {
                return Err(AuthorizationError::VerificationMethodMismatch {
                    expected: method_id,
                    found: kid.clone(),
                }
                .into());
            }
        }
        verifying_key
            .verify_strict(&decoded.signing_input, &decoded.signature)
            .map_err(|_| Error::SignatureMismatch)
    }
}

/// Ed25519 key of a located verification method.
pub fn public_key(key: &LocatedKey) -> Result<VerifyingKey, Error> {
    Ok(key.method.ed25519_public_key()?)
}

/// The document with its `proof` member removed.
pub fn document_without_proof(document: &Value) -> Result<Value, Error> {
    let mut document = document.clone();
    match document.as_object_mut() {
        Some(members) => {
            members.remove("proof");
        }
        None => return Err(Error::Malformed("credential is not an object".to_string())),
    }
    Ok(document)
}

/// The proof without its signature, in the document's JSON-LD context.
pub fn proof_options(document: &Value, proof: &Value) -> Result<Value, Error> {
    let mut options = proof.clone();
    let members = options
        .as_object_mut()
        .ok_or_else(|| Error::Malformed("proof is not an object".to_string()))?;
    for member in SIGNATURE_MEMBERS {
        members.remove(member);
    }
    match document.get(AT_CONTEXT) {
        Some(context) => {
            members.insert(AT_CONTEXT.to_string(), context.clone());
        }
        None => {
            members.remove(AT_CONTEXT);
        }
    }
    Ok(options)
}

/// Check that the proof is for the expected purpose and that the
/// verification method's controller authorizes it for that purpose.
pub async fn ensure_proof_purpose(
    proof: &Proof,
    key: &LocatedKey,
    expected: VerificationRelationship,
    resolver: &DocumentResolver,
) -> Result<(), Error> {
    let purpose = proof
        .proof_purpose
        .ok_or(AuthorizationError::MissingProofPurpose)?;
    if purpose != expected {
        return Err(AuthorizationError::ProofPurposeMismatch {
            expected,
            found: purpose,
        }
        .into());
    }
    let method_id = key.id();
    match proof.verification_method.as_deref() {
        Some(vm) if vm == method_id => {}
        found => {
            return Err(AuthorizationError::VerificationMethodMismatch {
                expected: method_id,
                found: found.unwrap_or_default().to_string(),
            }
            .into())
        }
    }
    let controller = key.controller();
    let authorized = if controller == key.document.id {
        key.document.is_authorized(&method_id, purpose)
    } else {
        let value = resolver.resolve(controller).await?;
        let document: Document =
            serde_json::from_value(value).map_err(|source| ResolutionError::Malformed {
                url: controller.to_string(),
                source,
            })?;
        document.is_authorized(&method_id, purpose)
    };
    if !authorized {
        return Err(AuthorizationError::NotAuthorized {
            method: method_id,
            purpose,
            controller: controller.to_string(),
        }
        .into());
    }
    Ok(())
}
