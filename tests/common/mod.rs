#![allow(dead_code)]

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde_json::{json, Value};
use vc_verify::jsonld::CREDENTIALS_V1_CONTEXT;
use vc_verify::{ContextMap, Ed25519Signature2018, ProofSuite, StaticLoader, Urdna2015};

pub const ISSUER: &str = "did:web:issuer.example:registry:org-1";
pub const KEY_1: &str = "did:web:issuer.example:registry:org-1#key-1";
pub const DID_URL: &str = "https://issuer.example/registry/org-1/did.json";

pub fn issuer_key() -> SigningKey {
    SigningKey::from_bytes(&[42; 32])
}

pub fn unrelated_key() -> SigningKey {
    SigningKey::from_bytes(&[7; 32])
}

pub fn verification_method(id: &str, controller: &str, key: &VerifyingKey) -> Value {
    json!({
        "id": id,
        "type": "Ed25519VerificationKey2018",
        "controller": controller,
        "publicKeyBase58": bs58::encode(key.as_bytes()).into_string()
    })
}

pub fn did_document(key: &VerifyingKey) -> Value {
    json!({
        "@context": "https://www.w3.org/ns/did/v1",
        "id": ISSUER,
        "verificationMethod": [verification_method(KEY_1, ISSUER, key)],
        "assertionMethod": [KEY_1]
    })
}

pub fn issuer_loader(document: Value) -> StaticLoader {
    StaticLoader::new().with_document(DID_URL, document)
}

pub fn credential(issuer: &str) -> Value {
    json!({
        "@context": [
            CREDENTIALS_V1_CONTEXT,
            {"@vocab": "https://example.org/vocab#"}
        ],
        "id": "urn:uuid:5e7a9b5c-48d2-4f0c-9a51-1f4f3c1e2a77",
        "type": ["VerifiableCredential"],
        "issuer": issuer,
        "issuanceDate": "2021-01-01T00:00:00Z",
        "credentialSubject": {
            "id": "did:example:holder",
            "degree": {"type": "BachelorDegree", "name": "Bachelor of Science"},
            "graduated": true,
            "gpa": 3.5
        }
    })
}

pub fn proof_options(verification_method: &str) -> Value {
    json!({
        "type": "Ed25519Signature2018",
        "created": "2021-01-01T00:00:00Z",
        "proofPurpose": "assertionMethod",
        "verificationMethod": verification_method
    })
}

/// Attach an Ed25519Signature2018 proof made with `key`.
pub fn sign_with(credential: &Value, options: &Value, key: &SigningKey) -> Value {
    let contexts = ContextMap::bundled().unwrap();
    let proof = Ed25519Signature2018
        .sign(credential, options, &contexts, &Urdna2015::default(), key)
        .unwrap();
    let mut signed = credential.clone();
    signed["proof"] = proof;
    signed
}

pub fn signed_credential() -> Value {
    sign_with(&credential(ISSUER), &proof_options(KEY_1), &issuer_key())
}
