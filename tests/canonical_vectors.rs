use std::sync::Arc;

use serde_json::{json, Value};
use vc_verify::jsonld::CREDENTIALS_V1_CONTEXT;
use vc_verify::{
    Canonicalizer, ContextMap, StaticLoader, Urdna2015, VerificationOutcome, Verifier,
    VerifierOptions,
};

const SECURITY_V1_CONTEXT: &str = "https://w3id.org/security/v1";
const EXAMPLES_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/examples/v1";

fn contexts() -> ContextMap {
    let mut contexts = ContextMap::bundled().unwrap();
    contexts.insert(
        SECURITY_V1_CONTEXT,
        json!({"@context": {"id": "@id", "type": "@type", "sec": "https://w3id.org/security#"}}),
    );
    contexts.insert(
        EXAMPLES_V1_CONTEXT,
        json!({"@context": {"name": {
            "@id": "http://schema.org/name",
            "@type": "http://www.w3.org/1999/02/22-rdf-syntax-ns#HTML"
        }}}),
    );
    contexts
}

fn canonicalize(document: &Value) -> String {
    Urdna2015::default()
        .canonicalize(document, &contexts())
        .unwrap()
}

#[test]
fn proof_json_to_urdna2015() {
    let proof = json!({
        "@context": [SECURITY_V1_CONTEXT, CREDENTIALS_V1_CONTEXT],
        "type": "RsaSignature2018",
        "created": "2020-09-03T15:15:39Z",
        "verificationMethod": "https://example.org/foo/1",
        "proofPurpose": "assertionMethod"
    });
    let expected = "\
_:c14n0 <http://purl.org/dc/terms/created> \"2020-09-03T15:15:39Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://w3id.org/security#RsaSignature2018> .
_:c14n0 <https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod> .
_:c14n0 <https://w3id.org/security#verificationMethod> <https://example.org/foo/1> .
";
    assert_eq!(canonicalize(&proof), expected);
}

#[test]
fn credential_json_to_urdna2015() {
    let credential = json!({
        "@context": [CREDENTIALS_V1_CONTEXT, EXAMPLES_V1_CONTEXT],
        "id": "http://example.com/credentials/4643",
        "type": ["VerifiableCredential"],
        "issuer": "https://example.com/issuers/14",
        "issuanceDate": "2018-02-24T05:28:04Z",
        "credentialSubject": {
            "id": "did:example:abcdef1234567",
            "name": "Jane Doe"
        }
    });
    let expected = "\
<did:example:abcdef1234567> <http://schema.org/name> \"Jane Doe\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#HTML> .
<http://example.com/credentials/4643> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .
<http://example.com/credentials/4643> <https://www.w3.org/2018/credentials#credentialSubject> <did:example:abcdef1234567> .
<http://example.com/credentials/4643> <https://www.w3.org/2018/credentials#issuanceDate> \"2018-02-24T05:28:04Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
<http://example.com/credentials/4643> <https://www.w3.org/2018/credentials#issuer> <https://example.com/issuers/14> .
";
    assert_eq!(canonicalize(&credential), expected);
}

// Issued by an independent Ed25519Signature2018 implementation.
const LOCALHOST_DID_URL: &str = "https://localhost/did.json";

fn localhost_did_document() -> Value {
    json!({
        "@context": "https://www.w3.org/ns/did/v1",
        "id": "did:web:localhost",
        "verificationMethod": [{
            "id": "did:web:localhost#key1",
            "type": "Ed25519VerificationKey2018",
            "controller": "did:web:localhost",
            "publicKeyBase58": "2sXRz2VfrpySNEL6xmXJWQg6iY94qwNp1qrJJFBuPWmH"
        }],
        "assertionMethod": ["did:web:localhost#key1"]
    })
}

fn localhost_credential() -> Value {
    json!({
        "@context": [CREDENTIALS_V1_CONTEXT],
        "type": ["VerifiableCredential"],
        "issuer": "did:web:localhost",
        "issuanceDate": "2021-01-26T16:57:27Z",
        "credentialSubject": {"id": "did:web:localhost"},
        "proof": {
            "type": "Ed25519Signature2018",
            "created": "2021-01-26T16:57:27Z",
            "verificationMethod": "did:web:localhost#key1",
            "proofPurpose": "assertionMethod",
            "jws": "eyJhbGciOiJFZERTQSIsImNyaXQiOlsiYjY0Il0sImI2NCI6ZmFsc2V9..BCvVb4jz-yVaTeoP24Wz0cOtiHKXCdPcmFQD_pxgsMU6aCAj1AIu3cqHyoViU93nPmzqMLswOAqZUlMyVnmzDw"
        }
    })
}

#[test]
fn externally_signed_credential_canonical_forms() {
    let mut credential = localhost_credential();
    let proof = credential.as_object_mut().unwrap().remove("proof").unwrap();
    assert_eq!(
        canonicalize(&credential),
        "\
_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .
_:c14n0 <https://www.w3.org/2018/credentials#credentialSubject> <did:web:localhost> .
_:c14n0 <https://www.w3.org/2018/credentials#issuanceDate> \"2021-01-26T16:57:27Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
_:c14n0 <https://www.w3.org/2018/credentials#issuer> <did:web:localhost> .
"
    );

    let mut options = proof;
    options.as_object_mut().unwrap().remove("jws");
    options["@context"] = credential["@context"].clone();
    assert_eq!(
        canonicalize(&options),
        "\
_:c14n0 <http://purl.org/dc/terms/created> \"2021-01-26T16:57:27Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://w3id.org/security#Ed25519Signature2018> .
_:c14n0 <https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod> .
_:c14n0 <https://w3id.org/security#verificationMethod> <did:web:localhost#key1> .
"
    );
}

#[tokio::test]
async fn verify_externally_signed_credential() {
    let loader = StaticLoader::new().with_document(LOCALHOST_DID_URL, localhost_did_document());
    let verifier = Verifier::new(Arc::new(loader), VerifierOptions::default());
    let outcome = verifier.verify_credential(&localhost_credential()).await;
    assert_eq!(outcome, VerificationOutcome::success());

    let mut tampered = localhost_credential();
    tampered["issuanceDate"] = json!("2021-01-26T16:57:28Z");
    let outcome = verifier.verify_credential(&tampered).await;
    assert_eq!(outcome.reason.as_deref(), Some("signature mismatch"));
}
