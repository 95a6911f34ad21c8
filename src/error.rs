use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::did::VerificationRelationship;

/// Error raised while verifying a credential.
///
/// Every variant maps onto one [`FailureKind`], which is what callers
/// inspect programmatically; the `Display` text becomes the outcome reason.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("key not found: {0}")]
    KeyNotFound(#[from] KeyNotFoundError),
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("authorization error: {0}")]
    Authorization(#[from] AuthorizationError),
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("malformed input: {0}")]
    JWS(#[from] crate::jws::Error),
    #[error("malformed input: {0}")]
    KeyMaterial(#[from] crate::key::KeyMaterialError),
    #[error("policy violation: {0}")]
    Policy(#[from] PolicyError),
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Resolution(_) => FailureKind::Resolution,
            Self::KeyNotFound(_) => FailureKind::KeyNotFound,
            Self::Canonicalization(_) => FailureKind::Canonicalization,
            Self::SignatureMismatch => FailureKind::SignatureMismatch,
            Self::Authorization(_) => FailureKind::Authorization,
            Self::Malformed(_) | Self::JWS(_) | Self::KeyMaterial(_) => FailureKind::Malformed,
            Self::Policy(_) => FailureKind::Policy,
        }
    }
}

/// Category of a failed verification.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Resolution,
    KeyNotFound,
    Canonicalization,
    SignatureMismatch,
    Authorization,
    Malformed,
    Policy,
}

#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    #[error("unsupported identifier scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid DID: {0}")]
    InvalidDid(String),
    #[error("timed out after {}s fetching {url}", .timeout.as_secs_f32())]
    Timeout { url: String, timeout: Duration },
    #[error("unable to fetch {url}: {message}")]
    Transport { url: String, message: String },
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("HTTP error {status} fetching {url}")]
    Http { url: String, status: u16 },
    #[error("unable to parse document from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyNotFoundError {
    #[error("no verification method with id {0}")]
    Missing(String),
    #[error("{count} verification methods share the id {id}")]
    Ambiguous { id: String, count: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    #[error("invalid @context: {0}")]
    InvalidContext(String),
    #[error("too many remote contexts")]
    ContextOverflow,
    #[error("expansion failed: {0}")]
    Expansion(String),
    #[error("document nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("invalid value object: {0}")]
    InvalidValueObject(String),
    #[error("invalid @id value")]
    InvalidIdValue,
    #[error("invalid @type value")]
    InvalidTypeValue,
    #[error("invalid @reverse value")]
    InvalidReverseValue,
    #[error("relative IRI reference: {0}")]
    RelativeIri(String),
    #[error("blank node graph is too complex to normalize")]
    TooComplex,
    #[error("missing canonical identifier for blank node {0}")]
    MissingIdentifier(String),
    #[error("canonicalization task failed: {0}")]
    Task(String),
    #[error("unable to serialize JSON literal: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("proof purpose {found} does not match expected purpose {expected}")]
    ProofPurposeMismatch {
        expected: VerificationRelationship,
        found: VerificationRelationship,
    },
    #[error("missing proof purpose")]
    MissingProofPurpose,
    #[error("verification method {method} is not authorized for {purpose} by {controller}")]
    NotAuthorized {
        method: String,
        purpose: VerificationRelationship,
        controller: String,
    },
    #[error("verification method mismatch: expected {expected}, found {found}")]
    VerificationMethodMismatch { expected: String, found: String },
    #[error("issuer {issuer} does not control verification method {method}")]
    IssuerMismatch { issuer: String, method: String },
    #[error("credential has no issuer")]
    MissingIssuer,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("proof has no creation time")]
    MissingCreated,
    #[error("proof created in the future: {0}")]
    FutureProof(DateTime<Utc>),
    #[error("proof created at {0} is older than the allowed maximum age")]
    TooOld(DateTime<Utc>),
    #[error("proof expired at {0}")]
    Expired(DateTime<Utc>),
    #[error("duration out of range")]
    InvalidDuration,
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
