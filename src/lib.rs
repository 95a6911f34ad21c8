//! Verification of [Verifiable Credentials][vc-data-model] secured with
//! [Linked Data Proofs][ld-proofs].
//!
//! The verifier discovers the signing key from the proof's
//! `verificationMethod`: the owning document (a [`did:web`][did-web] DID
//! document or any document reachable over HTTP(S)) is resolved, the
//! matching verification method selected, and the signature checked over
//! the [URDNA2015][rdf-canon] canonical form of the credential and the proof
//! options.
//!
//! ```no_run
//! use std::sync::Arc;
//! use vc_verify::{HttpLoader, Verifier, VerifierOptions};
//!
//! # async fn run(credential: serde_json::Value) -> Result<(), vc_verify::ResolutionError> {
//! let verifier = Verifier::new(Arc::new(HttpLoader::new()?), VerifierOptions::default());
//! let outcome = verifier.verify_credential(&credential).await;
//! if !outcome.verified {
//!     eprintln!("{}", outcome.reason.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [vc-data-model]: <https://www.w3.org/TR/vc-data-model/>
//! [ld-proofs]: <https://w3c-ccg.github.io/ld-proofs/>
//! [did-web]: <https://w3c-ccg.github.io/did-method-web/>
//! [rdf-canon]: <https://www.w3.org/TR/rdf-canon/>

pub mod did;
pub mod error;
pub mod hash;
pub mod jsonld;
pub mod jwk;
pub mod jws;
pub mod key;
pub mod ldp;
pub mod loader;
pub mod options;
pub mod rdf;
pub mod resolver;
pub mod urdna2015;
pub mod vc;

pub use did::{Document, VerificationMethod, VerificationMethodMap, VerificationRelationship};
pub use error::{
    AuthorizationError, CanonicalizationError, Error, FailureKind, KeyNotFoundError,
    PolicyError, ResolutionError,
};
pub use jsonld::{ContextLoader, ContextMap, JsonLdOptions};
pub use key::{locate_key, LocatedKey};
pub use ldp::{Ed25519Signature2018, Proof, ProofSuite, ProofSuiteType};
#[cfg(feature = "http")]
pub use loader::HttpLoader;
pub use loader::{DocumentLoader, StaticLoader};
pub use options::{FreshnessPolicy, VerifierOptions};
pub use resolver::{DocumentResolver, ResolutionMethod};
pub use urdna2015::{Canonicalizer, Urdna2015};
pub use vc::{Credential, VerificationOutcome, Verifier};
