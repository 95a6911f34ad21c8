//! Verifiable Credential verification.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthorizationError, CanonicalizationError, Error, FailureKind};
use crate::jsonld::{ContextLoader, JsonLdOptions};
use crate::key::locate_key;
use crate::ldp::{ensure_proof_purpose, Proof, ProofSuiteType};
use crate::loader::DocumentLoader;
use crate::options::VerifierOptions;
use crate::resolver::DocumentResolver;
use crate::urdna2015::{Canonicalizer, Urdna2015};

// https://www.w3.org/TR/vc-data-model/

/// The members of a credential the verifier reads. Everything else is
/// canonicalized from the original JSON.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: Option<String>,
    pub issuer: Option<Issuer>,
    pub proof: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Issuer {
    URI(String),
    Object(IssuerObject),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IssuerObject {
    pub id: String,
}

impl Issuer {
    pub fn get_id(&self) -> &str {
        match self {
            Self::URI(uri) => uri,
            Self::Object(object) => &object.id,
        }
    }
}

impl Credential {
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        if !value.is_object() {
            return Err(Error::Malformed("credential is not an object".to_string()));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| Error::Malformed(format!("credential: {e}")))
    }

    /// The single embedded proof.
    pub fn single_proof(&self) -> Result<&Value, Error> {
        match &self.proof {
            None | Some(Value::Null) => Err(Error::Malformed("missing proof".to_string())),
            Some(Value::Array(proofs)) => match proofs.as_slice() {
                [proof] => Ok(proof),
                [] => Err(Error::Malformed("missing proof".to_string())),
                _ => Err(Error::Malformed(format!(
                    "expected a single proof, found {}",
                    proofs.len()
                ))),
            },
            Some(proof) => Ok(proof),
        }
    }
}

/// Result of verifying a credential.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl VerificationOutcome {
    pub fn success() -> Self {
        Self {
            verified: true,
            reason: None,
            failure: None,
        }
    }
}

impl From<Error> for VerificationOutcome {
    fn from(err: Error) -> Self {
        Self {
            verified: false,
            failure: Some(err.kind()),
            reason: Some(err.to_string()),
        }
    }
}

/// Verifies credentials against keys discovered through their proofs.
#[derive(Clone)]
pub struct Verifier {
    resolver: DocumentResolver,
    canonicalizer: Arc<dyn Canonicalizer>,
    options: VerifierOptions,
}

impl Verifier {
    pub fn new(loader: Arc<dyn DocumentLoader>, options: VerifierOptions) -> Self {
        let resolver = DocumentResolver::new(loader).with_timeout(options.resolution_timeout);
        let canonicalizer = Arc::new(Urdna2015::new(JsonLdOptions {
            safe_mode: options.safe_mode,
            ..Default::default()
        }));
        Self {
            resolver,
            canonicalizer,
            options,
        }
    }

    pub fn with_canonicalizer(mut self, canonicalizer: Arc<dyn Canonicalizer>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    /// Verify a credential's embedded proof. Failures are reported in the
    /// outcome, never as errors.
    pub async fn verify_credential(&self, credential: &Value) -> VerificationOutcome {
        match self.try_verify(credential).await {
            Ok(()) => VerificationOutcome::success(),
            Err(err) => {
                warn!("credential verification failed: {}", err);
                err.into()
            }
        }
    }

    async fn try_verify(&self, value: &Value) -> Result<(), Error> {
        let credential = Credential::from_value(value)?;
        let proof_value = credential.single_proof()?;
        let proof = Proof::from_value(proof_value)?;
        let suite = proof.type_.parse::<ProofSuiteType>()?.suite();
        self.options.freshness.check(&proof, Utc::now())?;

        let verification_method = proof
            .verification_method
            .as_deref()
            .ok_or_else(|| Error::Malformed("proof has no verificationMethod".to_string()))?;
        let key = locate_key(verification_method, &self.resolver).await?;

        let contexts = ContextLoader::new(&self.resolver).load(value).await?;
        // Canonicalization is CPU bound; keep it off the async workers.
        let (document, proof_value, located) = (value.clone(), proof_value.clone(), key.clone());
        let canonicalizer = Arc::clone(&self.canonicalizer);
        tokio::task::spawn_blocking(move || {
            suite.verify(
                &document,
                &proof_value,
                &located,
                &contexts,
                canonicalizer.as_ref(),
            )
        })
        .await
        .map_err(|e| CanonicalizationError::Task(e.to_string()))??;
        ensure_proof_purpose(
            &proof,
            &key,
            self.options.expected_proof_purpose,
            &self.resolver,
        )
        .await?;

        if self.options.check_issuer {
            let issuer = credential
                .issuer
                .as_ref()
                .ok_or(AuthorizationError::MissingIssuer)?;
            if issuer.get_id() != key.controller() {
                return Err(AuthorizationError::IssuerMismatch {
                    issuer: issuer.get_id().to_string(),
                    method: key.id(),
                }
                .into());
            }
        }
        debug!(
            "verified {} with {}",
            credential.id.as_deref().unwrap_or("credential"),
            verification_method
        );
        Ok(())
    }

    /// Verify credentials concurrently. Once more than `max_failures` have
    /// failed, verifications still in flight are dropped and reported as
    /// `None`.
    pub async fn verify_batch(
        &self,
        credentials: &[Value],
        max_failures: usize,
    ) -> Vec<Option<VerificationOutcome>> {
        let mut outcomes = vec![None; credentials.len()];
        let mut pending: FuturesUnordered<_> = credentials
            .iter()
            .enumerate()
            .map(|(i, credential)| async move { (i, self.verify_credential(credential).await) })
            .collect();
        let mut failures = 0;
        while let Some((i, outcome)) = pending.next().await {
            if !outcome.verified {
                failures += 1;
            }
            outcomes[i] = Some(outcome);
            if failures > max_failures {
                debug!(
                    "abandoning {} verifications after {} failures",
                    pending.len(),
                    failures
                );
                break;
            }
        }
        outcomes
    }
}
