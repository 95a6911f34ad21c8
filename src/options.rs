//! Verifier configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::did::VerificationRelationship;
use crate::error::PolicyError;
use crate::ldp::Proof;
use crate::resolver::DEFAULT_TIMEOUT;

/// Options controlling credential verification.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct VerifierOptions {
    /// Bound on each document or context fetch, in whole seconds.
    #[serde(with = "duration_secs")]
    pub resolution_timeout: Duration,
    pub expected_proof_purpose: VerificationRelationship,
    /// Require the verification method's controller to be the issuer.
    pub check_issuer: bool,
    /// Fail canonicalization on terms that do not expand to absolute IRIs.
    pub safe_mode: bool,
    pub freshness: FreshnessPolicy,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            resolution_timeout: DEFAULT_TIMEOUT,
            expected_proof_purpose: VerificationRelationship::AssertionMethod,
            check_issuer: true,
            safe_mode: true,
            freshness: FreshnessPolicy::default(),
        }
    }
}

/// Checks on the proof timestamps.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "policy", rename_all = "camelCase")]
pub enum FreshnessPolicy {
    /// Accept any timestamp covered by a valid signature.
    #[default]
    TrustOnSignature,
    /// Reject proofs older than `max_age`, created in the future, or expired.
    #[serde(rename_all = "camelCase")]
    MaxAge {
        #[serde(with = "duration_secs")]
        max_age: Duration,
        #[serde(with = "duration_secs", default)]
        clock_skew: Duration,
    },
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, PolicyError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| PolicyError::InvalidTimestamp(timestamp.to_string()))
}

impl FreshnessPolicy {
    pub fn check(&self, proof: &Proof, now: DateTime<Utc>) -> Result<(), PolicyError> {
        let (max_age, clock_skew) = match self {
            Self::TrustOnSignature => return Ok(()),
            Self::MaxAge {
                max_age,
                clock_skew,
            } => (
                chrono::Duration::from_std(*max_age).map_err(|_| PolicyError::InvalidDuration)?,
                chrono::Duration::from_std(*clock_skew)
                    .map_err(|_| PolicyError::InvalidDuration)?,
            ),
        };
        let created = parse_timestamp(
            proof
                .created
                .as_deref()
                .ok_or(PolicyError::MissingCreated)?,
        )?;
        let shift = |time: DateTime<Utc>, by: chrono::Duration| {
            time.checked_add_signed(by).ok_or(PolicyError::InvalidDuration)
        };
        if created > shift(now, clock_skew)? {
            return Err(PolicyError::FutureProof(created));
        }
        if shift(shift(created, max_age)?, clock_skew)? < now {
            return Err(PolicyError::TooOld(created));
        }
        if let Some(expires) = proof.expires.as_deref() {
            let expires = parse_timestamp(expires)?;
            if shift(expires, clock_skew)? < now {
                return Err(PolicyError::Expired(expires));
            }
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
