use std::collections::BTreeMap as Map;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, KeyNotFoundError};

// https://www.w3.org/TR/did-core/

/// A DID document, or any JSON document listing verification methods.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "@context", default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<VerificationMethod>>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

/// Entry of a verification method or verification relationship array.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
#[allow(clippy::upper_case_acronyms)]
pub enum VerificationMethod {
    DIDURL(String),
    Map(VerificationMethodMap),
}

/// <https://www.w3.org/TR/did-core/#verification-methods>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethodMap {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

/// A [verification relationship](https://w3c.github.io/did-core/#dfn-verification-relationship),
/// used as a proof purpose.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "String", into = "String")]
pub enum VerificationRelationship {
    #[default]
    AssertionMethod,
    Authentication,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl VerificationRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssertionMethod => "assertionMethod",
            Self::Authentication => "authentication",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl FromStr for VerificationRelationship {
    type Err = Error;
    fn from_str(purpose: &str) -> Result<Self, Self::Err> {
        match purpose {
            "assertionMethod" => Ok(Self::AssertionMethod),
            "authentication" => Ok(Self::Authentication),
            "keyAgreement" => Ok(Self::KeyAgreement),
            "capabilityInvocation" => Ok(Self::CapabilityInvocation),
            "capabilityDelegation" => Ok(Self::CapabilityDelegation),
            _ => Err(Error::Malformed(format!(
                "unsupported verification relationship: {purpose}"
            ))),
        }
    }
}

impl TryFrom<String> for VerificationRelationship {
    type Error = Error;
    fn try_from(purpose: String) -> Result<Self, Self::Error> {
        Self::from_str(&purpose)
    }
}

impl From<VerificationRelationship> for String {
    fn from(purpose: VerificationRelationship) -> String {
        purpose.as_str().to_string()
    }
}

impl fmt::Display for VerificationRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Document {
    /// Resolve a relative DID URL (`#key-1`) against the document id.
    pub fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{}", self.id, id)
        } else {
            id.to_string()
        }
    }

    pub fn relationship(
        &self,
        relationship: VerificationRelationship,
    ) -> Option<&Vec<VerificationMethod>> {
        match relationship {
            VerificationRelationship::AssertionMethod => self.assertion_method.as_ref(),
            VerificationRelationship::Authentication => self.authentication.as_ref(),
            VerificationRelationship::KeyAgreement => self.key_agreement.as_ref(),
            VerificationRelationship::CapabilityInvocation => self.capability_invocation.as_ref(),
            VerificationRelationship::CapabilityDelegation => self.capability_delegation.as_ref(),
        }
    }

    /// Every embedded verification method map, including those inside
    /// verification relationships.
    pub fn verification_method_maps(&self) -> impl Iterator<Item = &VerificationMethodMap> {
        [
            &self.verification_method,
            &self.authentication,
            &self.assertion_method,
            &self.key_agreement,
            &self.capability_invocation,
            &self.capability_delegation,
        ]
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|vm| match vm {
            VerificationMethod::Map(map) => Some(map),
            VerificationMethod::DIDURL(_) => None,
        })
    }

    /// The one verification method with the given id.
    pub fn select_verification_method(
        &self,
        id: &str,
    ) -> Result<&VerificationMethodMap, KeyNotFoundError> {
        let matches: Vec<&VerificationMethodMap> = self
            .verification_method_maps()
            .filter(|vm| self.absolute_id(&vm.id) == id)
            .collect();
        match matches.as_slice() {
            [vm] => Ok(vm),
            [] => Err(KeyNotFoundError::Missing(id.to_string())),
            _ => Err(KeyNotFoundError::Ambiguous {
                id: id.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Whether the method is listed under the verification relationship.
    pub fn is_authorized(&self, vm_id: &str, relationship: VerificationRelationship) -> bool {
        self.relationship(relationship)
            .into_iter()
            .flatten()
            .any(|vm| {
                let id = match vm {
                    VerificationMethod::DIDURL(id) => id,
                    VerificationMethod::Map(map) => &map.id,
                };
                self.absolute_id(id) == vm_id
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Document {
        serde_json::from_value(json!({
            "@context": "https://www.w3.org/ns/did/v1",
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#key-1",
                "type": "Ed25519VerificationKey2018",
                "controller": "did:web:example.com",
                "publicKeyBase58": "AAAA"
            }],
            "authentication": [{
                "id": "#key-2",
                "type": "Ed25519VerificationKey2018",
                "controller": "did:web:example.com",
                "publicKeyBase58": "BBBB"
            }],
            "assertionMethod": ["#key-1"],
            "service": []
        }))
        .unwrap()
    }

    #[test]
    fn parse_document() {
        let doc = document();
        assert_eq!(doc.verification_method_maps().count(), 2);
        assert!(doc.property_set.contains_key("service"));
    }

    #[test]
    fn select() {
        let doc = document();
        let vm = doc
            .select_verification_method("did:web:example.com#key-2")
            .unwrap();
        assert_eq!(vm.public_key_base58.as_deref(), Some("BBBB"));
        assert_eq!(
            doc.select_verification_method("did:web:example.com#key-3"),
            Err(KeyNotFoundError::Missing(
                "did:web:example.com#key-3".to_string()
            ))
        );
    }

    #[test]
    fn select_ambiguous() {
        let mut doc = document();
        let mut duplicate = doc.verification_method_maps().next().unwrap().clone();
        duplicate.public_key_base58 = Some("CCCC".to_string());
        doc.verification_method
            .as_mut()
            .unwrap()
            .push(VerificationMethod::Map(duplicate));
        assert_eq!(
            doc.select_verification_method("did:web:example.com#key-1"),
            Err(KeyNotFoundError::Ambiguous {
                id: "did:web:example.com#key-1".to_string(),
                count: 2
            })
        );
    }

    #[test]
    fn authorization() {
        let doc = document();
        assert!(doc.is_authorized(
            "did:web:example.com#key-1",
            VerificationRelationship::AssertionMethod
        ));
        assert!(doc.is_authorized(
            "did:web:example.com#key-2",
            VerificationRelationship::Authentication
        ));
        assert!(!doc.is_authorized(
            "did:web:example.com#key-2",
            VerificationRelationship::AssertionMethod
        ));
    }

    #[test]
    fn relationship_names() {
        let purpose: VerificationRelationship =
            serde_json::from_value(json!("capabilityInvocation")).unwrap();
        assert_eq!(purpose, VerificationRelationship::CapabilityInvocation);
        assert_eq!(purpose.to_string(), "capabilityInvocation");
        assert!(serde_json::from_value::<VerificationRelationship>(json!("signing")).is_err());
    }
}
