//! RDF Dataset Normalization (URDNA2015) and the default [`Canonicalizer`].

use std::collections::{BTreeMap as Map, BTreeSet};

use log::debug;
use serde_json::Value;

use crate::error::CanonicalizationError;
use crate::hash::sha256_hex;
use crate::jsonld::{json_to_dataset, ContextMap, JsonLdOptions};
use crate::rdf::{DataSet, Statement};

/// Upper bound on Hash N-Degree Quads invocations for one dataset.
const MAX_DEEP_ITERATIONS: usize = 4096;
/// Largest group of related blank nodes whose permutations are searched.
const MAX_PERMUTATION_SIZE: usize = 8;

/// Turns a JSON-LD document into canonical N-Quads.
///
/// Implementations must be pure: every `@context` the document needs is
/// already present in `contexts`.
pub trait Canonicalizer: Send + Sync {
    fn canonicalize(
        &self,
        document: &Value,
        contexts: &ContextMap,
    ) -> Result<String, CanonicalizationError>;
}

/// JSON-LD to RDF followed by URDNA2015.
#[derive(Debug, Clone, Default)]
pub struct Urdna2015 {
    pub options: JsonLdOptions,
}

impl Urdna2015 {
    pub fn new(options: JsonLdOptions) -> Self {
        Self { options }
    }
}

impl Canonicalizer for Urdna2015 {
    fn canonicalize(
        &self,
        document: &Value,
        contexts: &ContextMap,
    ) -> Result<String, CanonicalizationError> {
        let dataset = json_to_dataset(document, contexts, &self.options)?;
        let normalized = normalize(&dataset)?;
        Ok(normalized.to_nquads())
    }
}

/// https://www.w3.org/TR/rdf-canon/#canon-state
#[derive(Debug, Clone)]
pub struct NormalizationState<'a> {
    pub blank_node_to_quads: Map<String, Vec<&'a Statement>>,
    pub canonical_issuer: IdentifierIssuer,
    deep_iterations: usize,
}

/// https://www.w3.org/TR/rdf-canon/#dfn-identifier-issuer
#[derive(Debug, Clone)]
pub struct IdentifierIssuer {
    pub identifier_prefix: String,
    pub identifier_counter: u64,
    pub issued_identifiers_list: Vec<(String, String)>,
}

impl IdentifierIssuer {
    pub fn new(prefix: &str) -> Self {
        Self {
            identifier_prefix: prefix.to_string(),
            identifier_counter: 0,
            issued_identifiers_list: Vec::new(),
        }
    }

    pub fn find_issued_identifier(&self, existing_identifier: &str) -> Option<&str> {
        self.issued_identifiers_list
            .iter()
            .find(|(_, existing_id)| existing_id == existing_identifier)
            .map(|(issued_identifier, _)| issued_identifier.as_ref())
    }

    /// https://www.w3.org/TR/rdf-canon/#issue-identifier
    pub fn issue(&mut self, existing_identifier: &str) -> String {
        if let Some(id) = self.find_issued_identifier(existing_identifier) {
            return id.to_string();
        }
        let issued_identifier = format!("{}{}", self.identifier_prefix, self.identifier_counter);
        self.issued_identifiers_list
            .push((issued_identifier.clone(), existing_identifier.to_string()));
        self.identifier_counter += 1;
        issued_identifier
    }
}

#[derive(Debug, Clone)]
pub struct HashNDegreeQuadsOutput {
    pub hash: String,
    pub issuer: IdentifierIssuer,
}

/// https://www.w3.org/TR/rdf-canon/#hash-1d-quads
pub fn hash_first_degree_quads(
    normalization_state: &NormalizationState,
    reference_blank_node_identifier: &str,
) -> String {
    let mut nquads: Vec<String> = Vec::new();
    if let Some(quads) = normalization_state
        .blank_node_to_quads
        .get(reference_blank_node_identifier)
    {
        for quad in quads {
            let mut quad: Statement = (*quad).clone();
            for label in quad.blank_node_components_mut() {
                label.0 = if label.0 == reference_blank_node_identifier {
                    "_:a".to_string()
                } else {
                    "_:z".to_string()
                };
            }
            nquads.push(String::from(&quad));
        }
    }
    nquads.sort();
    sha256_hex(nquads.join("").as_bytes())
}

/// https://www.w3.org/TR/rdf-canon/#canon-algorithm
pub fn normalize(input_dataset: &DataSet) -> Result<DataSet, CanonicalizationError> {
    let mut normalization_state = NormalizationState {
        blank_node_to_quads: Map::new(),
        canonical_issuer: IdentifierIssuer::new("_:c14n"),
        deep_iterations: 0,
    };
    let input_dataset_quads = input_dataset.statements();
    for quad in input_dataset_quads {
        let labels: BTreeSet<&str> = quad
            .blank_node_components()
            .into_iter()
            .map(|label| label.0.as_str())
            .collect();
        for label in labels {
            normalization_state
                .blank_node_to_quads
                .entry(label.to_string())
                .or_default()
                .push(quad);
        }
    }
    let mut non_normalized_identifiers: BTreeSet<String> = normalization_state
        .blank_node_to_quads
        .keys()
        .cloned()
        .collect();

    let mut hash_to_blank_nodes: Map<String, Vec<String>> = Map::new();
    let mut simple = true;
    while simple {
        simple = false;
        hash_to_blank_nodes.clear();
        for identifier in &non_normalized_identifiers {
            let hash = hash_first_degree_quads(&normalization_state, identifier);
            hash_to_blank_nodes
                .entry(hash)
                .or_default()
                .push(identifier.clone());
        }
        hash_to_blank_nodes.retain(|_hash, identifier_list| {
            if identifier_list.len() > 1 {
                return true;
            }
            let identifier = &identifier_list[0];
            normalization_state.canonical_issuer.issue(identifier);
            non_normalized_identifiers.remove(identifier);
            simple = true;
            false
        });
    }

    // Only groups of blank nodes sharing a first degree hash remain.
    for (_hash, identifier_list) in hash_to_blank_nodes {
        let mut hash_path_list: Vec<HashNDegreeQuadsOutput> = Vec::new();
        for identifier in identifier_list {
            if normalization_state
                .canonical_issuer
                .find_issued_identifier(&identifier)
                .is_some()
            {
                continue;
            }
            let mut temporary_issuer = IdentifierIssuer::new("_:b");
            temporary_issuer.issue(&identifier);
            hash_path_list.push(hash_n_degree_quads(
                &mut normalization_state,
                &identifier,
                &temporary_issuer,
            )?);
        }
        hash_path_list.sort_by(|a, b| a.hash.cmp(&b.hash));
        for result in hash_path_list {
            for (_, existing_identifier) in result.issuer.issued_identifiers_list {
                normalization_state
                    .canonical_issuer
                    .issue(&existing_identifier);
            }
        }
    }
    if normalization_state.deep_iterations > 0 {
        debug!(
            "URDNA2015 used {} hash n-degree quads iterations",
            normalization_state.deep_iterations
        );
    }

    let mut normalized_dataset = DataSet::default();
    for quad in input_dataset_quads {
        let mut quad_copy = quad.clone();
        for label in quad_copy.blank_node_components_mut() {
            let canonical_identifier = normalization_state
                .canonical_issuer
                .find_issued_identifier(&label.0)
                .ok_or_else(|| CanonicalizationError::MissingIdentifier(label.0.clone()))?;
            label.0 = canonical_identifier.to_string();
        }
        normalized_dataset.add_statement(quad_copy);
    }
    Ok(normalized_dataset)
}

/// https://www.w3.org/TR/rdf-canon/#hash-nd-quads
pub fn hash_n_degree_quads(
    normalization_state: &mut NormalizationState,
    identifier: &str,
    issuer: &IdentifierIssuer,
) -> Result<HashNDegreeQuadsOutput, CanonicalizationError> {
    normalization_state.deep_iterations += 1;
    if normalization_state.deep_iterations > MAX_DEEP_ITERATIONS {
        return Err(CanonicalizationError::TooComplex);
    }
    let mut issuer = issuer.clone();
    let mut hash_to_related_blank_nodes: Map<String, Vec<String>> = Map::new();
    let quads = normalization_state
        .blank_node_to_quads
        .get(identifier)
        .cloned()
        .unwrap_or_default();
    for quad in quads {
        for (component, position) in quad.blank_node_components_with_position() {
            if component.0 != identifier {
                let hash = hash_related_blank_node(
                    normalization_state,
                    &component.0,
                    quad,
                    &issuer,
                    position,
                );
                hash_to_related_blank_nodes
                    .entry(hash)
                    .or_default()
                    .push(component.0.clone());
            }
        }
    }

    let mut data_to_hash = String::new();
    for (related_hash, blank_node_list) in hash_to_related_blank_nodes {
        data_to_hash.push_str(&related_hash);
        if blank_node_list.len() > MAX_PERMUTATION_SIZE {
            return Err(CanonicalizationError::TooComplex);
        }
        let mut chosen_path = String::new();
        let mut chosen_issuer = None;
        'permutations: for permutation in permutations(&blank_node_list) {
            let mut issuer_copy = issuer.clone();
            let mut path = String::new();
            let mut recursion_list: Vec<String> = Vec::new();
            for related in &permutation {
                if let Some(canonical_identifier) = normalization_state
                    .canonical_issuer
                    .find_issued_identifier(related)
                {
                    path.push_str(canonical_identifier);
                } else {
                    if issuer_copy.find_issued_identifier(related).is_none() {
                        recursion_list.push(related.clone());
                    }
                    path.push_str(&issuer_copy.issue(related));
                }
                if !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
                {
                    continue 'permutations;
                }
            }
            for related in recursion_list {
                let result = hash_n_degree_quads(normalization_state, &related, &issuer_copy)?;
                path.push_str(&issuer_copy.issue(&related));
                path.push('<');
                path.push_str(&result.hash);
                path.push('>');
                issuer_copy = result.issuer;
                if !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
                {
                    continue 'permutations;
                }
            }
            if chosen_path.is_empty() || path < chosen_path {
                chosen_path = path;
                chosen_issuer = Some(issuer_copy);
            }
        }
        data_to_hash.push_str(&chosen_path);
        if let Some(chosen_issuer) = chosen_issuer {
            issuer = chosen_issuer;
        }
    }
    Ok(HashNDegreeQuadsOutput {
        hash: sha256_hex(data_to_hash.as_bytes()),
        issuer,
    })
}

/// https://www.w3.org/TR/rdf-canon/#hash-related-blank-node
pub fn hash_related_blank_node(
    normalization_state: &NormalizationState,
    related: &str,
    quad: &Statement,
    issuer: &IdentifierIssuer,
    position: char,
) -> String {
    let identifier = match normalization_state
        .canonical_issuer
        .find_issued_identifier(related)
    {
        Some(id) => id.to_string(),
        None => match issuer.find_issued_identifier(related) {
            Some(id) => id.to_string(),
            None => hash_first_degree_quads(normalization_state, related),
        },
    };
    let mut input = position.to_string();
    if position != 'g' {
        input.push('<');
        input.push_str(quad.predicate.iri());
        input.push('>');
    }
    input.push_str(&identifier);
    sha256_hex(input.as_bytes())
}

fn permutations(items: &[String]) -> Vec<Vec<String>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, item.clone());
            result.push(tail);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{BlankNodeLabel, IRIRef, Literal, Object, Predicate, StringLiteral, Subject};

    fn blank(label: &str) -> BlankNodeLabel {
        BlankNodeLabel(label.to_string())
    }

    fn link(from: &str, predicate: &str, to: &str) -> Statement {
        Statement {
            subject: Subject::BlankNodeLabel(blank(from)),
            predicate: Predicate::IRIRef(IRIRef(predicate.to_string())),
            object: Object::BlankNodeLabel(blank(to)),
            graph_label: None,
        }
    }

    fn name(subject: &str, value: &str) -> Statement {
        Statement {
            subject: Subject::BlankNodeLabel(blank(subject)),
            predicate: Predicate::IRIRef(IRIRef("http://example.org/name".to_string())),
            object: Object::Literal(Literal::String {
                string: StringLiteral(value.to_string()),
            }),
            graph_label: None,
        }
    }

    #[test]
    fn single_blank_node() {
        let dataset: DataSet = vec![name("_:x", "v")].into_iter().collect();
        let normalized = normalize(&dataset).unwrap();
        assert_eq!(
            normalized.to_nquads(),
            "_:c14n0 <http://example.org/name> \"v\" .\n"
        );
    }

    #[test]
    fn labels_follow_first_degree_hash_order() {
        let forward: DataSet = vec![name("_:a", "alice"), name("_:b", "bob")]
            .into_iter()
            .collect();
        let reversed: DataSet = vec![name("_:q", "bob"), name("_:p", "alice")]
            .into_iter()
            .collect();
        assert_eq!(
            normalize(&forward).unwrap().to_nquads(),
            normalize(&reversed).unwrap().to_nquads()
        );
    }

    #[test]
    fn isomorphic_cycles_normalize_identically() {
        let p = "http://example.org/p";
        let first: DataSet = vec![link("_:a", p, "_:b"), link("_:b", p, "_:a")]
            .into_iter()
            .collect();
        let second: DataSet = vec![link("_:y", p, "_:x"), link("_:x", p, "_:y")]
            .into_iter()
            .collect();
        let normalized = normalize(&first).unwrap().to_nquads();
        assert_eq!(normalized, normalize(&second).unwrap().to_nquads());
        assert_eq!(
            normalized,
            "_:c14n0 <http://example.org/p> _:c14n1 .\n_:c14n1 <http://example.org/p> _:c14n0 .\n"
        );
    }

    #[test]
    fn shared_hash_groups_are_resolved() {
        let p = "http://example.org/p";
        let q = "http://example.org/q";
        let first: DataSet = vec![
            link("_:a", p, "_:b"),
            link("_:a", p, "_:c"),
            link("_:b", q, "_:c"),
        ]
        .into_iter()
        .collect();
        let second: DataSet = vec![
            link("_:n2", q, "_:n3"),
            link("_:n1", p, "_:n3"),
            link("_:n1", p, "_:n2"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            normalize(&first).unwrap().to_nquads(),
            normalize(&second).unwrap().to_nquads()
        );
    }

    #[test]
    fn canonical_form_ignores_member_order() {
        let first: serde_json::Value = serde_json::from_str(
            r#"{"@context": {"@vocab": "http://example.org/"},
                "name": "a", "knows": {"name": "b", "age": 3}}"#,
        )
        .unwrap();
        let second: serde_json::Value = serde_json::from_str(
            r#"{"knows": {"age": 3, "name": "b"}, "name": "a",
                "@context": {"@vocab": "http://example.org/"}}"#,
        )
        .unwrap();
        let canonicalizer = Urdna2015::default();
        let contexts = ContextMap::default();
        let normalized = canonicalizer.canonicalize(&first, &contexts).unwrap();
        assert_eq!(
            normalized,
            canonicalizer.canonicalize(&second, &contexts).unwrap()
        );
        let age = "<http://example.org/age> \"3\"^^<http://www.w3.org/2001/XMLSchema#integer>";
        assert!(normalized.contains(age));
    }

    #[test]
    fn permutation_count() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let all = permutations(&items);
        assert_eq!(all.len(), 6);
        assert!(all.contains(&vec!["c".to_string(), "a".to_string(), "b".to_string()]));
    }
}
