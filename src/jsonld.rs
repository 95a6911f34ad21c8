//! JSON-LD 1.1 processing: context loading, expansion and deserialization
//! to RDF.

use std::collections::{HashMap, VecDeque};

use iref::{Iri, IriBuf};
use json_ld::syntax::IntoJsonWithContext;
use json_ld::{JsonLdProcessor, LoadError, RemoteDocument};
use log::debug;
use serde_json::Value;

use crate::error::{CanonicalizationError, Error};
use crate::rdf::DataSet;
use crate::resolver::DocumentResolver;

mod to_rdf;

pub use to_rdf::{canonical_double, to_dataset};

/// <https://w3c.github.io/json-ld-api/#the-jsonldoptions-type>
// Options implemented as needed
#[derive(Debug, Clone)]
pub struct JsonLdOptions {
    /// <https://w3c.github.io/json-ld-api/#dom-jsonldoptions-base>
    pub base: Option<String>,
    /// Reject terms, types and node identifiers that would otherwise be
    /// dropped for not expanding to absolute IRIs.
    pub safe_mode: bool,
}

impl Default for JsonLdOptions {
    fn default() -> Self {
        Self {
            base: None,
            safe_mode: true,
        }
    }
}

/// <https://www.w3.org/TR/json-ld11/#keywords>
pub const AT_CONTEXT: &str = "@context";
pub const AT_GRAPH: &str = "@graph";
pub const AT_ID: &str = "@id";
pub const AT_IMPORT: &str = "@import";
pub const AT_INCLUDED: &str = "@included";
pub const AT_JSON: &str = "@json";
pub const AT_LANGUAGE: &str = "@language";
pub const AT_LIST: &str = "@list";
pub const AT_REVERSE: &str = "@reverse";
pub const AT_TYPE: &str = "@type";
pub const AT_VALUE: &str = "@value";

/// Starts with a URI scheme followed by `:`.
pub fn is_absolute_iri(string: &str) -> bool {
    let (scheme, _) = match string.split_once(':') {
        Some(split) => split,
        None => return false,
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !string.chars().any(char::is_whitespace)
}

pub fn is_blank_node_identifier(string: &str) -> bool {
    string.starts_with("_:")
}

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const ED25519_2018_V1_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2018/v1";

/// Context documents shipped with the crate.
pub fn bundled_context(url: &str) -> Option<&'static str> {
    match url {
        CREDENTIALS_V1_CONTEXT => Some(vc_verify_contexts::CREDENTIALS_V1),
        ED25519_2018_V1_CONTEXT => Some(vc_verify_contexts::ED25519_2018_V1),
        _ => None,
    }
}

const MAX_LOADED_CONTEXTS: usize = 64;

/// Deepest array/object nesting accepted in a document, matching the
/// recursion limit `serde_json` applies when parsing text.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Remote context documents by URL, ready for synchronous expansion.
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    documents: HashMap<String, Value>,
}

impl ContextMap {
    /// A map holding every bundled context.
    pub fn bundled() -> Result<Self, CanonicalizationError> {
        let mut map = Self::default();
        for url in [CREDENTIALS_V1_CONTEXT, ED25519_2018_V1_CONTEXT] {
            if let Some(text) = bundled_context(url) {
                let document = serde_json::from_str(text)
                    .map_err(|e| CanonicalizationError::InvalidContext(format!("{url}: {e}")))?;
                map.insert(url, document);
            }
        }
        Ok(map)
    }

    pub fn get(&self, url: &str) -> Option<&Value> {
        self.documents.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.documents.contains_key(url)
    }

    pub fn insert(&mut self, url: &str, document: Value) {
        self.documents.insert(url.to_string(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Fetches every context a document refers to, directly or through other
/// contexts.
pub struct ContextLoader<'a> {
    resolver: &'a DocumentResolver,
}

impl<'a> ContextLoader<'a> {
    pub fn new(resolver: &'a DocumentResolver) -> Self {
        Self { resolver }
    }

    pub async fn load(&self, document: &Value) -> Result<ContextMap, Error> {
        check_nesting_depth(document)?;
        let mut contexts = ContextMap::bundled()?;
        let mut queue = VecDeque::new();
        collect_document_contexts(document, &mut queue);
        while let Some(url) = queue.pop_front() {
            if contexts.contains(&url) {
                continue;
            }
            if contexts.len() >= MAX_LOADED_CONTEXTS {
                return Err(CanonicalizationError::ContextOverflow.into());
            }
            debug!("loading JSON-LD context {}", url);
            let context_document = self.resolver.resolve(&url).await?;
            match context_document.get(AT_CONTEXT) {
                Some(context) => collect_context_references(context, &mut queue),
                None => {
                    return Err(CanonicalizationError::InvalidContext(format!(
                        "{url} has no @context"
                    ))
                    .into())
                }
            }
            contexts.insert(&url, context_document);
        }
        Ok(contexts)
    }
}

#[derive(Debug, thiserror::Error)]
enum ContextMapError {
    #[error("context not loaded: {0}")]
    NotLoaded(String),

    #[error("context {0} is not JSON-LD: {1}")]
    Syntax(String, String),
}

/// Serves expansion from the prefetched documents only.
impl json_ld::Loader for ContextMap {
    async fn load(&self, url: &Iri) -> json_ld::LoadingResult {
        let document = self.get(url.as_str()).ok_or_else(|| {
            LoadError::new(url.to_owned(), ContextMapError::NotLoaded(url.to_string()))
        })?;
        let document = json_syntax::to_value(document).map_err(|e| {
            let cause = ContextMapError::Syntax(url.to_string(), e.to_string());
            LoadError::new(url.to_owned(), cause)
        })?;
        Ok(RemoteDocument::new(Some(url.to_owned()), None, document))
    }
}

fn collect_document_contexts(value: &Value, queue: &mut VecDeque<String>) {
    match value {
        Value::Object(object) => {
            for (key, value) in object {
                if key == AT_CONTEXT {
                    collect_context_references(value, queue);
                } else {
                    collect_document_contexts(value, queue);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_document_contexts(item, queue);
            }
        }
        _ => {}
    }
}

fn collect_context_references(context: &Value, queue: &mut VecDeque<String>) {
    match context {
        Value::String(url) => queue.push_back(url.clone()),
        Value::Array(items) => {
            for item in items {
                collect_context_references(item, queue);
            }
        }
        Value::Object(definitions) => {
            for (key, value) in definitions {
                if key == AT_IMPORT {
                    if let Value::String(url) = value {
                        queue.push_back(url.clone());
                    }
                } else if let Some(scoped) = value.get(AT_CONTEXT) {
                    collect_context_references(scoped, queue);
                }
            }
        }
        _ => {}
    }
}

/// Fail on documents nested deeper than [`MAX_NESTING_DEPTH`].
pub fn check_nesting_depth(document: &Value) -> Result<(), CanonicalizationError> {
    let mut stack = vec![(document, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        let children: Box<dyn Iterator<Item = &Value>> = match value {
            Value::Array(items) => Box::new(items.iter()),
            Value::Object(object) => Box::new(object.values()),
            _ => continue,
        };
        if depth >= MAX_NESTING_DEPTH {
            return Err(CanonicalizationError::TooDeep(MAX_NESTING_DEPTH));
        }
        stack.extend(children.map(|child| (child, depth + 1)));
    }
    Ok(())
}

/// Expand a JSON-LD document against prefetched contexts.
///
/// In safe mode, keys, types and identifiers that would be dropped for not
/// expanding to absolute IRIs are errors.
pub fn expand(
    document: &Value,
    contexts: &ContextMap,
    options: &JsonLdOptions,
) -> Result<Vec<Value>, CanonicalizationError> {
    check_nesting_depth(document)?;
    let base = match &options.base {
        Some(base) => Some(
            IriBuf::new(base.clone())
                .map_err(|_| CanonicalizationError::RelativeIri(base.clone()))?,
        ),
        None => None,
    };
    let json = json_syntax::to_value(document)
        .map_err(|e| CanonicalizationError::Expansion(e.to_string()))?;
    let remote = RemoteDocument::new(base, None, json);
    let mut expansion_options = json_ld::Options::default();
    if options.safe_mode {
        expansion_options.expansion_policy = json_ld::expansion::Policy::strictest();
    }
    // Contexts are already in memory, so the loader never suspends.
    let expansion = remote.expand_full(&mut (), contexts, expansion_options, ());
    let expanded = futures::executor::block_on(expansion)
        .map_err(|e| CanonicalizationError::Expansion(e.to_string()))?;
    let expanded = serde_json::to_value(expanded.into_json_with(&()))
        .map_err(|e| CanonicalizationError::Expansion(e.to_string()))?;
    match expanded {
        Value::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

/// Expand a JSON-LD document and deserialize it to an RDF dataset.
pub fn json_to_dataset(
    document: &Value,
    contexts: &ContextMap,
    options: &JsonLdOptions,
) -> Result<DataSet, CanonicalizationError> {
    let expanded = expand(document, contexts, options)?;
    to_dataset(&expanded, options)
}

pub(crate) fn as_array_ref(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}
