//! <https://www.w3.org/TR/json-ld11-api/#deserialize-json-ld-to-rdf-algorithm>

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use super::{
    as_array_ref, is_absolute_iri, is_blank_node_identifier, JsonLdOptions, AT_GRAPH, AT_ID,
    AT_INCLUDED, AT_JSON, AT_LANGUAGE, AT_LIST, AT_REVERSE, AT_TYPE, AT_VALUE, MAX_NESTING_DEPTH,
};
use crate::error::CanonicalizationError as Error;
use crate::rdf::{
    BlankNodeLabel, DataSet, GraphLabel, IRIRef, Lang, Literal, Object, Predicate, Statement,
    StringLiteral, Subject, RDF_FIRST, RDF_JSON, RDF_LANG_STRING, RDF_NIL, RDF_REST, RDF_TYPE,
    XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING,
};

/// Deserialize expanded JSON-LD into an RDF dataset.
///
/// Blank nodes are relabeled; labels are only stable within one dataset.
pub fn to_dataset(expanded: &[Value], options: &JsonLdOptions) -> Result<DataSet, Error> {
    let mut builder = DatasetBuilder {
        dataset: DataSet::default(),
        blank_nodes: HashMap::new(),
        counter: 0,
        depth: 0,
        safe_mode: options.safe_mode,
    };
    for element in expanded {
        builder.element(element, None)?;
    }
    Ok(builder.dataset)
}

struct DatasetBuilder {
    dataset: DataSet,
    blank_nodes: HashMap<String, String>,
    counter: u64,
    depth: usize,
    safe_mode: bool,
}

impl DatasetBuilder {
    fn fresh_blank_node(&mut self) -> BlankNodeLabel {
        let label = format!("_:b{}", self.counter);
        self.counter += 1;
        BlankNodeLabel(label)
    }

    fn blank_node(&mut self, existing: &str) -> BlankNodeLabel {
        if let Some(label) = self.blank_nodes.get(existing) {
            return BlankNodeLabel(label.clone());
        }
        let label = self.fresh_blank_node();
        self.blank_nodes
            .insert(existing.to_string(), label.0.clone());
        label
    }

    /// Subject for a node identifier, `None` if it is a relative IRI.
    fn node_id(&mut self, id: &str) -> Result<Option<Subject>, Error> {
        if is_blank_node_identifier(id) {
            Ok(Some(Subject::BlankNodeLabel(self.blank_node(id))))
        } else if is_absolute_iri(id) {
            Ok(Some(Subject::IRIRef(IRIRef(id.to_string()))))
        } else if self.safe_mode {
            Err(Error::RelativeIri(id.to_string()))
        } else {
            Ok(None)
        }
    }

    fn emit(
        &mut self,
        subject: &Subject,
        predicate: &str,
        object: Object,
        graph: Option<&GraphLabel>,
    ) {
        self.dataset.add_statement(Statement {
            subject: subject.clone(),
            predicate: Predicate::IRIRef(IRIRef(predicate.to_string())),
            object,
            graph_label: graph.cloned(),
        });
    }

    fn element(&mut self, element: &Value, graph: Option<&GraphLabel>) -> Result<(), Error> {
        if let Value::Object(node) = element {
            if !node.contains_key(AT_VALUE) && !node.contains_key(AT_LIST) {
                self.node(node, graph)?;
            }
        }
        Ok(())
    }

    fn node(
        &mut self,
        node: &Map<String, Value>,
        graph: Option<&GraphLabel>,
    ) -> Result<Option<Subject>, Error> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::TooDeep(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        let subject = self.node_statements(node, graph)?;
        self.depth -= 1;
        Ok(subject)
    }

    fn node_statements(
        &mut self,
        node: &Map<String, Value>,
        graph: Option<&GraphLabel>,
    ) -> Result<Option<Subject>, Error> {
        let subject = match node.get(AT_ID) {
            Some(Value::String(id)) => self.node_id(id)?,
            Some(_) => return Err(Error::InvalidIdValue),
            None => Some(Subject::BlankNodeLabel(self.fresh_blank_node())),
        };

        if let Some(types) = node.get(AT_TYPE) {
            for type_ in as_array_ref(types) {
                let type_ = type_.as_str().ok_or(Error::InvalidTypeValue)?;
                let object = self.node_id(type_)?.map(Object::from);
                if let (Some(subject), Some(object)) = (&subject, object) {
                    self.emit(subject, RDF_TYPE, object, graph);
                }
            }
        }

        for (property, values) in node {
            if property.starts_with('@') {
                continue;
            }
            if is_blank_node_identifier(property) {
                // Blank node predicates would need generalized RDF.
                continue;
            }
            if !is_absolute_iri(property) {
                if self.safe_mode {
                    return Err(Error::RelativeIri(property.clone()));
                }
                continue;
            }
            for item in as_array_ref(values) {
                let object = self.object(item, graph)?;
                if let (Some(subject), Some(object)) = (&subject, object) {
                    self.emit(subject, property, object, graph);
                }
            }
        }

        if let Some(reverse) = node.get(AT_REVERSE) {
            let reverse = reverse.as_object().ok_or(Error::InvalidReverseValue)?;
            for (property, values) in reverse {
                if !is_absolute_iri(property) {
                    if self.safe_mode {
                        return Err(Error::RelativeIri(property.clone()));
                    }
                    continue;
                }
                for item in as_array_ref(values) {
                    let referrer = match item {
                        Value::Object(map) => self.node(map, graph)?,
                        _ => return Err(Error::InvalidReverseValue),
                    };
                    if let (Some(referrer), Some(subject)) = (referrer, &subject) {
                        self.emit(&referrer, property, Object::from(subject.clone()), graph);
                    }
                }
            }
        }

        if let Some(items) = node.get(AT_INCLUDED) {
            for item in as_array_ref(items) {
                self.element(item, graph)?;
            }
        }

        if let Some(items) = node.get(AT_GRAPH) {
            if let Some(name) = subject.clone().map(GraphLabel::from) {
                for item in as_array_ref(items) {
                    self.element(item, Some(&name))?;
                }
            }
        }
        Ok(subject)
    }

    fn object(
        &mut self,
        item: &Value,
        graph: Option<&GraphLabel>,
    ) -> Result<Option<Object>, Error> {
        let map = match item {
            Value::Object(map) => map,
            _ => return Ok(None),
        };
        if map.contains_key(AT_VALUE) {
            return Ok(self.literal(map)?.map(Object::Literal));
        }
        if let Some(list) = map.get(AT_LIST) {
            return self.list(&as_array_ref(list), graph).map(Some);
        }
        Ok(self.node(map, graph)?.map(Object::from))
    }

    /// <https://www.w3.org/TR/json-ld11-api/#list-to-rdf-conversion>
    fn list(&mut self, items: &[&Value], graph: Option<&GraphLabel>) -> Result<Object, Error> {
        if items.is_empty() {
            return Ok(Object::IRIRef(IRIRef(RDF_NIL.to_string())));
        }
        let labels: Vec<BlankNodeLabel> = items.iter().map(|_| self.fresh_blank_node()).collect();
        for (i, item) in items.iter().enumerate() {
            let subject = Subject::BlankNodeLabel(labels[i].clone());
            if let Some(object) = self.object(item, graph)? {
                self.emit(&subject, RDF_FIRST, object, graph);
            }
            let rest = match labels.get(i + 1) {
                Some(next) => Object::BlankNodeLabel(next.clone()),
                None => Object::IRIRef(IRIRef(RDF_NIL.to_string())),
            };
            self.emit(&subject, RDF_REST, rest, graph);
        }
        Ok(Object::BlankNodeLabel(labels[0].clone()))
    }

    /// <https://www.w3.org/TR/json-ld11-api/#object-to-rdf-conversion>
    fn literal(&self, value_object: &Map<String, Value>) -> Result<Option<Literal>, Error> {
        let value = &value_object[AT_VALUE];
        let datatype = value_object.get(AT_TYPE).and_then(Value::as_str);
        if let Some(datatype) = datatype {
            if datatype != AT_JSON && !is_absolute_iri(datatype) {
                if self.safe_mode {
                    return Err(Error::RelativeIri(datatype.to_string()));
                }
                return Ok(None);
            }
        }
        let language = value_object.get(AT_LANGUAGE).and_then(Value::as_str);

        let (lexical, default_datatype) = if datatype == Some(AT_JSON) {
            (serde_jcs::to_string(value)?, RDF_JSON)
        } else {
            match value {
                Value::Bool(boolean) => (boolean.to_string(), XSD_BOOLEAN),
                Value::Number(number) => number_lexical_form(number, datatype),
                Value::String(string) if language.is_some() => (string.clone(), RDF_LANG_STRING),
                Value::String(string) => (string.clone(), XSD_STRING),
                _ => {
                    return Err(Error::InvalidValueObject(
                        "value is not a scalar".to_string(),
                    ))
                }
            }
        };
        let datatype = match datatype {
            None | Some(AT_JSON) => default_datatype,
            Some(datatype) => datatype,
        };
        let string = StringLiteral(lexical);
        Ok(Some(match language {
            Some(language) if value.is_string() && datatype == RDF_LANG_STRING => {
                Literal::LangTagged {
                    string,
                    lang: Lang(language.to_string()),
                }
            }
            _ if datatype == XSD_STRING => Literal::String { string },
            _ => Literal::Typed {
                string,
                type_: IRIRef(datatype.to_string()),
            },
        }))
    }
}

fn number_lexical_form(number: &Number, datatype: Option<&str>) -> (String, &'static str) {
    let as_double = datatype == Some(XSD_DOUBLE);
    if !as_double {
        if let Some(integer) = number.as_i64() {
            return (integer.to_string(), XSD_INTEGER);
        }
        if let Some(integer) = number.as_u64() {
            return (integer.to_string(), XSD_INTEGER);
        }
    }
    let mut float = number.as_f64().unwrap_or(f64::NAN);
    if float == 0.0 {
        // -0 has no distinct integer or canonical double form.
        float = 0.0;
    }
    if !as_double && float.fract() == 0.0 && float.abs() < 1e21 {
        return (format!("{float:.0}"), XSD_INTEGER);
    }
    (canonical_double(float), XSD_DOUBLE)
}

/// Canonical lexical form of an `xsd:double`: one digit before the decimal
/// point, at most fifteen after it, no trailing zeros, and an exponent
/// without a plus sign (`1.5E0`, `1.0E21`, `-2.5E-3`).
pub fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:.15E}");
    let (mantissa, exponent) = match formatted.split_once('E') {
        Some(parts) => parts,
        None => return formatted,
    };
    let mantissa = mantissa.trim_end_matches('0');
    if mantissa.ends_with('.') {
        format!("{mantissa}0E{exponent}")
    } else {
        format!("{mantissa}E{exponent}")
    }
}
