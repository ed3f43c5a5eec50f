use super::{AdditionalProperties, Pattern, SchemaArena, SchemaId, SchemaNode, SchemaType};
use crate::error::{GuardError, Result};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Compiles raw schema JSON into [`SchemaArena`] nodes.
///
/// Named component schemas are compiled at most once. A component's handle is
/// registered before its body is compiled, so self-referential schemas
/// terminate and share one node.
pub struct SchemaCompiler<'a> {
    arena: &'a mut SchemaArena,
    components: &'a IndexMap<String, Value>,
    named: HashMap<String, SchemaId>,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(arena: &'a mut SchemaArena, components: &'a IndexMap<String, Value>) -> Self {
        Self {
            arena,
            components,
            named: HashMap::new(),
        }
    }

    /// Compile a schema; `location` names where it was found, for error messages
    pub fn compile(&mut self, schema: &Value, location: &str) -> Result<SchemaId> {
        match schema {
            Value::Bool(true) => Ok(SchemaId::ANY),
            Value::Bool(false) => Ok(self.arena.alloc(SchemaNode {
                not: Some(SchemaId::ANY),
                ..Default::default()
            })),
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref") {
                    let reference = reference
                        .as_str()
                        .ok_or_else(|| invalid(location, "$ref must be a string"))?;
                    return self.compile_reference(reference);
                }

                let node = self.compile_node(map, location)?;
                if node.is_unconstrained() {
                    Ok(SchemaId::ANY)
                } else {
                    Ok(self.arena.alloc(node))
                }
            }
            other => Err(invalid(
                location,
                &format!("expected a schema object, found {}", SchemaType::of(other)),
            )),
        }
    }

    /// Compile `#/components/schemas/{name}`
    pub fn compile_reference(&mut self, reference: &str) -> Result<SchemaId> {
        let name = reference
            .strip_prefix(SCHEMA_REF_PREFIX)
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .map(decode_pointer_segment)
            .ok_or_else(|| GuardError::UnresolvedReference(reference.to_string()))?;

        if let Some(id) = self.named.get(&name) {
            return Ok(*id);
        }

        let components = self.components;
        let raw = components
            .get(&name)
            .ok_or_else(|| GuardError::UnresolvedReference(reference.to_string()))?;

        let id = self.arena.reserve();
        self.named.insert(name.clone(), id);
        tracing::trace!(schema = %name, id = id.index(), "Compiling component schema");

        let node = match raw {
            Value::Object(map) if map.contains_key("$ref") => {
                // alias of another component
                let target = self.compile(raw, reference)?;
                SchemaNode {
                    all_of: vec![target],
                    ..Default::default()
                }
            }
            Value::Object(map) => self.compile_node(map, reference)?,
            Value::Bool(true) => SchemaNode::default(),
            Value::Bool(false) => SchemaNode {
                not: Some(SchemaId::ANY),
                ..Default::default()
            },
            _ => return Err(invalid(reference, "expected a schema object")),
        };
        self.arena.set(id, node);

        if composition_cycle(self.arena, id) {
            return Err(invalid(
                reference,
                "reference cycle through allOf, anyOf, oneOf or not without an intervening \
                 properties or items schema",
            ));
        }

        Ok(id)
    }

    fn compile_node(&mut self, map: &Map<String, Value>, location: &str) -> Result<SchemaNode> {
        let mut node = SchemaNode::default();

        match map.get("type") {
            None => {}
            Some(Value::String(name)) => node.types.push(parse_type(name, location)?),
            Some(Value::Array(names)) => {
                for name in names {
                    let name = name
                        .as_str()
                        .ok_or_else(|| invalid(location, "type entries must be strings"))?;
                    node.types.push(parse_type(name, location)?);
                }
            }
            Some(_) => return Err(invalid(location, "type must be a string or an array")),
        }

        node.nullable = map.get("nullable").and_then(Value::as_bool).unwrap_or(false);
        node.format = map.get("format").and_then(Value::as_str).map(str::to_string);
        node.enum_values = map.get("enum").and_then(Value::as_array).cloned();
        node.const_value = map.get("const").cloned();

        if let Some(Value::Object(properties)) = map.get("properties") {
            for (name, schema) in properties {
                let id = self.compile(schema, &format!("{}/properties/{}", location, name))?;
                node.properties.insert(name.clone(), id);
            }
        }

        if let Some(Value::Array(required)) = map.get("required") {
            node.required = required
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }

        node.additional_properties = match map.get("additionalProperties") {
            None | Some(Value::Bool(true)) => AdditionalProperties::Unconstrained,
            Some(Value::Bool(false)) => AdditionalProperties::Forbidden,
            Some(schema) => {
                let id = self.compile(schema, &format!("{}/additionalProperties", location))?;
                if id.is_any() {
                    AdditionalProperties::Unconstrained
                } else {
                    AdditionalProperties::Schema(id)
                }
            }
        };
        node.min_properties = map.get("minProperties").and_then(Value::as_u64);
        node.max_properties = map.get("maxProperties").and_then(Value::as_u64);

        if let Some(items) = map.get("items").filter(|v| v.is_object() || v.is_boolean()) {
            let id = self.compile(items, &format!("{}/items", location))?;
            node.items = (!id.is_any()).then_some(id);
        }
        node.min_items = map.get("minItems").and_then(Value::as_u64);
        node.max_items = map.get("maxItems").and_then(Value::as_u64);
        node.unique_items = map.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false);

        node.min_length = map.get("minLength").and_then(Value::as_u64);
        node.max_length = map.get("maxLength").and_then(Value::as_u64);
        if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
            let compiled = Pattern::new(pattern).map_err(|e| {
                invalid(location, &format!("invalid pattern '{}': {}", pattern, e))
            })?;
            node.pattern = Some(compiled);
        }

        node.minimum = map.get("minimum").and_then(Value::as_f64);
        node.maximum = map.get("maximum").and_then(Value::as_f64);
        node.multiple_of = map.get("multipleOf").and_then(Value::as_f64);

        // 3.0 uses boolean flags on minimum/maximum, 3.1 uses numbers
        match map.get("exclusiveMinimum") {
            Some(Value::Bool(true)) => node.exclusive_minimum = node.minimum.take(),
            Some(Value::Number(n)) => node.exclusive_minimum = n.as_f64(),
            _ => {}
        }
        match map.get("exclusiveMaximum") {
            Some(Value::Bool(true)) => node.exclusive_maximum = node.maximum.take(),
            Some(Value::Number(n)) => node.exclusive_maximum = n.as_f64(),
            _ => {}
        }

        node.all_of = self.compile_list(map, "allOf", location)?;
        node.any_of = self.compile_list(map, "anyOf", location)?;
        node.one_of = self.compile_list(map, "oneOf", location)?;
        if let Some(not) = map.get("not") {
            node.not = Some(self.compile(not, &format!("{}/not", location))?);
        }

        Ok(node)
    }

    fn compile_list(
        &mut self,
        map: &Map<String, Value>,
        keyword: &str,
        location: &str,
    ) -> Result<Vec<SchemaId>> {
        let Some(members) = map.get(keyword) else {
            return Ok(vec![]);
        };
        let members = members
            .as_array()
            .ok_or_else(|| invalid(location, &format!("{} must be an array", keyword)))?;

        members
            .iter()
            .enumerate()
            .map(|(i, member)| self.compile(member, &format!("{}/{}/{}", location, keyword, i)))
            .collect()
    }
}

/// Whether `start` reaches itself through composition keywords alone. Such a
/// cycle never descends into the instance, so checking it cannot terminate.
fn composition_cycle(arena: &SchemaArena, start: SchemaId) -> bool {
    let mut seen = HashSet::new();
    let mut pending: Vec<SchemaId> = composition_edges(arena.get(start)).collect();

    while let Some(id) = pending.pop() {
        if id == start {
            return true;
        }
        if seen.insert(id) {
            pending.extend(composition_edges(arena.get(id)));
        }
    }
    false
}

fn composition_edges(node: &SchemaNode) -> impl Iterator<Item = SchemaId> + '_ {
    node.all_of
        .iter()
        .chain(&node.any_of)
        .chain(&node.one_of)
        .chain(&node.not)
        .copied()
}

fn parse_type(name: &str, location: &str) -> Result<SchemaType> {
    SchemaType::parse(name).ok_or_else(|| invalid(location, &format!("unknown type '{}'", name)))
}

fn invalid(location: &str, message: &str) -> GuardError {
    GuardError::InvalidSchema {
        location: location.to_string(),
        message: message.to_string(),
    }
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(schema: Value, components: IndexMap<String, Value>) -> (SchemaArena, SchemaId) {
        let mut arena = SchemaArena::new();
        let id = {
            let mut compiler = SchemaCompiler::new(&mut arena, &components);
            compiler.compile(&schema, "test").unwrap()
        };
        (arena, id)
    }

    #[test]
    fn test_empty_schema_is_any() {
        let (arena, id) = compile(json!({"description": "anything"}), IndexMap::new());
        assert!(id.is_any());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_additional_properties_schema() {
        let (arena, id) = compile(
            json!({"type": "object", "additionalProperties": {"type": "string"}}),
            IndexMap::new(),
        );
        let node = arena.get(id);
        assert_eq!(node.types, vec![SchemaType::Object]);
        assert!(node.properties.is_empty());
        let AdditionalProperties::Schema(inner) = node.additional_properties else {
            panic!("expected additionalProperties schema");
        };
        assert_eq!(arena.get(inner).types, vec![SchemaType::String]);
    }

    #[test]
    fn test_additional_properties_flags() {
        let (arena, id) = compile(
            json!({"type": "object", "additionalProperties": false}),
            IndexMap::new(),
        );
        assert_eq!(arena.get(id).additional_properties, AdditionalProperties::Forbidden);

        let (arena, id) = compile(
            json!({"type": "object", "additionalProperties": {}}),
            IndexMap::new(),
        );
        assert_eq!(arena.get(id).additional_properties, AdditionalProperties::Unconstrained);
    }

    #[test]
    fn test_exclusive_bounds_both_dialects() {
        let (arena, id) = compile(
            json!({"type": "number", "minimum": 1, "exclusiveMinimum": true}),
            IndexMap::new(),
        );
        assert_eq!(arena.get(id).minimum, None);
        assert_eq!(arena.get(id).exclusive_minimum, Some(1.0));

        let (arena, id) =
            compile(json!({"type": "number", "exclusiveMaximum": 10}), IndexMap::new());
        assert_eq!(arena.get(id).exclusive_maximum, Some(10.0));
    }

    #[test]
    fn test_recursive_reference_shares_node() {
        let mut components = IndexMap::new();
        components.insert(
            "Node".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                }
            }),
        );

        let (arena, id) = compile(json!({"$ref": "#/components/schemas/Node"}), components);
        let children = arena.get(id).properties["children"];
        assert_eq!(arena.get(children).items, Some(id));
    }

    #[test]
    fn test_alias_cycle_is_rejected() {
        let mut components = IndexMap::new();
        components.insert("A".to_string(), json!({"$ref": "#/components/schemas/B"}));
        components.insert("B".to_string(), json!({"$ref": "#/components/schemas/A"}));
        components.insert("Self".to_string(), json!({"$ref": "#/components/schemas/Self"}));

        let mut arena = SchemaArena::new();
        let mut compiler = SchemaCompiler::new(&mut arena, &components);
        let pair = compiler.compile(&json!({"$ref": "#/components/schemas/A"}), "test");
        assert!(matches!(
            pair,
            Err(GuardError::InvalidSchema { location, .. }) if location == "#/components/schemas/A"
        ));
        let own = compiler.compile(&json!({"$ref": "#/components/schemas/Self"}), "test");
        assert!(matches!(own, Err(GuardError::InvalidSchema { .. })));
    }

    #[test]
    fn test_composition_cycle_is_rejected() {
        let mut components = IndexMap::new();
        components.insert(
            "A".to_string(),
            json!({"type": "object", "allOf": [{"$ref": "#/components/schemas/A"}]}),
        );
        components.insert(
            "B".to_string(),
            json!({"anyOf": [{"type": "string"}, {"not": {"$ref": "#/components/schemas/B"}}]}),
        );

        let mut arena = SchemaArena::new();
        let mut compiler = SchemaCompiler::new(&mut arena, &components);
        for name in ["A", "B"] {
            let reference = json!({"$ref": format!("#/components/schemas/{}", name)});
            assert!(matches!(
                compiler.compile(&reference, "test"),
                Err(GuardError::InvalidSchema { .. })
            ));
        }
    }

    #[test]
    fn test_composition_of_recursive_container_is_accepted() {
        let mut components = IndexMap::new();
        components.insert(
            "Tree".to_string(),
            json!({"anyOf": [
                {"type": "string"},
                {"type": "array", "items": {"$ref": "#/components/schemas/Tree"}}
            ]}),
        );

        let (arena, id) = compile(json!({"$ref": "#/components/schemas/Tree"}), components);
        let branch = arena.get(id).any_of[1];
        assert_eq!(arena.get(branch).items, Some(id));
    }

    #[test]
    fn test_unresolved_reference() {
        let mut arena = SchemaArena::new();
        let components = IndexMap::new();
        let mut compiler = SchemaCompiler::new(&mut arena, &components);

        let missing = compiler.compile(&json!({"$ref": "#/components/schemas/Missing"}), "test");
        assert!(matches!(missing, Err(GuardError::UnresolvedReference(_))));

        let external = compiler.compile(&json!({"$ref": "other.yaml#/Pet"}), "test");
        assert!(matches!(external, Err(GuardError::UnresolvedReference(_))));
    }

    #[test]
    fn test_invalid_type_and_pattern() {
        let mut arena = SchemaArena::new();
        let components = IndexMap::new();
        let mut compiler = SchemaCompiler::new(&mut arena, &components);

        assert!(compiler.compile(&json!({"type": "text"}), "test").is_err());
        assert!(compiler.compile(&json!({"type": "string", "pattern": "("}), "test").is_err());
    }

    #[test]
    fn test_look_around_pattern_compiles() {
        let (arena, id) =
            compile(json!({"type": "string", "pattern": "^(?!admin).*$"}), IndexMap::new());
        let pattern = arena.get(id).pattern.as_ref().unwrap();
        assert!(matches!(pattern, Pattern::Backtracking(_)));
        assert!(!pattern.is_match("admin1"));
    }

    #[test]
    fn test_openapi_31_type_array() {
        let (arena, id) = compile(json!({"type": ["string", "null"]}), IndexMap::new());
        assert!(arena.get(id).accepts_null());
        assert_eq!(arena.get(id).scalar_type(), Some(SchemaType::String));
    }
}
