use super::{Keyword, Location, Pointer, Violation};
use crate::description::ParameterSpec;
use crate::models::openapi::ParameterLocation;
use crate::schema::{SchemaArena, SchemaId, SchemaType, SchemaValidator};
use http::HeaderMap;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::{Number, Value};

/// Raw parameter values of one message, grouped by location
#[derive(Debug)]
pub struct ParameterSources<'m> {
    pub path: IndexMap<String, String>,
    pub query: IndexMap<String, Vec<String>>,
    pub headers: &'m HeaderMap,
    pub cookies: IndexMap<String, String>,
}

impl<'m> ParameterSources<'m> {
    pub fn new(
        path: IndexMap<String, String>,
        query: Option<&str>,
        headers: &'m HeaderMap,
    ) -> Self {
        Self {
            path,
            query: query.map(parse_query).unwrap_or_default(),
            headers,
            cookies: parse_cookies(headers),
        }
    }

    /// All raw values sent for a parameter, `None` when it is absent
    fn values(&self, spec: &ParameterSpec) -> Option<Vec<String>> {
        match spec.location {
            ParameterLocation::Path => self.path.get(&spec.name).map(|v| vec![v.clone()]),
            ParameterLocation::Query => self.query.get(&spec.name).cloned(),
            ParameterLocation::Header => header_values(self.headers, &spec.name),
            ParameterLocation::Cookie => self.cookies.get(&spec.name).map(|v| vec![v.clone()]),
        }
    }
}

/// Validate declared parameters in location order (path, query, header, cookie)
pub(crate) fn validate_parameters(
    specs: &[ParameterSpec],
    sources: &ParameterSources<'_>,
    validator: &SchemaValidator<'_>,
    arena: &SchemaArena,
) -> Vec<Violation> {
    let order = [
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Cookie,
    ];

    let mut violations = vec![];
    for location in order {
        for spec in specs.iter().filter(|s| s.location == location) {
            violations.extend(validate_parameter(spec, sources.values(spec), validator, arena));
        }
    }
    violations
}

pub(crate) fn validate_parameter(
    spec: &ParameterSpec,
    values: Option<Vec<String>>,
    validator: &SchemaValidator<'_>,
    arena: &SchemaArena,
) -> Vec<Violation> {
    let location = violation_location(spec.location);
    let pointer = Pointer::root().join(spec.name.as_str());

    let Some(values) = values else {
        if spec.required {
            return vec![
                Violation::new(
                    location,
                    Keyword::Required,
                    format!("{} parameter '{}' is required", spec.location, spec.name),
                )
                .with_pointer(pointer),
            ];
        }
        return vec![];
    };

    if spec.schema.is_any() {
        return vec![];
    }

    let separator_split = !(spec.location == ParameterLocation::Query && spec.explode);
    let value = coerce_values(values, spec.schema, arena, separator_split);
    validator.validate(spec.schema, &value, location, &pointer)
}

pub(crate) fn violation_location(location: ParameterLocation) -> Location {
    match location {
        ParameterLocation::Path => Location::Path,
        ParameterLocation::Query => Location::Query,
        ParameterLocation::Header => Location::Header,
        ParameterLocation::Cookie => Location::Cookie,
    }
}

/// Turn wire-level strings into a JSON value shaped like the declared schema.
///
/// Arrays of scalars are built from repeated values, or from comma-separated
/// values when `split` is set. Anything that does not coerce stays a string so
/// the schema check reports it.
pub(crate) fn coerce_values(
    values: Vec<String>,
    schema: SchemaId,
    arena: &SchemaArena,
    split: bool,
) -> Value {
    let node = arena.get(schema);

    if node.scalar_type() == Some(SchemaType::Array) {
        let items = node.items.unwrap_or(SchemaId::ANY);
        let raw: Vec<String> = if split {
            values
                .iter()
                .flat_map(|v| v.split(','))
                .map(|v| v.trim().to_string())
                .collect()
        } else {
            values
        };
        return Value::Array(raw.iter().map(|v| coerce_scalar(v, items, arena)).collect());
    }

    match values.first() {
        Some(first) => coerce_scalar(first, schema, arena),
        None => Value::String(String::new()),
    }
}

pub(crate) fn coerce_scalar(raw: &str, schema: SchemaId, arena: &SchemaArena) -> Value {
    let node = arena.get(schema);

    if raw == "null" && node.accepts_null() {
        return Value::Null;
    }

    let coerced = match node.scalar_type() {
        Some(SchemaType::Integer | SchemaType::Number) => raw
            .parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| parse_float(raw)),
        Some(SchemaType::Boolean) => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };

    coerced.unwrap_or_else(|| Value::String(raw.to_string()))
}

fn parse_float(raw: &str) -> Option<Value> {
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Parse an `application/x-www-form-urlencoded` string; `+` means space
pub fn parse_query(query: &str) -> IndexMap<String, Vec<String>> {
    let mut pairs: IndexMap<String, Vec<String>> = IndexMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        pairs.entry(form_decode(key)).or_default().push(form_decode(value));
    }
    pairs
}

fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn parse_cookies(headers: &HeaderMap) -> IndexMap<String, String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .flat_map(|value| {
            String::from_utf8_lossy(value.as_bytes())
                .split(';')
                .filter_map(|pair| {
                    let (name, value) = pair.trim().split_once('=')?;
                    Some((name.trim().to_string(), value.trim().to_string()))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Header lookup is case-insensitive; repeated headers are kept in order
pub(crate) fn header_values(headers: &HeaderMap, name: &str) -> Option<Vec<String>> {
    let values: Vec<String> = headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();
    (!values.is_empty()).then_some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaCompiler;
    use http::HeaderValue;
    use serde_json::json;

    fn compile(schema: Value) -> (SchemaArena, SchemaId) {
        let mut arena = SchemaArena::new();
        let components = IndexMap::new();
        let id = SchemaCompiler::new(&mut arena, &components)
            .compile(&schema, "test")
            .unwrap();
        (arena, id)
    }

    fn spec(
        name: &str,
        location: ParameterLocation,
        required: bool,
        schema: SchemaId,
    ) -> ParameterSpec {
        ParameterSpec {
            name: name.to_string(),
            location,
            required,
            schema,
            explode: location == ParameterLocation::Query,
        }
    }

    #[test]
    fn test_coerce_scalars() {
        let (arena, int) = compile(json!({"type": "integer"}));
        assert_eq!(coerce_scalar("5", int, &arena), json!(5));
        assert_eq!(coerce_scalar("5.5", int, &arena), json!(5.5));
        assert_eq!(coerce_scalar("five", int, &arena), json!("five"));

        let (arena, boolean) = compile(json!({"type": "boolean"}));
        assert_eq!(coerce_scalar("true", boolean, &arena), json!(true));
        assert_eq!(coerce_scalar("yes", boolean, &arena), json!("yes"));

        let (arena, string) = compile(json!({"type": "string"}));
        assert_eq!(coerce_scalar("5", string, &arena), json!("5"));
    }

    #[test]
    fn test_coerce_arrays() {
        let (arena, ids) = compile(json!({"type": "array", "items": {"type": "integer"}}));
        assert_eq!(
            coerce_values(vec!["1,2".into(), "3".into()], ids, &arena, true),
            json!([1, 2, 3])
        );
        assert_eq!(
            coerce_values(vec!["1".into(), "x".into()], ids, &arena, false),
            json!([1, "x"])
        );
    }

    #[test]
    fn test_parse_query() {
        let query = parse_query("tag=a&tag=b%20c&name=John+Smith&flag");
        assert_eq!(query["tag"], vec!["a", "b c"]);
        assert_eq!(query["name"], vec!["John Smith"]);
        assert_eq!(query["flag"], vec![""]);
    }

    #[test]
    fn test_missing_required_and_invalid_values() {
        let (arena, int) = compile(json!({"type": "integer", "minimum": 1}));
        let validator = SchemaValidator::new(&arena);

        let mut headers = HeaderMap::new();
        headers.insert("x-page", HeaderValue::from_static("0"));
        headers.insert(http::header::COOKIE, HeaderValue::from_static("session=abc; theme=dark"));
        let sources = ParameterSources::new(IndexMap::new(), Some("limit=ten"), &headers);

        let specs = vec![
            spec("X-Page", ParameterLocation::Header, false, int),
            spec("limit", ParameterLocation::Query, true, int),
            spec("offset", ParameterLocation::Query, true, int),
            spec("session", ParameterLocation::Cookie, true, SchemaId::ANY),
        ];

        let found = validate_parameters(&specs, &sources, &validator, &arena);
        let summary: Vec<_> = found
            .iter()
            .map(|v| (v.location, v.keyword, v.pointer.to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Location::Query, Keyword::Type, "/limit".to_string()),
                (Location::Query, Keyword::Required, "/offset".to_string()),
                (Location::Header, Keyword::Minimum, "/X-Page".to_string()),
            ]
        );
    }
}
