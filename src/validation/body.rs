use super::parameters::{coerce_values, parse_query};
use super::{Keyword, Location, Violation};
use crate::schema::{AdditionalProperties, SchemaArena, SchemaId};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Problems with a message body as a whole, before any schema check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    Missing,
    Malformed(String),
    UnsupportedMediaType(String),
}

impl BodyError {
    pub fn keyword(&self) -> Keyword {
        match self {
            BodyError::Missing => Keyword::MissingBody,
            BodyError::Malformed(_) => Keyword::MalformedBody,
            BodyError::UnsupportedMediaType(_) => Keyword::UnsupportedMediaType,
        }
    }

    pub fn into_violation(self) -> Violation {
        let message = match &self {
            BodyError::Missing => "body is required but empty".to_string(),
            BodyError::Malformed(reason) => format!("body could not be decoded: {}", reason),
            BodyError::UnsupportedMediaType(media_type) => {
                format!("media type '{}' is not declared", media_type)
            }
        };
        Violation::new(Location::Body, self.keyword(), message)
    }
}

/// `Application/JSON; charset=utf-8` → `application/json`
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub fn is_json(media_type: &str) -> bool {
    let media_type = essence(media_type);
    media_type == "application/json" || media_type.ends_with("+json")
}

/// Pick the declared media type for a `Content-Type`: exact, then `type/*`, then `*/*`
pub fn select_media_type<'c>(
    content: &'c IndexMap<String, SchemaId>,
    content_type: &str,
) -> Option<(&'c str, SchemaId)> {
    let wanted = essence(content_type);
    let wildcard = wanted
        .split_once('/')
        .map(|(major, _)| format!("{}/*", major))
        .unwrap_or_default();

    [wanted.as_str(), wildcard.as_str(), "*/*"]
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .find_map(|candidate| {
            content
                .iter()
                .find(|(declared, _)| essence(declared) == candidate)
                .map(|(declared, schema)| (declared.as_str(), *schema))
        })
}

/// Decode a body for validation.
///
/// `media_type` is the message's `Content-Type`. Returns `Ok(None)` for media
/// types whose content is opaque to schema checks (binary, multipart).
pub fn decode(
    media_type: &str,
    body: &[u8],
    schema: SchemaId,
    arena: &SchemaArena,
) -> Result<Option<Value>, BodyError> {
    let media_type = essence(media_type);

    if is_json(&media_type) {
        return serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| BodyError::Malformed(e.to_string()));
    }

    if media_type == "application/x-www-form-urlencoded" {
        let text = std::str::from_utf8(body).map_err(|e| BodyError::Malformed(e.to_string()))?;
        return Ok(Some(decode_form(text, schema, arena)));
    }

    if media_type.starts_with("text/") {
        let text = std::str::from_utf8(body).map_err(|e| BodyError::Malformed(e.to_string()))?;
        return Ok(Some(Value::String(text.to_string())));
    }

    Ok(None)
}

/// Form fields become an object whose values are coerced per property schema
fn decode_form(text: &str, schema: SchemaId, arena: &SchemaArena) -> Value {
    let node = arena.get(schema);
    let mut object = Map::new();

    for (key, values) in parse_query(text) {
        let field_schema = match (node.properties.get(&key), node.additional_properties) {
            (Some(id), _) => *id,
            (None, AdditionalProperties::Schema(id)) => id,
            (None, _) => SchemaId::ANY,
        };
        // repeated fields form arrays; commas are literal in form bodies
        object.insert(key, coerce_values(values, field_schema, arena, false));
    }

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaCompiler;
    use serde_json::json;

    fn content(types: &[&str]) -> IndexMap<String, SchemaId> {
        types.iter().map(|t| (t.to_string(), SchemaId::ANY)).collect()
    }

    #[test]
    fn test_media_type_selection() {
        let declared = content(&["application/json", "text/*", "*/*"]);

        assert_eq!(
            select_media_type(&declared, "Application/JSON; charset=utf-8").map(|(m, _)| m),
            Some("application/json")
        );
        assert_eq!(
            select_media_type(&declared, "text/csv").map(|(m, _)| m),
            Some("text/*")
        );
        assert_eq!(
            select_media_type(&declared, "image/png").map(|(m, _)| m),
            Some("*/*")
        );

        let strict = content(&["application/json"]);
        assert!(select_media_type(&strict, "application/xml").is_none());
    }

    #[test]
    fn test_json_detection() {
        assert!(is_json("application/json"));
        assert!(is_json("application/problem+json; charset=utf-8"));
        assert!(!is_json("application/xml"));
    }

    #[test]
    fn test_decode_json() {
        let arena = SchemaArena::new();
        let value = decode("application/json", br#"{"a": 1}"#, SchemaId::ANY, &arena).unwrap();
        assert_eq!(value, Some(json!({"a": 1})));

        let malformed = decode("application/json", b"{not json", SchemaId::ANY, &arena);
        assert!(matches!(malformed, Err(BodyError::Malformed(_))));

        let opaque =
            decode("application/octet-stream", b"\x00\x01", SchemaId::ANY, &arena).unwrap();
        assert_eq!(opaque, None);
    }

    #[test]
    fn test_decode_form_coerces_fields() {
        let mut arena = SchemaArena::new();
        let components = IndexMap::new();
        let schema = SchemaCompiler::new(&mut arena, &components)
            .compile(
                &json!({
                    "type": "object",
                    "properties": {
                        "age": {"type": "integer"},
                        "tags": {"type": "array", "items": {"type": "string"}}
                    }
                }),
                "test",
            )
            .unwrap();

        let value = decode(
            "application/x-www-form-urlencoded",
            b"age=30&tags=a&tags=b%2Cc&name=Jane+Doe",
            schema,
            &arena,
        )
        .unwrap();
        assert_eq!(
            value,
            Some(json!({"age": 30, "tags": ["a", "b,c"], "name": "Jane Doe"}))
        );
    }

    #[test]
    fn test_body_error_keywords() {
        let violation = BodyError::UnsupportedMediaType("text/xml".into()).into_violation();
        assert_eq!(violation.keyword, Keyword::UnsupportedMediaType);
        assert_eq!(violation.location, Location::Body);
        assert_eq!(BodyError::Missing.keyword(), Keyword::MissingBody);
    }
}
