use super::format;
use super::{AdditionalProperties, SchemaArena, SchemaId, SchemaNode, SchemaType};
use crate::validation::{Keyword, Location, Pointer, Violation};
use serde_json::{Map, Number, Value};

/// Recursive validator of JSON values against compiled schemas.
///
/// Holds only a shared borrow of the arena, so one validator (or many) can be
/// used from several threads at once.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'a> {
    arena: &'a SchemaArena,
    validate_formats: bool,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(arena: &'a SchemaArena) -> Self {
        Self {
            arena,
            validate_formats: true,
        }
    }

    pub fn with_formats(mut self, validate_formats: bool) -> Self {
        self.validate_formats = validate_formats;
        self
    }

    /// Validate `value` against `schema`, reporting violations at `location`
    /// with pointers below `pointer`
    pub fn validate(
        &self,
        schema: SchemaId,
        value: &Value,
        location: Location,
        pointer: &Pointer,
    ) -> Vec<Violation> {
        let mut walk = Walk {
            location,
            pointer: pointer.clone(),
            violations: vec![],
        };
        self.check(schema, value, &mut walk);
        walk.violations
    }

    /// True when `value` satisfies `schema`
    pub fn is_valid(&self, schema: SchemaId, value: &Value) -> bool {
        self.validate(schema, value, Location::Body, &Pointer::root())
            .is_empty()
    }

    fn check(&self, id: SchemaId, value: &Value, walk: &mut Walk) {
        if id.is_any() {
            return;
        }
        let node = self.arena.get(id);

        if value.is_null() && node.accepts_null() {
            return;
        }

        if !node.types.is_empty() && !node.types.iter().any(|t| t.matches(value)) {
            let expected: Vec<&str> = node.types.iter().map(SchemaType::as_str).collect();
            walk.report(
                Keyword::Type,
                format!(
                    "expected {}, found {}",
                    expected.join(" or "),
                    SchemaType::of(value)
                ),
            );
            return;
        }

        if let Some(allowed) = &node.enum_values
            && !allowed.iter().any(|candidate| json_equal(candidate, value))
        {
            walk.report(Keyword::Enum, format!("{} is not one of the allowed values", value));
        }

        if let Some(expected) = &node.const_value
            && !json_equal(expected, value)
        {
            walk.report(Keyword::Const, format!("expected {}", expected));
        }

        if self.validate_formats
            && let Some(format) = &node.format
            && !format::conforms(format, value)
        {
            walk.report(Keyword::Format, format!("{} is not a valid {}", value, format));
        }

        match value {
            Value::Object(map) => self.check_object(node, map, walk),
            Value::Array(items) => self.check_array(node, items, walk),
            Value::String(s) => check_string(node, s, walk),
            Value::Number(n) => check_number(node, n, walk),
            Value::Bool(_) | Value::Null => {}
        }

        self.check_composition(node, value, walk);
    }

    fn check_object(&self, node: &SchemaNode, map: &Map<String, Value>, walk: &mut Walk) {
        let count = map.len() as u64;
        if let Some(min) = node.min_properties
            && count < min
        {
            walk.report(
                Keyword::MinProperties,
                format!("expected at least {} properties, found {}", min, count),
            );
        }
        if let Some(max) = node.max_properties
            && count > max
        {
            walk.report(
                Keyword::MaxProperties,
                format!("expected at most {} properties, found {}", max, count),
            );
        }

        for (key, child) in map {
            if let Some(schema) = node.properties.get(key) {
                walk.descend(key.as_str(), |walk| self.check(*schema, child, walk));
                continue;
            }

            match node.additional_properties {
                AdditionalProperties::Unconstrained => {}
                AdditionalProperties::Forbidden => walk.descend(key.as_str(), |walk| {
                    walk.report(
                        Keyword::AdditionalProperties,
                        format!("property '{}' is not allowed", key),
                    )
                }),
                AdditionalProperties::Schema(schema) => {
                    walk.descend(key.as_str(), |walk| self.check(schema, child, walk))
                }
            }
        }

        for name in &node.required {
            if !map.contains_key(name) {
                walk.report(Keyword::Required, format!("property '{}' is required", name));
            }
        }
    }

    fn check_array(&self, node: &SchemaNode, items: &[Value], walk: &mut Walk) {
        let count = items.len() as u64;
        if let Some(min) = node.min_items
            && count < min
        {
            walk.report(
                Keyword::MinItems,
                format!("expected at least {} items, found {}", min, count),
            );
        }
        if let Some(max) = node.max_items
            && count > max
        {
            walk.report(
                Keyword::MaxItems,
                format!("expected at most {} items, found {}", max, count),
            );
        }

        if node.unique_items {
            let duplicate = items
                .iter()
                .enumerate()
                .any(|(i, a)| items[i + 1..].iter().any(|b| json_equal(a, b)));
            if duplicate {
                walk.report(Keyword::UniqueItems, "items must be unique");
            }
        }

        if let Some(schema) = node.items {
            for (i, item) in items.iter().enumerate() {
                walk.descend(i, |walk| self.check(schema, item, walk));
            }
        }
    }

    fn check_composition(&self, node: &SchemaNode, value: &Value, walk: &mut Walk) {
        for member in &node.all_of {
            self.check(*member, value, walk);
        }

        if !node.any_of.is_empty() && !node.any_of.iter().any(|m| self.is_valid(*m, value)) {
            walk.report(Keyword::AnyOf, "value does not match any of the allowed schemas");
        }

        if !node.one_of.is_empty() {
            let matched = node.one_of.iter().filter(|m| self.is_valid(**m, value)).count();
            if matched != 1 {
                walk.report(
                    Keyword::OneOf,
                    format!("value must match exactly one schema, matched {}", matched),
                );
            }
        }

        if let Some(not) = node.not
            && self.is_valid(not, value)
        {
            walk.report(Keyword::Not, "value matches a disallowed schema");
        }
    }
}

/// Mutable state of one validation pass
struct Walk {
    location: Location,
    pointer: Pointer,
    violations: Vec<Violation>,
}

impl Walk {
    fn report(&mut self, keyword: Keyword, message: impl Into<String>) {
        let violation =
            Violation::new(self.location, keyword, message).with_pointer(self.pointer.clone());
        self.violations.push(violation);
    }

    fn descend(
        &mut self,
        segment: impl Into<crate::validation::PointerSegment>,
        f: impl FnOnce(&mut Walk),
    ) {
        self.pointer.push(segment);
        f(self);
        self.pointer.pop();
    }
}

fn check_string(node: &SchemaNode, s: &str, walk: &mut Walk) {
    let length = s.chars().count() as u64;
    if let Some(min) = node.min_length
        && length < min
    {
        walk.report(
            Keyword::MinLength,
            format!("expected at least {} characters, found {}", min, length),
        );
    }
    if let Some(max) = node.max_length
        && length > max
    {
        walk.report(
            Keyword::MaxLength,
            format!("expected at most {} characters, found {}", max, length),
        );
    }
    if let Some(pattern) = &node.pattern
        && !pattern.is_match(s)
    {
        walk.report(
            Keyword::Pattern,
            format!("'{}' does not match pattern '{}'", s, pattern.as_str()),
        );
    }
}

fn check_number(node: &SchemaNode, n: &Number, walk: &mut Walk) {
    let Some(v) = n.as_f64() else {
        return;
    };

    if let Some(min) = node.minimum
        && v < min
    {
        walk.report(Keyword::Minimum, format!("{} is less than {}", n, min));
    }
    if let Some(max) = node.maximum
        && v > max
    {
        walk.report(Keyword::Maximum, format!("{} is greater than {}", n, max));
    }
    if let Some(min) = node.exclusive_minimum
        && v <= min
    {
        walk.report(Keyword::ExclusiveMinimum, format!("{} must be greater than {}", n, min));
    }
    if let Some(max) = node.exclusive_maximum
        && v >= max
    {
        walk.report(Keyword::ExclusiveMaximum, format!("{} must be less than {}", n, max));
    }
    if let Some(divisor) = node.multiple_of
        && divisor > 0.0
    {
        let quotient = v / divisor;
        if (quotient - quotient.round()).abs() > 1e-9 {
            walk.report(Keyword::MultipleOf, format!("{} is not a multiple of {}", n, divisor));
        }
    }
}

/// JSON equality where numbers compare by value (`1 == 1.0`)
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}
