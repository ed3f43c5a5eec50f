use serde::Serialize;
use std::fmt;

/// Part of the message a violation was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Body,
    Path,
    Query,
    Header,
    Cookie,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Location::Body => "body",
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
        };
        f.write_str(s)
    }
}

/// The constraint a violation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Keyword {
    // Schema checks
    Type,
    Required,
    AdditionalProperties,
    Enum,
    Const,
    Format,
    Pattern,
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    MinItems,
    MaxItems,
    UniqueItems,
    MinProperties,
    MaxProperties,
    AnyOf,
    OneOf,
    Not,

    // Message checks
    MissingBody,
    MalformedBody,
    UnsupportedMediaType,
    UndeclaredResponseCode,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Type => "type",
            Keyword::Required => "required",
            Keyword::AdditionalProperties => "additionalProperties",
            Keyword::Enum => "enum",
            Keyword::Const => "const",
            Keyword::Format => "format",
            Keyword::Pattern => "pattern",
            Keyword::MinLength => "minLength",
            Keyword::MaxLength => "maxLength",
            Keyword::Minimum => "minimum",
            Keyword::Maximum => "maximum",
            Keyword::ExclusiveMinimum => "exclusiveMinimum",
            Keyword::ExclusiveMaximum => "exclusiveMaximum",
            Keyword::MultipleOf => "multipleOf",
            Keyword::MinItems => "minItems",
            Keyword::MaxItems => "maxItems",
            Keyword::UniqueItems => "uniqueItems",
            Keyword::MinProperties => "minProperties",
            Keyword::MaxProperties => "maxProperties",
            Keyword::AnyOf => "anyOf",
            Keyword::OneOf => "oneOf",
            Keyword::Not => "not",
            Keyword::MissingBody => "missingBody",
            Keyword::MalformedBody => "malformedBody",
            Keyword::UnsupportedMediaType => "unsupportedMediaType",
            Keyword::UndeclaredResponseCode => "undeclaredResponseCode",
        }
    }
}

impl From<Keyword> for &'static str {
    fn from(keyword: Keyword) -> Self {
        keyword.as_str()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PointerSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PointerSegment {
    fn from(key: &str) -> Self {
        PointerSegment::Key(key.to_string())
    }
}

impl From<usize> for PointerSegment {
    fn from(index: usize) -> Self {
        PointerSegment::Index(index)
    }
}

/// Path from the root of a validated value to the offending node.
/// Displays as a JSON Pointer (`/items/0/name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Pointer(Vec<PointerSegment>);

impl Pointer {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PointerSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<PointerSegment>) {
        self.0.push(segment.into());
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// A copy of this pointer extended by one segment
    pub fn join(&self, segment: impl Into<PointerSegment>) -> Self {
        let mut pointer = self.clone();
        pointer.push(segment);
        pointer
    }
}

impl<S: Into<PointerSegment>> FromIterator<S> for Pointer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Pointer(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PointerSegment::Key(key) => {
                    write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?
                }
                PointerSegment::Index(index) => write!(f, "/{}", index)?,
            }
        }
        Ok(())
    }
}

/// One mismatch between a message and the contract
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub location: Location,
    pub pointer: Pointer,
    pub keyword: Keyword,
    pub message: String,
}

impl Violation {
    pub fn new(location: Location, keyword: Keyword, message: impl Into<String>) -> Self {
        Self {
            location,
            pointer: Pointer::root(),
            keyword,
            message: message.into(),
        }
    }

    pub fn with_pointer(mut self, pointer: Pointer) -> Self {
        self.pointer = pointer;
        self
    }

    /// Format the violation with its location context
    pub fn format(&self) -> String {
        let pointer = if self.pointer.is_root() {
            String::new()
        } else {
            format!(" {}", self.pointer)
        };
        format!("[{}{}] {}: {}", self.location, pointer, self.keyword, self.message)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}
