use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
}

/// A parsed path template such as `/products/{id}` or `/files/{name}.{ext}`
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Vec<Part>>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Self {
        let segments = split_path(template).into_iter().map(parse_segment).collect();
        Self {
            raw: template.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of segments that contain no parameter
    pub fn literal_segments(&self) -> usize {
        self.segments
            .iter()
            .filter(|parts| parts.iter().all(|p| matches!(p, Part::Literal(_))))
            .count()
    }

    /// Names of the parameters in declaration order
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flatten().filter_map(|part| match part {
            Part::Param(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Match a request path; on success returns the bound (percent-decoded) parameters
    pub fn matches(&self, path: &str) -> Option<IndexMap<String, String>> {
        let actual = split_path(path);
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut bindings = IndexMap::new();
        for (parts, segment) in self.segments.iter().zip(&actual) {
            if !match_parts(parts, segment, &mut bindings) {
                return None;
            }
        }

        Some(
            bindings
                .into_iter()
                .map(|(name, raw)| {
                    let value = percent_decode_str(&raw).decode_utf8_lossy().into_owned();
                    (name, value)
                })
                .collect(),
        )
    }
}

/// `/` and the empty path both have zero segments; a trailing slash adds an empty one
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        vec![]
    } else {
        trimmed.split('/').collect()
    }
}

fn parse_segment(segment: &str) -> Vec<Part> {
    let mut parts = vec![];
    let mut rest = segment;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        if open > 0 {
            parts.push(Part::Literal(rest[..open].to_string()));
        }
        parts.push(Part::Param(rest[open + 1..close].to_string()));
        rest = &rest[close + 1..];
    }

    if !rest.is_empty() || parts.is_empty() {
        parts.push(Part::Literal(rest.to_string()));
    }
    parts
}

fn match_parts(parts: &[Part], segment: &str, bindings: &mut IndexMap<String, String>) -> bool {
    match parts.split_first() {
        None => segment.is_empty(),
        Some((Part::Literal(literal), rest)) => segment
            .strip_prefix(literal.as_str())
            .is_some_and(|remaining| match_parts(rest, remaining, bindings)),
        Some((Part::Param(name), rest)) => {
            // parameters bind at least one character; try the shortest binding first
            for (end, _) in segment.char_indices().skip(1).chain([(segment.len(), ' ')]) {
                if end == 0 {
                    continue;
                }
                let mut attempt = bindings.clone();
                attempt.insert(name.clone(), segment[..end].to_string());
                if match_parts(rest, &segment[end..], &mut attempt) {
                    *bindings = attempt;
                    return true;
                }
            }
            false
        }
    }
}
