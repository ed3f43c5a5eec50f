use super::matcher::{MatchOutcome, PathTemplateMatcher};
use super::template::{PathTemplate, split_path};
use crate::models::{HttpMethod, OperationAddress};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Why a request could not be routed to a declared operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("No operation matches path '{path}'")]
    NotFound { path: String },

    #[error("Method {method} is not allowed for '{path}' (allowed: {})", join_methods(.allowed))]
    MethodNotAllowed {
        path: String,
        method: String,
        allowed: Vec<HttpMethod>,
    },

    #[error("{method} '{path}' matches several templates equally: {}", .candidates.join(", "))]
    Ambiguous {
        path: String,
        method: HttpMethod,
        candidates: Vec<String>,
    },
}

fn join_methods(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of routing: the operation plus the path parameters bound on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub address: OperationAddress,
    pub path_parameters: IndexMap<String, String>,
}

/// Resolves `(method, path)` pairs to declared operations
#[derive(Debug, Clone, Default)]
pub struct OperationResolver {
    matchers: BTreeMap<HttpMethod, PathTemplateMatcher>,
    base_paths: Vec<String>,
}

impl OperationResolver {
    pub fn new<'a>(operations: impl IntoIterator<Item = &'a OperationAddress>) -> Self {
        let mut templates: BTreeMap<HttpMethod, Vec<&str>> = BTreeMap::new();
        for address in operations {
            templates
                .entry(address.method)
                .or_default()
                .push(address.path.as_str());
        }

        Self {
            matchers: templates
                .into_iter()
                .map(|(method, paths)| (method, PathTemplateMatcher::new(paths)))
                .collect(),
            base_paths: vec![],
        }
    }

    /// Server base paths (e.g. `/api/v1`) that requests may carry in front of templates
    pub fn with_base_paths<I, S>(mut self, base_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut base_paths: Vec<String> = base_paths
            .into_iter()
            .map(Into::into)
            .map(|p| p.trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        // longest prefix first
        base_paths.sort_by_key(|p| std::cmp::Reverse(p.len()));
        self.base_paths = base_paths;
        self
    }

    /// Resolve a request. The method is matched case-insensitively.
    pub fn resolve(&self, method: &str, path: &str) -> Result<ResolvedRoute, RouteError> {
        let candidates = self.candidate_paths(path);

        let Ok(parsed) = method.parse::<HttpMethod>() else {
            return Err(self.unrouted(&candidates, path, method.to_uppercase()));
        };

        if let Some(matcher) = self.matchers.get(&parsed) {
            for candidate in &candidates {
                match matcher.match_path(candidate) {
                    MatchOutcome::Matched(found) => {
                        let address = OperationAddress::new(found.template, parsed);
                        tracing::debug!(%address, path, "Resolved operation");
                        return Ok(ResolvedRoute {
                            address,
                            path_parameters: found.parameters,
                        });
                    }
                    MatchOutcome::Ambiguous(templates) => {
                        return Err(RouteError::Ambiguous {
                            path: path.to_string(),
                            method: parsed,
                            candidates: templates,
                        });
                    }
                    MatchOutcome::NotFound => {}
                }
            }
        }

        Err(self.unrouted(&candidates, path, parsed.to_string()))
    }

    /// Bind the parameters of a known template against a request path
    pub fn bind(&self, template: &str, path: &str) -> Option<IndexMap<String, String>> {
        let template = PathTemplate::parse(template);
        self.candidate_paths(path)
            .iter()
            .find_map(|candidate| template.matches(candidate))
    }

    /// The request path with each matching base path stripped, then the path itself
    fn candidate_paths(&self, path: &str) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .base_paths
            .iter()
            .filter_map(|base| {
                let rest = path.strip_prefix(base.as_str())?;
                if rest.is_empty() {
                    Some("/".to_string())
                } else if rest.starts_with('/') {
                    Some(rest.to_string())
                } else {
                    None
                }
            })
            .collect();
        candidates.push(path.to_string());
        candidates
    }

    /// Distinguish "no such path" from "path exists under other methods"
    fn unrouted(&self, candidates: &[String], path: &str, method: String) -> RouteError {
        let allowed: Vec<HttpMethod> = self
            .matchers
            .iter()
            .filter(|(_, matcher)| {
                candidates
                    .iter()
                    .any(|c| matcher.match_path(c) != MatchOutcome::NotFound)
            })
            .map(|(method, _)| *method)
            .collect();

        if allowed.is_empty() {
            tracing::debug!(path, segments = split_path(path).len(), "No operation for path");
            RouteError::NotFound {
                path: path.to_string(),
            }
        } else {
            RouteError::MethodNotAllowed {
                path: path.to_string(),
                method,
                allowed,
            }
        }
    }
}
