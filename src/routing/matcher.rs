use super::template::PathTemplate;
use indexmap::IndexMap;

/// A template that matched a concrete path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub template: String,
    pub parameters: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(PathMatch),
    NotFound,
    /// Several templates matched with the same number of literal segments
    Ambiguous(Vec<String>),
}

/// Matches concrete paths against a fixed set of path templates
#[derive(Debug, Clone, Default)]
pub struct PathTemplateMatcher {
    templates: Vec<PathTemplate>,
}

impl PathTemplateMatcher {
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            templates: templates
                .into_iter()
                .map(|t| PathTemplate::parse(t.as_ref()))
                .collect(),
        }
    }

    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(PathTemplate::as_str)
    }

    /// Find the single best template for `path`.
    ///
    /// Among matching templates the one with the most literal segments wins;
    /// a tie on that count is reported as `Ambiguous`.
    pub fn match_path(&self, path: &str) -> MatchOutcome {
        let mut best: Vec<(&PathTemplate, IndexMap<String, String>)> = vec![];
        let mut best_score = 0;

        for template in &self.templates {
            let Some(parameters) = template.matches(path) else {
                continue;
            };
            let score = template.literal_segments();
            if best.is_empty() || score > best_score {
                best_score = score;
                best = vec![(template, parameters)];
            } else if score == best_score {
                best.push((template, parameters));
            }
        }

        match best.len() {
            0 => MatchOutcome::NotFound,
            1 => {
                let (template, parameters) = best.remove(0);
                MatchOutcome::Matched(PathMatch {
                    template: template.as_str().to_string(),
                    parameters,
                })
            }
            _ => MatchOutcome::Ambiguous(
                best.iter()
                    .map(|(template, _)| template.as_str().to_string())
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_more_literal_segments() {
        let matcher = PathTemplateMatcher::new(["/a/{id}", "/a/fixed"]);

        match matcher.match_path("/a/fixed") {
            MatchOutcome::Matched(m) => {
                assert_eq!(m.template, "/a/fixed");
                assert!(m.parameters.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        match matcher.match_path("/a/7") {
            MatchOutcome::Matched(m) => assert_eq!(m.parameters["id"], "7"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let matcher = PathTemplateMatcher::new(["/a/{id}/x", "/a/y/{name}", "/a/{slug}/{name}"]);

        match matcher.match_path("/a/y/x") {
            MatchOutcome::Ambiguous(candidates) => {
                assert_eq!(candidates, vec!["/a/{id}/x", "/a/y/{name}"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found() {
        let matcher = PathTemplateMatcher::new(["/a/{id}"]);
        assert_eq!(matcher.match_path("/a/1/2"), MatchOutcome::NotFound);
        assert_eq!(matcher.match_path("/b/1"), MatchOutcome::NotFound);
    }
}
